//! Request path canonicalization.
//!
//! Routes match the decoded path, the same path a dispatcher sees after its
//! own decoding. Each segment is percent-decoded once and empty segments are
//! collapsed, so `/%72estricted/x` and `//restricted/x` both resolve as
//! `/restricted/x`.

use percent_encoding::percent_decode_str;

/// A request path that cannot be routed unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("encoded '/' in path segment")]
    EncodedSlash,
    #[error("path is not valid UTF-8 after decoding")]
    InvalidUtf8,
    #[error("dot segment in path")]
    DotSegment,
}

/// Decode `raw` and collapse empty segments. A trailing slash is kept.
pub fn canonical_path(raw: &str) -> Result<String, PathError> {
    let mut out = String::with_capacity(raw.len());
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| PathError::InvalidUtf8)?;
        if decoded.contains('/') {
            return Err(PathError::EncodedSlash);
        }
        if decoded == "." || decoded == ".." {
            return Err(PathError::DotSegment);
        }
        out.push('/');
        out.push_str(&decoded);
    }

    if out.is_empty() || raw.ends_with('/') {
        out.push('/');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_and_collapses() {
        assert_eq!(canonical_path("/").unwrap(), "/");
        assert_eq!(canonical_path("").unwrap(), "/");
        assert_eq!(
            canonical_path("/%72estricted/set-client-id-and-secret").unwrap(),
            "/restricted/set-client-id-and-secret"
        );
        assert_eq!(canonical_path("//restricted//x").unwrap(), "/restricted/x");
        assert_eq!(canonical_path("/static/my%20file.txt").unwrap(), "/static/my file.txt");
        assert_eq!(canonical_path("/1234/").unwrap(), "/1234/");
    }

    #[test]
    fn test_ambiguous_paths_are_rejected() {
        assert_eq!(canonical_path("/restricted%2Fx"), Err(PathError::EncodedSlash));
        assert_eq!(canonical_path("/a/%2f"), Err(PathError::EncodedSlash));
        assert_eq!(canonical_path("/%ff%fe"), Err(PathError::InvalidUtf8));
        assert_eq!(canonical_path("/static/../gateway.toml"), Err(PathError::DotSegment));
        assert_eq!(canonical_path("/static/%2e%2e/x"), Err(PathError::DotSegment));
    }
}

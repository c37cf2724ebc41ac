//! Route matching logic.
//!
//! # Responsibilities
//! - Match a request path against a full-match regular expression
//! - Match a request path against a literal directory prefix
//! - Expose capture groups and the remainder below a prefix
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Regex patterns are anchored at both ends; `/foo` never matches `/foobar`
//! - Prefixes match on segment boundaries; `/static` never matches `/staticfoo`

use regex::Regex;

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathMatch {
    /// Capture groups; index 0 is the whole match. Unmatched groups are empty.
    pub captures: Vec<String>,
    /// Path below a directory prefix, without the leading slash.
    pub remainder: Option<String>,
}

/// Trait for matching request paths against a route pattern.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the match details if the path matches this pattern.
    fn match_path(&self, path: &str) -> Option<PathMatch>;

    /// Number of capture groups, excluding the whole match.
    fn capture_groups(&self) -> usize {
        0
    }

    /// True if the pattern matches every request path.
    fn is_catch_all(&self) -> bool {
        false
    }
}

/// Matches the whole path against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    source: String,
    regex: Regex,
}

impl RegexMatcher {
    /// Compile `pattern`, anchoring it at both ends.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }
}

impl Matcher for RegexMatcher {
    fn match_path(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let captures = caps
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        Some(PathMatch {
            captures,
            remainder: None,
        })
    }

    fn capture_groups(&self) -> usize {
        self.regex.captures_len() - 1
    }

    fn is_catch_all(&self) -> bool {
        matches!(self.source.as_str(), ".*" | "/.*" | "(.*)" | "/(.*)")
    }
}

/// Matches a literal directory prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. Trailing slashes are ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn match_path(&self, path: &str) -> Option<PathMatch> {
        let rest = path.strip_prefix(&self.prefix)?;
        let remainder = if rest.is_empty() {
            ""
        } else {
            rest.strip_prefix('/')?
        };
        Some(PathMatch {
            captures: vec![path.to_string()],
            remainder: Some(remainder.to_string()),
        })
    }

    fn is_catch_all(&self) -> bool {
        self.prefix.is_empty()
    }
}

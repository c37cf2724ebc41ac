//! Revision marker file.
//!
//! A plaintext file holding only the version tag of the build about to run.
//! Rewritten before every serve and update step.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::pipeline::version::VersionTag;
use crate::pipeline::PipelineError;

/// Overwrite the marker at `path` with `tag`.
pub fn write_revision_marker(path: &Path, tag: &VersionTag) -> Result<(), PipelineError> {
    fs::write(path, format!("{}\n", tag)).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(marker = %path.display(), tag = %tag, "Revision marker updated");
    Ok(())
}

/// Read the tag recorded at `path`; `None` if no marker exists yet.
pub fn read_revision_marker(path: &Path) -> Result<Option<String>, PipelineError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PipelineError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

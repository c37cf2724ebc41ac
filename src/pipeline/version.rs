//! Version tags derived from source control.
//!
//! The raw revision is `<commit-count>:<short-hash>`. The deployment target
//! only accepts `[a-z0-9-]` in version names, so the colon (and anything
//! else outside that set) becomes `-`. Uncommitted changes append
//! [`DIRTY_SUFFIX`].

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::pipeline::runner::{CommandRunner, Invocation};
use crate::pipeline::PipelineError;

/// Appended to the tag when the working tree has uncommitted changes.
pub const DIRTY_SUFFIX: &str = "-tainted";

/// Longest version name the deployment target accepts.
pub const MAX_TAG_LEN: usize = 63;

/// Source-control state needed to label a build.
pub trait SourceControl {
    /// Revision identifier of the checked-out commit.
    fn revision(&self) -> Result<String, PipelineError>;

    /// True if tracked files have uncommitted changes.
    fn is_dirty(&self) -> Result<bool, PipelineError>;
}

/// Reads revision state with the `git` command line.
pub struct GitCli<'a, R: CommandRunner> {
    runner: &'a R,
    repo: PathBuf,
    /// Paths excluded from the dirty check (the revision marker itself).
    ignored: Vec<String>,
}

impl<'a, R: CommandRunner> GitCli<'a, R> {
    pub fn new(runner: &'a R, repo: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo: repo.into(),
            ignored: Vec::new(),
        }
    }

    /// Ignore changes to `path` when deciding whether the tree is dirty.
    pub fn ignoring(mut self, path: impl Into<String>) -> Self {
        self.ignored.push(path.into());
        self
    }

    fn git(&self) -> Invocation {
        Invocation::new("git").current_dir(&self.repo)
    }
}

impl<R: CommandRunner> SourceControl for GitCli<'_, R> {
    fn revision(&self) -> Result<String, PipelineError> {
        let count = self
            .runner
            .output(&self.git().args(["rev-list", "--count", "HEAD"]))?;
        let hash = self
            .runner
            .output(&self.git().args(["rev-parse", "--short", "HEAD"]))?;
        Ok(format!("{}:{}", count.trim(), hash.trim()))
    }

    fn is_dirty(&self) -> Result<bool, PipelineError> {
        let mut invocation = self
            .git()
            .args(["status", "--porcelain", "--untracked-files=no", "--", "."]);
        for path in &self.ignored {
            invocation = invocation.arg(format!(":(exclude){}", path));
        }
        Ok(!self.runner.output(&invocation)?.trim().is_empty())
    }
}

/// A version name acceptable to the deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_dirty(&self) -> bool {
        self.0.ends_with(DIRTY_SUFFIX)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the tag for the current source-control state. Never cached.
pub fn compute_version_tag(scm: &dyn SourceControl) -> Result<VersionTag, PipelineError> {
    let revision = scm.revision()?;
    let dirty = scm.is_dirty()?;

    let budget = if dirty {
        MAX_TAG_LEN - DIRTY_SUFFIX.len()
    } else {
        MAX_TAG_LEN
    };
    let mut tag = sanitize(&revision);
    tag.truncate(budget);
    let tag = tag.trim_end_matches('-').to_string();
    if tag.is_empty() {
        return Err(PipelineError::EmptyRevision);
    }

    let tag = if dirty {
        format!("{}{}", tag, DIRTY_SUFFIX)
    } else {
        tag
    };
    tracing::info!(revision = %revision, dirty, tag = %tag, "Version tag computed");
    Ok(VersionTag(tag))
}

/// Lowercase and replace characters outside `[a-z0-9-]` with `-`.
pub fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

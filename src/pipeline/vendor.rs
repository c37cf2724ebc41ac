//! Pinned third-party sources.
//!
//! Some libraries are not packaged for the deployment target and must be
//! shipped inside the application artifact. Each is described by a
//! repository, a pinned revision and an optional local patch, and resolved
//! into the application tree before any upload.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::VendorConfig;
use crate::pipeline::runner::{CommandRunner, Invocation};
use crate::pipeline::PipelineError;

/// Stamp file recording the revision a destination was resolved at.
pub const STAMP_FILE: &str = ".vendor-revision";

/// A dependency pinned to a revision, with an optional patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorDependency {
    pub name: String,
    pub repository: String,
    pub revision: String,
    /// Absolute path of the patch to apply after checkout.
    pub patch: Option<PathBuf>,
    /// Absolute checkout destination.
    pub destination: PathBuf,
}

/// What resolving a dependency did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorStatus {
    /// Destination already holds the pinned revision.
    UpToDate,
    /// Fetched (and patched) afresh.
    Fetched,
}

impl VendorDependency {
    /// Resolve config paths against the application root.
    pub fn from_config(config: &VendorConfig, app_root: &Path) -> Self {
        let destination = config.destination.as_deref().unwrap_or(&config.name);
        Self {
            name: config.name.clone(),
            repository: config.repository.clone(),
            revision: config.revision.clone(),
            patch: config.patch.as_ref().map(|p| app_root.join(p)),
            destination: app_root.join(destination),
        }
    }

    fn stamp_path(&self) -> PathBuf {
        self.destination.join(STAMP_FILE)
    }

    /// True if the destination was resolved at the pinned revision.
    pub fn is_current(&self) -> bool {
        fs::read_to_string(self.stamp_path())
            .map(|stamp| stamp.trim() == self.revision)
            .unwrap_or(false)
    }

    /// Fetch, pin and patch the dependency unless it is already current.
    pub fn resolve<R: CommandRunner>(&self, runner: &R) -> Result<VendorStatus, PipelineError> {
        if self.is_current() {
            tracing::debug!(name = %self.name, revision = %self.revision, "Vendored dependency up to date");
            return Ok(VendorStatus::UpToDate);
        }

        if let Err(e) = self.fetch(runner) {
            self.discard();
            return Err(PipelineError::Vendor {
                name: self.name.clone(),
                source: Box::new(e),
            });
        }
        Ok(VendorStatus::Fetched)
    }

    /// Remove whatever a failed fetch left at the destination.
    fn discard(&self) {
        if !self.destination.exists() {
            return;
        }
        match fs::remove_dir_all(&self.destination) {
            Ok(()) => tracing::warn!(
                name = %self.name,
                destination = %self.destination.display(),
                "Removed partial vendored checkout"
            ),
            Err(e) => tracing::error!(
                name = %self.name,
                destination = %self.destination.display(),
                error = %e,
                "Failed to remove partial vendored checkout"
            ),
        }
    }

    fn fetch<R: CommandRunner>(&self, runner: &R) -> Result<(), PipelineError> {
        tracing::info!(
            name = %self.name,
            repository = %self.repository,
            revision = %self.revision,
            "Fetching vendored dependency"
        );

        if self.destination.exists() {
            fs::remove_dir_all(&self.destination).map_err(|source| PipelineError::Io {
                path: self.destination.clone(),
                source,
            })?;
        }

        let dest = self.destination.to_string_lossy().into_owned();
        runner.run(
            &Invocation::new("git").args(["clone", "--quiet", self.repository.as_str(), dest.as_str()]),
        )?;

        let in_dest = || Invocation::new("git").current_dir(&self.destination);
        runner.run(&in_dest().args(["checkout", "--quiet", self.revision.as_str()]))?;

        if let Some(patch) = &self.patch {
            runner.run(&in_dest().arg("apply").arg(patch.to_string_lossy()))?;
        }

        fs::write(self.stamp_path(), format!("{}\n", self.revision)).map_err(|source| {
            PipelineError::Io {
                path: self.stamp_path(),
                source,
            }
        })
    }
}

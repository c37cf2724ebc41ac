//! Platform SDK detection.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Development server launcher inside the SDK.
pub const DEV_APPSERVER: &str = "dev_appserver.py";
/// Deploy tool inside the SDK.
pub const APPCFG: &str = "appcfg.py";

/// First existing directory among `candidates`, after `~` and `$VAR` expansion.
///
/// Candidates that fail to expand (unset variables) are skipped.
pub fn detect_sdk<S: AsRef<str>>(candidates: &[S]) -> Option<PathBuf> {
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.as_ref();
        let expanded = match shellexpand::full(candidate) {
            Ok(expanded) => expanded,
            Err(e) => {
                tracing::debug!(candidate, error = %e, "Skipping SDK candidate");
                return None;
            }
        };
        let path = PathBuf::from(expanded.as_ref());
        path.is_dir().then_some(path)
    })
}

/// Resolved SDK tool locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdkTools {
    /// SDK directory; `None` means tools are looked up on `PATH`.
    pub sdk_path: Option<PathBuf>,
}

impl SdkTools {
    /// An explicit override wins; otherwise probe `candidates`.
    pub fn resolve<S: AsRef<str>>(override_path: Option<&Path>, candidates: &[S]) -> Self {
        let sdk_path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => detect_sdk(candidates),
        };
        match &sdk_path {
            Some(path) => tracing::info!(sdk = %path.display(), "Using SDK"),
            None => tracing::info!("No SDK found; using tools from PATH"),
        }
        Self { sdk_path }
    }

    /// Program name or path for an SDK tool.
    pub fn tool(&self, name: &str) -> String {
        match &self.sdk_path {
            Some(dir) => dir.join(name).to_string_lossy().into_owned(),
            None => name.to_string(),
        }
    }

    pub fn dev_appserver(&self) -> String {
        self.tool(DEV_APPSERVER)
    }

    pub fn appcfg(&self) -> String {
        self.tool(APPCFG)
    }
}

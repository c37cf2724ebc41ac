//! Release operations.
//!
//! Each operation recomputes the [`BuildDescriptor`] from the current
//! source-control state. Serve and update operations rewrite the revision
//! marker first; update operations also resolve vendored dependencies
//! before anything is uploaded.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::schema::ReleaseConfig;
use crate::pipeline::marker::write_revision_marker;
use crate::pipeline::runner::{CommandRunner, Invocation};
use crate::pipeline::sdk::SdkTools;
use crate::pipeline::vendor::VendorDependency;
use crate::pipeline::version::{compute_version_tag, SourceControl, VersionTag};
use crate::pipeline::PipelineError;

/// Everything that labels and locates one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDescriptor {
    pub application_id: String,
    pub version_tag: VersionTag,
    pub sdk: SdkTools,
    pub revision_marker: PathBuf,
}

/// A named pipeline operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Serve,
    ServeRemote,
    ServeEmail,
    ServeRemoteEmail,
    Update,
    UpdateBackend,
    Upload,
    Deploy,
    UpdateIndexes,
    VacuumIndexes,
    Test,
    Coverage,
}

/// Runs pipeline operations for one application checkout.
pub struct Release<'a, R: CommandRunner> {
    config: &'a ReleaseConfig,
    runner: &'a R,
    scm: &'a dyn SourceControl,
    app_root: PathBuf,
    sdk_override: Option<PathBuf>,
}

impl<'a, R: CommandRunner> Release<'a, R> {
    pub fn new(config: &'a ReleaseConfig, runner: &'a R, scm: &'a dyn SourceControl) -> Self {
        Self {
            config,
            runner,
            scm,
            app_root: PathBuf::from(&config.app_root),
            sdk_override: None,
        }
    }

    /// Use this SDK directory instead of probing candidates.
    pub fn with_sdk(mut self, sdk: Option<PathBuf>) -> Self {
        self.sdk_override = sdk;
        self
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    pub fn sdk(&self) -> SdkTools {
        SdkTools::resolve(self.sdk_override.as_deref(), &self.config.sdk_candidates)
    }

    /// Compute the descriptor without touching the tree.
    pub fn describe(&self) -> Result<BuildDescriptor, PipelineError> {
        Ok(BuildDescriptor {
            application_id: self.config.application_id.clone(),
            version_tag: compute_version_tag(self.scm)?,
            sdk: self.sdk(),
            revision_marker: self.app_root.join(&self.config.revision_marker),
        })
    }

    /// Compute the descriptor and rewrite the revision marker.
    pub fn prepare(&self) -> Result<BuildDescriptor, PipelineError> {
        let build = self.describe()?;
        write_revision_marker(&build.revision_marker, &build.version_tag)?;
        Ok(build)
    }

    /// Resolve every vendored dependency, stopping at the first failure.
    pub fn fetch_vendored(&self) -> Result<(), PipelineError> {
        for config in &self.config.vendor {
            VendorDependency::from_config(config, &self.app_root).resolve(self.runner)?;
        }
        Ok(())
    }

    pub fn execute(&self, operation: Operation) -> Result<(), PipelineError> {
        tracing::info!(operation = ?operation, app = %self.config.application_id, "Pipeline step starting");
        match operation {
            Operation::Serve => self.serve(None, false),
            Operation::ServeRemote => self.serve(Some(self.config.remote_address.as_str()), false),
            Operation::ServeEmail => self.serve(None, true),
            Operation::ServeRemoteEmail => self.serve(Some(self.config.remote_address.as_str()), true),
            Operation::Update | Operation::Upload | Operation::Deploy => self.update(),
            Operation::UpdateBackend => self.update_backend(),
            Operation::UpdateIndexes => self.indexes("update_indexes"),
            Operation::VacuumIndexes => self.indexes("vacuum_indexes"),
            Operation::Test => self.test(),
            Operation::Coverage => self.coverage(),
        }
    }

    /// Launch the local development server; blocks until it exits.
    pub fn serve(&self, address: Option<&str>, email: bool) -> Result<(), PipelineError> {
        let build = self.prepare()?;
        let mut invocation = self
            .tool(build.sdk.dev_appserver())
            .args(&self.config.dev_appserver_flags);
        if let Some(address) = address {
            invocation = invocation.args(["--address", address]);
        }
        if email {
            invocation = invocation.arg("--enable_sendmail");
        }
        self.runner.run(&invocation.arg("."))
    }

    /// Upload the application and its backend under the computed version.
    pub fn update(&self) -> Result<(), PipelineError> {
        let build = self.prepare()?;
        self.fetch_vendored()?;

        self.runner.run(
            &self
                .appcfg(&build)
                .args(["update", "."])
                .args(["--application", build.application_id.as_str()])
                .args(["--version", build.version_tag.as_str()]),
        )?;
        self.upload_backend(&build)
    }

    /// Upload only the backend.
    pub fn update_backend(&self) -> Result<(), PipelineError> {
        let build = self.prepare()?;
        self.fetch_vendored()?;
        self.upload_backend(&build)
    }

    fn upload_backend(&self, build: &BuildDescriptor) -> Result<(), PipelineError> {
        self.runner.run(
            &self
                .appcfg(build)
                .args(["backends", ".", "update"])
                .args(["--application", build.application_id.as_str()]),
        )
    }

    /// `update_indexes` or `vacuum_indexes`; independent of code deployment.
    fn indexes(&self, action: &str) -> Result<(), PipelineError> {
        let sdk = self.sdk();
        self.runner.run(
            &self
                .tool(sdk.appcfg())
                .args(&self.config.appcfg_flags)
                .args([action, "."])
                .args(["--application", self.config.application_id.as_str()]),
        )
    }

    /// Run the application's test suite.
    pub fn test(&self) -> Result<(), PipelineError> {
        let sdk = self.sdk();
        let invocation = self
            .tool(self.config.python.clone())
            .arg(self.config.test_runner.clone())
            .args(sdk_arg(&sdk));
        self.runner.run(&invocation)
    }

    /// Run the test suite under branch coverage and write an HTML report.
    pub fn coverage(&self) -> Result<(), PipelineError> {
        let sdk = self.sdk();
        self.runner.run(
            &self
                .tool(self.config.coverage.clone())
                .args(["run", "--branch"])
                .arg(self.config.test_runner.clone())
                .args(sdk_arg(&sdk)),
        )?;
        self.runner.run(
            &self
                .tool(self.config.coverage.clone())
                .arg("html")
                .arg(format!("--include={}", self.config.coverage_include)),
        )
    }

    fn tool(&self, program: String) -> Invocation {
        Invocation::new(program).current_dir(&self.app_root)
    }

    fn appcfg(&self, build: &BuildDescriptor) -> Invocation {
        self.tool(build.sdk.appcfg()).args(&self.config.appcfg_flags)
    }
}

fn sdk_arg(sdk: &SdkTools) -> Option<String> {
    sdk.sdk_path
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
}

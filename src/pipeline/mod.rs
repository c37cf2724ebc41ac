//! Build and release pipeline.
//!
//! Drives the platform SDK for the application this gateway fronts:
//! - Computes a version tag from source control ([`version`])
//! - Stamps the revision marker before serving or uploading ([`marker`])
//! - Fetches pinned third-party sources into the tree ([`vendor`])
//! - Runs the development server, uploads, index maintenance and tests ([`release`])

pub mod marker;
pub mod release;
pub mod runner;
pub mod sdk;
pub mod vendor;
pub mod version;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use marker::{read_revision_marker, write_revision_marker};
pub use release::{BuildDescriptor, Operation, Release};
pub use runner::{CommandRunner, Invocation, SystemRunner};
pub use sdk::SdkTools;
pub use vendor::{VendorDependency, VendorStatus};
pub use version::{compute_version_tag, GitCli, SourceControl, VersionTag};

/// Pipeline errors. Any error aborts the remaining steps.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` produced non-UTF-8 output")]
    Output { command: String },

    #[error("Source control reported an empty revision")]
    EmptyRevision,

    #[error("Vendored dependency `{name}` failed: {source}")]
    Vendor {
        name: String,
        #[source]
        source: Box<PipelineError>,
    },
}

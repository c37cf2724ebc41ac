use std::path::PathBuf;

use clap::{Parser, Subcommand};

use codereview_gateway::config::load_config;
use codereview_gateway::observability::logging;
use codereview_gateway::pipeline::{GitCli, Operation, Release, SystemRunner};

#[derive(Parser)]
#[command(name = "codereview-release")]
#[command(about = "Build, serve and deploy the code review application", long_about = None)]
struct Cli {
    /// Configuration file holding the `[release]` section.
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "gateway.toml")]
    config: PathBuf,

    /// Application id on the deployment target.
    #[arg(long, env = "APP_ID")]
    app_id: Option<String>,

    /// SDK directory; skips candidate detection.
    #[arg(long, env = "SDK_PATH")]
    sdk_path: Option<PathBuf>,

    /// Extra development server flags, whitespace separated.
    #[arg(long, env = "DEV_APPSERVER_FLAGS")]
    dev_appserver_flags: Option<String>,

    /// Extra deploy tool flags, whitespace separated.
    #[arg(long, env = "APPCFG_FLAGS")]
    appcfg_flags: Option<String>,

    /// Python interpreter for the test runner.
    #[arg(long, env = "PYTHON")]
    python: Option<String>,

    /// Coverage tool.
    #[arg(long, env = "COVERAGE")]
    coverage: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the build descriptor as JSON
    Describe,
    /// Run the local development server
    Serve,
    /// Run the development server on all interfaces
    #[command(alias = "serve_remote")]
    ServeRemote,
    /// Run the development server with outgoing mail enabled
    #[command(alias = "serve_email")]
    ServeEmail,
    /// Run the development server on all interfaces with outgoing mail enabled
    #[command(alias = "serve_remote_email")]
    ServeRemoteEmail,
    /// Upload the application and its backend
    Update,
    /// Upload only the backend
    #[command(alias = "update_backend")]
    UpdateBackend,
    /// Same as `update`
    Upload,
    /// Same as `update`
    Deploy,
    /// Push index definitions
    #[command(alias = "update_indexes")]
    UpdateIndexes,
    /// Remove unused indexes
    #[command(alias = "vacuum_indexes")]
    VacuumIndexes,
    /// Run the test suite
    Test,
    /// Run the test suite under coverage and write an HTML report
    Coverage,
}

impl Commands {
    fn operation(&self) -> Option<Operation> {
        Some(match self {
            Commands::Describe => return None,
            Commands::Serve => Operation::Serve,
            Commands::ServeRemote => Operation::ServeRemote,
            Commands::ServeEmail => Operation::ServeEmail,
            Commands::ServeRemoteEmail => Operation::ServeRemoteEmail,
            Commands::Update => Operation::Update,
            Commands::UpdateBackend => Operation::UpdateBackend,
            Commands::Upload => Operation::Upload,
            Commands::Deploy => Operation::Deploy,
            Commands::UpdateIndexes => Operation::UpdateIndexes,
            Commands::VacuumIndexes => Operation::VacuumIndexes,
            Commands::Test => Operation::Test,
            Commands::Coverage => Operation::Coverage,
        })
    }
}

fn split_flags(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init_logging(&config.observability.log_level);

    let mut release = config.release;
    if let Some(app_id) = cli.app_id {
        release.application_id = app_id;
    }
    if let Some(flags) = cli.dev_appserver_flags {
        release.dev_appserver_flags = split_flags(&flags);
    }
    if let Some(flags) = cli.appcfg_flags {
        release.appcfg_flags = split_flags(&flags);
    }
    if let Some(python) = cli.python {
        release.python = python;
    }
    if let Some(coverage) = cli.coverage {
        release.coverage = coverage;
    }

    let runner = SystemRunner;
    let git = GitCli::new(&runner, &release.app_root).ignoring(release.revision_marker.clone());
    let pipeline = Release::new(&release, &runner, &git).with_sdk(cli.sdk_path);

    match cli.command.operation() {
        Some(operation) => pipeline.execute(operation)?,
        None => println!("{}", serde_json::to_string_pretty(&pipeline.describe()?)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_aliases() {
        let cli = Cli::try_parse_from(["codereview-release", "serve_remote_email"]).unwrap();
        assert!(matches!(cli.command, Commands::ServeRemoteEmail));

        let cli = Cli::try_parse_from(["codereview-release", "update-backend"]).unwrap();
        assert_eq!(cli.command.operation(), Some(Operation::UpdateBackend));
    }

    #[test]
    fn test_split_flags() {
        assert_eq!(split_flags("  --port 9000 --clear_datastore "), vec!["--port", "9000", "--clear_datastore"]);
        assert!(split_flags("").is_empty());
    }
}

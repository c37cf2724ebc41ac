//! External command execution.
//!
//! Every pipeline step shells out to an SDK tool, `git` or the test runner.
//! Steps depend on [`CommandRunner`] rather than `std::process` so the
//! sequencing can be exercised without the tools installed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::pipeline::PipelineError;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Run with inherited stdio; a non-zero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<(), PipelineError>;

    /// Run and capture stdout; a non-zero exit is an error.
    fn output(&self, invocation: &Invocation) -> Result<String, PipelineError>;
}

/// Runs commands as child processes of the current one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), PipelineError> {
        tracing::info!(command = %invocation, "Running");
        let status = Self::command(invocation)
            .status()
            .map_err(|source| PipelineError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PipelineError::CommandFailed {
                command: invocation.to_string(),
                status: status.to_string(),
            })
        }
    }

    fn output(&self, invocation: &Invocation) -> Result<String, PipelineError> {
        tracing::debug!(command = %invocation, "Querying");
        let output = Self::command(invocation)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| PipelineError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(PipelineError::CommandFailed {
                command: invocation.to_string(),
                status: output.status.to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| PipelineError::Output {
            command: invocation.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let inv = Invocation::new("appcfg.py").args(["update", "."]).arg("--application=x");
        assert_eq!(inv.to_string(), "appcfg.py update . --application=x");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_status_and_output() {
        let runner = SystemRunner;
        assert!(runner.run(&Invocation::new("true")).is_ok());

        let err = runner.run(&Invocation::new("false")).unwrap_err();
        assert!(matches!(err, PipelineError::CommandFailed { .. }));

        let out = runner.output(&Invocation::new("echo").arg("hello")).unwrap();
        assert_eq!(out.trim(), "hello");

        let err = runner
            .run(&Invocation::new("definitely-not-a-real-tool-xyz"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { .. }));
    }
}

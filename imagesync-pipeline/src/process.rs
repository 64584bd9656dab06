//! External command invocation.
//!
//! Every side effect outside the filesystem (registry listing, docker, git,
//! gh) is a [`CommandSpec`]. Building the spec is pure, so the exact argv can
//! be asserted in tests without running anything.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::StepFailure;

/// A fully-specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
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

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run to completion and return trimmed stdout.
    ///
    /// A non-zero exit becomes [`StepFailure::Exit`] carrying stderr.
    pub fn run(&self) -> Result<String, StepFailure> {
        tracing::debug!("running: {self}");
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| self.spawn_err(source))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(StepFailure::Exit {
                command: self.to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run with stdout/stderr inherited from the current process.
    ///
    /// Used for long-running steps (`docker build`, `docker push`) whose
    /// progress should reach the operator as it happens.
    pub fn run_streaming(&self) -> Result<(), StepFailure> {
        tracing::debug!("running: {self}");
        let status = self
            .command()
            .stdin(Stdio::null())
            .status()
            .map_err(|source| self.spawn_err(source))?;

        if status.success() {
            return Ok(());
        }
        Err(StepFailure::Exit {
            command: self.to_string(),
            status: status.to_string(),
            stderr: "see output above".to_string(),
        })
    }

    fn spawn_err(&self, source: std::io::Error) -> StepFailure {
        StepFailure::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

//! Backend abstraction for running external commands.
//!
//! The [`Backend`] trait is the only place a process is spawned, allowing for
//! different implementations (real subprocesses, scripted doubles in tests).
//! [`Runner`] layers the dry-run gate and exit-status checking on top of it.

pub mod process;

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// A command to run, and whether dry-run mode may run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
    /// Run even when mutating actions are being simulated
    pub run_in_dry_run: bool,
}

impl Invocation {
    /// A mutating invocation.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            run_in_dry_run: false,
        }
    }

    /// Mark as a read-only query that is safe to run in dry-run mode.
    pub fn read_only(mut self) -> Self {
        self.run_in_dry_run = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if terminated by a signal or never run
    pub status: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Check if the command exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Backend trait for spawning processes.
pub trait Backend: Send + Sync {
    /// Run the invocation to completion and capture its output.
    ///
    /// Implementations must not interpret the exit status; [`Runner`] does.
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs cargo and git through a [`Backend`], honouring dry-run mode.
pub struct Runner<'a> {
    backend: &'a dyn Backend,
    cargo: &'a Path,
    dry_run: bool,
}

impl<'a> Runner<'a> {
    /// Create a runner for the given cargo executable.
    pub fn new(backend: &'a dyn Backend, cargo: &'a Path, dry_run: bool) -> Self {
        Self {
            backend,
            cargo,
            dry_run,
        }
    }

    /// Whether mutating invocations are being simulated.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Build a cargo invocation.
    pub fn cargo(&self, args: Vec<String>) -> Invocation {
        Invocation::new(self.cargo, args)
    }

    /// Build a git invocation.
    pub fn git(&self, args: Vec<String>) -> Invocation {
        Invocation::new("git", args)
    }

    /// Execute an invocation.
    ///
    /// In dry-run mode, invocations not marked read-only are skipped and
    /// yield empty output.
    pub fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        if self.dry_run && !invocation.run_in_dry_run {
            log::debug!("dry run, skipping: {invocation}");
            return Ok(CommandOutput::default());
        }

        log::debug!("running: {invocation}");
        let output = self.backend.execute(invocation)?;

        if !output.success() {
            return Err(Error::CommandFailed {
                command: invocation.to_string(),
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }
}

//! Real subprocess backend.

use crate::backend::{Backend, CommandOutput, Invocation};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locale variables forced to `C`, since command output is parsed.
const C_LOCALE: [&str; 4] = ["LANG", "LC_ALL", "LC_MESSAGES", "LC_CTYPE"];

/// Backend that spawns real processes.
#[derive(Debug, Default, Clone)]
pub struct ProcessBackend;

impl ProcessBackend {
    /// Create a new ProcessBackend.
    pub fn new() -> Self {
        Self
    }
}

impl Backend for ProcessBackend {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        for var in C_LOCALE {
            cmd.env(var, "C");
        }

        let output = cmd.output().map_err(|source| Error::Spawn {
            command: invocation.to_string(),
            source,
        })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Find the cargo executable.
///
/// An explicit path is used as-is; otherwise `cargo` is looked up in `PATH`.
pub fn find_cargo(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    which::which("cargo").map_err(|_| Error::CargoNotFound)
}

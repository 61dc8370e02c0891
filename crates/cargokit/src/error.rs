//! Error types for cargo package reconciliation.
//!
//! Every failure aborts the whole invocation: nothing is retried and no
//! partial inventory or partial action list is ever returned. Variants carry
//! enough context (paths, raw identifiers, captured output) to diagnose the
//! problem without re-running anything.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single violated precondition of a desired-state declaration.
///
/// All violations are collected before any other work happens and reported
/// together in [`Error::InvalidSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// More than one of `version`, `git` and `directory` was set
    ConflictingSources {
        /// The source-pinning fields that were set together
        fields: Vec<&'static str>,
    },
    /// A git source was combined with more than one package name
    MultiplePackageGitInstall {
        /// The requested package names
        names: Vec<String>,
    },
    /// A single-binary selector was combined with more than one package name
    MultiplePackageBin {
        /// The requested package names
        names: Vec<String>,
    },
    /// A caller-supplied path does not exist or is not a directory
    InvalidPath {
        /// Which option carried the path (`root` or `directory`)
        field: &'static str,
        /// The offending path
        path: PathBuf,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingSources { fields } => {
                write!(f, "parameters are mutually exclusive: {}", fields.join(", "))
            }
            Self::MultiplePackageGitInstall { names } => write!(
                f,
                "cannot do multiple git installs at a time, got {} packages: {}",
                names.len(),
                names.join(", ")
            ),
            Self::MultiplePackageBin { names } => write!(
                f,
                "cannot install multiple crates with 'bin', got: {}",
                names.join(", ")
            ),
            Self::InvalidPath { field, path } => {
                write!(f, "{field} {} is not a directory", path.display())
            }
        }
    }
}

/// Errors that can occur while reading, comparing or converging cargo state.
#[derive(Debug, Error)]
pub enum Error {
    /// The persisted installation record exists but is not valid JSON of the
    /// expected shape
    #[error("corrupt installation record {path}: {source}")]
    CorruptState {
        /// Path to the state file
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// A package identifier does not match `<name> <version> (<kind>+<url>)`
    #[error("unexpected package identifier format: '{raw}'")]
    MalformedIdentifier {
        /// The raw identifier string as found in the state file
        raw: String,
    },

    /// A per-package metadata entry is not the expected structured shape
    #[error("unexpected metadata for '{package}' in {path}: {detail}")]
    UnexpectedMetadata {
        /// Path to the state file
        path: PathBuf,
        /// Raw identifier of the offending entry
        package: String,
        /// What was wrong with it
        detail: String,
    },

    /// The desired-state declaration violates one or more preconditions
    #[error("invalid package declaration: {}", join_violations(.violations))]
    InvalidSpec {
        /// Every violated precondition, in check order
        violations: Vec<Violation>,
    },

    /// A directory-pinned package is not declared in that directory's manifest
    #[error("package {name} not defined in source, found: {found:?}")]
    PackageNotInManifest {
        /// The requested package name
        name: String,
        /// All package names the manifest does declare
        found: Vec<String>,
    },

    /// The remote git repository does not have the requested reference
    #[error("remote {url} does not have ref: {reference}")]
    RefNotFound {
        /// Repository URL
        url: String,
        /// Fully qualified reference that was queried
        reference: String,
    },

    /// `git ls-remote` returned something other than `<commit>\t<ref>`
    #[error("got unexpected output from git ls-remote: {output}")]
    UnexpectedRemoteOutput {
        /// The trimmed output
        output: String,
    },

    /// The registry search output did not contain a quoted version
    #[error("no published version for package '{name}' found")]
    NoPublishedVersion {
        /// Package name that was searched for
        name: String,
    },

    /// An external command exited unsuccessfully
    #[error("command failed ({}): {command}\n{stderr}", describe_status(.status))]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Exit code, if the process exited normally
        status: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// An external command could not be started at all
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// The command line that was attempted
        command: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// `cargo` could not be found
    #[error("cargo not found in PATH. Install it from https://rustup.rs")]
    CargoNotFound,

    /// The installation root could not be determined
    #[error("could not determine the cargo home directory")]
    HomeNotFound,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error outside the state file (e.g. `cargo metadata`)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The violations carried by an [`Error::InvalidSpec`], empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::InvalidSpec { violations } => violations,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Installation root resolution.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// File in the installation root that records every installed package.
pub const STATE_FILE: &str = ".crates2.json";

/// An installation root: where cargo keeps `bin/` and its install record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoHome {
    root: PathBuf,
}

impl CargoHome {
    /// Use an explicit root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root: `explicit`, else `CARGO_HOME`, else `~/.cargo`.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }

        if let Some(home) = std::env::var_os("CARGO_HOME").filter(|v| !v.is_empty()) {
            log::debug!("using CARGO_HOME: {}", PathBuf::from(&home).display());
            return Ok(Self::new(home));
        }

        dirs::home_dir()
            .map(|home| Self::new(home.join(".cargo")))
            .ok_or(Error::HomeNotFound)
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the install record.
    pub fn crates_json(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    /// Directory holding installed binaries.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_root_wins() {
        let home = CargoHome::resolve(Some(Path::new("/opt/cargo"))).unwrap();
        assert_eq!(home.root(), Path::new("/opt/cargo"));
        assert_eq!(home.crates_json(), PathBuf::from("/opt/cargo/.crates2.json"));
        assert_eq!(home.bin_dir(), PathBuf::from("/opt/cargo/bin"));
    }
}

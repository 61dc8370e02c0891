//! Declaration files.
//!
//! A declaration file is TOML with one `[[crate]]` table per desired state:
//!
//! ```toml
//! [[crate]]
//! names = ["ripgrep", "fd-find"]
//! state = "latest"
//!
//! [[crate]]
//! names = ["uv"]
//! git = { url = "https://github.com/astral-sh/uv", tag = "0.6.11" }
//! locked = true
//!
//! [[crate]]
//! names = ["my-tool"]
//! directory = "~/src/my-tool"
//! ```

use crate::paths;
use anyhow::{Context, Result, bail};
use cargokit::DesiredSpec;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declarations {
    #[serde(rename = "crate", default)]
    pub crates: Vec<DesiredSpec>,
}

impl Declarations {
    /// Load and normalize a declaration file.
    ///
    /// `~` and `$VARS` in paths are expanded; relative paths are taken
    /// relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let mut declarations: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid declaration file {}", path.display()))?;

        let base = path.parent().unwrap_or(Path::new("."));
        for (index, spec) in declarations.crates.iter_mut().enumerate() {
            if spec.names.is_empty() {
                bail!("[[crate]] entry {} in {} has no names", index + 1, path.display());
            }
            spec.directory = spec.directory.take().map(|p| resolve(base, &p));
            spec.root = spec.root.take().map(|p| resolve(base, &p));
        }

        log::debug!(
            "loaded {} declarations from {}",
            declarations.crates.len(),
            path.display()
        );
        Ok(declarations)
    }
}

/// The declaration file to use: `explicit`, else the default location.
pub fn declarations_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(paths::expand(path));
    }

    let path = paths::declarations_file()?;
    if !path.exists() {
        bail!(
            "No declaration file at {}\nCreate it or pass a path: crateward apply <FILE>",
            path.display()
        );
    }
    Ok(path)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    let expanded = paths::expand(&path.to_string_lossy());
    if expanded.is_relative() {
        base.join(expanded)
    } else {
        expanded
    }
}

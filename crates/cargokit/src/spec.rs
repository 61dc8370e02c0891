//! Desired-state declarations.

use crate::error::{Error, Result, Violation};
use crate::types::{GitSource, PackageOverlay, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Target state of the named packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// Installed and matching every given constraint
    #[default]
    Present,
    /// Not installed
    Absent,
    /// Installed at the newest available version
    Latest,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Latest => "latest",
        })
    }
}

/// One desired-state declaration, reconciled in a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesiredSpec {
    /// Packages to reconcile; empty means "just report the inventory"
    #[serde(alias = "name")]
    pub names: Vec<String>,
    /// Target state
    pub state: DesiredState,
    /// Exact version to install
    pub version: Option<String>,
    /// Feature flags to enable
    pub features: BTreeSet<String>,
    /// Whether default features are enabled; `None` leaves it unchecked
    pub default_features: Option<bool>,
    /// Install from a local source directory
    pub directory: Option<PathBuf>,
    /// Install from a git repository
    pub git: Option<GitSource>,
    /// Pass `--locked`
    pub locked: bool,
    /// Install only this binary
    pub bin: Option<String>,
    /// Installation root override
    pub root: Option<PathBuf>,
    /// Raw arguments appended to the install command
    #[serde(rename = "args")]
    pub extra_args: Vec<String>,
}

impl DesiredSpec {
    /// Declaration for the given names with every constraint unset.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the target state.
    pub fn with_state(mut self, state: DesiredState) -> Self {
        self.state = state;
        self
    }

    /// Pin an exact version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Pin a git source.
    pub fn with_git(mut self, git: GitSource) -> Self {
        self.git = Some(git);
        self
    }

    /// Pin a source directory.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Set the installation root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Append raw install arguments.
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Check every precondition, reporting all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        let pinned: Vec<&'static str> = [
            ("version", self.version.is_some()),
            ("git", self.git.is_some()),
            ("directory", self.directory.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect();
        if pinned.len() > 1 {
            violations.push(Violation::ConflictingSources { fields: pinned });
        }

        if self.git.is_some() && self.names.len() > 1 {
            violations.push(Violation::MultiplePackageGitInstall {
                names: self.names.clone(),
            });
        }

        if self.bin.is_some() && self.names.len() > 1 {
            violations.push(Violation::MultiplePackageBin {
                names: self.names.clone(),
            });
        }

        for (field, path) in [("root", &self.root), ("directory", &self.directory)] {
            if let Some(path) = path.as_deref().filter(|p| !p.is_dir()) {
                violations.push(Violation::InvalidPath {
                    field,
                    path: path.to_path_buf(),
                });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidSpec { violations })
        }
    }

    /// The record fields this declaration pins.
    pub fn overlay(&self) -> PackageOverlay {
        let mut overlay = PackageOverlay {
            version: self.version.clone(),
            features: (!self.features.is_empty()).then(|| self.features.clone()),
            default_features: self.default_features,
            ..PackageOverlay::default()
        };

        if let Some(git) = &self.git {
            let git = git.normalized();
            overlay.source_kind = Some(SourceKind::Git);
            overlay.source_url = Some(git.url.clone());
            overlay.git = Some(git);
        } else if let Some(directory) = &self.directory {
            overlay.source_kind = Some(SourceKind::Path);
            overlay.source_url = Some(directory_url(directory));
            overlay.directory = Some(directory.clone());
        }

        overlay
    }
}

fn directory_url(directory: &Path) -> String {
    Url::from_file_path(directory)
        .map(String::from)
        .unwrap_or_else(|()| format!("file://{}", directory.display()))
}

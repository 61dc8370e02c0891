//! Core types for cargo package reconciliation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Source id of the default crates.io index as cargo records it.
pub const CRATES_IO_INDEX: &str = "https://github.com/rust-lang/crates.io-index";

/// Installed packages keyed by package name.
///
/// A `BTreeMap` keeps iteration (and therefore every report) sorted by name.
pub type Inventory = BTreeMap<String, PackageRecord>;

/// Kind of source a package was installed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A git-protocol registry index (crates.io by default)
    Registry,
    /// A sparse-protocol registry index
    Sparse,
    /// A local source directory (`cargo install --path`)
    Path,
    /// A git repository (`cargo install --git`)
    Git,
}

impl SourceKind {
    /// The kind prefix used in package identifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Registry => "registry",
            SourceKind::Sparse => "sparse",
            SourceKind::Path => "path",
            SourceKind::Git => "git",
        }
    }

    /// Parse the kind prefix of a package identifier.
    pub fn from_kind(s: &str) -> Option<Self> {
        match s {
            "registry" => Some(SourceKind::Registry),
            "sparse" => Some(SourceKind::Sparse),
            "path" => Some(SourceKind::Path),
            "git" => Some(SourceKind::Git),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name, version and provenance of an installed package.
///
/// See [`PackageId::parse`](crate::pkgid) for the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageId {
    /// Package name (e.g., "ripgrep")
    pub name: String,
    /// Exact installed version
    pub version: String,
    /// Kind of source
    pub source_kind: SourceKind,
    /// Source location, including any query and fragment
    pub source_url: String,
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}+{})",
            self.name, self.version, self.source_kind, self.source_url
        )
    }
}

/// A git source, either requested or recorded for an installed package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSource {
    /// Repository URL
    pub url: String,
    /// Tag to build from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Branch to build from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Exact commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

impl GitSource {
    /// Create a git source with only a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Set the exact commit.
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    /// Copy with empty-string fields dropped.
    pub fn normalized(&self) -> Self {
        let keep = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Self {
            url: self.url.clone(),
            tag: keep(&self.tag),
            branch: keep(&self.branch),
            rev: keep(&self.rev),
        }
    }

    /// Whether `installed` agrees with every field set on `self`.
    ///
    /// Only the axes the caller asked for are compared: an installed record
    /// usually carries a resolved `rev` that a tag- or branch-pinned request
    /// never mentions.
    pub fn is_satisfied_by(&self, installed: &GitSource) -> bool {
        let wanted = self.normalized();
        let field_matches = |want: &Option<String>, have: &Option<String>| match want {
            Some(w) => have.as_deref() == Some(w.as_str()),
            None => true,
        };

        same_repository(&wanted.url, &installed.url)
            && field_matches(&wanted.tag, &installed.tag)
            && field_matches(&wanted.branch, &installed.branch)
            && field_matches(&wanted.rev, &installed.rev)
    }

    /// The fully qualified ref to ask the remote about.
    pub fn remote_ref(&self) -> String {
        if let Some(tag) = &self.tag {
            format!("refs/tags/{tag}")
        } else if let Some(branch) = &self.branch {
            format!("refs/heads/{branch}")
        } else {
            "HEAD".to_string()
        }
    }
}

fn same_repository(a: &str, b: &str) -> bool {
    let trim = |url: &str| url.trim_end_matches('/').trim_end_matches(".git").to_string();
    trim(a) == trim(b)
}

/// Filesystem status of an installed binary.
///
/// The field set is fixed; platform-specific fields are `None` where the
/// host does not expose them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinStat {
    /// File size in bytes
    pub size: u64,
    /// Modification time, seconds since the Unix epoch
    pub modified_secs: Option<i64>,
    /// Sub-second part of the modification time
    pub modified_nanos: Option<u32>,
    /// Whether the file is read-only
    pub readonly: bool,
    /// Permission bits
    pub mode: Option<u32>,
    /// Inode number
    pub inode: Option<u64>,
    /// Device id
    pub device: Option<u64>,
}

/// One installed package, as recorded in the installation state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Parsed identifier
    #[serde(flatten)]
    pub id: PackageId,
    /// Enabled feature flags
    pub features: BTreeSet<String>,
    /// Whether `--all-features` was used
    pub all_features: bool,
    /// Whether default features were enabled
    pub default_features: bool,
    /// Binaries the package installed
    pub bins: BTreeSet<String>,
    /// Version requirement given at install time
    pub version_req: Option<String>,
    /// Build profile
    pub profile: Option<String>,
    /// Target triple
    pub target: Option<String>,
    /// Compiler version string
    pub rustc: Option<String>,
    /// Source directory, for path installs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Git source, for git installs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
    /// Stat fields of binaries that exist on disk
    #[serde(default)]
    pub bin_stats: BTreeMap<String, BinStat>,
}

impl PackageRecord {
    /// A record for a package that is not installed yet, used as the base of
    /// dry-run projections.
    pub fn projected(name: impl Into<String>) -> Self {
        Self {
            id: PackageId {
                name: name.into(),
                version: String::new(),
                source_kind: SourceKind::Registry,
                source_url: CRATES_IO_INDEX.to_string(),
            },
            features: BTreeSet::new(),
            all_features: false,
            default_features: true,
            bins: BTreeSet::new(),
            version_req: None,
            profile: None,
            target: None,
            rustc: None,
            directory: None,
            git: None,
            bin_stats: BTreeMap::new(),
        }
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Installed version.
    pub fn version(&self) -> &str {
        &self.id.version
    }

    /// Return a copy with every field present in `overlay` overwritten.
    pub fn overlaid(&self, overlay: &PackageOverlay) -> Self {
        apply_overlay(self.clone(), overlay)
    }
}

/// A partial package record: only the `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageOverlay {
    /// Replaces the version
    pub version: Option<String>,
    /// Replaces the source kind
    pub source_kind: Option<SourceKind>,
    /// Replaces the source URL
    pub source_url: Option<String>,
    /// Replaces the feature set
    pub features: Option<BTreeSet<String>>,
    /// Replaces the default-features flag
    pub default_features: Option<bool>,
    /// Sets the source directory
    pub directory: Option<PathBuf>,
    /// Sets the git source
    pub git: Option<GitSource>,
}

/// Overwrite the fields of `base` that `overlay` carries.
pub fn apply_overlay(mut base: PackageRecord, overlay: &PackageOverlay) -> PackageRecord {
    if let Some(version) = &overlay.version {
        base.id.version = version.clone();
    }
    if let Some(kind) = overlay.source_kind {
        base.id.source_kind = kind;
    }
    if let Some(url) = &overlay.source_url {
        base.id.source_url = url.clone();
    }
    if let Some(features) = &overlay.features {
        base.features = features.clone();
    }
    if let Some(default_features) = overlay.default_features {
        base.default_features = default_features;
    }
    if let Some(directory) = &overlay.directory {
        base.directory = Some(directory.clone());
    }
    if let Some(git) = &overlay.git {
        base.git = Some(git.clone());
    }
    base
}

/// Human-facing view of a [`PackageRecord`]: everything except binary stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct PackageSummary {
    #[serde(flatten)]
    pub id: PackageId,
    pub features: BTreeSet<String>,
    pub all_features: bool,
    pub default_features: bool,
    pub bins: BTreeSet<String>,
    pub version_req: Option<String>,
    pub profile: Option<String>,
    pub target: Option<String>,
    pub rustc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
}

impl From<&PackageRecord> for PackageSummary {
    fn from(record: &PackageRecord) -> Self {
        Self {
            id: record.id.clone(),
            features: record.features.clone(),
            all_features: record.all_features,
            default_features: record.default_features,
            bins: record.bins.clone(),
            version_req: record.version_req.clone(),
            profile: record.profile.clone(),
            target: record.target.clone(),
            rustc: record.rustc.clone(),
            directory: record.directory.clone(),
            git: record.git.clone(),
        }
    }
}

/// A package whose record differs between two inventories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Package name
    pub name: String,
    /// Record before the change, `None` if it was not installed
    pub before: Option<PackageRecord>,
    /// Record after the change, `None` if it is no longer installed
    pub after: Option<PackageRecord>,
}

impl DiffEntry {
    /// The package was not installed before.
    pub fn is_addition(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    /// The package is no longer installed.
    pub fn is_removal(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }

    /// Reportable form with binary stats stripped.
    pub fn report(&self) -> DiffReport {
        DiffReport {
            name: self.name.clone(),
            before: self.before.as_ref().map(PackageSummary::from),
            after: self.after.as_ref().map(PackageSummary::from),
        }
    }
}

/// A [`DiffEntry`] as shown to people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// Package name
    pub name: String,
    /// Summary before the change
    pub before: Option<PackageSummary>,
    /// Summary after the change
    pub after: Option<PackageSummary>,
}

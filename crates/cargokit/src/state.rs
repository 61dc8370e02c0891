//! Reading cargo's installation record.
//!
//! Cargo keeps `.crates2.json` in the installation root:
//!
//! ```json
//! {
//!   "installs": {
//!     "ripgrep 14.1.0 (registry+https://github.com/rust-lang/crates.io-index)": {
//!       "version_req": null,
//!       "bins": ["rg"],
//!       "features": [],
//!       "all_features": false,
//!       "no_default_features": false,
//!       "profile": "release",
//!       "target": "x86_64-unknown-linux-gnu",
//!       "rustc": "rustc 1.85.0 (4d91de4e4 2025-02-17)"
//!     }
//!   }
//! }
//! ```
//!
//! The record is never written here; only cargo itself mutates it.

use crate::error::{Error, Result};
use crate::home::CargoHome;
use crate::types::{BinStat, Inventory, PackageId, PackageRecord};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Deserialize)]
struct CratesFile {
    installs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstallMeta {
    version_req: Option<String>,
    bins: BTreeSet<String>,
    features: BTreeSet<String>,
    all_features: bool,
    no_default_features: bool,
    profile: Option<String>,
    target: Option<String>,
    rustc: Option<String>,
}

/// Reads the install record of one installation root into an [`Inventory`].
#[derive(Debug, Clone)]
pub struct StateReader {
    path: PathBuf,
    bin_dir: PathBuf,
}

impl StateReader {
    /// Reader for the given installation root.
    pub fn new(home: &CargoHome) -> Self {
        Self {
            path: home.crates_json(),
            bin_dir: home.bin_dir(),
        }
    }

    /// Path of the install record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the inventory, restricted to `only` unless it is empty.
    ///
    /// A missing record yields an empty inventory. Every identifier is
    /// parsed, including those filtered out, so one malformed entry fails
    /// the whole read.
    pub fn read(&self, only: &[String]) -> Result<Inventory> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no install record at {}", self.path.display());
                return Ok(Inventory::new());
            }
            Err(e) => return Err(e.into()),
        };
        log::debug!("reading install record {}", self.path.display());

        let file: CratesFile =
            serde_json::from_slice(&content).map_err(|source| Error::CorruptState {
                path: self.path.clone(),
                source,
            })?;

        let mut inventory = Inventory::new();
        for (raw, value) in file.installs {
            let id = PackageId::parse(&raw)?;
            if !only.is_empty() && !only.iter().any(|n| *n == id.name) {
                continue;
            }

            let record = self.record(id, &raw, value)?;
            if let Some(previous) = inventory.insert(record.name().to_string(), record) {
                log::debug!("{} recorded more than once, keeping the last", previous.id);
            }
        }

        Ok(inventory)
    }

    fn record(&self, id: PackageId, raw: &str, value: serde_json::Value) -> Result<PackageRecord> {
        let unexpected = |detail: String| Error::UnexpectedMetadata {
            path: self.path.clone(),
            package: raw.to_string(),
            detail,
        };

        if !value.is_object() {
            return Err(unexpected(format!("expected an object, got {value}")));
        }
        let meta: InstallMeta =
            serde_json::from_value(value).map_err(|e| unexpected(e.to_string()))?;

        let directory = id.directory();
        let git = id.git_source()?;
        let bin_stats = self.stat_bins(&meta.bins)?;

        Ok(PackageRecord {
            id,
            features: meta.features,
            all_features: meta.all_features,
            default_features: !meta.no_default_features,
            bins: meta.bins,
            version_req: meta.version_req,
            profile: meta.profile,
            target: meta.target,
            rustc: meta.rustc,
            directory,
            git,
            bin_stats,
        })
    }

    fn stat_bins(&self, bins: &BTreeSet<String>) -> Result<BTreeMap<String, BinStat>> {
        let mut stats = BTreeMap::new();
        for bin in bins {
            if let Some(stat) = stat_binary(&self.bin_dir.join(bin))? {
                stats.insert(bin.clone(), stat);
            }
        }
        Ok(stats)
    }
}

/// Stat a binary, `None` if it does not exist.
pub fn stat_binary(path: &Path) -> Result<Option<BinStat>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok());

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut stat = BinStat {
        size: metadata.len(),
        modified_secs: modified.map(|d| d.as_secs() as i64),
        modified_nanos: modified.map(|d| d.subsec_nanos()),
        readonly: metadata.permissions().readonly(),
        ..BinStat::default()
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        stat.mode = Some(metadata.mode());
        stat.inode = Some(metadata.ino());
        stat.device = Some(metadata.dev());
    }

    Ok(Some(stat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;
    use tempfile::TempDir;

    const CRATES2: &str = r#"{
        "installs": {
            "ripgrep 14.1.0 (registry+https://github.com/rust-lang/crates.io-index)": {
                "version_req": null,
                "bins": ["rg"],
                "features": ["pcre2"],
                "all_features": false,
                "no_default_features": false,
                "profile": "release",
                "target": "x86_64-unknown-linux-gnu",
                "rustc": "rustc 1.85.0"
            },
            "uv 0.6.11 (git+https://github.com/astral-sh/uv?tag=0.6.11#e4a0b3c9)": {
                "bins": ["uv", "uvx"],
                "features": [],
                "all_features": false,
                "no_default_features": true
            }
        }
    }"#;

    fn root_with(content: &str) -> (TempDir, StateReader) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".crates2.json"), content).unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        let reader = StateReader::new(&CargoHome::new(dir.path()));
        (dir, reader)
    }

    #[test]
    fn test_missing_file_is_empty_inventory() {
        let dir = TempDir::new().unwrap();
        let reader = StateReader::new(&CargoHome::new(dir.path()));
        assert!(reader.read(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_reads_full_metadata() {
        let (_dir, reader) = root_with(CRATES2);
        let inventory = reader.read(&[]).unwrap();
        assert_eq!(inventory.len(), 2);

        let rg = &inventory["ripgrep"];
        assert_eq!(rg.version(), "14.1.0");
        assert_eq!(rg.id.source_kind, SourceKind::Registry);
        assert!(rg.features.contains("pcre2"));
        assert!(rg.default_features);
        assert_eq!(rg.profile.as_deref(), Some("release"));
        assert_eq!(rg.bins, BTreeSet::from(["rg".to_string()]));

        let uv = &inventory["uv"];
        assert!(!uv.default_features);
        let git = uv.git.as_ref().unwrap();
        assert_eq!(git.tag.as_deref(), Some("0.6.11"));
        assert_eq!(git.rev.as_deref(), Some("e4a0b3c9"));
    }

    #[test]
    fn test_only_existing_bins_are_recorded() {
        let (dir, reader) = root_with(CRATES2);
        fs::write(dir.path().join("bin/uv"), b"#!/bin/sh\n").unwrap();

        let inventory = reader.read(&[]).unwrap();
        let uv = &inventory["uv"];
        assert_eq!(uv.bin_stats.len(), 1);
        assert_eq!(uv.bin_stats["uv"].size, 10);
        assert!(!uv.bin_stats.contains_key("uvx"));
        assert!(inventory["ripgrep"].bin_stats.is_empty());
    }

    #[test]
    fn test_filter_by_name() {
        let (_dir, reader) = root_with(CRATES2);
        let inventory = reader.read(&["uv".to_string(), "bat".to_string()]).unwrap();
        assert_eq!(inventory.keys().collect::<Vec<_>>(), vec!["uv"]);
    }

    #[test]
    fn test_corrupt_file() {
        for content in ["not json", "{}", r#"{"installs": []}"#] {
            let (_dir, reader) = root_with(content);
            assert!(
                matches!(reader.read(&[]), Err(Error::CorruptState { .. })),
                "{content}"
            );
        }
    }

    #[test]
    fn test_non_utf8_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".crates2.json"), b"{\"installs\": {\xff\xfe}}").unwrap();
        let reader = StateReader::new(&CargoHome::new(dir.path()));

        assert!(matches!(reader.read(&[]), Err(Error::CorruptState { .. })));
    }

    #[test]
    fn test_malformed_identifier_fails_even_when_filtered_out() {
        let (_dir, reader) = root_with(r#"{"installs": {"garbage": {}}}"#);
        match reader.read(&["ripgrep".to_string()]) {
            Err(Error::MalformedIdentifier { raw }) => assert_eq!(raw, "garbage"),
            other => panic!("expected malformed identifier, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_metadata() {
        let (_dir, reader) = root_with(
            r#"{"installs": {"bat 0.25.0 (registry+https://github.com/rust-lang/crates.io-index)": ["bat"]}}"#,
        );
        match reader.read(&[]) {
            Err(Error::UnexpectedMetadata { package, .. }) => assert!(package.starts_with("bat ")),
            other => panic!("expected unexpected metadata, got {other:?}"),
        }
    }

    #[test]
    fn test_wrongly_typed_metadata() {
        let (_dir, reader) = root_with(
            r#"{"installs": {"bat 0.25.0 (registry+https://github.com/rust-lang/crates.io-index)": {"bins": "bat"}}}"#,
        );
        assert!(matches!(
            reader.read(&[]),
            Err(Error::UnexpectedMetadata { .. })
        ));
    }

    #[test]
    fn test_stat_missing_binary() {
        let dir = TempDir::new().unwrap();
        assert_eq!(stat_binary(&dir.path().join("nope")).unwrap(), None);
    }
}

//! Desired-vs-installed comparison.
//!
//! Each axis is checked independently; the first mismatch decides. Only the
//! axes a declaration actually constrains are looked at, so an unpinned
//! declaration is satisfied by any installed version.

use crate::spec::{DesiredSpec, DesiredState};
use crate::types::{Inventory, PackageRecord};
use std::fmt;

/// Why an installed package does not satisfy a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Not installed
    Missing,
    /// Installed at another version
    Version {
        /// Requested version
        wanted: String,
        /// Installed version
        installed: String,
    },
    /// Installed from another git source or ref
    Git,
    /// Installed with another feature set
    Features,
    /// Installed with the other default-features setting
    DefaultFeatures,
    /// Raw arguments make the outcome unverifiable
    ExtraArgs,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "not installed"),
            Self::Version { wanted, installed } => {
                write!(f, "version {installed} installed, {wanted} wanted")
            }
            Self::Git => write!(f, "git source differs"),
            Self::Features => write!(f, "feature set differs"),
            Self::DefaultFeatures => write!(f, "default features differ"),
            Self::ExtraArgs => write!(f, "extra arguments given"),
        }
    }
}

/// Requested names split by whether they need a cargo invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Names to install or uninstall, in request order
    pub needs_action: Vec<String>,
    /// Names already in the desired state
    pub satisfied: Vec<String>,
}

/// First axis on which `installed` fails a `present` declaration.
pub fn mismatch(spec: &DesiredSpec, installed: Option<&PackageRecord>) -> Option<Mismatch> {
    let Some(record) = installed else {
        return Some(Mismatch::Missing);
    };

    if let Some(wanted) = &spec.version {
        if wanted != record.version() {
            return Some(Mismatch::Version {
                wanted: wanted.clone(),
                installed: record.version().to_string(),
            });
        }
    }

    if let Some(wanted) = &spec.git {
        let satisfied = record
            .git
            .as_ref()
            .is_some_and(|have| wanted.is_satisfied_by(have));
        if !satisfied {
            return Some(Mismatch::Git);
        }
    }

    if !spec.features.is_empty() && spec.features != record.features {
        return Some(Mismatch::Features);
    }

    if spec
        .default_features
        .is_some_and(|wanted| wanted != record.default_features)
    {
        return Some(Mismatch::DefaultFeatures);
    }

    if !spec.extra_args.is_empty() {
        return Some(Mismatch::ExtraArgs);
    }

    None
}

/// Partition `spec.names` against the inventory.
pub fn partition(spec: &DesiredSpec, inventory: &Inventory) -> Partition {
    let mut result = Partition::default();

    for name in &spec.names {
        let installed = inventory.get(name);
        let needs_action = match spec.state {
            DesiredState::Absent => installed.is_some(),
            DesiredState::Latest => true,
            DesiredState::Present => match mismatch(spec, installed) {
                Some(reason) => {
                    log::trace!("{name}: {reason}");
                    true
                }
                None => false,
            },
        };

        if needs_action {
            result.needs_action.push(name.clone());
        } else {
            log::trace!("{name}: already {}", spec.state);
            result.satisfied.push(name.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GitSource, PackageId};

    fn installed(name: &str, version: &str) -> PackageRecord {
        let mut record = PackageRecord::projected(name);
        record.id.version = version.into();
        record
    }

    fn inventory(records: Vec<PackageRecord>) -> Inventory {
        records
            .into_iter()
            .map(|r| (r.name().to_string(), r))
            .collect()
    }

    #[test]
    fn test_present_without_constraints_is_satisfied() {
        let inv = inventory(vec![installed("ripgrep", "14.1.0")]);
        let result = partition(&DesiredSpec::new(["ripgrep", "bat"]), &inv);
        assert_eq!(result.needs_action, vec!["bat"]);
        assert_eq!(result.satisfied, vec!["ripgrep"]);
    }

    #[test]
    fn test_version_mismatch() {
        let record = installed("ripgrep", "1.0.0");
        let spec = DesiredSpec::new(["ripgrep"]).with_version("2.0.0");
        assert_eq!(
            mismatch(&spec, Some(&record)),
            Some(Mismatch::Version {
                wanted: "2.0.0".into(),
                installed: "1.0.0".into()
            })
        );

        let same = DesiredSpec::new(["ripgrep"]).with_version("1.0.0");
        assert_eq!(mismatch(&same, Some(&record)), None);
    }

    #[test]
    fn test_git_compared_on_requested_axes() {
        let mut record = installed("uv", "0.6.11");
        record.id = PackageId::parse(
            "uv 0.6.11 (git+https://github.com/astral-sh/uv?tag=0.6.11#e4a0b3c9)",
        )
        .unwrap();
        record.git = record.id.git_source().unwrap();

        let by_tag = DesiredSpec::new(["uv"])
            .with_git(GitSource::new("https://github.com/astral-sh/uv").with_tag("0.6.11"));
        assert_eq!(mismatch(&by_tag, Some(&record)), None);

        let by_rev = DesiredSpec::new(["uv"])
            .with_git(GitSource::new("https://github.com/astral-sh/uv").with_rev("ffff"));
        assert_eq!(mismatch(&by_rev, Some(&record)), Some(Mismatch::Git));

        let registry = installed("uv", "0.6.11");
        assert_eq!(mismatch(&by_tag, Some(&registry)), Some(Mismatch::Git));
    }

    #[test]
    fn test_features_and_default_features() {
        let mut record = installed("bat", "0.25.0");
        record.features.insert("regex-onig".into());

        let mut spec = DesiredSpec::new(["bat"]);
        spec.features.insert("regex-fancy".into());
        assert_eq!(mismatch(&spec, Some(&record)), Some(Mismatch::Features));

        let mut spec = DesiredSpec::new(["bat"]);
        spec.default_features = Some(false);
        assert_eq!(
            mismatch(&spec, Some(&record)),
            Some(Mismatch::DefaultFeatures)
        );

        spec.default_features = Some(true);
        assert_eq!(mismatch(&spec, Some(&record)), None);
    }

    #[test]
    fn test_extra_args_always_need_action() {
        let record = installed("bat", "0.25.0");
        let spec = DesiredSpec::new(["bat"]).with_extra_args(["--force"]);
        assert_eq!(mismatch(&spec, Some(&record)), Some(Mismatch::ExtraArgs));
    }

    #[test]
    fn test_absent_inverts() {
        let inv = inventory(vec![installed("ripgrep", "14.1.0")]);
        let spec = DesiredSpec::new(["ripgrep", "bat"]).with_state(DesiredState::Absent);
        let result = partition(&spec, &inv);
        assert_eq!(result.needs_action, vec!["ripgrep"]);
        assert_eq!(result.satisfied, vec!["bat"]);
    }

    #[test]
    fn test_latest_always_needs_action() {
        let inv = inventory(vec![installed("ripgrep", "14.1.0")]);
        let spec = DesiredSpec::new(["ripgrep"]).with_state(DesiredState::Latest);
        assert_eq!(partition(&spec, &inv).needs_action, vec!["ripgrep"]);
    }
}

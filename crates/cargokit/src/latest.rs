//! Resolving what "latest" means for one package.
//!
//! Only read-only queries are issued here (`cargo metadata`, `git ls-remote`,
//! `cargo search`), so resolution also runs in dry-run mode.

use crate::backend::Runner;
use crate::error::{Error, Result};
use crate::spec::DesiredSpec;
use crate::types::{GitSource, PackageRecord};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("quoted pattern is valid"));

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<MetadataPackage>,
}

#[derive(Debug, Deserialize)]
struct MetadataPackage {
    name: String,
    version: String,
}

/// Projects packages onto their newest available state, memoized by name.
pub struct LatestResolver<'a> {
    runner: &'a Runner<'a>,
    cache: HashMap<String, PackageRecord>,
}

impl<'a> LatestResolver<'a> {
    /// Resolver issuing queries through `runner`.
    pub fn new(runner: &'a Runner<'a>) -> Self {
        Self {
            runner,
            cache: HashMap::new(),
        }
    }

    /// Project `name` onto the newest state `spec` allows.
    ///
    /// `installed` is the current record, if any. The first result per name
    /// is cached and returned unchanged on later calls.
    pub fn resolve(
        &mut self,
        spec: &DesiredSpec,
        name: &str,
        installed: Option<&PackageRecord>,
    ) -> Result<PackageRecord> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        let mut record = installed
            .cloned()
            .unwrap_or_else(|| PackageRecord::projected(name))
            .overlaid(&spec.overlay());

        if let Some(directory) = &spec.directory {
            record.id.version = self.manifest_version(directory, name)?;
        } else if let Some(git) = spec.git.as_ref().map(GitSource::normalized) {
            // an exact rev is already final
            if git.rev.is_none() {
                let commit = self.remote_commit(&git)?;
                record.git = Some(GitSource {
                    rev: Some(commit),
                    ..git
                });
            }
        } else if spec.version.is_none() {
            record.id.version = self.published_version(name)?;
        }

        log::trace!("{name}: latest is {}", record.id);
        self.cache.insert(name.to_string(), record.clone());
        Ok(record)
    }

    fn manifest_version(&self, directory: &Path, name: &str) -> Result<String> {
        let manifest = directory.join("Cargo.toml");
        let invocation = self
            .runner
            .cargo(vec![
                "metadata".to_string(),
                "--format-version".to_string(),
                "1".to_string(),
                "--no-deps".to_string(),
                "--manifest-path".to_string(),
                manifest.display().to_string(),
            ])
            .read_only();
        let output = self.runner.execute(&invocation)?;
        let metadata: Metadata = serde_json::from_str(&output.stdout)?;

        metadata
            .packages
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.version.clone())
            .ok_or_else(|| Error::PackageNotInManifest {
                name: name.to_string(),
                found: metadata.packages.into_iter().map(|p| p.name).collect(),
            })
    }

    fn remote_commit(&self, git: &GitSource) -> Result<String> {
        let reference = git.remote_ref();
        let invocation = self
            .runner
            .git(vec![
                "ls-remote".to_string(),
                git.url.clone(),
                reference.clone(),
            ])
            .read_only();
        let output = self.runner.execute(&invocation)?;

        let out = output.stdout.trim();
        if out.is_empty() {
            return Err(Error::RefNotFound {
                url: git.url.clone(),
                reference,
            });
        }

        match out.split_whitespace().collect::<Vec<_>>().as_slice() {
            [commit, _reference] => Ok((*commit).to_string()),
            _ => Err(Error::UnexpectedRemoteOutput {
                output: out.to_string(),
            }),
        }
    }

    fn published_version(&self, name: &str) -> Result<String> {
        let invocation = self
            .runner
            .cargo(vec![
                "search".to_string(),
                name.to_string(),
                "--limit".to_string(),
                "1".to_string(),
            ])
            .read_only();
        let output = self.runner.execute(&invocation)?;

        QUOTED
            .captures(&output.stdout)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| Error::NoPublishedVersion {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CommandOutput;
    use crate::backend::testing::ScriptedBackend;
    use crate::spec::DesiredState;

    fn latest(names: &[&str]) -> DesiredSpec {
        DesiredSpec::new(names.iter().copied()).with_state(DesiredState::Latest)
    }

    #[test]
    fn test_registry_search() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok(
            "ripgrep = \"14.1.1\"    # ripgrep is a line-oriented search tool\n... and 40 crates more",
        ));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let record = resolver.resolve(&latest(&["ripgrep"]), "ripgrep", None).unwrap();
        assert_eq!(record.version(), "14.1.1");
        assert_eq!(
            backend.calls()[0].args,
            vec!["search", "ripgrep", "--limit", "1"]
        );
    }

    #[test]
    fn test_pinned_version_skips_search() {
        let backend = ScriptedBackend::new();
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["ripgrep"]).with_version("14.0.3");
        let record = resolver.resolve(&spec, "ripgrep", None).unwrap();
        assert_eq!(record.version(), "14.0.3");
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_results_are_cached_by_name() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok("bat = \"0.25.0\""));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["bat"]);
        let first = resolver.resolve(&spec, "bat", None).unwrap();
        let second = resolver.resolve(&spec, "bat", None).unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn test_no_published_version() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok(""));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        assert!(matches!(
            resolver.resolve(&latest(&["nope"]), "nope", None),
            Err(Error::NoPublishedVersion { name }) if name == "nope"
        ));
    }

    #[test]
    fn test_manifest_version() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok(
            r#"{"packages": [{"name": "tool-core", "version": "0.1.0"}, {"name": "tool", "version": "0.3.2"}]}"#,
        ));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["tool"]).with_directory("/src/tool");
        let record = resolver.resolve(&spec, "tool", None).unwrap();
        assert_eq!(record.version(), "0.3.2");
        assert_eq!(record.directory.as_deref(), Some(Path::new("/src/tool")));
        assert_eq!(
            backend.calls()[0].args,
            vec![
                "metadata",
                "--format-version",
                "1",
                "--no-deps",
                "--manifest-path",
                "/src/tool/Cargo.toml"
            ]
        );
    }

    #[test]
    fn test_package_not_in_manifest() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok(
            r#"{"packages": [{"name": "a", "version": "1.0.0"}, {"name": "b", "version": "1.0.0"}]}"#,
        ));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["tool"]).with_directory("/src/tool");
        match resolver.resolve(&spec, "tool", None) {
            Err(Error::PackageNotInManifest { name, found }) => {
                assert_eq!(name, "tool");
                assert_eq!(found, vec!["a", "b"]);
            }
            other => panic!("expected PackageNotInManifest, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_rev_short_circuits() {
        let backend = ScriptedBackend::new();
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["uv"])
            .with_git(GitSource::new("https://github.com/astral-sh/uv").with_rev("abc123"));
        let record = resolver.resolve(&spec, "uv", None).unwrap();
        assert_eq!(record.git.unwrap().rev.as_deref(), Some("abc123"));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_branch_resolves_through_ls_remote() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok("0f1e2d3c4b5a\trefs/heads/main\n"));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["uv"])
            .with_git(GitSource::new("https://github.com/astral-sh/uv").with_branch("main"));
        let record = resolver.resolve(&spec, "uv", None).unwrap();

        let git = record.git.unwrap();
        assert_eq!(git.branch.as_deref(), Some("main"));
        assert_eq!(git.rev.as_deref(), Some("0f1e2d3c4b5a"));

        let call = &backend.calls()[0];
        assert_eq!(call.program, Path::new("git"));
        assert_eq!(
            call.args,
            vec!["ls-remote", "https://github.com/astral-sh/uv", "refs/heads/main"]
        );
    }

    #[test]
    fn test_unpinned_git_uses_head() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok("abcdef\tHEAD\n"));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["uv"]).with_git(GitSource::new("https://github.com/astral-sh/uv"));
        resolver.resolve(&spec, "uv", None).unwrap();
        assert_eq!(backend.calls()[0].args[2], "HEAD");
    }

    #[test]
    fn test_ref_not_found_and_unexpected_output() {
        let backend = ScriptedBackend::new();
        backend.push(CommandOutput::ok("\n"));
        backend.push(CommandOutput::ok("abc\trefs/tags/v1\ndef\trefs/tags/v1^{}\n"));
        let runner = Runner::new(&backend, Path::new("cargo"), true);
        let mut resolver = LatestResolver::new(&runner);

        let spec = latest(&["a"]).with_git(GitSource::new("https://example.com/a").with_tag("v1"));
        assert!(matches!(
            resolver.resolve(&spec, "a", None),
            Err(Error::RefNotFound { reference, .. }) if reference == "refs/tags/v1"
        ));

        let spec = latest(&["b"]).with_git(GitSource::new("https://example.com/b").with_tag("v1"));
        assert!(matches!(
            resolver.resolve(&spec, "b", None),
            Err(Error::UnexpectedRemoteOutput { .. })
        ));
    }
}

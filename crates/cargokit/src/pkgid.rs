//! Package identifier parsing.
//!
//! Cargo keys its installation record by strings of the form
//! `<name> <version> (<kind>+<url>)`, for example:
//!
//! ```text
//! ripgrep 14.1.0 (registry+https://github.com/rust-lang/crates.io-index)
//! ludusavi 0.25.0 (path+file:///home/me/src/ludusavi)
//! uv 0.6.11 (git+https://github.com/astral-sh/uv?tag=0.6.11#e4a0b3c9)
//! ```
//!
//! For git sources the commit is carried in the URL fragment, without any
//! `rev=` key.

use crate::error::{Error, Result};
use crate::types::{GitSource, PackageId, SourceKind};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

static PKGID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^ ]+) +(?P<version>[^ ]+) +\((?P<kind>[^+]+)\+(?P<url>[^)]+)\)$")
        .expect("package id pattern is valid")
});

impl PackageId {
    /// Parse a raw identifier string.
    ///
    /// Fails with [`Error::MalformedIdentifier`] when the string does not
    /// follow the grammar or names an unknown source kind.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || Error::MalformedIdentifier {
            raw: raw.to_string(),
        };

        let caps = PKGID.captures(raw).ok_or_else(malformed)?;
        let source_kind = SourceKind::from_kind(&caps["kind"]).ok_or_else(malformed)?;

        Ok(Self {
            name: caps["name"].to_string(),
            version: caps["version"].to_string(),
            source_kind,
            source_url: caps["url"].to_string(),
        })
    }

    /// Source directory of a path install.
    ///
    /// `None` for other kinds, or when the URL carries no path.
    pub fn directory(&self) -> Option<PathBuf> {
        if self.source_kind != SourceKind::Path {
            return None;
        }

        let url = Url::parse(&self.source_url).ok()?;
        if url.path().is_empty() {
            return None;
        }

        Some(
            url.to_file_path()
                .unwrap_or_else(|()| PathBuf::from(url.path())),
        )
    }

    /// Git source of a git install.
    ///
    /// `tag` and `branch` come from the query string, `rev` from the
    /// fragment. A git identifier with neither is rejected.
    pub fn git_source(&self) -> Result<Option<GitSource>> {
        if self.source_kind != SourceKind::Git {
            return Ok(None);
        }

        let malformed = || Error::MalformedIdentifier {
            raw: self.to_string(),
        };

        let mut url = Url::parse(&self.source_url).map_err(|_| malformed())?;
        let has_query = url.query().is_some_and(|q| !q.is_empty());
        let fragment = url.fragment().filter(|f| !f.is_empty()).map(str::to_string);

        if !has_query && fragment.is_none() {
            return Err(malformed());
        }

        let mut git = GitSource::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "tag" => git.tag = Some(value.into_owned()),
                "branch" => git.branch = Some(value.into_owned()),
                "rev" => git.rev = Some(value.into_owned()),
                _ => {}
            }
        }

        // fragment wins over a `rev=` query parameter
        if fragment.is_some() {
            git.rev = fragment;
        }

        url.set_query(None);
        url.set_fragment(None);
        git.url = url.to_string();

        Ok(Some(git))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIPGREP: &str = "ripgrep 14.1.0 (registry+https://github.com/rust-lang/crates.io-index)";

    #[test]
    fn test_parse_registry_id() {
        let id = PackageId::parse(RIPGREP).unwrap();
        assert_eq!(id.name, "ripgrep");
        assert_eq!(id.version, "14.1.0");
        assert_eq!(id.source_kind, SourceKind::Registry);
        assert_eq!(id.source_url, "https://github.com/rust-lang/crates.io-index");
        assert_eq!(id.directory(), None);
        assert_eq!(id.git_source().unwrap(), None);
    }

    #[test]
    fn test_display_reproduces_identifier() {
        for raw in [
            RIPGREP,
            "ludusavi 0.25.0 (path+file:///home/me/src/ludusavi)",
            "uv 0.6.11 (git+https://github.com/astral-sh/uv?tag=0.6.11#e4a0b3c9)",
            "private 1.2.3 (sparse+https://index.example.com/)",
        ] {
            let id = PackageId::parse(raw).unwrap();
            assert_eq!(id.to_string(), raw);
            assert_eq!(PackageId::parse(&id.to_string()).unwrap(), id);
        }
    }

    #[test]
    fn test_parse_path_id_extracts_directory() {
        let id = PackageId::parse("ludusavi 0.25.0 (path+file:///home/me/src/ludusavi)").unwrap();
        assert_eq!(id.source_kind, SourceKind::Path);
        assert_eq!(id.directory(), Some(PathBuf::from("/home/me/src/ludusavi")));
    }

    #[test]
    fn test_git_fragment_is_revision() {
        let id = PackageId::parse("uv 0.6.11 (git+https://github.com/astral-sh/uv#abc123)").unwrap();
        let git = id.git_source().unwrap().unwrap();
        assert_eq!(git.rev.as_deref(), Some("abc123"));
        assert_eq!(git.tag, None);
        assert_eq!(git.url, "https://github.com/astral-sh/uv");
    }

    #[test]
    fn test_git_query_and_fragment() {
        let id = PackageId::parse(
            "uv 0.6.11 (git+https://github.com/astral-sh/uv?branch=main#0f1e2d3c)",
        )
        .unwrap();
        let git = id.git_source().unwrap().unwrap();
        assert_eq!(git.branch.as_deref(), Some("main"));
        assert_eq!(git.rev.as_deref(), Some("0f1e2d3c"));
        assert_eq!(git.url, "https://github.com/astral-sh/uv");
    }

    #[test]
    fn test_git_without_pin_is_rejected() {
        let id = PackageId::parse("uv 0.6.11 (git+https://github.com/astral-sh/uv)").unwrap();
        assert!(matches!(
            id.git_source(),
            Err(Error::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn test_malformed_ids() {
        for raw in [
            "",
            "ripgrep",
            "ripgrep 14.1.0",
            "ripgrep 14.1.0 registry+https://example.com",
            "ripgrep 14.1.0 (https://example.com)",
            "ripgrep 14.1.0 (svn+https://example.com)",
            "junk ripgrep 14.1.0 (registry+https://example.com)",
            "ripgrep 14.1.0 (registry+https://example.com) trailing",
        ] {
            match PackageId::parse(raw) {
                Err(Error::MalformedIdentifier { raw: got }) => assert_eq!(got, raw),
                other => panic!("expected malformed identifier for {raw:?}, got {other:?}"),
            }
        }
    }
}

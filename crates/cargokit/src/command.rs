//! Building `cargo install` / `cargo uninstall` argument lists.

use crate::error::{Error, Result, Violation};
use crate::spec::DesiredSpec;

/// Arguments for installing `targets` as `spec` declares.
///
/// Raw extra arguments come last so they can override anything before them.
pub fn install_args(spec: &DesiredSpec, targets: &[String]) -> Result<Vec<String>> {
    if spec.git.is_some() && targets.len() > 1 {
        return Err(Error::InvalidSpec {
            violations: vec![Violation::MultiplePackageGitInstall {
                names: targets.to_vec(),
            }],
        });
    }

    let mut args = vec!["install".to_string()];
    args.extend(targets.iter().cloned());

    if spec.locked {
        args.push("--locked".into());
    }
    if let Some(root) = &spec.root {
        args.push("--root".into());
        args.push(root.display().to_string());
    }
    if let Some(version) = &spec.version {
        args.push("--version".into());
        args.push(version.clone());
    }
    if let Some(directory) = &spec.directory {
        args.push("--path".into());
        args.push(directory.display().to_string());
    }
    if !spec.features.is_empty() {
        args.push("--features".into());
        args.push(spec.features.iter().cloned().collect::<Vec<_>>().join(","));
    }
    if spec.default_features == Some(false) {
        args.push("--no-default-features".into());
    }
    if let Some(git) = spec.git.as_ref().map(|g| g.normalized()) {
        args.push("--git".into());
        args.push(git.url);
        for (flag, value) in [("--tag", git.tag), ("--branch", git.branch), ("--rev", git.rev)] {
            if let Some(value) = value {
                args.push(flag.into());
                args.push(value);
            }
        }
    }
    if let Some(bin) = &spec.bin {
        args.push("--bin".into());
        args.push(bin.clone());
    }

    args.extend(spec.extra_args.iter().cloned());
    Ok(args)
}

/// Arguments for uninstalling `targets`.
pub fn uninstall_args(spec: &DesiredSpec, targets: &[String]) -> Vec<String> {
    let mut args = vec!["uninstall".to_string()];
    args.extend(targets.iter().cloned());
    if let Some(root) = &spec.root {
        args.push("--root".into());
        args.push(root.display().to_string());
    }
    args
}

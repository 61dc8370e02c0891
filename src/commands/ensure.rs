//! `crateward ensure`: one reconciliation from command-line arguments.

use anyhow::Result;
use cargokit::{DesiredSpec, DesiredState, GitSource};

use crate::Context as AppContext;
use crate::cli::{EnsureArgs, StateArg};
use crate::{paths, progress, ui};

pub fn run(ctx: &AppContext, args: EnsureArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let json = args.json;
    let spec = spec_from_args(args);
    let reconciler = super::reconciler(ctx, dry_run)?;

    let pb = progress::spinner(
        &format!("Reconciling {}...", spec.names.join(", ")),
        ctx.quiet || json,
    );
    let result = reconciler.reconcile(&spec);
    progress::finish_clear(&pb);
    let result = result?;

    if json {
        return super::print_json(&result.report());
    }

    if dry_run {
        ui::info("Dry run - nothing was installed or removed");
    }
    super::print_result(ctx, &result);

    if result.changed {
        ui::success(&format!(
            "{} {}",
            spec.names.join(", "),
            if dry_run { "would change" } else { "changed" }
        ));
    } else if !ctx.quiet {
        ui::success(&format!("{} already {}", spec.names.join(", "), spec.state));
    }
    Ok(())
}

fn state(arg: StateArg) -> DesiredState {
    match arg {
        StateArg::Present => DesiredState::Present,
        StateArg::Absent => DesiredState::Absent,
        StateArg::Latest => DesiredState::Latest,
    }
}

/// Translate command-line arguments into a declaration.
fn spec_from_args(args: EnsureArgs) -> DesiredSpec {
    let git = args.git.map(|url| GitSource {
        url,
        tag: args.tag,
        branch: args.branch,
        rev: args.rev,
    });

    DesiredSpec {
        names: args.names,
        state: state(args.state),
        version: args.version,
        features: args.features.into_iter().filter(|f| !f.is_empty()).collect(),
        default_features: args.no_default_features.then_some(false),
        directory: args.path.as_deref().map(paths::expand),
        git,
        locked: args.locked,
        bin: args.bin,
        root: args.root.as_deref().map(paths::expand),
        extra_args: args.extra,
    }
}

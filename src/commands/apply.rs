//! `crateward apply`: reconcile every entry of a declaration file in order.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::Context as AppContext;
use crate::cli::ApplyArgs;
use crate::config::{self, Declarations};
use crate::{progress, ui};

pub fn run(ctx: &AppContext, args: ApplyArgs) -> Result<()> {
    let path = config::declarations_path(args.file.as_deref())?;
    let declarations = Declarations::load(&path)?;
    let reconciler = super::reconciler(ctx, args.dry_run)?;

    if !args.json {
        ui::header("Applying crate declarations");
        ui::dim(&format!("Using: {}", path.display()));
        if args.dry_run {
            ui::info("Dry run - nothing will be installed or removed");
        }
    }

    let total = declarations.crates.len();
    let mut results = Vec::with_capacity(total);
    for (index, spec) in declarations.crates.iter().enumerate() {
        let names = spec.names.join(", ");
        let pb = progress::spinner(
            &format!("[{}/{}] {names} ({})", index + 1, total, spec.state),
            ctx.quiet || args.json,
        );
        let result = reconciler.reconcile(spec);
        progress::finish_clear(&pb);
        let result = result.with_context(|| format!("Failed to reconcile {names}"))?;

        if !args.json {
            let status = if result.changed {
                (if args.dry_run { "would change" } else { "changed" }).yellow()
            } else {
                "ok".green()
            };
            println!();
            println!("{} {}", names.cyan().bold(), status);
            super::print_result(ctx, &result);
        }
        results.push(result);
    }

    if args.json {
        let reports: Vec<_> = results.iter().map(|r| r.report()).collect();
        return super::print_json(&reports);
    }

    let changed = results.iter().filter(|r| r.changed).count();
    println!();
    if changed == 0 {
        ui::success(&format!("All {total} declarations satisfied"));
    } else {
        ui::success(&format!(
            "{changed} of {total} declarations {}",
            if args.dry_run { "would change" } else { "changed" }
        ));
    }
    Ok(())
}

pub mod apply;
pub mod ensure;
pub mod list;

use crate::Context as AppContext;
use crate::ui;
use anyhow::{Context, Result};
use cargokit::{ReconcileResult, Reconciler};

/// Build a reconciler for the cargo executable in use.
fn reconciler(ctx: &AppContext, dry_run: bool) -> Result<Reconciler> {
    let cargo = cargokit::find_cargo(ctx.cargo.as_deref())
        .context("Cannot reconcile crates without cargo")?;
    let reconciler = Reconciler::new(cargo).dry_run(dry_run);
    log::debug!("using cargo at {}", reconciler.cargo().display());
    Ok(reconciler)
}

/// Print a reconciliation result in human form.
fn print_result(ctx: &AppContext, result: &ReconcileResult) {
    for warning in &result.warnings {
        ui::warn(warning);
    }

    let report = result.report();
    ui::print_diff(&report.diff);

    if ctx.verbose > 0 {
        for line in result.stdout.lines().chain(result.stderr.lines()) {
            ui::dim(line);
        }
    }
}

/// Print any serializable value as pretty JSON.
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

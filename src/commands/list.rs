//! `crateward list`: report the installed inventory.

use anyhow::Result;
use cargokit::{CargoHome, DesiredSpec, Reconciler};

use crate::Context as AppContext;
use crate::cli::ListArgs;
use crate::{paths, ui};

pub fn run(ctx: &AppContext, args: ListArgs) -> Result<()> {
    let root = args.root.as_deref().map(paths::expand);
    let home = CargoHome::resolve(root.as_deref())?;

    // a declaration without names only reads state, so cargo is never spawned
    let spec = DesiredSpec {
        root,
        ..DesiredSpec::default()
    };
    let mut inventory = Reconciler::new("cargo")
        .home(home.clone())
        .reconcile(&spec)?
        .installed;
    if !args.names.is_empty() {
        inventory.retain(|name, _| args.names.contains(name));
    }

    if args.json {
        return super::print_json(&inventory);
    }

    ui::header(&format!("Installed crates ({})", home.root().display()));
    if inventory.is_empty() {
        ui::info("No crates installed");
        return Ok(());
    }

    for record in inventory.values() {
        ui::print_package(record);
        if ctx.verbose > 0 {
            if let Some(rustc) = &record.rustc {
                ui::kv("rustc", rustc);
            }
            if !record.features.is_empty() {
                let features: Vec<&str> = record.features.iter().map(String::as_str).collect();
                ui::kv("features", &features.join(", "));
            }
        }
    }
    Ok(())
}

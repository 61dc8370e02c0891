//! Symmetric difference between two inventories.

use crate::types::{DiffEntry, Inventory};
use std::collections::BTreeSet;

/// Every package whose record differs between `before` and `after`, sorted
/// by name.
///
/// Records are compared in full, binary stats included, so a rebuilt binary
/// shows up even when no metadata changed.
pub fn diff_inventories(before: &Inventory, after: &Inventory) -> Vec<DiffEntry> {
    let names: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    names
        .into_iter()
        .filter_map(|name| {
            let old = before.get(name);
            let new = after.get(name);
            (old != new).then(|| DiffEntry {
                name: name.clone(),
                before: old.cloned(),
                after: new.cloned(),
            })
        })
        .collect()
}

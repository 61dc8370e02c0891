//! # cargokit
//!
//! Pure Rust library for reconciling `cargo install`ed packages against a
//! desired state.
//!
//! This crate provides functionality for:
//! - Reading cargo's installation record (`.crates2.json`) into an inventory
//! - Parsing package identifiers, including git and path sources
//! - Deciding which packages need installing, upgrading or removing
//! - Resolving "latest" through the registry, a source manifest or a git remote
//! - Diffing two inventories for change reports
//!
//! ## Example
//!
//! ```no_run
//! use cargokit::{DesiredSpec, DesiredState, Reconciler};
//!
//! let cargo = cargokit::find_cargo(None).expect("cargo not available");
//! let reconciler = Reconciler::new(cargo).dry_run(true);
//!
//! let spec = DesiredSpec::new(["ripgrep", "bat"]).with_state(DesiredState::Latest);
//! let result = reconciler.reconcile(&spec).expect("reconcile failed");
//!
//! for entry in &result.diff {
//!     println!("{}: {:?} -> {:?}", entry.name,
//!         entry.before.as_ref().map(|r| r.version()),
//!         entry.after.as_ref().map(|r| r.version()));
//! }
//! ```
//!
//! ## Dry Run
//!
//! In dry-run mode `cargo install` and `cargo uninstall` are never run.
//! Read-only queries (`cargo search`, `cargo metadata`, `git ls-remote`) still
//! are, so the reported inventory is a projection of what would be installed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod command;
pub mod compare;
pub mod diff;
pub mod error;
pub mod home;
pub mod latest;
pub mod pkgid;
pub mod reconcile;
pub mod spec;
pub mod state;
pub mod types;

pub use backend::process::find_cargo;
pub use error::{Error, Result, Violation};
pub use home::CargoHome;
pub use reconcile::{ReconcileResult, Reconciler, Report};
pub use spec::{DesiredSpec, DesiredState};
pub use types::{
    BinStat, DiffEntry, DiffReport, GitSource, Inventory, PackageId, PackageOverlay,
    PackageRecord, PackageSummary, SourceKind, apply_overlay,
};

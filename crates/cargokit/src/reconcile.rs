//! Converging one installation root onto a [`DesiredSpec`].

use crate::backend::process::ProcessBackend;
use crate::backend::{Backend, CommandOutput, Runner};
use crate::command::{install_args, uninstall_args};
use crate::compare::partition;
use crate::diff::diff_inventories;
use crate::error::Result;
use crate::home::CargoHome;
use crate::latest::LatestResolver;
use crate::spec::{DesiredSpec, DesiredState};
use crate::state::StateReader;
use crate::types::{DiffEntry, DiffReport, Inventory, PackageRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Warning emitted whenever raw install arguments are given.
pub const EXTRA_ARGS_WARNING: &str = "changes are always assumed when using extra arguments";

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Whether anything changed (or is assumed to have changed)
    pub changed: bool,
    /// Stdout of the install/uninstall command, empty if none ran
    pub stdout: String,
    /// Stderr of the install/uninstall command, empty if none ran
    pub stderr: String,
    /// Inventory afterwards (projected in dry-run mode)
    pub installed: Inventory,
    /// Packages whose record changed, sorted by name
    pub diff: Vec<DiffEntry>,
    /// Non-fatal notices
    pub warnings: Vec<String>,
}

impl ReconcileResult {
    /// Reportable form, with binary stats stripped from the diff.
    pub fn report(&self) -> Report<'_> {
        Report {
            changed: self.changed,
            stdout: &self.stdout,
            stderr: &self.stderr,
            installed: &self.installed,
            diff: self.diff.iter().map(DiffEntry::report).collect(),
            warnings: &self.warnings,
        }
    }
}

/// Serializable view of a [`ReconcileResult`].
#[derive(Debug, Serialize)]
#[allow(missing_docs)]
pub struct Report<'a> {
    pub changed: bool,
    pub stdout: &'a str,
    pub stderr: &'a str,
    pub installed: &'a Inventory,
    pub diff: Vec<DiffReport>,
    pub warnings: &'a [String],
}

/// Reconciles desired state through cargo.
pub struct Reconciler {
    backend: Box<dyn Backend>,
    cargo: PathBuf,
    home: Option<CargoHome>,
    dry_run: bool,
}

impl Reconciler {
    /// Reconciler spawning real processes with the given cargo executable.
    pub fn new(cargo: impl Into<PathBuf>) -> Self {
        Self::with_backend(Box::new(ProcessBackend::new()), cargo)
    }

    /// Reconciler with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>, cargo: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            cargo: cargo.into(),
            home: None,
            dry_run: false,
        }
    }

    /// Default installation root, used when a declaration has no `root`.
    ///
    /// Without one, the root is resolved from the environment.
    pub fn home(mut self, home: CargoHome) -> Self {
        self.home = Some(home);
        self
    }

    /// Compute and report without running install or uninstall.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Cargo executable in use.
    pub fn cargo(&self) -> &Path {
        &self.cargo
    }

    /// Bring the installed packages in line with `spec`.
    ///
    /// With no names, only reports the current inventory.
    pub fn reconcile(&self, spec: &DesiredSpec) -> Result<ReconcileResult> {
        spec.validate()?;

        let home = match (&spec.root, &self.home) {
            (Some(root), _) => CargoHome::new(root),
            (None, Some(home)) => home.clone(),
            (None, None) => CargoHome::resolve(None)?,
        };
        let reader = StateReader::new(&home);
        let before = reader.read(&spec.names)?;

        if spec.names.is_empty() {
            return Ok(ReconcileResult {
                changed: false,
                stdout: String::new(),
                stderr: String::new(),
                installed: before,
                diff: Vec::new(),
                warnings: Vec::new(),
            });
        }

        let runner = Runner::new(self.backend.as_ref(), &self.cargo, self.dry_run);
        let targets = partition(spec, &before).needs_action;

        let mut output = CommandOutput::default();
        if !targets.is_empty() {
            let args = match spec.state {
                DesiredState::Absent => uninstall_args(spec, &targets),
                DesiredState::Present | DesiredState::Latest => install_args(spec, &targets)?,
            };
            output = runner.execute(&runner.cargo(args))?;
        }

        let after = if targets.is_empty() {
            before.clone()
        } else if runner.is_dry_run() {
            project(&runner, spec, &targets, &before)?
        } else {
            log::debug!("re-reading {} after {}", reader.path().display(), spec.state);
            reader.read(&spec.names)?
        };

        let diff = diff_inventories(&before, &after);

        let mut warnings = Vec::new();
        if !spec.extra_args.is_empty() {
            warnings.push(EXTRA_ARGS_WARNING.to_string());
        }

        let changed =
            !diff.is_empty() || (spec.state != DesiredState::Absent && !spec.extra_args.is_empty());

        Ok(ReconcileResult {
            changed,
            stdout: output.stdout,
            stderr: output.stderr,
            installed: after,
            diff,
            warnings,
        })
    }
}

/// The inventory `targets` would produce, without touching anything.
fn project(
    runner: &Runner<'_>,
    spec: &DesiredSpec,
    targets: &[String],
    before: &Inventory,
) -> Result<Inventory> {
    let mut after = before.clone();

    if spec.state == DesiredState::Absent {
        for name in targets {
            after.remove(name);
        }
        return Ok(after);
    }

    let mut resolver = LatestResolver::new(runner);
    let overlay = spec.overlay();
    for name in targets {
        let installed = before.get(name);
        let unpinned_install = installed.is_none() && spec.version.is_none();

        let record = if spec.state == DesiredState::Latest || unpinned_install {
            resolver.resolve(spec, name, installed)?
        } else {
            installed
                .cloned()
                .unwrap_or_else(|| PackageRecord::projected(name))
                .overlaid(&overlay)
        };
        after.insert(name.clone(), record);
    }

    Ok(after)
}

use cargokit::{DiffReport, PackageRecord, PackageSummary};
use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Package Rendering
// ============================================================================

/// Kind of change a diff entry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Removed,
    Modified,
}

impl Change {
    fn symbol(self) -> colored::ColoredString {
        match self {
            Self::Added => "+".green().bold(),
            Self::Removed => "-".red().bold(),
            Self::Modified => "~".yellow().bold(),
        }
    }
}

/// Where a package came from, for display
pub fn source_label(summary: &PackageSummary) -> String {
    if let Some(git) = &summary.git {
        let pin = git
            .tag
            .as_deref()
            .map(|t| format!("tag {t}"))
            .or_else(|| git.branch.as_deref().map(|b| format!("branch {b}")))
            .or_else(|| git.rev.as_deref().map(|r| format!("rev {r}")));
        return match pin {
            Some(pin) => format!("{} ({pin})", git.url),
            None => git.url.clone(),
        };
    }
    if let Some(directory) = &summary.directory {
        return directory.display().to_string();
    }
    match summary.id.source_url.as_str() {
        cargokit::types::CRATES_IO_INDEX => "crates.io".to_string(),
        other => other.to_string(),
    }
}

/// Describe one diff entry without color
pub fn describe_change(report: &DiffReport) -> (Change, String) {
    match (&report.before, &report.after) {
        (None, Some(after)) => (
            Change::Added,
            format!("{} {} ({})", report.name, after.id.version, source_label(after)),
        ),
        (Some(before), None) => (
            Change::Removed,
            format!("{} {}", report.name, before.id.version),
        ),
        (Some(before), Some(after)) if before.id.version != after.id.version => (
            Change::Modified,
            format!(
                "{} {} -> {}",
                report.name, before.id.version, after.id.version
            ),
        ),
        (Some(before), Some(after)) => {
            let fields = changed_fields(before, after);
            let detail = if fields.is_empty() {
                "rebuilt".to_string()
            } else {
                fields.join(", ")
            };
            (
                Change::Modified,
                format!("{} {} ({detail})", report.name, after.id.version),
            )
        }
        (None, None) => (Change::Modified, report.name.clone()),
    }
}

fn changed_fields(before: &PackageSummary, after: &PackageSummary) -> Vec<&'static str> {
    let checks = [
        ("source", before.id != after.id),
        ("features", before.features != after.features),
        ("all features", before.all_features != after.all_features),
        ("default features", before.default_features != after.default_features),
        ("bins", before.bins != after.bins),
        ("profile", before.profile != after.profile),
        ("target", before.target != after.target),
        ("rustc", before.rustc != after.rustc),
        ("git", before.git != after.git),
    ];
    checks
        .into_iter()
        .filter_map(|(name, differs)| differs.then_some(name))
        .collect()
}

/// Print the diff of a reconciliation
pub fn print_diff(diff: &[DiffReport]) {
    for entry in diff {
        let (change, text) = describe_change(entry);
        println!("  {} {}", change.symbol(), text);
    }
}

/// Print one installed package
pub fn print_package(record: &PackageRecord) {
    let summary = PackageSummary::from(record);
    let bins: Vec<&str> = record.bins.iter().map(String::as_str).collect();
    println!(
        "  {} {} {}",
        record.name().bold(),
        record.version(),
        format!("({})", source_label(&summary)).dimmed()
    );
    if !bins.is_empty() {
        println!("    {}", bins.join(", ").dimmed());
    }
}

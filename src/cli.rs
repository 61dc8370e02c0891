use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crateward")]
#[command(version)]
#[command(about = "Keep cargo-installed crates in a declared state", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the cargo executable (default: looked up in PATH)
    #[arg(long, global = true, env = "CRATEWARD_CARGO")]
    pub cargo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List installed crates
    List(ListArgs),

    /// Bring crates into a desired state
    Ensure(EnsureArgs),

    /// Reconcile every entry of a declaration file
    Apply(ApplyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Only show these crates
    pub names: Vec<String>,

    /// Installation root (default: CARGO_HOME or ~/.cargo)
    #[arg(long)]
    pub root: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum StateArg {
    #[default]
    Present,
    Absent,
    Latest,
}

#[derive(Args)]
pub struct EnsureArgs {
    /// Crates to reconcile
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Desired state
    #[arg(short, long, value_enum, default_value_t)]
    pub state: StateArg,

    /// Exact version to install
    #[arg(long)]
    pub version: Option<String>,

    /// Features to enable (comma-separated)
    #[arg(short = 'F', long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Disable default features
    #[arg(long)]
    pub no_default_features: bool,

    /// Install from a local source directory
    #[arg(long)]
    pub path: Option<String>,

    /// Install from a git repository
    #[arg(long)]
    pub git: Option<String>,

    /// Git tag to install
    #[arg(long, requires = "git", conflicts_with_all = ["branch", "rev"])]
    pub tag: Option<String>,

    /// Git branch to install
    #[arg(long, requires = "git", conflicts_with = "rev")]
    pub branch: Option<String>,

    /// Git commit to install
    #[arg(long, requires = "git")]
    pub rev: Option<String>,

    /// Install only this binary
    #[arg(long)]
    pub bin: Option<String>,

    /// Build with the crate's Cargo.lock
    #[arg(long)]
    pub locked: bool,

    /// Installation root (default: CARGO_HOME or ~/.cargo)
    #[arg(long)]
    pub root: Option<String>,

    /// Show what would change without installing or uninstalling
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Extra arguments passed to `cargo install` verbatim
    #[arg(last = true)]
    pub extra: Vec<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Declaration file (default: <config dir>/crates.toml)
    pub file: Option<String>,

    /// Show what would change without installing or uninstalling
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

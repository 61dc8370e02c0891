//! Progress indicators for the crateward CLI.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner with `message`.
///
/// Hidden when quiet, so output stays clean in scripts.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue.bold} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Stop and erase a spinner.
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}

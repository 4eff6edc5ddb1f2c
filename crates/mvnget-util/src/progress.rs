use std::io::Write;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print a Cargo-style status line: `  Downloading org.example:lib:1.0`
///
/// The `label` is right-padded to 12 characters and printed in bold green,
/// followed by the `message` in the default terminal colour.
pub fn status(label: &str, message: &str) {
    let green_bold = Style::new().green().bold();
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        green_bold.apply_to(label),
    );
}

/// Print a warning-style status line (bold yellow label).
pub fn status_warn(label: &str, message: &str) {
    let yellow_bold = Style::new().yellow().bold();
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        yellow_bold.apply_to(label),
    );
}

/// Create an animated spinner with the given message.
///
/// `ticks` are the frames to cycle through, e.g. `|/-\`.
pub fn spinner(message: &str, ticks: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let mut style = ProgressStyle::default_spinner()
        .template("      {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    if ticks.chars().count() > 1 {
        let mut frames: Vec<String> = ticks.chars().map(|c| c.to_string()).collect();
        // indicatif uses the last frame as the "finished" state.
        frames.push(" ".to_string());
        let refs: Vec<&str> = frames.iter().map(String::as_str).collect();
        style = style.tick_strings(&refs);
    }
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// A spinner that draws nothing, for when progress display is disabled.
pub fn hidden() -> ProgressBar {
    ProgressBar::hidden()
}

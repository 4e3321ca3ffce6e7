use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_red, bright_yellow};

/// Spinner shown on stderr while dashboard lists are being fetched.
pub struct LoadingSpinner {
    pb: ProgressBar,
}

impl LoadingSpinner {
    pub fn start(what: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
            pb.set_style(style);
        }
        pb.set_message(bright_yellow(format!("Loading {what}...")).to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self, what: &str, ok: bool) {
        let message = if ok {
            bright_green(format!("Loaded {what} ✓")).to_string()
        } else {
            bright_red(format!("Failed to load {what} ✗")).to_string()
        };
        self.pb.finish_with_message(message);
    }
}

mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

use chrono::{DateTime, Utc};

use crate::dashboard::display::DisplayContext;

pub use exports::{export_dashboard, export_init_failure};
pub use progress::LoadingSpinner;
pub use styling::{bright_red, dim};
pub use summary::{print_dashboard, print_init_failure};

use styling::magenta_bold;

/// Everything the renderers need besides the dashboard itself.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Base of the platform's web UI, used for launch and relaunch links.
    pub web_url: String,
    pub display: DisplayContext,
    pub now: DateTime<Utc>,
}

/// Prints the `SeqDash` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🧬 SeqDash"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Seqera Platform dashboard and relay")
    );
}

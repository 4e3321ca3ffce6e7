//! Pure display derivations for pipeline and run records.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use url::{Host, Url};

use crate::seqera::{Label, Pipeline, Run};

pub const MISSING: &str = "—";

/// Coarse run outcome that drives colour, icon and row class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Succeeded,
    Failed,
    Cancelled,
    Other,
}

/// Colours of a status badge, as CSS hex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPalette {
    pub text: &'static str,
    pub border: &'static str,
    pub background: &'static str,
}

impl StatusClass {
    /// Case-insensitive classification of a free-text run status.
    pub fn classify(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "failed" | "error" => StatusClass::Failed,
            "succeeded" | "completed" => StatusClass::Succeeded,
            "cancelled" | "canceled" => StatusClass::Cancelled,
            _ => StatusClass::Other,
        }
    }

    pub fn palette(self) -> StatusPalette {
        match self {
            StatusClass::Failed => StatusPalette {
                text: "#DC2626",
                border: "#FCA5A5",
                background: "#FEF2F2",
            },
            StatusClass::Succeeded => StatusPalette {
                text: "#16A34A",
                border: "#86EFAC",
                background: "#F0FDF4",
            },
            StatusClass::Cancelled => StatusPalette {
                text: "#6B7280",
                border: "#D1D5DB",
                background: "#F9FAFB",
            },
            StatusClass::Other => StatusPalette {
                text: "#374151",
                border: "#D1D5DB",
                background: "#F9FAFB",
            },
        }
    }

    /// Accent colour used for the row marker.
    pub fn accent(self) -> &'static str {
        match self {
            StatusClass::Failed => "#DC2626",
            StatusClass::Succeeded => "#16A34A",
            StatusClass::Cancelled | StatusClass::Other => "#D1D5DB",
        }
    }

    pub fn icon(self) -> Option<&'static str> {
        match self {
            StatusClass::Failed => Some("✗"),
            StatusClass::Succeeded => Some("✓"),
            StatusClass::Cancelled => Some("⊘"),
            StatusClass::Other => None,
        }
    }

    pub fn row_class(self) -> &'static str {
        match self {
            StatusClass::Failed => "status-failed",
            StatusClass::Succeeded => "status-succeeded",
            StatusClass::Cancelled => "status-cancelled",
            StatusClass::Other => "",
        }
    }
}

/// Lower-cased status for the badge, or a dash when the run has none.
pub fn badge_text(status: Option<&str>) -> String {
    status.map_or_else(|| MISSING.to_string(), str::to_lowercase)
}

/// Elapsed time since `submitted`, bucketed into minutes, hours or days.
///
/// Buckets use whole (floored) units: under a minute renders `after <1m`.
pub fn time_since(submitted: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(submitted) = submitted else {
        return String::new();
    };

    let minutes = (now - submitted).num_seconds().div_euclid(60);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if minutes < 1 {
        "after <1m".to_string()
    } else if minutes < 60 {
        format!("after {minutes}m")
    } else if hours < 24 {
        format!("after {hours}h")
    } else {
        format!("after {days}d")
    }
}

pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || MISSING.to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

pub fn format_date(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || MISSING.to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d").to_string(),
    )
}

/// Texts of the labels shown next to a run.
///
/// Bare strings are always shown; name/value labels only when `resource` is
/// explicitly `false`.
pub fn label_texts(labels: &[Label]) -> Vec<String> {
    labels
        .iter()
        .filter_map(|label| match label {
            Label::Bare(text) => Some(text.clone()),
            Label::Tagged {
                name,
                value,
                resource: Some(false),
            } => {
                let name = name.as_deref().unwrap_or_default();
                Some(match value.as_deref() {
                    Some(value) if !value.is_empty() => format!("{name}={value}"),
                    _ => name.to_string(),
                })
            }
            Label::Tagged { .. } => None,
        })
        .collect()
}

pub fn pipeline_name(pipeline: &Pipeline) -> &str {
    non_empty(pipeline.name.as_deref()).unwrap_or("Unnamed Pipeline")
}

pub fn pipeline_repository(pipeline: &Pipeline) -> &str {
    non_empty(pipeline.repository.as_deref()).unwrap_or("No repository")
}

pub fn run_name(run: &Run) -> &str {
    run.run_name().unwrap_or("Unnamed Run")
}

pub fn run_project(run: &Run) -> &str {
    run.project_name().unwrap_or(MISSING)
}

pub fn run_user(run: &Run) -> &str {
    run.user_name().unwrap_or(MISSING)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Where the dashboard runs, decided once from the relay URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayContext {
    /// Direct icon loads rely on the platform's session cookie, which is not
    /// sent when the relay is reached on a loopback host.
    pub suppress_icons: bool,
}

impl DisplayContext {
    pub fn for_relay(relay_url: &Url) -> Self {
        let suppress_icons = match relay_url.host() {
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        };
        Self { suppress_icons }
    }

    /// The icon reference to display, or `None` to show the placeholder.
    pub fn icon_src<'a>(&self, icon: Option<&'a str>) -> Option<&'a str> {
        if self.suppress_icons {
            return None;
        }
        non_empty(icon)
    }
}

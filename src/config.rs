use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.cloud.seqera.io";
pub const DEFAULT_WEB_URL: &str = "https://cloud.seqera.io";

/// Configuration file structure for SeqDash.
///
/// Holds the non-secret settings shared by the relay and the dashboard.
/// Tokens are not part of the file format; they come from the
/// command line, the environment, or the host runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayConfig {
    /// Port the relay listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream Seqera Platform API base URL
    #[serde(default = "default_upstream_url")]
    pub upstream: String,

    /// Deployment mode; production binds all interfaces
    #[serde(default)]
    pub mode: RelayMode,

    /// Directory holding the single-page application shell and its assets
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DashboardConfig {
    /// Base URL of the relay the dashboard talks to
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Seqera web UI base URL used for launch and relaunch links
    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// Path of the host-delivered app config; selects the host provider
    pub host_config: Option<PathBuf>,

    /// Organization name used to resolve the workspace id
    pub organization: Option<String>,

    /// Workspace name used to resolve the workspace id
    pub workspace: Option<String>,

    /// Number of runs requested from the run history
    #[serde(default = "default_runs_limit")]
    pub runs_limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Html,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            upstream: default_upstream_url(),
            mode: RelayMode::default(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            web_url: default_web_url(),
            host_config: None,
            organization: None,
            workspace: None,
            runs_limit: default_runs_limit(),
        }
    }
}

fn default_port() -> u16 {
    3001
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_relay_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_web_url() -> String {
    DEFAULT_WEB_URL.to_string()
}

fn default_runs_limit() -> usize {
    25
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./seqdash.{toml,json,yaml,yml}
    /// 3. <platform config dir>/seqdash/seqdash.{toml,json,yaml,yml}
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Self::load_from_path(path);
        }

        let candidates = ["seqdash.toml", "seqdash.json", "seqdash.yaml", "seqdash.yml"];

        let mut dirs = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            dirs.push(config_dir.join("seqdash"));
        }

        for dir in &dirs {
            for candidate in &candidates {
                let path = dir.join(candidate);
                if path.exists() {
                    log::debug!("Loading config from {}", path.display());
                    return Self::load_from_path(&path);
                }
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

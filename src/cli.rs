use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use console::Term;
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use url::Url;

use crate::auth::Token;
use crate::config::{Config, DashboardConfig, OutputFormat, RelayConfig, RelayMode};
use crate::dashboard::display::DisplayContext;
use crate::dashboard::{initialize, select_provider, Dashboard, DashboardError, EnvConfigProvider};
use crate::output::{
    bright_red, dim, export_dashboard, export_init_failure, print_dashboard, print_init_failure,
    LoadingSpinner, RenderOptions,
};
use crate::relay::{Relay, RelaySettings};
use crate::seqera::{resolve_workspace_id, SeqeraClient};

#[derive(Parser)]
#[command(name = "seqdash")]
#[command(author, version, about = "Seqera Platform dashboard and relay", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./seqdash.toml or the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the same-origin relay in front of the Seqera Platform API
    Serve(ServeArgs),

    /// Load and show the workspace's pipelines and recent runs
    Dashboard(DashboardArgs),

    /// Resolve an organization and workspace name to a workspace id
    Resolve(ResolveArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    #[arg(long, env = "RELAY_MODE", value_enum)]
    mode: Option<RelayMode>,

    /// Upstream Seqera Platform API base URL
    #[arg(long)]
    upstream: Option<String>,

    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[derive(Args)]
struct DashboardArgs {
    #[arg(long, env = "SEQDASH_RELAY_URL")]
    relay_url: Option<String>,

    /// App config handed over by the host runtime; takes precedence over the flags below
    #[arg(long, env = "SEQDASH_HOST_CONFIG")]
    host_config: Option<PathBuf>,

    #[arg(short, long, env = "SEQERA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(short, long, env = "SEQERA_WORKSPACE_ID")]
    workspace_id: Option<String>,

    #[arg(long)]
    organization: Option<String>,

    #[arg(long)]
    workspace: Option<String>,

    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short = 'l', long)]
    runs_limit: Option<usize>,

    /// Seqera web UI base URL for launch and relaunch links
    #[arg(long)]
    web_url: Option<String>,
}

#[derive(Args)]
struct ResolveArgs {
    #[arg(long)]
    organization: String,

    #[arg(long)]
    workspace: String,

    #[arg(short, long, env = "SEQERA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "SEQDASH_RELAY_URL")]
    relay_url: Option<String>,
}

fn relay_settings(args: &ServeArgs, config: &RelayConfig) -> RelaySettings {
    RelaySettings {
        port: args.port.unwrap_or(config.port),
        upstream: args
            .upstream
            .clone()
            .unwrap_or_else(|| config.upstream.clone()),
        mode: args.mode.unwrap_or(config.mode),
        static_dir: args
            .static_dir
            .clone()
            .unwrap_or_else(|| config.static_dir.clone()),
    }
}

fn env_provider(args: &DashboardArgs, config: &DashboardConfig) -> EnvConfigProvider {
    EnvConfigProvider {
        token: args.token.clone(),
        workspace_id: args.workspace_id.clone(),
        organization: args
            .organization
            .clone()
            .or_else(|| config.organization.clone()),
        workspace: args.workspace.clone().or_else(|| config.workspace.clone()),
    }
}

fn confirm_retry(term: &Term, what: &str) -> Result<bool> {
    term.write_str(&format!(
        "{} {} ",
        bright_red(format!("Failed to load {what}.")),
        dim("Retry? [y/N]")
    ))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Offers a retry for every failed list. Returns whether anything was refetched.
async fn offer_retry(dashboard: &mut Dashboard) -> Result<bool> {
    let term = Term::stderr();
    let mut retried = false;

    if dashboard.pipelines().error().is_some() && confirm_retry(&term, "pipelines")? {
        let spinner = LoadingSpinner::start("pipelines");
        dashboard.retry_pipelines().await;
        spinner.finish("pipelines", dashboard.pipelines().error().is_none());
        retried = true;
    }

    if dashboard.runs().error().is_some() && confirm_retry(&term, "runs")? {
        let spinner = LoadingSpinner::start("runs");
        dashboard.retry_runs().await;
        spinner.finish("runs", dashboard.runs().error().is_none());
        retried = true;
    }

    Ok(retried)
}

impl Cli {
    fn write_output(&self, render: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
        if let Some(output_path) = &self.output {
            let mut file = std::fs::File::create(output_path)
                .with_context(|| format!("Failed to create {}", output_path.display()))?;
            render(&mut file)?;
            info!("Output written to: {}", output_path.display());
        } else {
            let mut stdout = std::io::stdout().lock();
            render(&mut stdout)?;
        }
        Ok(())
    }

    async fn execute_serve(&self, args: &ServeArgs, config: &Config) -> Result<()> {
        let settings = relay_settings(args, &config.relay);
        info!(
            "Starting relay in {:?} mode on port {}",
            settings.mode, settings.port
        );

        Relay::new(settings)?.run().await?;
        Ok(())
    }

    async fn execute_dashboard(&self, args: &DashboardArgs, config: &Config) -> Result<()> {
        let relay_url = args
            .relay_url
            .clone()
            .unwrap_or_else(|| config.dashboard.relay_url.clone());
        let host_config = args
            .host_config
            .clone()
            .or_else(|| config.dashboard.host_config.clone());

        let provider = select_provider(host_config, env_provider(args, &config.dashboard));
        let format = args.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;
        let interactive = format == OutputFormat::Table && self.output.is_none();

        let options = RenderOptions {
            web_url: args
                .web_url
                .clone()
                .unwrap_or_else(|| config.dashboard.web_url.clone()),
            display: DisplayContext::for_relay(
                &Url::parse(&relay_url)
                    .with_context(|| format!("Invalid relay URL: {relay_url}"))?,
            ),
            now: Utc::now(),
        };

        let (client, credentials) = loop {
            let error = match initialize(provider.as_ref(), &relay_url).await {
                Ok(session) => break session,
                Err(e) => e,
            };
            warn!("Dashboard initialization failed: {error}");

            let message = error.to_string();
            if !interactive {
                self.write_output(|out| {
                    export_init_failure(&message, &options, format, pretty, out)
                })?;
                return Err(error.into());
            }

            print_init_failure(&message);
            if !console::user_attended() || !confirm_retry(&Term::stderr(), "configuration")? {
                return Err(error.into());
            }
        };

        let runs_limit = args.runs_limit.unwrap_or(config.dashboard.runs_limit);
        let mut dashboard = Dashboard::new(client, credentials, runs_limit);

        let spinner = LoadingSpinner::start("pipelines and runs");
        dashboard.load().await;
        spinner.finish(
            "pipelines and runs",
            dashboard.pipelines().error().is_none() && dashboard.runs().error().is_none(),
        );

        if interactive {
            loop {
                print_dashboard(&dashboard.view(), &options);
                if !console::user_attended() || !offer_retry(&mut dashboard).await? {
                    break;
                }
            }
            return Ok(());
        }

        self.write_output(|out| export_dashboard(&dashboard.view(), &options, format, pretty, out))
    }

    async fn execute_resolve(&self, args: &ResolveArgs, config: &Config) -> Result<()> {
        let relay_url = args
            .relay_url
            .clone()
            .unwrap_or_else(|| config.dashboard.relay_url.clone());
        let token = args
            .token
            .as_deref()
            .map(Token::from)
            .filter(|token| !token.is_empty())
            .ok_or(DashboardError::MissingCredentials)?;

        info!(
            "Resolving workspace '{}' in organization '{}'",
            args.workspace, args.organization
        );

        let client = SeqeraClient::new(&relay_url, token)?;
        let workspace_id = resolve_workspace_id(&client, &args.organization, &args.workspace).await?;

        self.write_output(|out| {
            writeln!(out, "{workspace_id}")?;
            Ok(())
        })
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Serve(args) => self.execute_serve(args, &config).await,
            Commands::Dashboard(args) => self.execute_dashboard(args, &config).await,
            Commands::Resolve(args) => self.execute_resolve(args, &config).await,
        }
    }
}

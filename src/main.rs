mod auth;
mod cli;
mod config;
mod dashboard;
mod error;
mod output;
mod relay;
mod seqera;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting SeqDash");
    cli.execute().await?;

    Ok(())
}

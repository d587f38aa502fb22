use anyhow::Result;
use clap::Parser;
use colored::*;

use dedup_cli::cli::{Cli, commands};
use dedup_cli::config::Config;

#[tokio::main]
async fn main() {
    // Load .env before reading DEDUP_API_URL or RUST_LOG
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        log::debug!("Using backend URL from --api-url: {}", url);
        config.api.base_url = url;
    }

    commands::execute(cli.command, &config).await
}

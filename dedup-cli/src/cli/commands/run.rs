//! `run`: configure a session from a plan file and process it

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::api::DedupClient;
use crate::cli::plan::Plan;
use crate::cli::render::{format_session, format_summary};
use crate::config::Config;
use crate::session::{Console, ConsoleError};

pub async fn handle_run(
    client: DedupClient,
    config: &Config,
    plan_path: &Path,
    dry_run: bool,
) -> Result<()> {
    let plan = Plan::load(plan_path)?;
    println!(
        "Running plan {} for {} ({} mode)",
        plan_path.display().to_string().cyan(),
        plan.entity.bold(),
        plan.mode
    );

    let mut console = Console::new(client, &config.fetch);
    plan.apply(&mut console).await?;
    print!("{}", format_session(console.state()));

    if dry_run {
        let request = console
            .build_request()
            .context("Configuration is not ready for processing")?;
        println!();
        println!("{}", "Request (dry run, nothing submitted):".bold());
        println!(
            "{}",
            serde_json::to_string_pretty(&request).context("Failed to format request")?
        );
        return Ok(());
    }

    let summaries = match console.submit().await {
        Ok(summaries) => summaries,
        Err(ConsoleError::Incomplete {
            completed,
            failed,
            cause,
        }) => {
            println!();
            for summary in &completed {
                print!("{}", format_summary(summary));
            }
            println!(
                "{} {} file(s) processed before {} failed",
                "Partial run:".yellow().bold(),
                completed.len(),
                failed.bold()
            );
            return Err(
                anyhow::Error::new(*cause).context(format!("Processing {} failed", failed))
            );
        }
        Err(err) => return Err(anyhow::Error::new(err).context("Processing failed")),
    };
    println!();
    for summary in &summaries {
        print!("{}", format_summary(summary));
    }

    let limiter = console.limiter().stats();
    log::debug!(
        "Fetch limiter: {} acquired, {} waited (max {})",
        limiter.acquired,
        limiter.waited,
        limiter.max_concurrent
    );
    Ok(())
}

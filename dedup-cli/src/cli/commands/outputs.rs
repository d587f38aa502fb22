//! Processed output management: download, delete, clear

use anyhow::{Context, Result, bail};
use colored::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::api::{DedupBackend, DedupClient};
use crate::config::Config;
use crate::session::{Console, ConsoleError};

pub async fn handle_download(
    client: &DedupClient,
    filename: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let bytes = client
        .download(filename)
        .await
        .with_context(|| format!("Failed to download {}", filename))?;

    let path = output.unwrap_or_else(|| PathBuf::from(filename));
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "Saved {} ({} bytes) to {}",
        filename.bold(),
        bytes.len(),
        path.display().to_string().bright_green()
    );
    Ok(())
}

pub async fn handle_delete_output(
    client: DedupClient,
    config: &Config,
    entity: &str,
    source_system: &str,
    filename: &str,
) -> Result<()> {
    let mut console = Console::new(client, &config.fetch);
    console.select_entity(entity).await?;

    let response = match console.delete_output(source_system, filename).await {
        Err(ConsoleError::Network(err)) if err.is_not_found() => bail!(
            "{}/{} is not a processed output of {}; `outputs {}` lists them",
            source_system,
            filename,
            entity,
            entity
        ),
        result => {
            result.with_context(|| format!("Failed to delete {}/{}", source_system, filename))?
        }
    };

    println!("{} {}", "✓".bright_green().bold(), response.message);
    let remaining: usize = console
        .state()
        .processed_outputs()
        .values()
        .map(Vec::len)
        .sum();
    println!("  {} processed outputs remain for {}", remaining, entity.cyan());
    Ok(())
}

pub async fn handle_clear_outputs(
    client: DedupClient,
    config: &Config,
    entity: &str,
    yes: bool,
) -> Result<()> {
    let existing = client
        .list_processed_outputs(entity)
        .await
        .with_context(|| format!("Failed to list processed outputs of '{}'", entity))?;
    let count: usize = existing.values().map(Vec::len).sum();
    if count == 0 {
        println!("No processed outputs to clear for {}", entity.cyan());
        return Ok(());
    }

    if !yes && !confirm(&format!(
        "Delete {} processed output(s) for {}?",
        count, entity
    ))? {
        bail!("Aborted");
    }

    let mut console = Console::new(client, &config.fetch);
    console.select_entity(entity).await?;
    let response = console
        .clear_outputs()
        .await
        .with_context(|| format!("Failed to clear processed outputs of '{}'", entity))?;

    println!("{} {}", "✓".bright_green().bold(), response.message);
    for file in &response.deleted_files {
        println!("  {} {}", "-".red(), file);
    }
    Ok(())
}

/// Ask a yes/no question on stdin; anything but y/yes is a no
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question.yellow());
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

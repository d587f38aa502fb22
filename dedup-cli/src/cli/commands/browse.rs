//! Read-only commands: entities, systems, files, outputs, columns, health

use anyhow::{Context, Result};
use colored::*;

use crate::api::{DedupBackend, DedupClient};
use crate::cli::render::{format_health, format_list, format_outputs};
use crate::session::populate::fetch_columns;
use crate::session::FileDescriptor;

pub async fn handle_entities(client: &DedupClient) -> Result<()> {
    let entities = client
        .list_entities()
        .await
        .context("Failed to list entities")?;
    print!("{}", format_list("Entities", &entities));
    Ok(())
}

pub async fn handle_systems(client: &DedupClient, entity: &str) -> Result<()> {
    let systems = client
        .list_source_systems(entity)
        .await
        .with_context(|| format!("Failed to list source systems of '{}'", entity))?;
    print!(
        "{}",
        format_list(&format!("Source systems for {}", entity), &systems)
    );
    Ok(())
}

pub async fn handle_files(client: &DedupClient, entity: &str, source_system: &str) -> Result<()> {
    let files = client
        .list_files(entity, source_system)
        .await
        .with_context(|| format!("Failed to list files of {}/{}", entity, source_system))?;
    print!(
        "{}",
        format_list(&format!("Source files for {}/{}", entity, source_system), &files)
    );
    Ok(())
}

pub async fn handle_outputs(client: &DedupClient, entity: &str) -> Result<()> {
    let outputs = client
        .list_processed_outputs(entity)
        .await
        .with_context(|| format!("Failed to list processed outputs of '{}'", entity))?;
    print!("{}", format_outputs(entity, &outputs));
    Ok(())
}

pub async fn handle_columns(
    client: &DedupClient,
    entity: &str,
    source_system: &str,
    filename: &str,
    output: bool,
) -> Result<()> {
    let file = if output {
        FileDescriptor::output(filename)
    } else {
        FileDescriptor::source(filename)
    };
    let columns = fetch_columns(client, entity, source_system, &file).await?;
    print!(
        "{}",
        format_list(&format!("Columns of {}", file.display_name()), &columns)
    );
    Ok(())
}

pub async fn handle_health(client: &DedupClient) -> Result<()> {
    let report = client
        .health()
        .await
        .context("Failed to reach backend health endpoint")?;
    print!("{}", format_health(&report));

    if !report.is_healthy() {
        eprintln!(
            "{}",
            format!("Backend at {} is not healthy", client.base_url()).yellow()
        );
    }
    Ok(())
}

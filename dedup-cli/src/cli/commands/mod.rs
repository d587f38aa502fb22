//! Command handlers

pub mod browse;
pub mod outputs;
pub mod run;

use anyhow::{Context, Result};

use super::Commands;
use crate::api::DedupClient;
use crate::config::Config;

/// Dispatch a parsed command
pub async fn execute(command: Commands, config: &Config) -> Result<()> {
    let client = DedupClient::new(&config.api).context("Failed to create backend client")?;
    log::debug!("Using backend at {}", client.base_url());

    match command {
        Commands::Entities => browse::handle_entities(&client).await,
        Commands::Systems { entity } => browse::handle_systems(&client, &entity).await,
        Commands::Files {
            entity,
            source_system,
        } => browse::handle_files(&client, &entity, &source_system).await,
        Commands::Outputs { entity } => browse::handle_outputs(&client, &entity).await,
        Commands::Columns {
            entity,
            source_system,
            filename,
            output,
        } => browse::handle_columns(&client, &entity, &source_system, &filename, output).await,
        Commands::Health => browse::handle_health(&client).await,
        Commands::Download { filename, output } => {
            outputs::handle_download(&client, &filename, output).await
        }
        Commands::DeleteOutput {
            entity,
            source_system,
            filename,
        } => outputs::handle_delete_output(client, config, &entity, &source_system, &filename).await,
        Commands::ClearOutputs { entity, yes } => {
            outputs::handle_clear_outputs(client, config, &entity, yes).await
        }
        Commands::Run { plan, dry_run } => run::handle_run(client, config, &plan, dry_run).await,
    }
}

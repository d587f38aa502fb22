//! Console driver
//!
//! [`Console`] owns the session state and the backend. It performs the
//! network calls, feeds every completion back into the state as a [`Msg`]
//! and submits validated requests.

use futures::StreamExt;
use log::{debug, info, warn};
use std::time::Instant;

use super::error::{ConsoleError, ValidationError};
use super::file_config::{FileConfigId, FileDescriptor};
use super::msg::Msg;
use super::populate::{PopulationContext, fetch_columns, populate};
use super::state::{ProcessingMode, SessionState, Update};
use super::summary::ProcessingSummary;
use crate::api::models::{
    ClearOutputsResponse, DeleteOutputResponse, HealthReport, ProcessedOutputs,
    ProcessingRequest, SingleFileRequest,
};
use crate::api::{DedupBackend, FetchLimiter};
use crate::config::FetchConfig;

pub struct Console<B> {
    backend: B,
    limiter: FetchLimiter,
    state: SessionState,
}

impl<B: DedupBackend> Console<B> {
    pub fn new(backend: B, fetch: &FetchConfig) -> Self {
        Self {
            backend,
            limiter: FetchLimiter::new(fetch),
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Direct access for mapping edits (toggles, thresholds, removals)
    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    fn entity(&self) -> Result<String, ConsoleError> {
        self.state
            .entity()
            .map(str::to_string)
            .ok_or(ConsoleError::NoEntitySelected)
    }

    pub async fn load_entities(&self) -> Result<Vec<String>, ConsoleError> {
        Ok(self.backend.list_entities().await?)
    }

    /// Select an entity, resetting the session, then load its source systems
    /// and processed outputs
    pub async fn select_entity(&mut self, entity: &str) -> Result<(), ConsoleError> {
        let generation = self.state.set_entity(entity);

        let systems = self.backend.list_source_systems(entity).await?;
        info!("Entity '{}' has {} source systems", entity, systems.len());
        self.apply(Msg::SourceSystemsLoaded {
            generation,
            systems,
        })
        .await?;

        self.refresh_processed_outputs().await
    }

    /// Switch mode; entering cross-system mode runs auto-population
    pub async fn set_mode(&mut self, mode: ProcessingMode) -> Result<(), ConsoleError> {
        self.entity()?;
        self.state.set_mode(mode);
        if mode.is_cross_system() {
            self.auto_populate().await?;
        }
        Ok(())
    }

    /// Reload processed outputs; a failed listing counts as no outputs
    pub async fn refresh_processed_outputs(&mut self) -> Result<(), ConsoleError> {
        let entity = self.entity()?;
        let generation = self.state.generation();

        let outputs = match self.backend.list_processed_outputs(&entity).await {
            Ok(outputs) => outputs,
            Err(err) => {
                warn!("Failed to load processed outputs for '{}': {}", entity, err);
                ProcessedOutputs::new()
            }
        };

        self.apply(Msg::ProcessedOutputsLoaded {
            generation,
            outputs,
        })
        .await?;
        Ok(())
    }

    async fn apply(&mut self, msg: Msg) -> Result<Update, ConsoleError> {
        let update = self.state.update(msg)?;
        if update == Update::PopulationNeeded {
            self.auto_populate().await?;
        }
        Ok(update)
    }

    /// Rebuild the file list with one configuration per source system
    ///
    /// Returns the number of configurations in the rebuilt list.
    async fn auto_populate(&mut self) -> Result<usize, ConsoleError> {
        let entity = self.entity()?;
        let generation = self.state.begin_population();
        let context = PopulationContext {
            entity,
            source_systems: self.state.source_systems().to_vec(),
            processed_outputs: self.state.processed_outputs().clone(),
            generation,
        };

        let mut completions = populate(&self.backend, &self.limiter, context);
        while let Some(msg) = completions.next().await {
            if let Err(err) = self.state.update(msg) {
                warn!("Auto-population result rejected: {}", err);
            }
        }

        self.state.finish_population(generation);
        Ok(self.state.files().len())
    }

    // === File configuration list ===

    /// Fetch the file's columns and append a configuration for it
    pub async fn add_file(
        &mut self,
        source_system: &str,
        file: FileDescriptor,
    ) -> Result<FileConfigId, ConsoleError> {
        let entity = self.entity()?;
        self.state.ensure_absent(source_system, &file)?;

        let generation = self.state.generation();
        let result = fetch_columns(&self.backend, &entity, source_system, &file).await;
        let display_name = file.display_name();

        match self.state.update(Msg::FileLoaded {
            generation,
            source_system: source_system.to_string(),
            file,
            result,
        })? {
            Update::Added(id) => {
                info!("Added {}/{}", source_system, display_name);
                Ok(id)
            }
            _ => Err(ConsoleError::Superseded),
        }
    }

    /// Point a configuration at another file; its mapping is reset
    ///
    /// On failure the entry is left unchanged.
    pub async fn switch_file_kind(
        &mut self,
        id: &FileConfigId,
        file: FileDescriptor,
    ) -> Result<(), ConsoleError> {
        let entity = self.entity()?;
        let entry = self
            .state
            .file(id)
            .ok_or_else(|| ConsoleError::UnknownConfig(id.clone()))?;
        let source_system = entry.source_system.clone();
        if let Some(alternatives) = &entry.alternatives {
            if !alternatives.contains(&file) {
                warn!(
                    "{} is not among the files listed for {}",
                    file.display_name(),
                    source_system
                );
            }
        }
        if entry.filename() != file.name {
            self.state.ensure_absent(&source_system, &file)?;
        }

        let generation = self.state.generation();
        let result = fetch_columns(&self.backend, &entity, &source_system, &file).await;
        debug!("Switching {} to {}", id, file.display_name());

        match self.state.update(Msg::FileSwitched {
            generation,
            id: id.clone(),
            file,
            result,
        })? {
            Update::Stale => Err(ConsoleError::Superseded),
            _ => Ok(()),
        }
    }

    /// Enter cross-system mode (if needed) and add a processed output to it
    pub async fn use_in_cross_system(
        &mut self,
        source_system: &str,
        output_file: &str,
    ) -> Result<FileConfigId, ConsoleError> {
        if !self.state.mode().is_cross_system() {
            self.set_mode(ProcessingMode::CrossSystem).await?;
        }
        self.add_file(source_system, FileDescriptor::output(output_file))
            .await
    }

    // === Submission ===

    pub fn build_request(&self) -> Result<ProcessingRequest, ConsoleError> {
        self.state.build_request()
    }

    /// Validate and submit the whole configuration
    ///
    /// Cross-system mode sends one combined request. Independent mode sends
    /// one single-file request per configuration, in list order, and stops
    /// at the first failure. Processed outputs are refreshed either way; a
    /// failure after some files succeeded is reported as
    /// [`ConsoleError::Incomplete`] carrying their summaries.
    pub async fn submit(&mut self) -> Result<Vec<ProcessingSummary>, ConsoleError> {
        let request = self.state.build_request()?;

        match self.state.mode() {
            ProcessingMode::CrossSystem => {
                info!(
                    "Submitting cross-system run over {} files",
                    request.file_configs.len()
                );
                let started = Instant::now();
                let response = self.backend.process_cross_system(&request).await?;
                Ok(vec![ProcessingSummary::from_cross_system(
                    &request,
                    response,
                    started.elapsed(),
                )])
            }
            ProcessingMode::Independent => {
                let mut summaries = Vec::with_capacity(request.file_configs.len());
                for payload in &request.file_configs {
                    let single = SingleFileRequest::from_payload(&request.entity, payload);
                    let failed = format!("{}/{}", single.source_system, single.filename);
                    match self.process_single(single).await {
                        Ok(summary) => summaries.push(summary),
                        Err(err) => {
                            if let Err(refresh) = self.refresh_processed_outputs().await {
                                warn!("Could not refresh processed outputs: {}", refresh);
                            }
                            if summaries.is_empty() {
                                return Err(err);
                            }
                            return Err(ConsoleError::Incomplete {
                                completed: summaries,
                                failed,
                                cause: Box::new(err),
                            });
                        }
                    }
                }
                self.refresh_processed_outputs().await?;
                Ok(summaries)
            }
        }
    }

    /// Process one configuration on its own with its own mapping
    pub async fn process_file(
        &mut self,
        id: &FileConfigId,
    ) -> Result<ProcessingSummary, ConsoleError> {
        let entity = self.entity()?;
        let entry = self
            .state
            .file(id)
            .ok_or_else(|| ConsoleError::UnknownConfig(id.clone()))?;
        if entry.mapping.is_empty() {
            return Err(ValidationError::MissingMapping {
                files: vec![(entry.source_system.clone(), entry.filename().to_string())],
            }
            .into());
        }

        let single = SingleFileRequest::from_payload(&entity, &entry.to_payload(true));
        let summary = self.process_single(single).await?;
        self.refresh_processed_outputs().await?;
        Ok(summary)
    }

    async fn process_single(
        &self,
        request: SingleFileRequest,
    ) -> Result<ProcessingSummary, ConsoleError> {
        info!(
            "Processing {}/{} ({} fuzzy, {} exact)",
            request.source_system,
            request.filename,
            request.fuzzy_columns.len(),
            request.exact_columns.len()
        );
        let started = Instant::now();
        let response = self.backend.process_single(&request).await?;
        Ok(ProcessingSummary::from_single(
            &request,
            response,
            started.elapsed(),
        ))
    }

    // === Processed outputs ===

    pub async fn delete_output(
        &mut self,
        source_system: &str,
        filename: &str,
    ) -> Result<DeleteOutputResponse, ConsoleError> {
        let entity = self.entity()?;
        let response = self
            .backend
            .delete_output(&entity, source_system, filename)
            .await?;
        info!("Deleted processed output {}/{}", source_system, filename);
        self.refresh_processed_outputs().await?;
        Ok(response)
    }

    pub async fn clear_outputs(&mut self) -> Result<ClearOutputsResponse, ConsoleError> {
        let entity = self.entity()?;
        let response = self.backend.delete_processed_outputs(&entity).await?;
        info!(
            "Cleared {} processed outputs for '{}'",
            response.deleted_files.len(),
            entity
        );
        self.refresh_processed_outputs().await?;
        Ok(response)
    }

    pub async fn download(&self, filename: &str) -> Result<Vec<u8>, ConsoleError> {
        Ok(self.backend.download(filename).await?)
    }

    pub async fn health(&self) -> Result<HealthReport, ConsoleError> {
        Ok(self.backend.health().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::FileKind;
    use crate::session::fake::FakeBackend;

    fn console(backend: FakeBackend) -> Console<FakeBackend> {
        Console::new(backend, &FetchConfig { max_concurrent: 4 })
    }

    fn claims_backend() -> FakeBackend {
        FakeBackend::new()
            .with_system("Claims", "SYS1", &["file1.xlsx", "file1b.xlsx"])
            .with_system("Claims", "SYS2", &["file2.xlsx"])
            .with_columns("file1.xlsx", &["id", "name", "dob"])
            .with_columns("file1b.xlsx", &["id", "name"])
            .with_columns("file2.xlsx", &["id", "name"])
            .with_columns("SYS1_Output.xlsx", &["id", "name", "group_id"])
    }

    #[tokio::test]
    async fn test_operations_need_entity() {
        let mut console = console(claims_backend());
        let err = console
            .add_file("SYS1", FileDescriptor::source("file1.xlsx"))
            .await
            .unwrap_err();
        assert_eq!(err, ConsoleError::NoEntitySelected);
        assert_eq!(
            console.set_mode(ProcessingMode::CrossSystem).await.unwrap_err(),
            ConsoleError::NoEntitySelected
        );
    }

    #[tokio::test]
    async fn test_add_file_and_duplicate() {
        let mut console = console(claims_backend());
        console.select_entity("Claims").await.unwrap();
        assert_eq!(console.state().source_systems().len(), 2);

        let id = console
            .add_file("SYS1", FileDescriptor::source("file1.xlsx"))
            .await
            .unwrap();
        assert_eq!(console.state().file(&id).unwrap().columns.len(), 3);

        let fetches_before = console.backend().column_fetches.lock().unwrap().len();
        let err = console
            .add_file("SYS1", FileDescriptor::source("file1.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::DuplicateConfig { .. }));
        // Rejected before any network call
        assert_eq!(
            console.backend().column_fetches.lock().unwrap().len(),
            fetches_before
        );
    }

    #[tokio::test]
    async fn test_add_file_without_columns_fails() {
        let backend = claims_backend().with_columns("blank.xlsx", &[]);
        let mut console = console(backend);
        console.select_entity("Claims").await.unwrap();

        let err = console
            .add_file("SYS1", FileDescriptor::source("blank.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::ColumnFetch { .. }));
        assert!(console.state().files().is_empty());
    }

    #[tokio::test]
    async fn test_cross_system_auto_population() {
        let backend = claims_backend()
            .with_system("Claims", "SYS3", &[])
            .with_system("Claims", "SYS4", &["file4.xlsx"])
            .failing("SYS4")
            .with_delay("SYS1", 30);
        let mut console = console(backend);
        console.select_entity("Claims").await.unwrap();
        console.set_mode(ProcessingMode::CrossSystem).await.unwrap();

        let files: Vec<(&str, &str)> = console
            .state()
            .files()
            .iter()
            .map(|c| (c.source_system.as_str(), c.filename()))
            .collect();
        // SYS3 has nothing to offer, SYS4 fails; SYS1 stays first despite its delay
        assert_eq!(files, vec![("SYS1", "file1.xlsx"), ("SYS2", "file2.xlsx")]);
        assert_eq!(
            console.state().available_columns(),
            &["id".to_string(), "name".to_string(), "dob".to_string()][..]
        );

        let first = console.state().files().iter().next().unwrap();
        let alternatives = first.alternatives.as_ref().unwrap();
        assert_eq!(alternatives.source_files.len(), 2);
    }

    #[tokio::test]
    async fn test_cross_system_submit() {
        let mut console = console(claims_backend());
        console.select_entity("Claims").await.unwrap();
        console.set_mode(ProcessingMode::CrossSystem).await.unwrap();

        let err = console.submit().await.unwrap_err();
        assert_eq!(
            err,
            ConsoleError::Validation(ValidationError::MissingGlobalMapping)
        );

        let state = console.state_mut();
        assert!(state.toggle_global_fuzzy("name"));
        assert!(state.set_global_threshold("name", "85"));
        assert!(state.toggle_global_exact("id"));

        let summaries = console.submit().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].files_processed, 2);

        let requests = console.backend().cross_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].global_thresholds.get("name"), Some(&85));
        assert!(requests[0].file_configs.iter().all(|f| f.fuzzy_columns.is_empty()));
    }

    #[tokio::test]
    async fn test_independent_submit_in_list_order() {
        let mut console = console(claims_backend());
        console.select_entity("Claims").await.unwrap();
        let a = console
            .add_file("SYS2", FileDescriptor::source("file2.xlsx"))
            .await
            .unwrap();
        let b = console
            .add_file("SYS1", FileDescriptor::source("file1.xlsx"))
            .await
            .unwrap();

        assert!(console.state_mut().toggle_exact(&a, "id"));
        assert!(matches!(
            console.submit().await.unwrap_err(),
            ConsoleError::Validation(ValidationError::MissingMapping { .. })
        ));

        assert!(console.state_mut().toggle_fuzzy(&b, "name"));
        let summaries = console.submit().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].subject, "SYS2/file2.xlsx");

        let requests = console.backend().single_requests.lock().unwrap();
        let order: Vec<&str> = requests.iter().map(|r| r.source_system.as_str()).collect();
        assert_eq!(order, vec!["SYS2", "SYS1"]);
        drop(requests);

        // Outputs registered by processing are picked up
        let outputs = console.state().processed_outputs();
        assert_eq!(outputs.get("SYS1"), Some(&vec!["SYS1_Output.xlsx".to_string()]));
    }

    #[tokio::test]
    async fn test_submit_network_failure() {
        let mut console = console(claims_backend().failing_processing());
        console.select_entity("Claims").await.unwrap();
        let id = console
            .add_file("SYS1", FileDescriptor::source("file1.xlsx"))
            .await
            .unwrap();
        console.state_mut().toggle_exact(&id, "id");

        let err = console.submit().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Network(_)));
    }

    #[tokio::test]
    async fn test_independent_submit_keeps_completed_on_failure() {
        let mut console = console(claims_backend().failing_single("SYS2"));
        console.select_entity("Claims").await.unwrap();
        let a = console
            .add_file("SYS1", FileDescriptor::source("file1.xlsx"))
            .await
            .unwrap();
        let b = console
            .add_file("SYS2", FileDescriptor::source("file2.xlsx"))
            .await
            .unwrap();
        console.state_mut().toggle_exact(&a, "id");
        console.state_mut().toggle_exact(&b, "id");

        let err = console.submit().await.unwrap_err();
        match err {
            ConsoleError::Incomplete {
                completed,
                failed,
                cause,
            } => {
                assert_eq!(completed.len(), 1);
                assert_eq!(completed[0].subject, "SYS1/file1.xlsx");
                assert_eq!(failed, "SYS2/file2.xlsx");
                assert!(matches!(*cause, ConsoleError::Network(_)));
            }
            other => panic!("unexpected error {:?}", other),
        }

        // SYS1 registered its output before SYS2 failed
        assert_eq!(
            console.state().processed_outputs().get("SYS1"),
            Some(&vec!["SYS1_Output.xlsx".to_string()])
        );
    }

    #[tokio::test]
    async fn test_process_file_and_use_in_cross_system() {
        let mut console = console(claims_backend());
        console.select_entity("Claims").await.unwrap();
        let id = console
            .add_file("SYS1", FileDescriptor::source("file1.xlsx"))
            .await
            .unwrap();

        assert!(matches!(
            console.process_file(&id).await.unwrap_err(),
            ConsoleError::Validation(ValidationError::MissingMapping { .. })
        ));

        console.state_mut().toggle_fuzzy(&id, "name");
        let summary = console.process_file(&id).await.unwrap();
        assert_eq!(summary.output_files, vec!["SYS1_Output.xlsx".to_string()]);

        let added = console
            .use_in_cross_system("SYS1", "SYS1_Output.xlsx")
            .await
            .unwrap();
        assert!(console.state().mode().is_cross_system());
        let entry = console.state().file(&added).unwrap();
        assert_eq!(entry.kind(), FileKind::Output);
        // Population added SYS1 and SYS2, plus the extra output
        assert_eq!(console.state().files().len(), 3);
    }

    #[tokio::test]
    async fn test_switch_file_kind() {
        let backend = claims_backend().with_output("Claims", "SYS1", "SYS1_Output.xlsx");
        let mut console = console(backend);
        console.select_entity("Claims").await.unwrap();
        console.set_mode(ProcessingMode::CrossSystem).await.unwrap();

        let id = console.state().files().iter().next().unwrap().id.clone();
        console
            .switch_file_kind(&id, FileDescriptor::output("SYS1_Output.xlsx"))
            .await
            .unwrap();
        let entry = console.state().file(&id).unwrap();
        assert_eq!(entry.display_name(), "SYS1_Output.xlsx (Processed Output)");
        assert!(entry.has_column("group_id"));
        assert!(console.state().available_columns().contains(&"group_id".to_string()));

        // Unknown file: columns cannot be fetched and the entry is kept
        let err = console
            .switch_file_kind(&id, FileDescriptor::source("missing.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::ColumnFetch { .. }));
        assert_eq!(console.state().file(&id).unwrap().filename(), "SYS1_Output.xlsx");
    }

    #[tokio::test]
    async fn test_switch_to_unlisted_file_still_switches() {
        let mut console = console(claims_backend());
        console.select_entity("Claims").await.unwrap();
        console.set_mode(ProcessingMode::CrossSystem).await.unwrap();

        let id = console.state().files().iter().next().unwrap().id.clone();
        let unlisted = FileDescriptor::source("file2.xlsx");
        let entry = console.state().file(&id).unwrap();
        assert!(!entry.alternatives.as_ref().unwrap().contains(&unlisted));

        console.switch_file_kind(&id, unlisted).await.unwrap();
        let entry = console.state().file(&id).unwrap();
        assert_eq!(entry.filename(), "file2.xlsx");
        assert!(entry.alternatives.as_ref().unwrap().contains(&FileDescriptor::source("file1b.xlsx")));
    }

    #[tokio::test]
    async fn test_clear_outputs_repopulates() {
        let backend = claims_backend().with_output("Claims", "SYS3", "SYS3_Output.xlsx");
        let backend = backend
            .with_system("Claims", "SYS3", &[])
            .with_columns("SYS3_Output.xlsx", &["id"]);
        let mut console = console(backend);
        console.select_entity("Claims").await.unwrap();
        console.set_mode(ProcessingMode::CrossSystem).await.unwrap();
        assert_eq!(console.state().files().len(), 3);

        let response = console.clear_outputs().await.unwrap();
        assert_eq!(response.deleted_files, vec!["SYS3_Output.xlsx".to_string()]);
        assert!(console.state().processed_outputs().is_empty());
        // SYS3 only had a processed output, so it drops out
        assert_eq!(console.state().files().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_output() {
        let backend = claims_backend().with_output("Claims", "SYS1", "SYS1_Output.xlsx");
        let mut console = console(backend);
        console.select_entity("Claims").await.unwrap();
        assert_eq!(console.state().processed_outputs().len(), 1);

        console
            .delete_output("SYS1", "SYS1_Output.xlsx")
            .await
            .unwrap();
        assert_eq!(console.state().processed_outputs().get("SYS1"), None);
        assert!(console.state().processed_outputs().is_empty());

        let err = console
            .delete_output("SYS1", "SYS1_Output.xlsx")
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Network(ref api) if api.is_not_found()));
    }

    #[tokio::test]
    async fn test_select_entity_resets() {
        let mut console = console(claims_backend());
        console.select_entity("Claims").await.unwrap();
        console.set_mode(ProcessingMode::CrossSystem).await.unwrap();
        assert!(!console.state().files().is_empty());

        console.select_entity("Claims").await.unwrap();
        assert_eq!(console.state().mode(), ProcessingMode::Independent);
        assert!(console.state().files().is_empty());
        assert!(console.health().await.unwrap().is_healthy());
        assert_eq!(console.download("x.xlsx").await.unwrap(), b"x.xlsx".to_vec());
    }
}

//! Plan files for the `run` command
//!
//! A plan describes one configuration session in TOML: the entity, the
//! processing mode, the files to configure and the column mappings.

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::api::DedupBackend;
use crate::api::models::{FileKind, Thresholds};
use crate::session::mapping::parse_threshold;
use crate::session::{Console, FileDescriptor, ProcessingMode};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Plan {
    pub entity: String,
    #[serde(default)]
    pub mode: ProcessingMode,
    /// Files to configure; in cross-system mode they are added after
    /// auto-population and their mappings are ignored
    #[serde(default)]
    pub files: Vec<PlanFile>,
    /// Cross-system: pick another file for an auto-populated source system
    #[serde(default)]
    pub switch: Vec<PlanSwitch>,
    /// Cross-system mapping across all files
    #[serde(default)]
    pub global: Option<PlanMapping>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanFile {
    pub source_system: String,
    pub filename: String,
    #[serde(default)]
    pub kind: FileKind,
    #[serde(default)]
    pub fuzzy: Vec<String>,
    #[serde(default)]
    pub exact: Vec<String>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdValue>,
}

impl PlanFile {
    fn descriptor(&self) -> FileDescriptor {
        FileDescriptor::new(self.filename.clone(), self.kind)
    }

    fn has_mapping(&self) -> bool {
        !self.fuzzy.is_empty() || !self.exact.is_empty() || !self.thresholds.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanSwitch {
    pub source_system: String,
    pub filename: String,
    #[serde(default)]
    pub kind: FileKind,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlanMapping {
    #[serde(default)]
    pub fuzzy: Vec<String>,
    #[serde(default)]
    pub exact: Vec<String>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdValue>,
}

/// Threshold written either as a number or as text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Number(i64),
    Text(String),
}

impl ThresholdValue {
    /// Resolve the same way a typed threshold is: unparseable text becomes
    /// the default, numbers are clamped
    pub fn resolve(&self) -> i64 {
        match self {
            ThresholdValue::Number(value) => parse_threshold(&value.to_string()),
            ThresholdValue::Text(text) => parse_threshold(text),
        }
    }
}

fn resolve_thresholds(raw: &BTreeMap<String, ThresholdValue>) -> Thresholds {
    raw.iter()
        .map(|(column, value)| (column.clone(), value.resolve()))
        .collect()
}

/// Columns named in a mapping that are not in `available`
fn unknown_columns<'a>(
    fuzzy: &'a [String],
    exact: &'a [String],
    thresholds: &'a BTreeMap<String, ThresholdValue>,
    available: &[String],
) -> Vec<&'a str> {
    let mut unknown: Vec<&str> = fuzzy
        .iter()
        .chain(exact.iter())
        .chain(thresholds.keys())
        .filter(|c| !available.contains(c))
        .map(String::as_str)
        .collect();
    unknown.sort_unstable();
    unknown.dedup();
    unknown
}

impl Plan {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let plan: Plan = toml::from_str(content).context("Failed to parse plan TOML")?;
        if plan.entity.trim().is_empty() {
            bail!("Plan entity cannot be empty");
        }
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid plan file: {}", path.display()))
    }

    /// Drive `console` through the plan: select the entity, set the mode,
    /// add files and apply mappings
    pub async fn apply<B: DedupBackend>(&self, console: &mut Console<B>) -> Result<()> {
        console
            .select_entity(&self.entity)
            .await
            .with_context(|| format!("Failed to load entity '{}'", self.entity))?;

        match self.mode {
            ProcessingMode::Independent => self.apply_independent(console).await,
            ProcessingMode::CrossSystem => self.apply_cross_system(console).await,
        }
    }

    async fn apply_independent<B: DedupBackend>(&self, console: &mut Console<B>) -> Result<()> {
        if !self.switch.is_empty() || self.global.is_some() {
            warn!("Ignoring [[switch]] and [global] sections in independent mode");
        }

        for file in &self.files {
            let id = console
                .add_file(&file.source_system, file.descriptor())
                .await
                .with_context(|| {
                    format!("Failed to add {}/{}", file.source_system, file.filename)
                })?;

            let state = console.state_mut();
            let columns = state
                .file(&id)
                .map(|c| c.columns.clone())
                .unwrap_or_default();
            let unknown = unknown_columns(&file.fuzzy, &file.exact, &file.thresholds, &columns);
            if !unknown.is_empty() {
                bail!(
                    "{}/{} has no column(s): {}",
                    file.source_system,
                    file.filename,
                    unknown.join(", ")
                );
            }

            state.update_mapping(
                &id,
                &file.fuzzy,
                &file.exact,
                &resolve_thresholds(&file.thresholds),
            );
        }
        Ok(())
    }

    async fn apply_cross_system<B: DedupBackend>(&self, console: &mut Console<B>) -> Result<()> {
        console
            .set_mode(ProcessingMode::CrossSystem)
            .await
            .context("Failed to enter cross-system mode")?;
        info!(
            "Auto-populated {} source systems",
            console.state().files().len()
        );

        for switch in &self.switch {
            let existing = console
                .state()
                .files()
                .iter()
                .find(|c| c.source_system == switch.source_system)
                .map(|c| c.id.clone());
            let file = FileDescriptor::new(switch.filename.clone(), switch.kind);

            match existing {
                Some(id) => console.switch_file_kind(&id, file).await,
                None => console
                    .add_file(&switch.source_system, file)
                    .await
                    .map(|_| ()),
            }
            .with_context(|| {
                format!(
                    "Failed to switch {} to {}",
                    switch.source_system, switch.filename
                )
            })?;
        }

        for file in &self.files {
            if file.has_mapping() {
                warn!(
                    "Ignoring per-file mapping of {}/{} in cross-system mode",
                    file.source_system,
                    file.filename
                );
            }
            console
                .add_file(&file.source_system, file.descriptor())
                .await
                .with_context(|| {
                    format!("Failed to add {}/{}", file.source_system, file.filename)
                })?;
        }

        let global = self.global.clone().unwrap_or_default();
        let state = console.state_mut();
        let unknown = unknown_columns(
            &global.fuzzy,
            &global.exact,
            &global.thresholds,
            state.available_columns(),
        );
        if !unknown.is_empty() {
            bail!(
                "Global mapping names column(s) no file has: {}",
                unknown.join(", ")
            );
        }
        state.update_global_mapping(
            &global.fuzzy,
            &global.exact,
            &resolve_thresholds(&global.thresholds),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::session::fake::FakeBackend;

    const CROSS_PLAN: &str = r#"
        entity = "Claims"
        mode = "cross-system"

        [[switch]]
        source_system = "SYS2"
        filename = "SYS2_Output.xlsx"
        kind = "output"

        [global]
        fuzzy = ["name"]
        exact = ["id"]
        thresholds = { name = "88" }
    "#;

    fn backend() -> FakeBackend {
        FakeBackend::new()
            .with_system("Claims", "SYS1", &["file1.xlsx"])
            .with_system("Claims", "SYS2", &["file2.xlsx"])
            .with_output("Claims", "SYS2", "SYS2_Output.xlsx")
            .with_columns("file1.xlsx", &["id", "name", "dob"])
            .with_columns("file2.xlsx", &["id", "name"])
            .with_columns("SYS2_Output.xlsx", &["id", "name", "group_id"])
    }

    fn console() -> Console<FakeBackend> {
        Console::new(backend(), &FetchConfig::default())
    }

    #[test]
    fn test_parse_cross_plan() {
        let plan = Plan::from_toml_str(CROSS_PLAN).unwrap();
        assert_eq!(plan.mode, ProcessingMode::CrossSystem);
        assert_eq!(plan.switch.len(), 1);
        assert_eq!(plan.switch[0].kind, FileKind::Output);

        let global = plan.global.unwrap();
        assert_eq!(
            global.thresholds.get("name"),
            Some(&ThresholdValue::Text("88".to_string()))
        );
    }

    #[test]
    fn test_parse_defaults() {
        let plan = Plan::from_toml_str(
            r#"
            entity = "Claims"

            [[files]]
            source_system = "SYS1"
            filename = "file1.xlsx"
            fuzzy = ["name"]
            thresholds = { name = 85 }
            "#,
        )
        .unwrap();
        assert_eq!(plan.mode, ProcessingMode::Independent);
        assert_eq!(plan.files[0].kind, FileKind::Source);
        assert_eq!(
            plan.files[0].thresholds.get("name"),
            Some(&ThresholdValue::Number(85))
        );
        assert!(plan.global.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_plans() {
        assert!(Plan::from_toml_str("entity = \"\"").is_err());
        assert!(Plan::from_toml_str("entity = \"Claims\"\nmode = \"both\"").is_err());
    }

    #[test]
    fn test_threshold_values_resolve() {
        assert_eq!(ThresholdValue::Number(85).resolve(), 85);
        assert_eq!(ThresholdValue::Number(250).resolve(), 100);
        assert_eq!(ThresholdValue::Text("70".to_string()).resolve(), 70);
        assert_eq!(ThresholdValue::Text("high".to_string()).resolve(), 90);
    }

    #[tokio::test]
    async fn test_apply_cross_plan() {
        let plan = Plan::from_toml_str(CROSS_PLAN).unwrap();
        let mut console = console();
        plan.apply(&mut console).await.unwrap();

        let request = console.build_request().unwrap();
        assert_eq!(request.file_configs.len(), 2);
        assert_eq!(request.file_configs[1].filename, "SYS2_Output.xlsx");
        assert_eq!(request.file_configs[1].file_type, FileKind::Output);
        assert_eq!(request.global_fuzzy_columns, vec!["name".to_string()]);
        assert_eq!(request.global_thresholds.get("name"), Some(&88));
    }

    #[tokio::test]
    async fn test_apply_independent_plan() {
        let plan = Plan::from_toml_str(
            r#"
            entity = "Claims"

            [[files]]
            source_system = "SYS1"
            filename = "file1.xlsx"
            fuzzy = ["name"]
            exact = ["id"]
            thresholds = { name = 85 }
            "#,
        )
        .unwrap();
        let mut console = console();
        plan.apply(&mut console).await.unwrap();

        let request = console.build_request().unwrap();
        let file = &request.file_configs[0];
        assert_eq!(file.fuzzy_columns, vec!["name".to_string()]);
        assert_eq!(file.exact_columns, vec!["id".to_string()]);
        assert_eq!(file.thresholds.get("name"), Some(&85));
        assert!(request.global_fuzzy_columns.is_empty());
    }

    #[tokio::test]
    async fn test_apply_rejects_unknown_columns() {
        let plan = Plan::from_toml_str(
            r#"
            entity = "Claims"
            mode = "cross-system"

            [global]
            fuzzy = ["surname"]
            "#,
        )
        .unwrap();
        let mut console = console();
        let err = plan.apply(&mut console).await.unwrap_err();
        assert!(err.to_string().contains("surname"));
    }
}

//! Terminal rendering of console state and results

use colored::*;

use crate::api::models::{HealthReport, HealthStatus, ProcessedOutputs};
use crate::session::{ColumnRole, ProcessingSummary, SessionState};

/// Numbered list, or a dimmed placeholder when empty
pub fn format_list(title: &str, items: &[String]) -> String {
    let mut out = format!("{} ({})\n", title.bold(), items.len());
    if items.is_empty() {
        out.push_str(&format!("  {}\n", "none".dimmed()));
    }
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("  {:>3}. {}\n", index + 1, item));
    }
    out
}

pub fn format_outputs(entity: &str, outputs: &ProcessedOutputs) -> String {
    let total: usize = outputs.values().map(Vec::len).sum();
    let mut out = format!(
        "{} {} ({})\n",
        "Processed outputs for".bold(),
        entity.cyan(),
        total
    );
    if total == 0 {
        out.push_str(&format!("  {}\n", "none".dimmed()));
    }
    for (system, files) in outputs.iter().filter(|(_, files)| !files.is_empty()) {
        out.push_str(&format!("  {}\n", system.bright_blue().bold()));
        for file in files {
            out.push_str(&format!("    {}\n", file));
        }
    }
    out
}

/// File configurations with each column's role, plus the global mapping in
/// cross-system mode
pub fn format_session(state: &SessionState) -> String {
    let mut out = format!(
        "{} {} ({} mode, {} files)\n",
        "Entity".bold(),
        state.entity().unwrap_or("-").cyan(),
        state.mode(),
        state.files().len()
    );
    let cross_system = state.mode().is_cross_system();

    for config in state.files() {
        out.push_str(&format!(
            "  {} {}\n",
            config.source_system.bright_blue().bold(),
            config.display_name()
        ));
        if cross_system {
            if let Some(alternatives) = &config.alternatives {
                let others = alternatives
                    .descriptors()
                    .into_iter()
                    .filter(|d| d != &config.file)
                    .count();
                if others > 0 {
                    out.push_str(&format!(
                        "    {}\n",
                        format!("{} other file(s) available", others).dimmed()
                    ));
                }
            }
            continue;
        }
        for column in &config.columns {
            out.push_str(&format!(
                "    {:<30} {}\n",
                column,
                format_role(config.mapping.role(column))
            ));
        }
    }

    if cross_system {
        out.push_str(&format!(
            "{} ({} available columns)\n",
            "Global mapping".bold(),
            state.available_columns().len()
        ));
        for column in state.available_columns() {
            let role = state.global().role(column);
            if role != ColumnRole::Unused {
                out.push_str(&format!("    {:<30} {}\n", column, format_role(role)));
            }
        }
    }
    out
}

fn format_role(role: ColumnRole) -> String {
    match role {
        ColumnRole::Unused => "-".dimmed().to_string(),
        ColumnRole::Fuzzy { threshold } => format!("{} ({})", "fuzzy".yellow(), threshold),
        ColumnRole::Exact => "exact".green().to_string(),
    }
}

pub fn format_summary(summary: &ProcessingSummary) -> String {
    let mut out = format!(
        "{} {} [{}]\n",
        "✓".bright_green().bold(),
        summary.subject.bold(),
        summary.mode
    );
    if !summary.message.is_empty() {
        out.push_str(&format!("  {}\n", summary.message));
    }
    for file in &summary.output_files {
        out.push_str(&format!("  Output: {}\n", file.bright_green()));
    }

    let mut line = |label: &str, value: String| {
        out.push_str(&format!("  {:<18} {}\n", label.dimmed(), value));
    };

    line("Files processed", summary.files_processed.to_string());
    if let Some(total) = summary.total_records {
        line("Total records", total.to_string());
    }
    if let Some(kept) = summary.final_records {
        let reduction = summary
            .reduction_percent()
            .map(|p| format!(" ({:.1}% removed)", p))
            .unwrap_or_default();
        line("Final records", format!("{}{}", kept, reduction));
    }
    if let Some(groups) = summary.duplicate_groups {
        line("Duplicate groups", groups.to_string());
    }
    if let Some(found) = summary.duplicates_found {
        line("Duplicates found", found.to_string());
    }
    if !summary.fuzzy_columns.is_empty() {
        line("Fuzzy columns", summary.fuzzy_columns.join(", "));
    }
    if !summary.exact_columns.is_empty() {
        line("Exact columns", summary.exact_columns.join(", "));
    }
    if let Some(size) = summary.file_size_mb {
        line("File size", format!("{:.2} MB", size));
    }
    if let Some(memory) = summary.memory_used_mb {
        line("Memory used", format!("{:.2} MB", memory));
    }
    if let Some(rate) = summary
        .performance
        .as_ref()
        .and_then(|p| p.records_per_second)
    {
        line("Throughput", format!("{:.0} records/s", rate));
    }
    if let Some(backend) = summary.backend_time_ms {
        line("Backend time", format!("{} ms", backend));
    }
    line("Elapsed", format!("{} ms", summary.elapsed_ms));
    out
}

pub fn format_health(report: &HealthReport) -> String {
    let status = match report.status {
        HealthStatus::Healthy => "healthy".bright_green().bold(),
        HealthStatus::Warning => "warning".yellow().bold(),
        HealthStatus::Error => "error".red().bold(),
        HealthStatus::Unknown => "unknown".dimmed(),
    };
    let mut out = format!("{} {}\n", "Backend status:".bold(), status);
    if let Some(timestamp) = report.timestamp {
        out.push_str(&format!("  Checked at {}\n", timestamp.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(error) = &report.error {
        out.push_str(&format!("  {}\n", error.red()));
    }
    if let Some(checks) = &report.checks {
        for (name, ok) in [
            ("directories", checks.directories_ok),
            ("required files", checks.required_files_ok),
            ("memory", checks.memory_ok),
            ("disk", checks.disk_ok),
        ] {
            let mark = if ok { "✓".green() } else { "✗".red() };
            out.push_str(&format!("  {} {}\n", mark, name));
        }
    }
    if let Some(stats) = &report.statistics {
        out.push_str(&format!(
            "  {} entities, {} source files, {} output files\n",
            stats.entities_count, stats.total_source_files, stats.total_output_files
        ));
    }
    out
}

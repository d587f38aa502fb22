//! Column mapping editor
//!
//! A [`ColumnMapping`] assigns columns to the fuzzy or exact matching role.
//! The toggle and threshold operations are the only mutators, and every one
//! of them keeps two invariants:
//!
//! - a column is never fuzzy and exact at the same time
//! - only fuzzy columns carry a threshold

use crate::api::models::Thresholds;

/// Threshold assigned when a column becomes fuzzy or a value cannot be parsed
pub const DEFAULT_THRESHOLD: i64 = 90;
pub const MIN_THRESHOLD: i64 = 0;
pub const MAX_THRESHOLD: i64 = 100;

/// Role of one column within a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Unused,
    Fuzzy { threshold: i64 },
    Exact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    fuzzy_columns: Vec<String>,
    exact_columns: Vec<String>,
    thresholds: Thresholds,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from raw selections, restricted to `columns`
    ///
    /// Duplicates are dropped, a column listed in both roles stays fuzzy,
    /// thresholds outside the fuzzy set are dropped and fuzzy columns without
    /// one get [`DEFAULT_THRESHOLD`].
    pub fn normalized(
        columns: &[String],
        fuzzy: &[String],
        exact: &[String],
        thresholds: &Thresholds,
    ) -> Self {
        let mut mapping = Self::new();

        for column in fuzzy {
            if columns.contains(column) && !mapping.is_fuzzy(column) {
                let threshold = thresholds
                    .get(column)
                    .copied()
                    .map(clamp_threshold)
                    .unwrap_or(DEFAULT_THRESHOLD);
                mapping.fuzzy_columns.push(column.clone());
                mapping.thresholds.insert(column.clone(), threshold);
            }
        }

        for column in exact {
            if columns.contains(column) && !mapping.is_fuzzy(column) && !mapping.is_exact(column)
            {
                mapping.exact_columns.push(column.clone());
            }
        }

        mapping
    }

    pub fn fuzzy_columns(&self) -> &[String] {
        &self.fuzzy_columns
    }

    pub fn exact_columns(&self) -> &[String] {
        &self.exact_columns
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn threshold(&self, column: &str) -> Option<i64> {
        self.thresholds.get(column).copied()
    }

    pub fn is_fuzzy(&self, column: &str) -> bool {
        self.fuzzy_columns.iter().any(|c| c == column)
    }

    pub fn is_exact(&self, column: &str) -> bool {
        self.exact_columns.iter().any(|c| c == column)
    }

    /// True when no column has a role
    pub fn is_empty(&self) -> bool {
        self.fuzzy_columns.is_empty() && self.exact_columns.is_empty()
    }

    pub fn role(&self, column: &str) -> ColumnRole {
        if self.is_fuzzy(column) {
            ColumnRole::Fuzzy {
                threshold: self.threshold(column).unwrap_or(DEFAULT_THRESHOLD),
            }
        } else if self.is_exact(column) {
            ColumnRole::Exact
        } else {
            ColumnRole::Unused
        }
    }

    /// Flip the fuzzy role of `column`
    ///
    /// Adding makes the column fuzzy at [`DEFAULT_THRESHOLD`] and drops its
    /// exact role; removing also drops its threshold.
    pub fn toggle_fuzzy(&mut self, column: &str) {
        if self.is_fuzzy(column) {
            self.fuzzy_columns.retain(|c| c != column);
            self.thresholds.remove(column);
        } else {
            self.fuzzy_columns.push(column.to_string());
            self.thresholds
                .insert(column.to_string(), DEFAULT_THRESHOLD);
            self.exact_columns.retain(|c| c != column);
        }
    }

    /// Flip the exact role of `column`
    ///
    /// Adding drops the column's fuzzy role and threshold.
    pub fn toggle_exact(&mut self, column: &str) {
        if self.is_exact(column) {
            self.exact_columns.retain(|c| c != column);
        } else {
            self.exact_columns.push(column.to_string());
            self.fuzzy_columns.retain(|c| c != column);
            self.thresholds.remove(column);
        }
    }

    /// Set a fuzzy threshold from user text
    ///
    /// Unparseable text falls back to [`DEFAULT_THRESHOLD`]. Returns false
    /// (and changes nothing) when `column` is not fuzzy.
    pub fn set_threshold(&mut self, column: &str, value: &str) -> bool {
        self.set_threshold_value(column, parse_threshold(value))
    }

    /// Set a fuzzy threshold, clamped to `[MIN_THRESHOLD, MAX_THRESHOLD]`
    pub fn set_threshold_value(&mut self, column: &str, value: i64) -> bool {
        if !self.is_fuzzy(column) {
            return false;
        }
        self.thresholds
            .insert(column.to_string(), clamp_threshold(value));
        true
    }

    /// Drop every role whose column is not in `available`
    pub fn retain_columns(&mut self, available: &[String]) {
        self.fuzzy_columns.retain(|c| available.contains(c));
        self.exact_columns.retain(|c| available.contains(c));
        let fuzzy = &self.fuzzy_columns;
        self.thresholds.retain(|c, _| fuzzy.contains(c));
    }

    pub fn clear(&mut self) {
        self.fuzzy_columns.clear();
        self.exact_columns.clear();
        self.thresholds.clear();
    }
}

/// Parse a user-entered threshold, falling back to [`DEFAULT_THRESHOLD`]
pub fn parse_threshold(value: &str) -> i64 {
    value
        .trim()
        .parse::<i64>()
        .map(clamp_threshold)
        .unwrap_or(DEFAULT_THRESHOLD)
}

fn clamp_threshold(value: i64) -> i64 {
    value.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

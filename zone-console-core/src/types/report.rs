//! Bulk operation result type definitions

use serde::{Deserialize, Serialize};

use super::LineRejection;

/// Per-line (or per-domain) outcome returned by the remote API after a bulk apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub success: bool,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub updated: bool,
    #[serde(default)]
    pub type_changed: bool,
    /// Source line, for record applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    /// Domain name, for bulk domain adds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Nameservers to configure at the registrar (bulk domain add)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
}

/// Display category of one reconciliation item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultCategory {
    Failed,
    TypeChanged,
    Updated,
    Created,
}

/// One row of a [`ReconciliationReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportItem {
    /// Input position, 0-based
    pub index: usize,
    pub category: ResultCategory,
    /// The line or domain the result refers to
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
}

/// Display-ready report for a multi-item operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub success_count: usize,
    pub failure_count: usize,
    /// Items in input order
    pub items: Vec<ReportItem>,
}

impl ReconciliationReport {
    /// `"3 operations succeeded, 1 operations failed."`
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} operations succeeded, {} operations failed.",
            self.success_count, self.failure_count
        )
    }

    /// Number of items in `category`
    #[must_use]
    pub fn count(&self, category: ResultCategory) -> usize {
        self.items.iter().filter(|i| i.category == category).count()
    }
}

/// Outcome of a bulk record apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkApplyReport {
    /// Message returned by the remote API
    pub message: String,
    pub report: ReconciliationReport,
    /// Lines refused locally and never sent (partial mode only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<LineRejection>,
}

/// One entry of the batched delete response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteItem {
    pub record_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a single delete ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "camelCase")]
pub enum DeleteOutcome {
    Deleted,
    /// Target did not exist anymore; the intent is already satisfied
    AlreadyGone,
    Failed(String),
}

/// Bulk delete failure details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteFailure {
    pub record_id: String,
    pub reason: String,
}

/// Bulk delete result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteReport {
    /// Ids removed by this call
    pub deleted: Vec<String>,
    /// Ids that were already gone
    pub already_gone: Vec<String>,
    pub failures: Vec<BulkDeleteFailure>,
}

impl BulkDeleteReport {
    /// Ids whose delete intent is satisfied (deleted now or already gone)
    #[must_use]
    pub fn satisfied_count(&self) -> usize {
        self.deleted.len() + self.already_gone.len()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// `"Deleted 2 record(s)."`, with failures appended when present
    #[must_use]
    pub fn summary(&self) -> String {
        if self.failures.is_empty() {
            format!("Deleted {} record(s).", self.deleted.len())
        } else {
            format!(
                "Deleted {} record(s), {} failed.",
                self.deleted.len(),
                self.failures.len()
            )
        }
    }
}

/// What a load-time normalization pass changed in a persisted collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    /// Data was in a legacy shape and has been rewritten
    pub migrated: bool,
    /// Data could not be parsed and was discarded
    pub discarded_corrupt: bool,
    /// Expired or duplicate entries dropped
    pub dropped: usize,
    /// The default entry had to be (re)created
    pub seeded: bool,
    /// Entries left after normalization
    pub remaining: usize,
}

impl NormalizeReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.migrated || self.discarded_corrupt || self.dropped > 0 || self.seeded
    }
}

//! Classification of bulk operation outcomes into display-ready reports

use crate::error::{is_already_gone_message, CoreError};
use crate::types::{
    BulkDeleteFailure, BulkDeleteReport, BulkDeleteResponse, DeleteOutcome, ReconciliationReport,
    ReconciliationResult, ReportItem, ResultCategory,
};

/// Stateless result classifier
pub struct ResultReporter;

impl ResultReporter {
    /// Category of one result: failure first, then type change, update, create
    #[must_use]
    pub fn classify(result: &ReconciliationResult) -> ResultCategory {
        if !result.success {
            ResultCategory::Failed
        } else if result.type_changed {
            ResultCategory::TypeChanged
        } else if result.updated {
            ResultCategory::Updated
        } else {
            ResultCategory::Created
        }
    }

    /// Build a report keeping input order
    #[must_use]
    pub fn reconciliation(results: &[ReconciliationResult]) -> ReconciliationReport {
        let items: Vec<ReportItem> = results
            .iter()
            .enumerate()
            .map(|(index, result)| ReportItem {
                index,
                category: Self::classify(result),
                subject: result
                    .line
                    .clone()
                    .or_else(|| result.domain.clone())
                    .unwrap_or_default(),
                message: result.message.clone(),
                error: result.error.clone(),
                nameservers: result.nameservers.clone(),
            })
            .collect();

        let failure_count = items
            .iter()
            .filter(|i| i.category == ResultCategory::Failed)
            .count();

        ReconciliationReport {
            success_count: items.len() - failure_count,
            failure_count,
            items,
        }
    }

    /// Outcome of a single failed delete call
    #[must_use]
    pub fn delete_outcome(err: &CoreError) -> DeleteOutcome {
        if err.is_already_gone() {
            DeleteOutcome::AlreadyGone
        } else {
            DeleteOutcome::Failed(err.to_string())
        }
    }

    /// Fold per-id outcomes into a report, keeping input order within each bucket
    #[must_use]
    pub fn bulk_delete<I>(outcomes: I) -> BulkDeleteReport
    where
        I: IntoIterator<Item = (String, DeleteOutcome)>,
    {
        let mut report = BulkDeleteReport::default();
        for (record_id, outcome) in outcomes {
            match outcome {
                DeleteOutcome::Deleted => report.deleted.push(record_id),
                DeleteOutcome::AlreadyGone => {
                    log::info!("Record {record_id} was already gone, treating delete as done");
                    report.already_gone.push(record_id);
                }
                DeleteOutcome::Failed(reason) => {
                    log::warn!("Failed to delete record {record_id}: {reason}");
                    report.failures.push(BulkDeleteFailure { record_id, reason });
                }
            }
        }
        report
    }

    /// Report for a batched delete response
    #[must_use]
    pub fn bulk_delete_response(response: &BulkDeleteResponse) -> BulkDeleteReport {
        Self::bulk_delete(response.results.iter().map(|item| {
            let outcome = if item.success {
                DeleteOutcome::Deleted
            } else {
                let reason = item.error.clone().unwrap_or_default();
                if is_already_gone_message(&reason) {
                    DeleteOutcome::AlreadyGone
                } else {
                    DeleteOutcome::Failed(reason)
                }
            };
            (item.record_id.clone(), outcome)
        }))
    }
}

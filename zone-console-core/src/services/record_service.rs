//! DNS record service

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::parser::{ParseOptions, RecordLineParser, Submission};
use crate::services::{ResultReporter, ServiceContext};
use crate::types::{
    BulkApplyReport, BulkDeleteReport, DeleteOutcome, PaginatedResponse, RecordType, RecordUpdate,
    RemoteRecord,
};
use crate::view::{ApplyOutcome, PageRequest, RecordsView};

/// DNS record service for one signed-in session
pub struct RecordService {
    ctx: Arc<ServiceContext>,
    options: ParseOptions,
}

impl RecordService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self::with_options(ctx, ParseOptions::default())
    }

    #[must_use]
    pub fn with_options(ctx: Arc<ServiceContext>, options: ParseOptions) -> Self {
        Self { ctx, options }
    }

    // ===== Listing =====

    /// Execute a page request issued by a [`RecordsView`]
    pub async fn fetch_page(
        &self,
        domain: &str,
        request: &PageRequest,
    ) -> CoreResult<PaginatedResponse<RemoteRecord>> {
        let result = self
            .ctx
            .zone_api
            .list_records(domain, &request.query)
            .await;
        self.ctx.check(result).await
    }

    /// Request, fetch and apply one page in a single step
    pub async fn load_page(
        &self,
        domain: &str,
        view: &mut RecordsView,
        page: u32,
        search: Option<String>,
    ) -> ApplyOutcome {
        let request = view.request_page(page, search);
        let result = self.fetch_page(domain, &request).await;
        view.apply_response(request.token, result)
    }

    // ===== Bulk apply =====

    /// Validate bulk lines and send the accepted ones.
    ///
    /// Nothing reaches the API when validation blocks the batch.
    pub async fn apply_lines(&self, domain: &str, text: &str) -> CoreResult<BulkApplyReport> {
        let submission = RecordLineParser::new(self.options).prepare_submission(text)?;
        self.submit(domain, submission).await
    }

    /// Apply a saved template to `domain`
    pub async fn apply_template(&self, domain: &str, template_id: &str) -> CoreResult<BulkApplyReport> {
        let template = self
            .ctx
            .templates
            .get(template_id)
            .await?
            .ok_or_else(|| CoreError::TemplateNotFound(template_id.to_string()))?;
        let submission = RecordLineParser::for_template(&template, self.options.strict_types)
            .prepare_submission(&template.records.join("\n"))?;
        self.submit(domain, submission).await
    }

    async fn submit(&self, domain: &str, submission: Submission) -> CoreResult<BulkApplyReport> {
        if submission.is_empty() {
            return Err(CoreError::BatchRejected(submission.rejections));
        }
        if !submission.rejections.is_empty() {
            log::warn!(
                "Skipping {} invalid line(s) for {domain}",
                submission.rejections.len()
            );
        }

        let result = self
            .ctx
            .zone_api
            .apply_records(domain, &submission.records_text())
            .await;
        let response = self.ctx.check(result).await?;

        if !response.success && response.results.is_empty() {
            return Err(CoreError::ApiError(response.message));
        }

        let report = ResultReporter::reconciliation(&response.results);
        log::info!(
            "Applied {} line(s) to {domain}: {}",
            submission.intents.len(),
            report.summary()
        );
        Ok(BulkApplyReport {
            message: response.message,
            report,
            skipped: submission.rejections,
        })
    }

    // ===== Single record =====

    /// Replace one record; returns the remote message
    pub async fn update_record(
        &self,
        domain: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> CoreResult<String> {
        let update = self.validate_update(update)?;
        let result = self
            .ctx
            .zone_api
            .update_record(domain, record_id, &update)
            .await;
        self.ctx.check(result).await
    }

    /// Delete one record. A record that is already gone counts as deleted.
    pub async fn delete_record(&self, domain: &str, record_id: &str) -> CoreResult<DeleteOutcome> {
        match self.ctx.zone_api.delete_record(domain, record_id).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(e) if e.is_already_gone() => {
                log::info!("Record {record_id} in {domain} was already gone");
                Ok(DeleteOutcome::AlreadyGone)
            }
            Err(e) => Err(self.ctx.handle_api_error(e).await),
        }
    }

    fn validate_update(&self, update: &RecordUpdate) -> CoreResult<RecordUpdate> {
        let name = update.name.trim();
        let content = update.content.trim();
        if name.is_empty() || content.is_empty() {
            return Err(CoreError::ValidationError(
                "Name and content are required".to_string(),
            ));
        }

        let record_type = if self.options.strict_types {
            let parsed: RecordType = update.record_type.trim().parse().map_err(|_| {
                CoreError::ValidationError(format!(
                    "Invalid record type: {}. Supported types: {}",
                    update.record_type,
                    RecordType::supported_list()
                ))
            })?;
            if parsed == RecordType::Mx && content.split_whitespace().count() < 2 {
                return Err(CoreError::ValidationError(
                    "MX record content must include priority (e.g., '10 mail.example.com')"
                        .to_string(),
                ));
            }
            parsed.as_str().to_string()
        } else {
            update.record_type.trim().to_string()
        };

        Ok(RecordUpdate {
            record_type,
            name: name.to_string(),
            content: content.to_string(),
            proxied: update.proxied,
        })
    }

    // ===== Bulk delete =====

    /// Delete the view's current selection.
    ///
    /// Holds the view's in-flight slot for the duration. Satisfied ids are
    /// deselected only if the view still shows the page the delete started on.
    pub async fn delete_selected(
        &self,
        domain: &str,
        view: &mut RecordsView,
    ) -> CoreResult<BulkDeleteReport> {
        let ticket = view.try_begin_action()?;
        if ticket.selected().is_empty() {
            view.finish_action(&ticket);
            return Err(CoreError::ValidationError(
                "No records selected".to_string(),
            ));
        }

        let result = self.delete_records(domain, ticket.selected()).await;
        if let Ok(ref report) = result {
            if view.ticket_matches_view(&ticket) {
                view.deselect(report.deleted.iter().chain(&report.already_gone));
            }
        }
        view.finish_action(&ticket);
        result
    }

    /// Delete `record_ids`, batched when the API supports it.
    ///
    /// "Does not exist" failures are reported as already gone, not as failures.
    pub async fn delete_records(
        &self,
        domain: &str,
        record_ids: &[String],
    ) -> CoreResult<BulkDeleteReport> {
        if record_ids.is_empty() {
            return Ok(BulkDeleteReport::default());
        }

        let batched = self
            .ctx
            .zone_api
            .delete_records_bulk(domain, record_ids)
            .await;
        let report = match self.ctx.check(batched).await? {
            Some(response) => ResultReporter::bulk_delete_response(&response),
            None => self.delete_each(domain, record_ids).await,
        };

        log::info!("Bulk delete in {domain}: {}", report.summary());
        Ok(report)
    }

    async fn delete_each(&self, domain: &str, record_ids: &[String]) -> BulkDeleteReport {
        let api = &self.ctx.zone_api;
        let delete_futures = record_ids.iter().map(|record_id| async move {
            let result = api.delete_record(domain, record_id).await;
            (record_id.clone(), result)
        });
        let results = futures::future::join_all(delete_futures).await;

        let mut credential_rejected = false;
        let outcomes: Vec<(String, DeleteOutcome)> = results
            .into_iter()
            .map(|(record_id, result)| {
                let outcome = match result {
                    Ok(()) => DeleteOutcome::Deleted,
                    Err(e) => {
                        credential_rejected |= e.is_auth();
                        ResultReporter::delete_outcome(&e)
                    }
                };
                (record_id, outcome)
            })
            .collect();

        if credential_rejected {
            self.ctx.purge_active_credential().await;
        }
        ResultReporter::bulk_delete(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_context, test_record, MockFailure, MockZoneApi};
    use crate::types::{ApplyRecordsResponse, ReconciliationResult, ResultCategory};
    use crate::view::{LoadState, RecordFilter};

    const ZONE: &str = "example.com";

    async fn seeded() -> (RecordService, Arc<ServiceContext>, Arc<MockZoneApi>) {
        let (ctx, _, api, _) = create_test_context();
        api.set_records(
            ZONE,
            vec![
                test_record("r1", "A", "example.com", "192.0.2.1"),
                test_record("r2", "CNAME", "www.example.com", "example.com"),
                test_record("r3", "TXT", "example.com", "v=spf1 -all"),
                test_record("r4", "MX", "example.com", "10 mail.example.com"),
                test_record("r5", "CNAME", "shop.example.com", "example.com"),
            ],
        )
        .await;
        (RecordService::new(ctx.clone()), ctx, api)
    }

    #[tokio::test]
    async fn load_page_fills_view() {
        let (service, _, _) = seeded().await;
        let mut view = RecordsView::new(2);
        let outcome = service.load_page(ZONE, &mut view, 2, None).await;
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(view.page(), 2);
        let ids: Vec<&str> = view.items().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r3", "r4"]);
        assert_eq!(view.pagination().map(|p| p.total_count), Some(5));
    }

    #[tokio::test]
    async fn unauthenticated_page_load_purges_credential() {
        let (service, ctx, api) = seeded().await;
        ctx.credentials.save("a@example.com", "k").await.unwrap();
        ctx.set_active_identifier(Some("a@example.com".to_string())).await;
        api.set_failure(Some(MockFailure::Unauthenticated)).await;

        let mut view = RecordsView::new(50);
        let outcome = service.load_page(ZONE, &mut view, 1, None).await;
        assert_eq!(outcome, ApplyOutcome::Unauthenticated);
        assert_eq!(view.load_state(), &LoadState::Unauthenticated);
        assert!(ctx.credentials.get("a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_lines_never_reach_the_api() {
        let (service, _, api) = seeded().await;
        let err = service
            .apply_lines(ZONE, "A|@|192.0.2.1\nA|@")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::BatchRejected(ref r) if r.len() == 1));
        assert!(api.applied.read().await.is_empty());
    }

    #[tokio::test]
    async fn apply_sends_normalized_lines_and_reports() {
        let (service, _, api) = seeded().await;
        let report = service
            .apply_lines(ZONE, "A|@|192.0.2.1|true\n\ncname|www|@")
            .await
            .unwrap();
        assert_eq!(report.report.success_count, 2);
        assert_eq!(report.report.count(ResultCategory::Created), 2);

        let applied = api.applied.read().await;
        assert_eq!(applied[0].0, ZONE);
        assert_eq!(applied[0].1, "A|@|192.0.2.1|true\nCNAME|www|@|false");
    }

    #[tokio::test]
    async fn partial_mode_skips_bad_lines() {
        let (ctx, _, api, _) = create_test_context();
        let service = RecordService::with_options(
            ctx,
            ParseOptions {
                validate_all: false,
                ..ParseOptions::default()
            },
        );
        let report = service
            .apply_lines(ZONE, "A|@\nCNAME|www|@")
            .await
            .unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(api.applied.read().await[0].1, "CNAME|www|@|false");

        assert!(matches!(
            service.apply_lines(ZONE, "A|@").await,
            Err(CoreError::BatchRejected(_))
        ));
    }

    #[tokio::test]
    async fn mixed_remote_results_are_classified() {
        let (service, _, api) = seeded().await;
        api.set_apply_response(ApplyRecordsResponse {
            success: true,
            message: "done".to_string(),
            results: vec![
                ReconciliationResult {
                    success: true,
                    updated: true,
                    type_changed: true,
                    ..ReconciliationResult::default()
                },
                ReconciliationResult {
                    success: false,
                    error: Some("Invalid IPv4".to_string()),
                    ..ReconciliationResult::default()
                },
            ],
        })
        .await;

        let report = service
            .apply_lines(ZONE, "CNAME|www|@\nA|x|999.0.0.1")
            .await
            .unwrap();
        assert_eq!(report.report.items[0].category, ResultCategory::TypeChanged);
        assert_eq!(report.report.items[1].category, ResultCategory::Failed);
        assert_eq!(report.message, "done");
    }

    #[tokio::test]
    async fn apply_template_uses_template_lines() {
        let (service, _, api) = seeded().await;
        let report = service.apply_template(ZONE, "default").await.unwrap();
        assert_eq!(report.report.success_count, 4);
        assert!(api.applied.read().await[0].1.starts_with("A|@|192.0.2.1|true"));

        assert!(matches!(
            service.apply_template(ZONE, "missing").await,
            Err(CoreError::TemplateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_validates_and_normalizes() {
        let (service, _, api) = seeded().await;
        let update = RecordUpdate {
            record_type: "cname".to_string(),
            name: " www.example.com ".to_string(),
            content: "example.org".to_string(),
            proxied: true,
        };
        service.update_record(ZONE, "r2", &update).await.unwrap();
        let updated = api.updated.read().await;
        assert_eq!(updated[0].1.record_type, "CNAME");
        assert_eq!(updated[0].1.name, "www.example.com");

        let bad_mx = RecordUpdate {
            record_type: "MX".to_string(),
            name: "example.com".to_string(),
            content: "mail.example.com".to_string(),
            proxied: false,
        };
        assert!(matches!(
            service.update_record(ZONE, "r4", &bad_mx).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_missing_record_is_satisfied() {
        let (service, _, _) = seeded().await;
        assert_eq!(
            service.delete_record(ZONE, "r1").await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            service.delete_record(ZONE, "r1").await.unwrap(),
            DeleteOutcome::AlreadyGone
        );
    }

    #[tokio::test]
    async fn batched_delete_with_already_gone_targets() {
        let (service, _, api) = seeded().await;
        api.set_bulk_delete_supported(true).await;
        let ids: Vec<String> = ["r1", "gone-1", "r2", "gone-2", "gone-3"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let report = service.delete_records(ZONE, &ids).await.unwrap();
        assert_eq!(report.deleted, vec!["r1", "r2"]);
        assert_eq!(report.already_gone.len(), 3);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn per_id_fallback_reports_real_failures() {
        let (service, _, api) = seeded().await;
        api.fail_delete("r3", MockFailure::Network("reset".to_string()))
            .await;
        let ids: Vec<String> = ["r1", "r3", "nope"].iter().map(ToString::to_string).collect();

        let report = service.delete_records(ZONE, &ids).await.unwrap();
        assert_eq!(report.deleted, vec!["r1"]);
        assert_eq!(report.already_gone, vec!["nope"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].record_id, "r3");
        assert_eq!(report.summary(), "Deleted 1 record(s), 1 failed.");
    }

    #[tokio::test]
    async fn missing_zone_is_a_failure_not_already_gone() {
        let (service, _, api) = seeded().await;
        for id in ["r1", "r2"] {
            api.fail_delete(id, MockFailure::Api("Domain not found".to_string()))
                .await;
        }

        assert!(matches!(
            service.delete_record(ZONE, "r1").await,
            Err(CoreError::ApiError(ref m)) if m == "Domain not found"
        ));

        let ids: Vec<String> = ["r1", "r2"].iter().map(ToString::to_string).collect();
        let report = service.delete_records(ZONE, &ids).await.unwrap();
        assert!(report.deleted.is_empty());
        assert!(report.already_gone.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.summary(), "Deleted 0 record(s), 2 failed.");
    }

    #[tokio::test]
    async fn per_id_auth_failure_purges_credential() {
        let (service, ctx, api) = seeded().await;
        ctx.credentials.save("a@example.com", "k").await.unwrap();
        ctx.set_active_identifier(Some("a@example.com".to_string())).await;
        api.fail_delete("r1", MockFailure::Unauthenticated).await;

        let ids = vec!["r1".to_string(), "r2".to_string()];
        let report = service.delete_records(ZONE, &ids).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(ctx.active_identifier().await.is_none());
    }

    #[tokio::test]
    async fn delete_selected_uses_and_releases_guard() {
        let (service, _, _) = seeded().await;
        let mut view = RecordsView::new(50);
        service.load_page(ZONE, &mut view, 1, None).await;

        assert!(matches!(
            service.delete_selected(ZONE, &mut view).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(!view.action_in_flight());

        view.apply_local_filter(RecordFilter {
            record_type: Some("CNAME".to_string()),
            ..RecordFilter::default()
        });
        view.select_all();
        let report = service.delete_selected(ZONE, &mut view).await.unwrap();
        assert_eq!(report.deleted, vec!["r2", "r5"]);
        assert_eq!(view.selected_count(), 0);
        assert!(!view.action_in_flight());
    }

    #[tokio::test]
    async fn delete_selected_refuses_while_busy() {
        let (service, _, _) = seeded().await;
        let mut view = RecordsView::new(50);
        service.load_page(ZONE, &mut view, 1, None).await;
        view.select_all();
        let ticket = view.try_begin_action().unwrap();

        assert!(matches!(
            service.delete_selected(ZONE, &mut view).await,
            Err(CoreError::ActionInProgress)
        ));
        view.finish_action(&ticket);
    }
}

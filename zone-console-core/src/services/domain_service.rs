//! Domain service

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::parser::{require_domain_list, RecordLineParser};
use crate::services::{ResultReporter, ServiceContext};
use crate::types::{Domain, PaginatedResponse, ReconciliationReport};
use crate::view::{ApplyOutcome, DomainsView, PageRequest};

/// Zone listing and bulk zone creation
pub struct DomainService {
    ctx: Arc<ServiceContext>,
    strict_types: bool,
}

impl DomainService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self::with_strict_types(ctx, true)
    }

    /// `strict_types` applies to the template lines sent with new zones
    #[must_use]
    pub fn with_strict_types(ctx: Arc<ServiceContext>, strict_types: bool) -> Self {
        Self { ctx, strict_types }
    }

    /// Execute a page request issued by a [`DomainsView`]
    pub async fn fetch_page(&self, request: &PageRequest) -> CoreResult<PaginatedResponse<Domain>> {
        let result = self.ctx.zone_api.list_domains(&request.query).await;
        self.ctx.check(result).await
    }

    /// Request, fetch and apply one page in a single step
    pub async fn load_page(
        &self,
        view: &mut DomainsView,
        page: u32,
        search: Option<String>,
    ) -> ApplyOutcome {
        let request = view.request_page(page, search);
        let result = self.fetch_page(&request).await;
        view.apply_response(request.token, result)
    }

    /// Add the zones listed in `text`, optionally seeding each from a template.
    ///
    /// The whole list is validated before anything is sent.
    pub async fn add_domains(
        &self,
        text: &str,
        template_id: Option<&str>,
    ) -> CoreResult<ReconciliationReport> {
        let domains = require_domain_list(text)?;
        let template_records = match template_id {
            Some(id) => self.template_lines(id).await?,
            None => Vec::new(),
        };

        let result = self
            .ctx
            .zone_api
            .add_domains(&domains, &template_records)
            .await;
        let results = self.ctx.check(result).await?;

        let report = ResultReporter::reconciliation(&results);
        log::info!("Added {} domain(s): {}", domains.len(), report.summary());
        Ok(report)
    }

    /// Template lines, validated and normalized to four fields
    async fn template_lines(&self, template_id: &str) -> CoreResult<Vec<String>> {
        let template = self
            .ctx
            .templates
            .get(template_id)
            .await?
            .ok_or_else(|| CoreError::TemplateNotFound(template_id.to_string()))?;
        let submission = RecordLineParser::for_template(&template, self.strict_types)
            .prepare_submission(&template.records.join("\n"))?;
        Ok(submission.intents.iter().map(|i| i.to_line()).collect())
    }
}

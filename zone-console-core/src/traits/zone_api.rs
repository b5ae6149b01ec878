//! Remote zone-hosting API abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{
    ApplyRecordsResponse, BulkDeleteResponse, Domain, PageQuery, PaginatedResponse,
    ReconciliationResult, RecordUpdate, RemoteRecord,
};

/// Remote zone-hosting API
///
/// Transport is out of scope for this crate; frontends implement this trait
/// over whatever channel they have. Implementations map failures onto
/// `CoreError` as follows:
/// - HTTP 401 / missing session → `Unauthenticated`
/// - request never completed → `NetworkError`
/// - `success: false` bodies → `ApiError(message)` (or `RecordNotFound`)
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// List one page of zones
    async fn list_domains(&self, query: &PageQuery) -> CoreResult<PaginatedResponse<Domain>>;

    /// List one page of records of `domain`
    async fn list_records(
        &self,
        domain: &str,
        query: &PageQuery,
    ) -> CoreResult<PaginatedResponse<RemoteRecord>>;

    /// Apply bulk record lines; the remote side reconciles each line
    async fn apply_records(&self, domain: &str, records_text: &str)
        -> CoreResult<ApplyRecordsResponse>;

    /// Replace one record; returns the remote message
    async fn update_record(
        &self,
        domain: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> CoreResult<String>;

    /// Delete one record
    async fn delete_record(&self, domain: &str, record_id: &str) -> CoreResult<()>;

    /// Delete several records in one call
    ///
    /// # Returns
    /// * `Ok(Some(response))` - batched endpoint used
    /// * `Ok(None)` - not supported, callers fall back to per-id deletes
    async fn delete_records_bulk(
        &self,
        _domain: &str,
        _record_ids: &[String],
    ) -> CoreResult<Option<BulkDeleteResponse>> {
        Ok(None)
    }

    /// Check credentials against the provider
    async fn validate_credentials(&self, identifier: &str, secret: &str) -> CoreResult<()>;

    /// Create zones, seeding each with `template_records`
    async fn add_domains(
        &self,
        domains: &[String],
        template_records: &[String],
    ) -> CoreResult<Vec<ReconciliationResult>>;
}

//! Test helpers
//!
//! Mock implementations and factory functions for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::{Clock, KeyValueStore, ZoneApi};
use crate::types::{
    ApplyRecordsResponse, BulkDeleteItem, BulkDeleteResponse, Domain, PageQuery, PaginatedResponse,
    ReconciliationResult, RecordUpdate, RemoteRecord,
};

// ===== MockKeyValueStore =====

pub struct MockKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
    /// If Some, `get` returns this error
    read_error: RwLock<Option<String>>,
    /// If Some, `set`/`remove` return this error (simulates an exhausted quota)
    write_error: RwLock<Option<String>>,
}

impl MockKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            read_error: RwLock::new(None),
            write_error: RwLock::new(None),
        }
    }

    pub async fn set_read_error(&self, err: Option<String>) {
        *self.read_error.write().await = err;
    }

    pub async fn set_write_error(&self, err: Option<String>) {
        *self.write_error.write().await = err;
    }

    /// Bypass failure injection and write a raw value
    pub async fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValueStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        if let Some(ref msg) = *self.read_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        if let Some(ref msg) = *self.write_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        self.insert_raw(key, value).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        if let Some(ref msg) = *self.write_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// ===== FixedClock =====

/// Manually advanced clock
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at_timestamp(secs: i64) -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(secs, 0).unwrap_or_default()),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

// ===== MockZoneApi =====

/// Error kinds the mock can be told to return
#[derive(Debug, Clone)]
pub enum MockFailure {
    Unauthenticated,
    InvalidCredentials,
    Network(String),
    Api(String),
}

impl MockFailure {
    pub fn to_error(&self) -> CoreError {
        match self {
            Self::Unauthenticated => CoreError::Unauthenticated,
            Self::InvalidCredentials => CoreError::InvalidCredentials("mock".to_string()),
            Self::Network(msg) => CoreError::NetworkError(msg.clone()),
            Self::Api(msg) => CoreError::ApiError(msg.clone()),
        }
    }
}

/// In-memory zone API with failure injection and call recording
pub struct MockZoneApi {
    domains: RwLock<Vec<Domain>>,
    records: RwLock<HashMap<String, Vec<RemoteRecord>>>,
    /// Secret accepted by `validate_credentials`
    valid_secret: RwLock<String>,
    /// Every call fails with this when set
    failure: RwLock<Option<MockFailure>>,
    /// Per-record delete failures
    delete_failures: RwLock<HashMap<String, MockFailure>>,
    /// Batched delete endpoint support
    bulk_delete_supported: RwLock<bool>,
    apply_response: RwLock<Option<ApplyRecordsResponse>>,
    nameservers: Vec<String>,

    pub applied: RwLock<Vec<(String, String)>>,
    pub deleted: RwLock<Vec<String>>,
    pub updated: RwLock<Vec<(String, RecordUpdate)>>,
    pub added_domains: RwLock<Vec<(Vec<String>, Vec<String>)>>,
    pub list_calls: AtomicUsize,
}

impl MockZoneApi {
    pub fn new() -> Self {
        Self {
            domains: RwLock::new(Vec::new()),
            records: RwLock::new(HashMap::new()),
            valid_secret: RwLock::new("valid-key".to_string()),
            failure: RwLock::new(None),
            delete_failures: RwLock::new(HashMap::new()),
            bulk_delete_supported: RwLock::new(false),
            apply_response: RwLock::new(None),
            nameservers: vec![
                "ada.ns.example.net".to_string(),
                "bob.ns.example.net".to_string(),
            ],
            applied: RwLock::new(Vec::new()),
            deleted: RwLock::new(Vec::new()),
            updated: RwLock::new(Vec::new()),
            added_domains: RwLock::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_domains(&self, domains: Vec<Domain>) {
        *self.domains.write().await = domains;
    }

    pub async fn set_records(&self, domain: &str, records: Vec<RemoteRecord>) {
        self.records
            .write()
            .await
            .insert(domain.to_string(), records);
    }

    pub async fn set_failure(&self, failure: Option<MockFailure>) {
        *self.failure.write().await = failure;
    }

    pub async fn fail_delete(&self, record_id: &str, failure: MockFailure) {
        self.delete_failures
            .write()
            .await
            .insert(record_id.to_string(), failure);
    }

    pub async fn set_bulk_delete_supported(&self, supported: bool) {
        *self.bulk_delete_supported.write().await = supported;
    }

    pub async fn set_apply_response(&self, response: ApplyRecordsResponse) {
        *self.apply_response.write().await = Some(response);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    async fn check_failure(&self) -> CoreResult<()> {
        match *self.failure.read().await {
            Some(ref failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn page<T: Clone>(items: &[T], query: &PageQuery) -> PaginatedResponse<T> {
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let start = ((query.page - 1) * query.page_size) as usize;
        let page_items = items
            .iter()
            .skip(start)
            .take(query.page_size as usize)
            .cloned()
            .collect();
        PaginatedResponse::new(page_items, query.page, query.page_size, total)
    }

    async fn delete_one(&self, domain: &str, record_id: &str) -> CoreResult<()> {
        if let Some(failure) = self.delete_failures.read().await.get(record_id) {
            return Err(failure.to_error());
        }
        let mut records = self.records.write().await;
        let zone = records.entry(domain.to_string()).or_default();
        let before = zone.len();
        zone.retain(|r| r.id != record_id);
        if zone.len() == before {
            return Err(CoreError::ApiError("Record does not exist".to_string()));
        }
        self.deleted.write().await.push(record_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl ZoneApi for MockZoneApi {
    async fn list_domains(&self, query: &PageQuery) -> CoreResult<PaginatedResponse<Domain>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;
        let domains = self.domains.read().await;
        let matching: Vec<Domain> = domains
            .iter()
            .filter(|d| {
                query
                    .search
                    .as_deref()
                    .is_none_or(|s| d.name.contains(s))
            })
            .cloned()
            .collect();
        Ok(Self::page(&matching, query))
    }

    async fn list_records(
        &self,
        domain: &str,
        query: &PageQuery,
    ) -> CoreResult<PaginatedResponse<RemoteRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;
        let records = self.records.read().await;
        let zone = records.get(domain).cloned().unwrap_or_default();
        let matching: Vec<RemoteRecord> = zone
            .into_iter()
            .filter(|r| {
                query
                    .search
                    .as_deref()
                    .is_none_or(|s| r.name.contains(s) || r.content.contains(s))
            })
            .collect();
        Ok(Self::page(&matching, query))
    }

    async fn apply_records(
        &self,
        domain: &str,
        records_text: &str,
    ) -> CoreResult<ApplyRecordsResponse> {
        self.check_failure().await?;
        self.applied
            .write()
            .await
            .push((domain.to_string(), records_text.to_string()));
        if let Some(ref response) = *self.apply_response.read().await {
            return Ok(response.clone());
        }
        let results = records_text
            .lines()
            .map(|line| ReconciliationResult {
                success: true,
                created: true,
                line: Some(line.to_string()),
                message: "Created".to_string(),
                ..ReconciliationResult::default()
            })
            .collect();
        Ok(ApplyRecordsResponse {
            success: true,
            message: "Records applied".to_string(),
            results,
        })
    }

    async fn update_record(
        &self,
        domain: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> CoreResult<String> {
        self.check_failure().await?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(domain)
            .and_then(|zone| zone.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| CoreError::RecordNotFound(record_id.to_string()))?;
        record.record_type.clone_from(&update.record_type);
        record.name.clone_from(&update.name);
        record.content.clone_from(&update.content);
        record.proxied = update.proxied;
        self.updated
            .write()
            .await
            .push((record_id.to_string(), update.clone()));
        Ok("Record updated".to_string())
    }

    async fn delete_record(&self, domain: &str, record_id: &str) -> CoreResult<()> {
        self.check_failure().await?;
        self.delete_one(domain, record_id).await
    }

    async fn delete_records_bulk(
        &self,
        domain: &str,
        record_ids: &[String],
    ) -> CoreResult<Option<BulkDeleteResponse>> {
        if !*self.bulk_delete_supported.read().await {
            return Ok(None);
        }
        self.check_failure().await?;
        let mut results = Vec::with_capacity(record_ids.len());
        for id in record_ids {
            let item = match self.delete_one(domain, id).await {
                Ok(()) => BulkDeleteItem {
                    record_id: id.clone(),
                    success: true,
                    error: None,
                },
                Err(e) => BulkDeleteItem {
                    record_id: id.clone(),
                    success: false,
                    error: Some(match e {
                        CoreError::ApiError(msg) => msg,
                        other => other.to_string(),
                    }),
                },
            };
            results.push(item);
        }
        Ok(Some(BulkDeleteResponse {
            success: results.iter().all(|r| r.success),
            total_count: results.len(),
            results,
        }))
    }

    async fn validate_credentials(&self, identifier: &str, secret: &str) -> CoreResult<()> {
        self.check_failure().await?;
        if *self.valid_secret.read().await == secret {
            Ok(())
        } else {
            Err(CoreError::InvalidCredentials(identifier.to_string()))
        }
    }

    async fn add_domains(
        &self,
        domains: &[String],
        template_records: &[String],
    ) -> CoreResult<Vec<ReconciliationResult>> {
        self.check_failure().await?;
        self.added_domains
            .write()
            .await
            .push((domains.to_vec(), template_records.to_vec()));

        let mut existing: HashSet<String> = self
            .domains
            .read()
            .await
            .iter()
            .map(|d| d.name.clone())
            .collect();
        Ok(domains
            .iter()
            .map(|name| {
                if existing.insert(name.clone()) {
                    ReconciliationResult {
                        success: true,
                        created: true,
                        domain: Some(name.clone()),
                        message: format!("Added {name}"),
                        nameservers: self.nameservers.clone(),
                        ..ReconciliationResult::default()
                    }
                } else {
                    ReconciliationResult {
                        success: false,
                        domain: Some(name.clone()),
                        message: format!("Failed to add {name}"),
                        error: Some("Zone already exists".to_string()),
                        ..ReconciliationResult::default()
                    }
                }
            })
            .collect())
    }
}

// ===== Factories =====

/// Build a `ServiceContext` over fresh mocks
pub fn create_test_context() -> (
    Arc<ServiceContext>,
    Arc<MockKeyValueStore>,
    Arc<MockZoneApi>,
    Arc<FixedClock>,
) {
    let kv = Arc::new(MockKeyValueStore::new());
    let api = Arc::new(MockZoneApi::new());
    let clock = Arc::new(FixedClock::at_timestamp(1_700_000_000));

    let ctx = Arc::new(ServiceContext::new(kv.clone(), api.clone(), clock.clone()));

    (ctx, kv, api, clock)
}

/// A `RemoteRecord` for tests
pub fn test_record(id: &str, record_type: &str, name: &str, content: &str) -> RemoteRecord {
    RemoteRecord {
        id: id.to_string(),
        record_type: record_type.to_string(),
        name: name.to_string(),
        content: content.to_string(),
        proxied: false,
        ttl: Some(1),
    }
}

/// A `Domain` for tests
pub fn test_domain(id: &str, name: &str) -> Domain {
    Domain {
        id: id.to_string(),
        name: name.to_string(),
        status: "active".to_string(),
        created_on: None,
    }
}

//! Platform-agnostic application bootstrap for the Zone Console.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter injection),
//! `StartupHooks` (platform-specific startup callbacks) and `AppConfig`.

pub mod adapters;
mod config;

pub use config::AppConfig;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use zone_console_core::error::{CoreError, CoreResult};
use zone_console_core::services::{
    DomainService, RecordService, ServiceContext, SessionService, CREDENTIALS_KEY, TEMPLATES_KEY,
};
use zone_console_core::traits::{
    Clock, InMemoryKeyValueStore, KeyValueStore, SystemClock, ZoneApi,
};
use zone_console_core::types::NormalizeReport;
use zone_console_core::view::{DomainsView, RecordsView};

/// Platform-specific hooks for the startup sequence.
///
/// Frontends implement this to back up persisted blobs before they are
/// normalized. Use `NoopStartupHooks` if no backup is needed.
#[async_trait::async_trait]
pub trait StartupHooks: Send + Sync {
    /// Called before `key` is normalized with its current raw value.
    /// Returns a backup identifier (e.g., file path) or `None` to skip backup.
    async fn backup_blob(&self, _key: &str, _raw_json: &str) -> Option<String> {
        None
    }

    /// Called after normalization succeeds to clean up the backup.
    async fn cleanup_backup(&self, _backup_info: &str) {}

    /// Called when normalization fails, to preserve the backup for manual recovery.
    async fn preserve_backup(&self, _backup_info: &str, _error: &str) {}
}

/// No-op startup hooks for frontends that don't need a backup.
pub struct NoopStartupHooks;

#[async_trait::async_trait]
impl StartupHooks for NoopStartupHooks {}

/// What the startup sequence changed in persisted data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// `None` when normalization failed (the error is logged)
    pub credentials: Option<NormalizeReport>,
    pub templates: Option<NormalizeReport>,
}

/// Platform-agnostic application state.
///
/// Holds the `ServiceContext` and every service. Each frontend constructs this
/// once at startup via `AppStateBuilder`.
pub struct AppState {
    pub config: AppConfig,
    /// Service context (holds storage, API and clock)
    pub ctx: Arc<ServiceContext>,
    pub session_service: SessionService,
    pub record_service: RecordService,
    pub domain_service: DomainService,
    /// Whether the startup sequence has completed
    pub startup_completed: AtomicBool,
}

impl AppState {
    /// Normalize persisted credentials and templates.
    ///
    /// Failures are logged and never abort startup; a broken blob only
    /// degrades the matching store.
    pub async fn run_startup(&self, hooks: &dyn StartupHooks) -> StartupReport {
        let credentials = self
            .normalize_key(hooks, CREDENTIALS_KEY, || self.ctx.credentials.normalize())
            .await;
        let templates = self
            .normalize_key(hooks, TEMPLATES_KEY, || self.ctx.templates.normalize())
            .await;

        self.startup_completed.store(true, Ordering::SeqCst);
        log::info!("Startup complete");
        StartupReport {
            credentials,
            templates,
        }
    }

    async fn normalize_key<F, Fut>(
        &self,
        hooks: &dyn StartupHooks,
        key: &str,
        normalize: F,
    ) -> Option<NormalizeReport>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = CoreResult<NormalizeReport>>,
    {
        // 1. Backup
        let backup_info = match self.ctx.kv_store.get(key).await {
            Ok(Some(raw)) => hooks.backup_blob(key, &raw).await,
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read {key} for backup: {e}");
                None
            }
        };

        // 2. Normalize
        match normalize().await {
            Ok(report) => {
                if report.changed() {
                    log::info!("Normalized {key}: {report:?}");
                } else {
                    log::debug!("{key} already up to date");
                }
                if let Some(ref info) = backup_info {
                    hooks.cleanup_backup(info).await;
                }
                Some(report)
            }
            Err(e) => {
                log::error!("Failed to normalize {key}: {e}");
                if let Some(ref info) = backup_info {
                    hooks.preserve_backup(info, &e.to_string()).await;
                }
                None
            }
        }
    }

    /// Empty records view sized from the configuration
    #[must_use]
    pub fn new_records_view(&self) -> RecordsView {
        RecordsView::new(self.config.records_page_size)
    }

    /// Empty domains view sized from the configuration
    #[must_use]
    pub fn new_domains_view(&self) -> DomainsView {
        DomainsView::new(self.config.domains_page_size)
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `zone_api`: transport to the zone-hosting provider
///
/// # Optional
/// - `kv_store`: defaults to `JsonFileStore` at the configured storage path
///   (`file-store` feature), otherwise `InMemoryKeyValueStore`
/// - `clock`: defaults to `SystemClock`
/// - `config`: defaults to `AppConfig::default()`
pub struct AppStateBuilder {
    kv_store: Option<Arc<dyn KeyValueStore>>,
    zone_api: Option<Arc<dyn ZoneApi>>,
    clock: Option<Arc<dyn Clock>>,
    config: Option<AppConfig>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            kv_store: None,
            zone_api: None,
            clock: None,
            config: None,
        }
    }

    #[must_use]
    pub fn kv_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.kv_store = Some(store);
        self
    }

    #[must_use]
    pub fn zone_api(mut self, api: Arc<dyn ZoneApi>) -> Self {
        self.zone_api = Some(api);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if `zone_api` is missing or the
    /// configuration is invalid.
    pub fn build(self) -> CoreResult<AppState> {
        let zone_api = self
            .zone_api
            .ok_or_else(|| CoreError::ValidationError("zone_api is required".to_string()))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let kv_store = self
            .kv_store
            .unwrap_or_else(|| Self::default_kv_store(&config));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let credential_ttl = config.credential_ttl()?;

        let ctx = Arc::new(ServiceContext::with_credential_ttl(
            kv_store,
            zone_api,
            clock,
            credential_ttl,
        ));

        let session_service = SessionService::new(Arc::clone(&ctx));
        let record_service = RecordService::with_options(Arc::clone(&ctx), config.parse_options());
        let domain_service =
            DomainService::with_strict_types(Arc::clone(&ctx), config.strict_record_types);

        Ok(AppState {
            config,
            ctx,
            session_service,
            record_service,
            domain_service,
            startup_completed: AtomicBool::new(false),
        })
    }

    #[cfg(feature = "file-store")]
    fn default_kv_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
        match config.resolved_storage_path() {
            Some(path) => {
                log::info!("Using storage file {}", path.display());
                Arc::new(adapters::JsonFileStore::new(path))
            }
            None => {
                log::warn!("No storage directory available, data will not persist");
                Arc::new(InMemoryKeyValueStore::new())
            }
        }
    }

    #[cfg(not(feature = "file-store"))]
    fn default_kv_store(_config: &AppConfig) -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

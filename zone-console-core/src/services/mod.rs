//! Business logic service layer

mod credential_store;
mod domain_service;
mod record_service;
mod reporter;
mod session_service;
mod template_store;

pub use credential_store::{CredentialStore, CREDENTIALS_KEY, LEGACY_CREDENTIALS_KEY};
pub use domain_service::DomainService;
pub use record_service::RecordService;
pub use reporter::ResultReporter;
pub use session_service::{SessionService, SignInOutcome};
pub use template_store::{TemplateStore, LEGACY_TEMPLATES_KEY, TEMPLATES_KEY};

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::traits::{Clock, KeyValueStore, ZoneApi};
use crate::types::DEFAULT_CREDENTIAL_TTL_DAYS;

/// Service context, holds every dependency
///
/// The hosting frontend builds one context and injects its storage backend,
/// its `ZoneApi` transport and a clock.
pub struct ServiceContext {
    /// Raw persisted storage
    pub kv_store: Arc<dyn KeyValueStore>,
    /// Remote zone-hosting API
    pub zone_api: Arc<dyn ZoneApi>,
    pub clock: Arc<dyn Clock>,
    /// Saved credentials
    pub credentials: CredentialStore,
    /// Saved DNS templates
    pub templates: TemplateStore,
    /// Identifier of the credential the current session signed in with
    active_identifier: RwLock<Option<String>>,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        kv_store: Arc<dyn KeyValueStore>,
        zone_api: Arc<dyn ZoneApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_credential_ttl(
            kv_store,
            zone_api,
            clock,
            Duration::days(DEFAULT_CREDENTIAL_TTL_DAYS),
        )
    }

    #[must_use]
    pub fn with_credential_ttl(
        kv_store: Arc<dyn KeyValueStore>,
        zone_api: Arc<dyn ZoneApi>,
        clock: Arc<dyn Clock>,
        credential_ttl: Duration,
    ) -> Self {
        Self {
            credentials: CredentialStore::with_ttl(
                kv_store.clone(),
                clock.clone(),
                credential_ttl,
            ),
            templates: TemplateStore::new(kv_store.clone()),
            kv_store,
            zone_api,
            clock,
            active_identifier: RwLock::new(None),
        }
    }

    pub async fn active_identifier(&self) -> Option<String> {
        self.active_identifier.read().await.clone()
    }

    pub async fn set_active_identifier(&self, identifier: Option<String>) {
        *self.active_identifier.write().await = identifier;
    }

    /// Remove the saved credential the current session signed in with
    ///
    /// Called when the remote side no longer accepts the session's credential.
    pub async fn purge_active_credential(&self) {
        let Some(identifier) = self.active_identifier.write().await.take() else {
            return;
        };
        match self.credentials.remove(&identifier).await {
            Ok(true) => log::warn!("Credential for {identifier} rejected, removed from saved credentials"),
            Ok(false) => log::warn!("Credential for {identifier} rejected"),
            Err(e) => log::error!("Failed to remove rejected credential for {identifier}: {e}"),
        }
    }

    /// Route an API error; an auth failure also purges the saved credential
    pub async fn handle_api_error(&self, err: CoreError) -> CoreError {
        if err.is_auth() {
            self.purge_active_credential().await;
        }
        err
    }

    /// Pass a `ZoneApi` result through [`Self::handle_api_error`]
    pub async fn check<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => Err(self.handle_api_error(e).await),
        }
    }
}

/// Remove a key whose data now lives under a current key. Failures are logged.
pub(crate) async fn retire_legacy_key(kv: &dyn KeyValueStore, key: &str) {
    if let Err(e) = kv.remove(key).await {
        log::warn!("Failed to remove legacy key {key}: {e}");
    }
}

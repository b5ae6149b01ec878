//! Saved credential collection
//!
//! Credentials live in a [`KeyValueStore`] under [`CREDENTIALS_KEY`] as a
//! versioned JSON envelope. Expired entries are dropped lazily on every read
//! and the pruned collection is written back. The single credential written
//! by the single-page release under [`LEGACY_CREDENTIALS_KEY`] is migrated
//! when the current key is empty.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::services::retire_legacy_key;
use crate::traits::{Clock, KeyValueStore};
use crate::types::{Credential, CredentialOrder, NormalizeReport, DEFAULT_CREDENTIAL_TTL_DAYS};

/// Storage key of the credential collection
pub const CREDENTIALS_KEY: &str = "zone_console.credentials";

/// Key used by the single-page release (one legacy credential)
pub const LEGACY_CREDENTIALS_KEY: &str = "cloudflare_dns_credentials";

const CREDENTIALS_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct CredentialEnvelope {
    version: u32,
    credentials: Vec<Credential>,
}

/// Single-credential blob written by older releases (millisecond timestamps)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCredential {
    email: String,
    api_key: String,
    timestamp: i64,
    expiry_time: i64,
}

/// Persisted shapes, newest first
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredCredentials {
    V2(CredentialEnvelope),
    V1(LegacyCredential),
}

impl LegacyCredential {
    fn into_credential(self) -> Option<Credential> {
        Some(Credential {
            identifier: self.email,
            secret: self.api_key,
            issued_at: DateTime::from_timestamp_millis(self.timestamp)?,
            expires_at: DateTime::from_timestamp_millis(self.expiry_time)?,
        })
    }
}

/// Result of reading the raw collection, before expiry pruning
struct Loaded {
    credentials: Vec<Credential>,
    report: NormalizeReport,
}

/// Saved credential collection
pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    /// Serializes read-modify-write cycles on the backing key
    lock: Mutex<()>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(kv, clock, Duration::days(DEFAULT_CREDENTIAL_TTL_DAYS))
    }

    #[must_use]
    pub fn with_ttl(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            kv,
            clock,
            ttl,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Save or refresh a credential.
    ///
    /// The identifier is stored exactly as given; input checks belong to the
    /// caller. An existing identifier is replaced in place with fresh timestamps.
    pub async fn save(&self, identifier: &str, secret: &str) -> CoreResult<Credential> {
        let _guard = self.lock.lock().await;
        let mut credentials = self.load_pruned().await?;
        let credential = Credential::issue(identifier, secret, self.clock.now(), self.ttl);

        match credentials
            .iter_mut()
            .find(|c| c.identifier == credential.identifier)
        {
            Some(existing) => *existing = credential.clone(),
            None => credentials.push(credential.clone()),
        }

        self.persist(&credentials).await?;
        log::info!("Saved credential for {}", credential.identifier);
        Ok(credential)
    }

    /// Every non-expired credential.
    pub async fn all(&self, order: CredentialOrder) -> CoreResult<Vec<Credential>> {
        let _guard = self.lock.lock().await;
        let mut credentials = self.load_pruned().await?;
        if order == CredentialOrder::MostRecentFirst {
            credentials.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        }
        Ok(credentials)
    }

    /// Like [`Self::all`], degrading storage failures to an empty list
    pub async fn all_or_empty(&self, order: CredentialOrder) -> Vec<Credential> {
        match self.all(order).await {
            Ok(credentials) => credentials,
            Err(e) => {
                log::warn!("Failed to read saved credentials: {e}");
                Vec::new()
            }
        }
    }

    pub async fn get(&self, identifier: &str) -> CoreResult<Option<Credential>> {
        Ok(self
            .all(CredentialOrder::Insertion)
            .await?
            .into_iter()
            .find(|c| c.identifier == identifier))
    }

    /// The credential issued last, used as the default selection
    pub async fn most_recent(&self) -> CoreResult<Option<Credential>> {
        Ok(self
            .all(CredentialOrder::MostRecentFirst)
            .await?
            .into_iter()
            .next())
    }

    /// Remove one credential. Returns whether it existed.
    pub async fn remove(&self, identifier: &str) -> CoreResult<bool> {
        let _guard = self.lock.lock().await;
        let mut credentials = self.load_pruned().await?;
        let before = credentials.len();
        credentials.retain(|c| c.identifier != identifier);
        if credentials.len() == before {
            return Ok(false);
        }
        self.persist(&credentials).await?;
        log::info!("Removed credential for {identifier}");
        Ok(true)
    }

    pub async fn clear_all(&self) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.kv.remove(CREDENTIALS_KEY).await?;
        self.kv.remove(LEGACY_CREDENTIALS_KEY).await?;
        log::info!("Cleared all saved credentials");
        Ok(())
    }

    /// Migrate, prune and rewrite the persisted collection.
    ///
    /// Unlike the lazy pruning done by reads, write failures are returned.
    pub async fn normalize(&self) -> CoreResult<NormalizeReport> {
        let _guard = self.lock.lock().await;
        let Loaded {
            credentials,
            mut report,
        } = self.load().await?;
        let (kept, expired) = self.prune(credentials);
        report.dropped += expired;
        report.remaining = kept.len();

        if report.migrated || report.dropped > 0 {
            self.persist(&kept).await?;
        }
        if report.changed() {
            log::info!(
                "Normalized saved credentials: migrated={}, discarded_corrupt={}, dropped={}, remaining={}",
                report.migrated,
                report.discarded_corrupt,
                report.dropped,
                report.remaining
            );
        }
        Ok(report)
    }

    // ===== Internal helpers =====

    /// Load, drop expired entries and write back best-effort when anything changed
    async fn load_pruned(&self) -> CoreResult<Vec<Credential>> {
        let Loaded {
            credentials,
            report,
        } = self.load().await?;
        let (kept, expired) = self.prune(credentials);

        if report.migrated || report.dropped > 0 || expired > 0 {
            if expired > 0 {
                log::info!("Dropped {expired} expired credential(s)");
            }
            if let Err(e) = self.persist(&kept).await {
                log::warn!("Failed to write back pruned credentials: {e}");
            }
        }
        Ok(kept)
    }

    async fn load(&self) -> CoreResult<Loaded> {
        let mut report = NormalizeReport::default();
        let (raw, source_key) = match self.kv.get(CREDENTIALS_KEY).await? {
            Some(raw) => (raw, CREDENTIALS_KEY),
            None => match self.kv.get(LEGACY_CREDENTIALS_KEY).await? {
                Some(raw) => {
                    log::info!("Found a credential under legacy key {LEGACY_CREDENTIALS_KEY}");
                    report.migrated = true;
                    (raw, LEGACY_CREDENTIALS_KEY)
                }
                None => {
                    return Ok(Loaded {
                        credentials: Vec::new(),
                        report,
                    })
                }
            },
        };

        let parsed = serde_json::from_str::<StoredCredentials>(&raw)
            .ok()
            .and_then(|stored| match stored {
                StoredCredentials::V2(envelope) => Some(envelope.credentials),
                StoredCredentials::V1(legacy) => {
                    report.migrated = true;
                    legacy.into_credential().map(|c| vec![c])
                }
            });

        let Some(credentials) = parsed else {
            log::warn!("Discarding unreadable credential data under {source_key}");
            self.kv.remove(source_key).await?;
            report.discarded_corrupt = true;
            return Ok(Loaded {
                credentials: Vec::new(),
                report,
            });
        };

        if report.migrated {
            log::info!("Migrating legacy single-credential data to the multi-credential format");
        }

        let (credentials, duplicates) = dedup_by_identifier(credentials);
        report.dropped = duplicates;
        Ok(Loaded {
            credentials,
            report,
        })
    }

    fn prune(&self, credentials: Vec<Credential>) -> (Vec<Credential>, usize) {
        let now = self.clock.now();
        let before = credentials.len();
        let kept: Vec<Credential> = credentials
            .into_iter()
            .filter(|c| !c.is_expired(now))
            .collect();
        let expired = before - kept.len();
        (kept, expired)
    }

    async fn persist(&self, credentials: &[Credential]) -> CoreResult<()> {
        let envelope = CredentialEnvelope {
            version: CREDENTIALS_SCHEMA_VERSION,
            credentials: credentials.to_vec(),
        };
        let json = serde_json::to_string(&envelope)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        self.kv.set(CREDENTIALS_KEY, &json).await?;
        retire_legacy_key(self.kv.as_ref(), LEGACY_CREDENTIALS_KEY).await;
        Ok(())
    }
}

/// Keep the first position of each identifier with the last value written for it
fn dedup_by_identifier(credentials: Vec<Credential>) -> (Vec<Credential>, usize) {
    let before = credentials.len();
    let mut unique: Vec<Credential> = Vec::with_capacity(before);
    for credential in credentials {
        match unique
            .iter_mut()
            .find(|c| c.identifier == credential.identifier)
        {
            Some(existing) => *existing = credential,
            None => unique.push(credential),
        }
    }
    let dropped = before - unique.len();
    (unique, dropped)
}

//! Stored credential type definitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of a saved credential
pub const DEFAULT_CREDENTIAL_TTL_DAYS: i64 = 30;

/// A saved API credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Account identifier (the account email), unique within the store
    pub identifier: String,
    /// API secret
    pub secret: String,
    /// When the credential was saved
    #[serde(with = "crate::utils::datetime")]
    pub issued_at: DateTime<Utc>,
    /// When the credential stops being returned by the store
    #[serde(with = "crate::utils::datetime")]
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential issued at `now` that lives for `ttl`.
    ///
    /// An expiry past the representable range saturates to the maximum date.
    #[must_use]
    pub fn issue(
        identifier: impl Into<String>,
        secret: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            issued_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Expired strictly after `expires_at`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Ordering for [`crate::services::CredentialStore::all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialOrder {
    /// Order in which identifiers were first saved
    #[default]
    Insertion,
    /// Newest `issued_at` first, used to pick the default selection
    MostRecentFirst,
}

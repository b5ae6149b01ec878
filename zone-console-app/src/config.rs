//! Application configuration.
//!
//! Stored as JSON. Missing fields take their defaults, so an empty object is
//! a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use zone_console_core::error::{CoreError, CoreResult};
use zone_console_core::parser::ParseOptions;
use zone_console_core::types::DEFAULT_CREDENTIAL_TTL_DAYS;

const APP_DIR_NAME: &str = "zone-console";
const CONFIG_FILE_NAME: &str = "config.json";
const STORAGE_FILE_NAME: &str = "storage.json";

/// Upper bound for `credential_ttl_days` (ten years)
pub const MAX_CREDENTIAL_TTL_DAYS: i64 = 3650;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Lifetime of a saved credential
    pub credential_ttl_days: i64,
    pub domains_page_size: u32,
    pub records_page_size: u32,
    /// Restrict bulk line types to the supported set
    pub strict_record_types: bool,
    /// Any invalid bulk line blocks the whole batch
    pub validate_all_before_send: bool,
    /// JSON storage file; the platform data directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            credential_ttl_days: DEFAULT_CREDENTIAL_TTL_DAYS,
            domains_page_size: 20,
            records_page_size: 50,
            strict_record_types: true,
            validate_all_before_send: true,
            storage_path: None,
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub async fn load(path: &Path) -> CoreResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(CoreError::StorageError(format!(
                    "Failed to read config {}: {e}",
                    path.display()
                )))
            }
        };

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| CoreError::SerializationError(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/zone-console/config.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Configured storage file, or `<data dir>/zone-console/storage.json`
    #[must_use]
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        self.storage_path.clone().or_else(|| {
            dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME).join(STORAGE_FILE_NAME))
        })
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(1..=MAX_CREDENTIAL_TTL_DAYS).contains(&self.credential_ttl_days) {
            return Err(CoreError::ValidationError(format!(
                "credential_ttl_days must be between 1 and {MAX_CREDENTIAL_TTL_DAYS}"
            )));
        }
        if self.domains_page_size == 0 || self.records_page_size == 0 {
            return Err(CoreError::ValidationError(
                "page sizes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn credential_ttl(&self) -> CoreResult<chrono::Duration> {
        chrono::Duration::try_days(self.credential_ttl_days).ok_or_else(|| {
            CoreError::ValidationError(format!(
                "credential_ttl_days out of range: {}",
                self.credential_ttl_days
            ))
        })
    }

    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict_types: self.strict_record_types,
            validate_all: self.validate_all_before_send,
            default_proxied: false,
        }
    }
}

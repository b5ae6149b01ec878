//! Domain name related type definitions

use serde::{Deserialize, Serialize};

/// A zone as listed by the remote provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Zone ID
    pub id: String,
    /// domain name
    pub name: String,
    /// Provider status (`active`, `pending`, ...)
    pub status: String,
    /// Creation time as reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
}

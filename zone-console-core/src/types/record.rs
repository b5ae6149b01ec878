//! DNS record type definitions: bulk-line intents and remote record mirrors

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Marker for the zone apex in NAME and CONTENT fields
pub const APEX_MARKER: &str = "@";

/// Record types accepted by strict parsing.
///
/// Serialized as uppercase strings (`"A"`, `"AAAA"`, `"CNAME"`, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
    /// Mail exchange record, content is `"<priority> <target>"`.
    Mx,
    /// Text record.
    Txt,
    /// Name server record.
    Ns,
    /// Service locator record.
    Srv,
    /// Certificate Authority Authorization record.
    Caa,
    /// Pointer record.
    Ptr,
}

impl RecordType {
    /// Every supported type, in display order
    pub const ALL: [Self; 9] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Mx,
        Self::Txt,
        Self::Ns,
        Self::Srv,
        Self::Caa,
        Self::Ptr,
    ];

    /// Uppercase wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
            Self::Ptr => "PTR",
        }
    }

    /// `"A, AAAA, CNAME, ..."` for error messages
    #[must_use]
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    /// Case-insensitive parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| format!("Unsupported record type: {}", s.trim()))
    }
}

/// One parsed `TYPE|NAME|CONTENT[|PROXIED]` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIntent {
    /// Record type; upper-cased when strict parsing is enabled
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record name, `@` for the apex
    pub name: String,
    /// Record content, `@` means "the zone apex" and is resolved by the consumer
    pub content: String,
    /// Route through the provider edge
    pub proxied: bool,
}

impl RecordIntent {
    /// The typed record type, if it is one of the supported ones
    #[must_use]
    pub fn known_type(&self) -> Option<RecordType> {
        self.record_type.parse().ok()
    }

    /// Render back into bulk-line form (always four fields)
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.record_type, self.name, self.content, self.proxied
        )
    }

    /// Expand apex markers and relative names against `zone`.
    ///
    /// NAME `@` becomes the zone itself; a NAME that is neither the zone nor
    /// already under it gets `.zone` appended. CONTENT `@` becomes the zone.
    #[must_use]
    pub fn resolve(&self, zone: &str) -> ResolvedRecord {
        let zone = zone.trim_end_matches('.');
        let name = if self.name == APEX_MARKER {
            zone.to_string()
        } else if self.name.eq_ignore_ascii_case(zone)
            || self
                .name
                .to_lowercase()
                .ends_with(&format!(".{}", zone.to_lowercase()))
        {
            self.name.clone()
        } else {
            format!("{}.{zone}", self.name)
        };
        let content = if self.content == APEX_MARKER {
            zone.to_string()
        } else {
            self.content.clone()
        };
        ResolvedRecord {
            record_type: self.record_type.clone(),
            name,
            content,
            proxied: self.proxied,
            content_is_apex: self.content == APEX_MARKER,
        }
    }
}

/// A [`RecordIntent`] with names made absolute for a specific zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully qualified name
    pub name: String,
    pub content: String,
    pub proxied: bool,
    /// CONTENT was `@`; an `A` record then needs the apex address looked up
    #[serde(skip)]
    pub content_is_apex: bool,
}

/// Why a bulk line was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRejection {
    /// 1-based line number in the submitted text (blank lines included)
    pub line_number: usize,
    /// The line as typed
    pub line: String,
    /// Human-readable reason
    pub reason: String,
}

impl fmt::Display for LineRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.reason)
    }
}

/// Read-only mirror of one record on the remote side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// Body of a single-record update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
}

impl RecordUpdate {
    /// Seed an edit form from an existing record
    #[must_use]
    pub fn from_record(record: &RemoteRecord) -> Self {
        Self {
            record_type: record.record_type.clone(),
            name: record.name.clone(),
            content: record.content.clone(),
            proxied: record.proxied,
        }
    }
}

//! DNS template type definitions

use serde::{Deserialize, Serialize};

/// Id of the built-in template that can never be deleted
pub const DEFAULT_TEMPLATE_ID: &str = "default";

/// A named, reusable set of bulk record lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Slug derived from the name, see [`template_slug`]
    pub id: String,
    /// Display name
    pub name: String,
    /// Raw `TYPE|NAME|CONTENT[|PROXIED]` lines, in order
    pub records: Vec<String>,
    /// Proxied value for lines that omit the fourth field
    #[serde(default)]
    pub default_proxied: bool,
}

impl Template {
    /// The template seeded into an empty store
    #[must_use]
    pub fn builtin_default() -> Self {
        Self {
            id: DEFAULT_TEMPLATE_ID.to_string(),
            name: "Default Template".to_string(),
            records: vec![
                "A|@|192.0.2.1|true".to_string(),
                "CNAME|www|@|true".to_string(),
                "CNAME|shop|@|true".to_string(),
                "CNAME|buy|@|true".to_string(),
            ],
            default_proxied: false,
        }
    }

    /// Whether this is the protected default template
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_TEMPLATE_ID
    }
}

/// Derive a template id from its name.
///
/// Lower-cases the name and replaces every character outside `[a-z0-9]` with `_`.
#[must_use]
pub fn template_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

//! DNS template collection
//!
//! Templates are stored as an ordered list in a versioned envelope under
//! [`TEMPLATES_KEY`]. The built-in default template is seeded on first read
//! and can never be deleted. Data written by the single-page release under
//! [`LEGACY_TEMPLATES_KEY`] is picked up when the current key is empty.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::parser::EXPECTED_FORMAT;
use crate::services::retire_legacy_key;
use crate::traits::KeyValueStore;
use crate::types::{template_slug, LineRejection, NormalizeReport, Template, DEFAULT_TEMPLATE_ID};

/// Storage key of the template collection
pub const TEMPLATES_KEY: &str = "zone_console.templates";

/// Key used by the single-page release (id-keyed map)
pub const LEGACY_TEMPLATES_KEY: &str = "cloudflare_dns_templates";

const TEMPLATES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct TemplateEnvelope {
    version: u32,
    templates: Vec<Template>,
}

#[derive(Debug, Deserialize)]
struct LegacyTemplate {
    name: String,
    #[serde(default)]
    records: Vec<String>,
}

/// Persisted shapes, newest first
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredTemplates {
    V1(TemplateEnvelope),
    /// `{ id: { name, records } }` keyed by slug
    Legacy(LegacyTemplateMap),
}

/// Legacy id-keyed map, kept in document order
#[derive(Debug)]
struct LegacyTemplateMap(Vec<(String, LegacyTemplate)>);

impl<'de> Deserialize<'de> for LegacyTemplateMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = LegacyTemplateMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of templates keyed by id")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, LegacyTemplate>()? {
                    entries.push(entry);
                }
                Ok(LegacyTemplateMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// DNS template collection
pub struct TemplateStore {
    kv: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl TemplateStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            lock: Mutex::new(()),
        }
    }

    /// All templates in stored order, default included
    pub async fn list(&self) -> CoreResult<Vec<Template>> {
        let _guard = self.lock.lock().await;
        let (templates, report) = self.load_seeded().await?;
        if report.changed() {
            self.persist(&templates).await?;
        }
        Ok(templates)
    }

    pub async fn get(&self, id: &str) -> CoreResult<Option<Template>> {
        Ok(self.list().await?.into_iter().find(|t| t.id == id))
    }

    /// Lines of a template; empty for an unknown id
    pub async fn records(&self, id: &str) -> CoreResult<Vec<String>> {
        Ok(self
            .get(id)
            .await?
            .map(|t| t.records)
            .unwrap_or_default())
    }

    /// Create or overwrite the template whose slug matches `name`.
    ///
    /// An existing template keeps its position and `default_proxied`.
    pub async fn save(&self, name: &str, records: &[String]) -> CoreResult<Template> {
        let (name, records) = validate_template(name, records)?;
        let id = template_slug(&name);

        let _guard = self.lock.lock().await;
        let (mut templates, _) = self.load_seeded().await?;
        let template = match templates.iter_mut().find(|t| t.id == id) {
            Some(existing) => {
                log::info!("Overwriting template {id}");
                existing.name = name;
                existing.records = records;
                existing.clone()
            }
            None => {
                let template = Template {
                    id,
                    name,
                    records,
                    default_proxied: false,
                };
                templates.push(template.clone());
                template
            }
        };

        self.persist(&templates).await?;
        log::info!("Saved template {} ({} lines)", template.id, template.records.len());
        Ok(template)
    }

    /// Replace name and lines of an existing template, keeping its id
    pub async fn update(&self, id: &str, name: &str, records: &[String]) -> CoreResult<Template> {
        let (name, records) = validate_template(name, records)?;

        let _guard = self.lock.lock().await;
        let (mut templates, _) = self.load_seeded().await?;
        let existing = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TemplateNotFound(id.to_string()))?;
        existing.name = name;
        existing.records = records;
        let template = existing.clone();

        self.persist(&templates).await?;
        log::info!("Updated template {id}");
        Ok(template)
    }

    /// Set the proxied value inherited by three-field lines
    pub async fn set_default_proxied(&self, id: &str, default_proxied: bool) -> CoreResult<Template> {
        let _guard = self.lock.lock().await;
        let (mut templates, _) = self.load_seeded().await?;
        let existing = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TemplateNotFound(id.to_string()))?;
        existing.default_proxied = default_proxied;
        let template = existing.clone();

        self.persist(&templates).await?;
        Ok(template)
    }

    /// Delete a template. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> CoreResult<bool> {
        if id == DEFAULT_TEMPLATE_ID {
            return Err(CoreError::TemplateProtected(id.to_string()));
        }

        let _guard = self.lock.lock().await;
        let (mut templates, report) = self.load_seeded().await?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        let removed = templates.len() != before;

        if removed || report.changed() {
            self.persist(&templates).await?;
        }
        if removed {
            log::info!("Deleted template {id}");
        }
        Ok(removed)
    }

    /// Migrate, re-seed and rewrite the persisted collection
    pub async fn normalize(&self) -> CoreResult<NormalizeReport> {
        let _guard = self.lock.lock().await;
        let (templates, mut report) = self.load_seeded().await?;
        report.remaining = templates.len();
        if report.changed() {
            self.persist(&templates).await?;
            log::info!(
                "Normalized templates: migrated={}, discarded_corrupt={}, seeded={}, remaining={}",
                report.migrated,
                report.discarded_corrupt,
                report.seeded,
                report.remaining
            );
        }
        Ok(report)
    }

    // ===== Internal helpers =====

    /// Load and make sure the default template exists
    async fn load_seeded(&self) -> CoreResult<(Vec<Template>, NormalizeReport)> {
        let (mut templates, mut report) = self.load().await?;

        let before = templates.len();
        let mut seen = HashSet::new();
        templates.retain(|t| seen.insert(t.id.clone()));
        report.dropped = before - templates.len();

        if !templates.iter().any(Template::is_default) {
            templates.insert(0, Template::builtin_default());
            report.seeded = true;
        }
        Ok((templates, report))
    }

    async fn load(&self) -> CoreResult<(Vec<Template>, NormalizeReport)> {
        let mut report = NormalizeReport::default();
        let (raw, source_key) = match self.kv.get(TEMPLATES_KEY).await? {
            Some(raw) => (raw, TEMPLATES_KEY),
            None => match self.kv.get(LEGACY_TEMPLATES_KEY).await? {
                Some(raw) => {
                    log::info!("Found templates under legacy key {LEGACY_TEMPLATES_KEY}");
                    report.migrated = true;
                    (raw, LEGACY_TEMPLATES_KEY)
                }
                None => return Ok((Vec::new(), report)),
            },
        };

        match serde_json::from_str::<StoredTemplates>(&raw) {
            Ok(StoredTemplates::V1(envelope)) => Ok((envelope.templates, report)),
            Ok(StoredTemplates::Legacy(LegacyTemplateMap(entries))) => {
                log::info!(
                    "Migrating {} legacy template(s) to the list format",
                    entries.len()
                );
                report.migrated = true;
                let templates = entries
                    .into_iter()
                    .map(|(id, legacy)| Template {
                        id,
                        name: legacy.name,
                        records: legacy.records,
                        default_proxied: false,
                    })
                    .collect();
                Ok((templates, report))
            }
            Err(e) => {
                log::warn!("Discarding unreadable template data under {source_key}: {e}");
                self.kv.remove(source_key).await?;
                report.discarded_corrupt = true;
                Ok((Vec::new(), report))
            }
        }
    }

    async fn persist(&self, templates: &[Template]) -> CoreResult<()> {
        let envelope = TemplateEnvelope {
            version: TEMPLATES_SCHEMA_VERSION,
            templates: templates.to_vec(),
        };
        let json = serde_json::to_string(&envelope)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        self.kv.set(TEMPLATES_KEY, &json).await?;
        retire_legacy_key(self.kv.as_ref(), LEGACY_TEMPLATES_KEY).await;
        Ok(())
    }
}

/// Trim the name and lines; every non-blank line needs 3 or 4 fields
fn validate_template(name: &str, records: &[String]) -> CoreResult<(String, Vec<String>)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::ValidationError(
            "Please enter a template name".to_string(),
        ));
    }

    let mut lines = Vec::new();
    let mut rejections = Vec::new();
    for (idx, raw) in records.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let fields = line.split('|').count();
        if (3..=4).contains(&fields) {
            lines.push(line.to_string());
        } else {
            rejections.push(LineRejection {
                line_number: idx + 1,
                line: raw.clone(),
                reason: format!("Invalid record format: {line}. Use {EXPECTED_FORMAT} format."),
            });
        }
    }

    if !rejections.is_empty() {
        return Err(CoreError::BatchRejected(rejections));
    }
    if lines.is_empty() {
        return Err(CoreError::ValidationError(
            "Please enter at least one DNS record".to_string(),
        ));
    }
    Ok((name.to_string(), lines))
}

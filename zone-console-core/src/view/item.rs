//! Rows that a [`super::ViewState`] can filter and sort

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Domain, RemoteRecord};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// A row of a server-paginated list
pub trait ViewItem: Clone {
    /// Sortable columns
    type Field: Copy + Eq + fmt::Debug;
    /// Local filter predicate set
    type Filter: Clone + Default + PartialEq + fmt::Debug;

    /// Stable identity used for selection
    fn id(&self) -> &str;

    /// Text the row sorts by for `field`
    fn sort_text(&self, field: Self::Field) -> Cow<'_, str>;

    /// Whether the row passes `filter`
    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// Case-insensitive text ordering, falling back to a byte compare on ties
#[must_use]
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

// ===== Records =====

/// Sortable record columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordField {
    Type,
    Name,
    Content,
    /// Sorts by the rendering `"true"` / `"false"`
    Proxied,
}

/// Local filter for the records list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    /// Case-insensitive substring of type, name or content
    #[serde(default)]
    pub search: String,
    /// Exact type, case-insensitive
    #[serde(default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub proxied: Option<bool>,
}

impl ViewItem for RemoteRecord {
    type Field = RecordField;
    type Filter = RecordFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_text(&self, field: RecordField) -> Cow<'_, str> {
        match field {
            RecordField::Type => Cow::Borrowed(&self.record_type),
            RecordField::Name => Cow::Borrowed(&self.name),
            RecordField::Content => Cow::Borrowed(&self.content),
            RecordField::Proxied => Cow::Owned(self.proxied.to_string()),
        }
    }

    fn matches(&self, filter: &RecordFilter) -> bool {
        if let Some(ref wanted) = filter.record_type {
            if !wanted.is_empty() && !self.record_type.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        if filter.proxied.is_some_and(|p| p != self.proxied) {
            return false;
        }
        let term = filter.search.trim().to_lowercase();
        term.is_empty()
            || contains_ci(&self.name, &term)
            || contains_ci(&self.content, &term)
            || contains_ci(&self.record_type, &term)
    }
}

// ===== Domains =====

/// Sortable domain columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainField {
    Name,
    Status,
    CreatedOn,
}

/// Local filter for the domains list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainFilter {
    /// Case-insensitive substring of the name
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ViewItem for Domain {
    type Field = DomainField;
    type Filter = DomainFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_text(&self, field: DomainField) -> Cow<'_, str> {
        match field {
            DomainField::Name => Cow::Borrowed(&self.name),
            DomainField::Status => Cow::Borrowed(&self.status),
            DomainField::CreatedOn => Cow::Borrowed(self.created_on.as_deref().unwrap_or("")),
        }
    }

    fn matches(&self, filter: &DomainFilter) -> bool {
        if let Some(ref wanted) = filter.status {
            if !wanted.is_empty() && !self.status.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        let term = filter.search.trim().to_lowercase();
        term.is_empty() || contains_ci(&self.name, &term)
    }
}

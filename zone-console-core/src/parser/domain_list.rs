//! Domain list parser for bulk zone creation

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::LineRejection;

static DOMAIN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]?\.([a-zA-Z]{2,}\.?)+$").ok()
});

/// Validated list of domains to add
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainList {
    pub domains: Vec<String>,
    pub rejections: Vec<LineRejection>,
}

/// Basic domain shape check: 3..=253 characters, a leading label and a TLD.
#[must_use]
pub fn is_valid_domain_format(domain: &str) -> bool {
    (3..=253).contains(&domain.len())
        && DOMAIN_RE
            .as_ref()
            .is_some_and(|re| re.is_match(domain))
}

/// Split newline-separated input into trimmed domains, rejecting malformed ones.
#[must_use]
pub fn parse_domain_list(text: &str) -> DomainList {
    let mut list = DomainList::default();
    for (idx, raw) in text.lines().enumerate() {
        let domain = raw.trim();
        if domain.is_empty() {
            continue;
        }
        if is_valid_domain_format(domain) {
            list.domains.push(domain.to_string());
        } else {
            list.rejections.push(LineRejection {
                line_number: idx + 1,
                line: raw.to_string(),
                reason: format!("Invalid domain format: {domain}"),
            });
        }
    }
    list
}

/// Like [`parse_domain_list`] but fails when anything was rejected or nothing was given.
pub fn require_domain_list(text: &str) -> CoreResult<Vec<String>> {
    let list = parse_domain_list(text);
    if !list.rejections.is_empty() {
        return Err(CoreError::BatchRejected(list.rejections));
    }
    if list.domains.is_empty() {
        return Err(CoreError::ValidationError(
            "Please enter at least one domain".to_string(),
        ));
    }
    Ok(list.domains)
}

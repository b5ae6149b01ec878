//! Bulk record line parser
//!
//! One record per line, pipe-delimited: `TYPE|NAME|CONTENT[|PROXIED]`.
//! Blank lines are skipped. Nothing here touches the network; a batch that
//! fails validation never reaches the `ZoneApi`.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{LineRejection, RecordIntent, RecordType, Template};

/// Accepted line formats, quoted in rejection messages
pub const EXPECTED_FORMAT: &str = "TYPE|NAME|CONTENT or TYPE|NAME|CONTENT|PROXIED";

/// Parser behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Restrict TYPE to [`RecordType`] and check MX content
    pub strict_types: bool,
    /// Any rejected line blocks the whole batch
    pub validate_all: bool,
    /// Proxied value for lines with only three fields
    pub default_proxied: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_types: true,
            validate_all: true,
            default_proxied: false,
        }
    }
}

/// Outcome of one non-blank input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based, counting blank lines
    pub line_number: usize,
    pub raw: String,
    pub result: Result<RecordIntent, LineRejection>,
}

/// Lines that passed validation, ready to send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub intents: Vec<RecordIntent>,
    /// Only non-empty when `validate_all` is off
    pub rejections: Vec<LineRejection>,
}

impl Submission {
    /// Normalized text for the bulk-apply endpoint, one four-field line per intent
    #[must_use]
    pub fn records_text(&self) -> String {
        self.intents
            .iter()
            .map(RecordIntent::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Bulk record line parser
#[derive(Debug, Clone, Default)]
pub struct RecordLineParser {
    options: ParseOptions,
}

impl RecordLineParser {
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parser for a template's lines, inheriting its proxied default
    #[must_use]
    pub fn for_template(template: &Template, strict_types: bool) -> Self {
        Self::new(ParseOptions {
            strict_types,
            validate_all: true,
            default_proxied: template.default_proxied,
        })
    }

    #[must_use]
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parse every non-blank line, keeping input order
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<ParsedLine> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| ParsedLine {
                line_number: idx + 1,
                raw: line.to_string(),
                result: self.parse_line(idx + 1, line),
            })
            .collect()
    }

    /// Parse and gate a batch before it is sent.
    ///
    /// With `validate_all`, every rejection is returned at once in
    /// `CoreError::BatchRejected` and nothing is accepted.
    pub fn prepare_submission(&self, text: &str) -> CoreResult<Submission> {
        let parsed = self.parse(text);
        if parsed.is_empty() {
            return Err(CoreError::ValidationError(
                "No DNS records provided".to_string(),
            ));
        }

        let mut submission = Submission::default();
        for line in parsed {
            match line.result {
                Ok(intent) => submission.intents.push(intent),
                Err(rejection) => submission.rejections.push(rejection),
            }
        }

        if self.options.validate_all && !submission.rejections.is_empty() {
            return Err(CoreError::BatchRejected(submission.rejections));
        }
        Ok(submission)
    }

    /// Parse a single line
    pub fn parse_line(&self, line_number: usize, raw: &str) -> Result<RecordIntent, LineRejection> {
        let reject = |reason: String| LineRejection {
            line_number,
            line: raw.to_string(),
            reason,
        };

        let line = raw.trim();
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if !(3..=4).contains(&fields.len()) {
            return Err(reject(format!(
                "Invalid record format: {line}. Use {EXPECTED_FORMAT} format."
            )));
        }

        let (type_field, name, content) = (fields[0], fields[1], fields[2]);
        for (label, value) in [("TYPE", type_field), ("NAME", name), ("CONTENT", content)] {
            if value.is_empty() {
                return Err(reject(format!("Missing {label} field in: {line}")));
            }
        }

        let record_type = if self.options.strict_types {
            let Ok(parsed) = type_field.parse::<RecordType>() else {
                return Err(reject(format!(
                    "Invalid record type: {type_field}. Supported types: {}",
                    RecordType::supported_list()
                )));
            };
            if parsed == RecordType::Mx && content.split_whitespace().count() < 2 {
                return Err(reject(
                    "MX record content must include priority (e.g., '10 mail.example.com')"
                        .to_string(),
                ));
            }
            parsed.as_str().to_string()
        } else {
            type_field.to_string()
        };

        let proxied = match fields.get(3).copied() {
            None | Some("") => self.options.default_proxied,
            Some(value) => parse_proxied(value).ok_or_else(|| {
                reject(format!(
                    "Invalid PROXIED value: {value} (expected true or false)"
                ))
            })?,
        };

        Ok(RecordIntent {
            record_type,
            name: name.to_string(),
            content: content.to_string(),
            proxied,
        })
    }
}

fn parse_proxied(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> RecordLineParser {
        RecordLineParser::default()
    }

    #[test]
    fn apex_a_record_with_proxied_flag() {
        let submission = strict().prepare_submission("A|@|192.0.2.1|true").unwrap();
        assert_eq!(
            submission.intents,
            vec![RecordIntent {
                record_type: "A".to_string(),
                name: "@".to_string(),
                content: "192.0.2.1".to_string(),
                proxied: true,
            }]
        );
    }

    #[test]
    fn three_fields_default_proxied_to_false() {
        let submission = strict().prepare_submission("CNAME|www|@").unwrap();
        assert_eq!(submission.intents.len(), 1);
        assert_eq!(submission.intents[0].content, "@");
        assert!(!submission.intents[0].proxied);
    }

    #[test]
    fn two_fields_rejected_with_line_and_format() {
        let err = strict().prepare_submission("A|@").unwrap_err();
        let CoreError::BatchRejected(rejections) = err else {
            panic!("expected BatchRejected, got {err:?}");
        };
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].line_number, 1);
        assert_eq!(rejections[0].line, "A|@");
        assert!(rejections[0].reason.contains("A|@"));
        assert!(rejections[0].reason.contains(EXPECTED_FORMAT));
    }

    #[test]
    fn five_fields_rejected() {
        let result = strict().parse_line(1, "A|@|192.0.2.1|true|extra");
        assert!(result.is_err());
    }

    #[test]
    fn every_rejection_reported_in_input_order() {
        let text = "A|@\nA|www|192.0.2.1\n\nBOGUS|x|y\nMX|@|mail.example.com\nTXT|@";
        let err = strict().prepare_submission(text).unwrap_err();
        let CoreError::BatchRejected(rejections) = err else {
            panic!("expected BatchRejected");
        };
        let numbers: Vec<usize> = rejections.iter().map(|r| r.line_number).collect();
        assert_eq!(numbers, vec![1, 4, 5, 6]);
        assert!(rejections[1].reason.starts_with("Invalid record type: BOGUS"));
        assert!(rejections[2].reason.contains("priority"));
    }

    #[test]
    fn partial_mode_keeps_valid_lines() {
        let parser = RecordLineParser::new(ParseOptions {
            validate_all: false,
            ..ParseOptions::default()
        });
        let submission = parser
            .prepare_submission("A|@|192.0.2.1\nA|@\nCNAME|www|@")
            .unwrap();
        assert_eq!(submission.intents.len(), 2);
        assert_eq!(submission.rejections.len(), 1);
        assert_eq!(submission.rejections[0].line_number, 2);
    }

    #[test]
    fn strict_mode_normalizes_type_case() {
        let intent = strict().parse_line(1, " aaaa | v6 | 2001:db8::1 ").unwrap();
        assert_eq!(intent.record_type, "AAAA");
        assert_eq!(intent.name, "v6");
        assert_eq!(intent.content, "2001:db8::1");
    }

    #[test]
    fn lenient_mode_accepts_any_type() {
        let parser = RecordLineParser::new(ParseOptions {
            strict_types: false,
            ..ParseOptions::default()
        });
        let intent = parser.parse_line(1, "spf|@|v=spf1 -all").unwrap();
        assert_eq!(intent.record_type, "spf");
        // MX shape is only checked in strict mode
        assert!(parser.parse_line(1, "MX|@|mail").is_ok());
    }

    #[test]
    fn mx_with_priority_accepted() {
        let intent = strict().parse_line(1, "mx|@|10 mail.example.com").unwrap();
        assert_eq!(intent.record_type, "MX");
        assert_eq!(intent.content, "10 mail.example.com");
    }

    #[test]
    fn empty_fields_and_bad_proxied_rejected() {
        assert!(strict()
            .parse_line(1, "A||192.0.2.1")
            .unwrap_err()
            .reason
            .contains("NAME"));
        assert!(strict()
            .parse_line(1, "A|@|192.0.2.1|maybe")
            .unwrap_err()
            .reason
            .contains("PROXIED"));
        // Trailing empty PROXIED falls back to the default
        assert!(!strict().parse_line(1, "A|@|192.0.2.1|").unwrap().proxied);
    }

    #[test]
    fn template_default_proxied_is_inherited() {
        let template = Template {
            id: "edge".to_string(),
            name: "Edge".to_string(),
            records: vec!["CNAME|www|@".to_string()],
            default_proxied: true,
        };
        let parser = RecordLineParser::for_template(&template, true);
        let intent = parser.parse_line(1, &template.records[0]).unwrap();
        assert!(intent.proxied);
        assert!(!parser.parse_line(1, "CNAME|www|@|false").unwrap().proxied);
    }

    #[test]
    fn blank_input_is_a_validation_error() {
        let err = strict().prepare_submission("\n  \n").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn records_text_is_normalized() {
        let submission = strict()
            .prepare_submission("a|@|192.0.2.1\r\ncname|www|@|TRUE")
            .unwrap();
        assert_eq!(
            submission.records_text(),
            "A|@|192.0.2.1|false\nCNAME|www|@|true"
        );
    }
}

//! Free-text input parsers (bulk record lines, domain lists)

mod domain_list;
mod record_line;

pub use domain_list::{is_valid_domain_format, parse_domain_list, require_domain_list, DomainList};
pub use record_line::{
    ParseOptions, ParsedLine, RecordLineParser, Submission, EXPECTED_FORMAT,
};

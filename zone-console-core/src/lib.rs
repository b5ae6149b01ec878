//! Zone Console Core Library
//!
//! Client-side engine of a DNS zone console:
//! - Saved credentials with expiry (`CredentialStore`)
//! - Reusable bulk-record templates (`TemplateStore`)
//! - Bulk record line and domain list parsing (`parser`)
//! - Paginated list view state with local filter, sort and selection (`view`)
//! - Bulk result classification (`ResultReporter`)
//!
//! The library is platform-independent: persistence goes through the
//! `KeyValueStore` trait and the remote provider through `ZoneApi`.

pub mod error;
pub mod parser;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;
pub mod view;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{Clock, InMemoryKeyValueStore, KeyValueStore, SystemClock, ZoneApi};

//! Storage layer and remote API abstraction trait definition

mod clock;
mod key_value_store;
mod zone_api;

pub use clock::{Clock, SystemClock};
pub use key_value_store::{InMemoryKeyValueStore, KeyValueStore};
pub use zone_api::ZoneApi;

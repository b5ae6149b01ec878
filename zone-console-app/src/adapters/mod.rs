//! Storage adapters for the `KeyValueStore` trait.
//!
//! `InMemoryKeyValueStore` lives in zone-console-core; this module adds the
//! on-disk backend.

#[cfg(feature = "file-store")]
mod json_file_store;

#[cfg(feature = "file-store")]
pub use json_file_store::JsonFileStore;

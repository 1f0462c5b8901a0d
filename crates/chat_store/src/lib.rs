//! Best-effort key/value persistence for chat transcripts and settings.
//!
//! Consumers read through [`KeyValueStoreExt::load_or`], which falls back to
//! a supplied default on missing or corrupt entries instead of raising.
//! Saves are fallible but callers are expected to treat them as best effort.

mod error;
pub mod keys;
mod store;

pub use error::StoreError;
pub use store::{FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore};

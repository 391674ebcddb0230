//! Store inspection tools.
//!
//! Read-only views over the named stores held by the proxy.

pub mod entries;
pub mod keys;

pub use entries::{CacheEntriesParams, entries_impl};
pub use keys::keys_impl;

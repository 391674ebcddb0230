//! SQLite-backed cache storage.
//!
//! A persistent set of named stores, each mapping a request key to a stored
//! response, accessed asynchronously via tokio-rusqlite. It supports:
//!
//! - Named stores created on demand and deleted as a unit
//! - Per-store match / put / delete / keys
//! - A global match across every store
//! - Automatic schema migrations and WAL mode
//!
//! There is no TTL and no size bound; entries live until their store is deleted.

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod response;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::RequestKey;
pub use response::{ResponseType, StoredResponse};
pub use storage::Store;

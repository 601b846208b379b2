//! Key-value storage layer for the gridstore server.
//!
//! - [`StorageBackend`]: the async get/put/delete/prefix-scan trait with an
//!   atomic read-modify-write transaction primitive
//! - [`MemoryBackend`]: ordered in-memory engine
//! - [`BackendFactory`]: per-namespace backend creation

pub mod backend;
pub mod factory;
pub mod memory;

pub use backend::{StorageBackend, Txn, TxnFn};
pub use factory::{BackendFactory, EngineKind};
pub use memory::MemoryBackend;

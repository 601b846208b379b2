//! Durable key-value backend trait and the transactional view.
//!
//! Defines [`StorageBackend`], the external collaborator every table store
//! sits on: get/put/delete, ordered prefix scan, and one atomic
//! read-modify-write primitive expressed as a transaction callback.

use std::collections::BTreeMap;

use async_trait::async_trait;
use gridstore_core::Value;

/// Mutable view of the store scoped to one transaction.
///
/// Handed to the [`transaction`](StorageBackend::transaction) callback; any
/// `get` observed inside the callback and any `put` issued by it commit as
/// one atomic unit. How that atomicity is realized is the backend's
/// business (the in-memory engine holds a whole-map lock, a durable engine
/// could use compare-and-swap).
pub struct Txn<'a> {
    entries: &'a mut BTreeMap<String, Value>,
}

impl<'a> Txn<'a> {
    /// Wraps a locked entry map for the duration of one callback.
    pub fn new(entries: &'a mut BTreeMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Reads a value inside the transaction.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Writes a value inside the transaction.
    pub fn put(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Transaction callback. Runs synchronously against the transactional view;
/// returning an error aborts without committing partial effects where the
/// backend supports it.
pub type TxnFn<'a> = Box<dyn FnOnce(&mut Txn<'_>) -> anyhow::Result<()> + Send + 'a>;

/// Asynchronous key-value storage with ordered prefix scans.
///
/// Used as `Arc<dyn StorageBackend>`. Reads, writes, and scans may suspend
/// awaiting the backend; that alone does not serialize concurrent callers,
/// which is why compound read-modify-write sequences must go through
/// [`transaction`](StorageBackend::transaction).
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key, or `None` if not present.
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;

    /// Insert or replace a value by key.
    async fn put(&self, key: &str, value: Value) -> anyhow::Result<()>;

    /// Remove a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> anyhow::Result<bool>;

    /// All entries whose key starts with `prefix`, in lexicographic key
    /// order. Callers relying on row ordering get it from this guarantee.
    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<(String, Value)>>;

    /// Runs `f` as one atomic read-modify-write unit.
    async fn transaction(&self, f: TxnFn<'_>) -> anyhow::Result<()>;
}

//! In-memory [`StorageBackend`] backed by a `BTreeMap`.
//!
//! The ordered map gives prefix scans their lexicographic key order for
//! free. A single `parking_lot` mutex guards the map; transactions hold it
//! for the whole callback, which makes the read-modify-write pair trivially
//! atomic (pessimistic, single-process).

use std::collections::BTreeMap;

use async_trait::async_trait;
use gridstore_core::Value;
use parking_lot::Mutex;

use super::backend::{StorageBackend, Txn, TxnFn};

/// In-memory storage suitable for development, testing, and single-node
/// deployments where the data set fits in memory.
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryBackend {
    /// Creates a new, empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.entries.lock().remove(key).is_some())
    }

    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<(String, Value)>> {
        let entries = self.entries.lock();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn transaction(&self, f: TxnFn<'_>) -> anyhow::Result<()> {
        let mut entries = self.entries.lock();
        let mut txn = Txn::new(&mut entries);
        f(&mut txn)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let backend = MemoryBackend::new();

        assert!(backend.get("k").await.unwrap().is_none());

        backend.put("k", Value::Int(1)).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(Value::Int(1)));

        // Same key overwrites, never duplicates.
        backend.put("k", Value::Int(2)).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(Value::Int(2)));

        assert!(backend.delete("k").await.unwrap());
        assert!(!backend.delete("k").await.unwrap());
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_prefix_matches_in_key_order() {
        let backend = MemoryBackend::new();
        backend.put("data:r2:1", Value::Int(21)).await.unwrap();
        backend.put("data:r1:2", Value::Int(12)).await.unwrap();
        backend.put("data:r1:1", Value::Int(11)).await.unwrap();
        backend.put("tables:x", Value::Null).await.unwrap();

        let entries = backend.list("data:").await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["data:r1:1", "data:r1:2", "data:r2:1"]);
    }

    #[tokio::test]
    async fn list_with_unmatched_prefix_is_empty() {
        let backend = MemoryBackend::new();
        backend.put("a", Value::Int(1)).await.unwrap();
        assert!(backend.list("z:").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transaction_sees_prior_writes_and_commits() {
        let backend = MemoryBackend::new();
        backend.put("counter", Value::Int(41)).await.unwrap();

        backend
            .transaction(Box::new(|txn| {
                let current = match txn.get("counter") {
                    Some(Value::Int(n)) => *n,
                    _ => 0,
                };
                txn.put("counter", Value::Int(current + 1));
                Ok(())
            }))
            .await
            .unwrap();

        assert_eq!(backend.get("counter").await.unwrap(), Some(Value::Int(42)));
    }

    #[tokio::test]
    async fn transaction_error_surfaces_to_caller() {
        let backend = MemoryBackend::new();
        let result = backend
            .transaction(Box::new(|_| anyhow::bail!("decode failed")))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn concurrent_transactions_do_not_lose_updates() {
        let backend = Arc::new(MemoryBackend::new());
        backend.put("counter", Value::Int(0)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend
                    .transaction(Box::new(|txn| {
                        let current = match txn.get("counter") {
                            Some(Value::Int(n)) => *n,
                            _ => 0,
                        };
                        txn.put("counter", Value::Int(current + 1));
                        Ok(())
                    }))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(backend.get("counter").await.unwrap(), Some(Value::Int(16)));
    }
}

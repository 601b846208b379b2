//! Factory for creating storage backends per namespace.
//!
//! The gateway asks for one backend for its table directory; the table host
//! asks for one fresh backend per table id. Keeping creation behind a
//! factory is the injection point for alternative engines later without
//! touching the gateway or host.

use std::sync::Arc;

use tracing::debug;

use super::backend::StorageBackend;
use super::memory::MemoryBackend;

/// Which storage engine the factory produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// In-memory `BTreeMap` engine.
    #[default]
    Memory,
}

/// Creates [`StorageBackend`] instances for named namespaces.
#[derive(Debug, Clone, Default)]
pub struct BackendFactory {
    engine: EngineKind,
}

impl BackendFactory {
    /// Factory producing the given engine kind.
    #[must_use]
    pub fn new(engine: EngineKind) -> Self {
        Self { engine }
    }

    /// Creates a fresh, empty backend for `namespace`.
    ///
    /// Namespaces are informational (they scope log output); isolation comes
    /// from each caller holding its own instance.
    #[must_use]
    pub fn create(&self, namespace: &str) -> Arc<dyn StorageBackend> {
        debug!(namespace, engine = ?self.engine, "created storage backend");
        match self.engine {
            EngineKind::Memory => Arc::new(MemoryBackend::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use gridstore_core::Value;

    use super::*;

    #[tokio::test]
    async fn created_backends_are_independent() {
        let factory = BackendFactory::default();
        let a = factory.create("table:a");
        let b = factory.create("table:b");

        a.put("k", Value::Int(1)).await.unwrap();

        assert_eq!(a.get("k").await.unwrap(), Some(Value::Int(1)));
        assert!(b.get("k").await.unwrap().is_none(), "backends must not share state");
    }

    #[tokio::test]
    async fn factory_output_is_object_safe() {
        let factory = BackendFactory::new(EngineKind::Memory);
        let backend: Arc<dyn StorageBackend> = factory.create("directory");
        backend.put("tables:x", Value::Null).await.unwrap();
        assert_eq!(backend.list("tables:").await.unwrap().len(), 1);
    }
}

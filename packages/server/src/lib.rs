//! gridstore server: storage engines, table actors, the gateway, and the
//! HTTP surface.
//!
//! The [`gateway`] module owns the table directory and delegates
//! table-scoped requests to per-table actors in [`table`]. The [`network`]
//! module exposes the gateway over axum with health probes and graceful
//! shutdown. Storage engines live behind the [`storage`] backend trait.

pub mod config;
pub mod gateway;
pub mod network;
pub mod storage;
pub mod table;

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        let factory = crate::storage::BackendFactory::default();
        let _gateway = crate::gateway::Gateway::new(factory).unwrap();
    }
}

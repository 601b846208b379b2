//! Per-table storage and hosting.
//!
//! - [`keys`]: composite cell key encoding
//! - [`TableStore`]: columns, cells, and lazy row reconstruction
//! - [`handlers`]: the table-scoped router
//! - [`TableHost`]: one serialized actor per table id

pub mod handlers;
pub mod host;
pub mod keys;
pub mod store;

pub use handlers::table_router;
pub use host::{HostError, TableHandle, TableHost};
pub use store::TableStore;

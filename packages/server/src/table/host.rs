//! Per-table actor hosting.
//!
//! Routes all operations for one table id through one serialized tokio
//! task: the task owns the table's store and drains a bounded mpsc channel
//! of request/reply pairs, so no two operations on the same table
//! interleave. Operations on different table ids share nothing and run
//! fully concurrently.

use std::sync::Arc;

use dashmap::DashMap;
use gridstore_core::{Request, Response, Router, TableId};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::storage::BackendFactory;

use super::handlers::table_router;
use super::store::TableStore;

/// Requests queued per table before senders start waiting.
const CALL_CHANNEL_CAPACITY: usize = 256;

/// Errors from calling into a table actor.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("table worker stopped accepting calls")]
    ChannelClosed,
    #[error("table worker dropped the reply")]
    ReplyDropped,
}

struct TableCall {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Cheap cloneable handle to one table's serialized execution context.
#[derive(Clone)]
pub struct TableHandle {
    tx: mpsc::Sender<TableCall>,
}

impl TableHandle {
    /// Sends a sub-request to the table and waits for its response.
    ///
    /// # Errors
    ///
    /// Fails only when the actor has shut down; handler faults come back as
    /// a regular fault-shaped `Response`.
    pub async fn call(&self, request: Request) -> Result<Response, HostError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TableCall {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| HostError::ChannelClosed)?;
        reply_rx.await.map_err(|_| HostError::ReplyDropped)
    }
}

/// Directory-wide registry of table actors.
///
/// Resolving an id returns the cached handle or lazily spawns an empty
/// table; ids coming from the directory are assumed initialized and are
/// not re-verified.
pub struct TableHost {
    factory: BackendFactory,
    router: Arc<Router<TableStore>>,
    tables: DashMap<TableId, TableHandle>,
    workers: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl TableHost {
    /// Creates an empty host producing table backends from `factory`.
    #[must_use]
    pub fn new(factory: BackendFactory) -> Self {
        let (shutdown_tx, _rx) = watch::channel(false);
        Self {
            factory,
            router: Arc::new(table_router()),
            tables: DashMap::new(),
            workers: Mutex::new(Vec::new()),
            shutdown_tx,
        }
    }

    /// Mints a globally unique table id.
    ///
    /// The jurisdiction hint would steer placement in a multi-region
    /// deployment; the single-node build records it and nothing more.
    #[must_use]
    pub fn new_unique_id(&self, jurisdiction: Option<&str>) -> TableId {
        if let Some(hint) = jurisdiction {
            debug!(hint, "jurisdiction hint recorded");
        }
        let hex = uuid::Uuid::new_v4().simple().to_string();
        TableId::parse(&hex).expect("uuid simple encoding is 32 lowercase hex chars")
    }

    /// Returns the handle for `id`, spawning the actor on first resolution.
    #[must_use]
    pub fn resolve(&self, id: &TableId) -> TableHandle {
        self.tables
            .entry(id.clone())
            .or_insert_with(|| self.spawn_table(id))
            .clone()
    }

    /// Number of live table actors.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn spawn_table(&self, id: &TableId) -> TableHandle {
        let backend = self.factory.create(&format!("table:{id}"));
        let store = Arc::new(TableStore::new(id.clone(), backend));
        let router = Arc::clone(&self.router);
        let (tx, mut rx) = mpsc::channel::<TableCall>(CALL_CHANNEL_CAPACITY);

        let table_id = id.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let worker = tokio::spawn(async move {
            debug!(table = %table_id, "table worker started");
            loop {
                tokio::select! {
                    call = rx.recv() => {
                        let Some(call) = call else { break };
                        let response = match router.handle(Arc::clone(&store), call.request).await {
                            Ok(response) => response,
                            Err(err) => {
                                warn!(table = %table_id, error = %err, "table handler fault");
                                Response::fault(&err)
                            }
                        };
                        // A caller that disconnected mid-operation just loses
                        // the reply; the key-value effects above are not
                        // rolled back.
                        let _ = call.reply.send(response);
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!(table = %table_id, "table worker stopped");
        });

        self.workers.lock().push(worker);
        TableHandle { tx }
    }

    /// Stops every table actor and waits for the workers to finish.
    ///
    /// Outstanding handles observe `ChannelClosed` on their next call.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.tables.clear();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for worker in workers {
            let _ = worker.await;
        }
    }
}

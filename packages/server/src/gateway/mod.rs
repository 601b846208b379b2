//! Directory-level gateway: table creation/listing plus delegation.
//!
//! The gateway owns the table directory and forwards table-scoped
//! operations to the addressed table actor as sub-requests carrying the
//! same `Request`/`Response` contract as the external surface. Write
//! operations answer with the full post-write combined view, not a delta.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use gridstore_core::{Method, PathMatcher, Request, Response, Router, TableId, Value};
use metrics::counter;
use serde::Deserialize;
use tracing::warn;

use crate::storage::{BackendFactory, StorageBackend};
use crate::table::keys::TABLES_PREFIX;
use crate::table::TableHost;

static LANDING_HTML: &str = include_str!("../../static/index.html");

/// Body of `POST /tables`.
#[derive(Debug, Default, Deserialize)]
struct CreateTableBody {
    jurisdiction: Option<String>,
}

/// Shared state behind the gateway router: the directory backend and the
/// table host. Passed to handlers explicitly, never ambient.
pub struct GatewayState {
    directory: Arc<dyn StorageBackend>,
    host: TableHost,
}

impl GatewayState {
    fn table_id(req: &Request) -> anyhow::Result<TableId> {
        let segment = req
            .path_segment(2)
            .with_context(|| format!("missing table id in {}", req.path))?;
        TableId::parse(segment).with_context(|| format!("invalid table id {segment:?}"))
    }

    /// Issues the columns and rows sub-requests and combines the results.
    async fn combined_view(&self, id: &TableId) -> anyhow::Result<Response> {
        let handle = self.host.resolve(id);
        let columns = handle.call(Request::get("/columns")).await?.into_json_body();
        let rows = handle.call(Request::get("/rows")).await?.into_json_body();

        let mut view = BTreeMap::new();
        view.insert("columns".to_string(), columns);
        view.insert("rows".to_string(), rows);
        Ok(Response::json_value(Value::Object(view)))
    }

    /// Forwards a sub-request verbatim and returns its response unchanged.
    async fn forward(&self, id: &TableId, sub: Request) -> anyhow::Result<Response> {
        Ok(self.host.resolve(id).call(sub).await?)
    }
}

async fn list_tables(state: Arc<GatewayState>, _req: Request) -> anyhow::Result<Response> {
    let ids: Vec<String> = state
        .directory
        .list(TABLES_PREFIX)
        .await?
        .into_iter()
        .filter_map(|(key, _)| key.strip_prefix(TABLES_PREFIX).map(str::to_string))
        .collect();
    Response::json(&ids)
}

async fn create_table(state: Arc<GatewayState>, req: Request) -> anyhow::Result<Response> {
    let body: CreateTableBody = match req.body {
        Some(_) => req.json_body()?,
        None => CreateTableBody::default(),
    };

    let id = state.host.new_unique_id(body.jurisdiction.as_deref());
    state
        .directory
        .put(
            &format!("{TABLES_PREFIX}{id}"),
            Value::String(id.to_string()),
        )
        .await?;

    let mut response = BTreeMap::new();
    response.insert("id".to_string(), Value::String(id.to_string()));
    Ok(Response::json_value(Value::Object(response)))
}

async fn get_table(state: Arc<GatewayState>, req: Request) -> anyhow::Result<Response> {
    let id = GatewayState::table_id(&req)?;
    state.combined_view(&id).await
}

async fn create_column(state: Arc<GatewayState>, req: Request) -> anyhow::Result<Response> {
    let id = GatewayState::table_id(&req)?;
    let body = req
        .body
        .ok_or_else(|| anyhow::anyhow!("column attributes required"))?;
    state
        .forward(&id, Request::post("/columns", body))
        .await?;
    state.combined_view(&id).await
}

async fn update_value(state: Arc<GatewayState>, req: Request) -> anyhow::Result<Response> {
    let id = GatewayState::table_id(&req)?;
    let body = req
        .body
        .ok_or_else(|| anyhow::anyhow!("value payload required"))?;
    state.forward(&id, Request::post("/value", body)).await?;
    state.combined_view(&id).await
}

async fn raw(state: Arc<GatewayState>, req: Request) -> anyhow::Result<Response> {
    let id = GatewayState::table_id(&req)?;
    state.forward(&id, Request::get("/raw")).await
}

async fn wipe(state: Arc<GatewayState>, req: Request) -> anyhow::Result<Response> {
    let id = GatewayState::table_id(&req)?;
    state.forward(&id, Request::get("/wipe")).await
}

#[allow(clippy::unused_async)]
async fn landing(_state: Arc<GatewayState>, _req: Request) -> anyhow::Result<Response> {
    Ok(Response::html(LANDING_HTML))
}

/// The directory of tables plus its request router.
pub struct Gateway {
    state: Arc<GatewayState>,
    router: Router<GatewayState>,
}

impl Gateway {
    /// Wires the directory backend and table host from `factory` and
    /// builds the route table.
    ///
    /// # Errors
    ///
    /// Fails only if a route pattern does not compile.
    pub fn new(factory: BackendFactory) -> anyhow::Result<Self> {
        let state = Arc::new(GatewayState {
            directory: factory.create("directory"),
            host: TableHost::new(factory),
        });

        let router = Router::new()
            .route(Method::Get, PathMatcher::pattern("^/wipe/.*")?, wipe)
            .route(Method::Get, PathMatcher::pattern("^/raw/.*")?, raw)
            .route(Method::Post, PathMatcher::pattern("^/value/.*")?, update_value)
            .route(Method::Post, PathMatcher::pattern("^/column/.*")?, create_column)
            .route(Method::Get, PathMatcher::pattern("^/table/.*")?, get_table)
            .route(Method::Get, PathMatcher::exact("/tables"), list_tables)
            .route(Method::Post, PathMatcher::exact("/tables"), create_table)
            .route(Method::Get, PathMatcher::exact("/"), landing);

        Ok(Self { state, router })
    }

    /// Dispatches one request, rendering handler faults as the 200
    /// `{message, stack}` failure shape at this outermost boundary.
    pub async fn dispatch(&self, request: Request) -> Response {
        // Unmatched paths collapse to one label to keep cardinality bounded.
        let surface = match request.path_segment(1) {
            Some(s @ ("tables" | "table" | "column" | "value" | "raw" | "wipe" | "")) => s,
            _ => "other",
        };
        counter!(
            "gridstore_requests_total",
            "method" => request.method.as_str(),
            "surface" => surface.to_string(),
        )
        .increment(1);
        let path = request.path.clone();
        match self.router.handle(Arc::clone(&self.state), request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(path = %path, error = %err, "gateway handler fault");
                counter!("gridstore_faults_total").increment(1);
                Response::fault(&err)
            }
        }
    }

    /// Stops all table actors.
    pub async fn shutdown(&self) {
        self.state.host.shutdown().await;
    }
}

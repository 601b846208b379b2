//! Table-scoped request handlers and router.
//!
//! Mirrors a subset of the external surface; the gateway delegates here
//! with the same `Request`/`Response` contract it speaks itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use gridstore_core::{Method, PathMatcher, Request, Response, Router, Value};
use serde::Deserialize;

use super::store::TableStore;

/// Body of `POST /value`.
#[derive(Debug, Deserialize)]
pub struct UpdateValueBody {
    #[serde(rename = "rowID")]
    pub row_id: String,
    #[serde(rename = "columnID")]
    pub column_id: u64,
    pub value: Value,
}

async fn list_columns(store: Arc<TableStore>, _req: Request) -> anyhow::Result<Response> {
    Response::json(&store.list_columns().await?)
}

async fn create_column(store: Arc<TableStore>, req: Request) -> anyhow::Result<Response> {
    let attrs: BTreeMap<String, Value> = req.json_body()?;
    Response::json(&store.create_column(attrs).await?)
}

async fn list_rows(store: Arc<TableStore>, _req: Request) -> anyhow::Result<Response> {
    Response::json(&store.list_rows().await?)
}

async fn update_value(store: Arc<TableStore>, req: Request) -> anyhow::Result<Response> {
    let body: UpdateValueBody = req.json_body()?;
    Response::json(&store.update_value(&body.row_id, body.column_id, body.value).await?)
}

async fn raw(store: Arc<TableStore>, _req: Request) -> anyhow::Result<Response> {
    Response::json(&store.raw().await?)
}

async fn wipe(store: Arc<TableStore>, _req: Request) -> anyhow::Result<Response> {
    Response::json(&store.wipe().await?)
}

/// Builds the table-scoped route table.
#[must_use]
pub fn table_router() -> Router<TableStore> {
    Router::new()
        .route(Method::Get, PathMatcher::exact("/columns"), list_columns)
        .route(Method::Post, PathMatcher::exact("/columns"), create_column)
        .route(Method::Get, PathMatcher::exact("/rows"), list_rows)
        .route(Method::Post, PathMatcher::exact("/value"), update_value)
        .route(Method::Get, PathMatcher::exact("/raw"), raw)
        .route(Method::Get, PathMatcher::exact("/wipe"), wipe)
}

#[cfg(test)]
mod tests {
    use gridstore_core::TableId;

    use crate::storage::MemoryBackend;

    use super::*;

    fn test_store() -> Arc<TableStore> {
        let id = TableId::parse("0123456789abcdef0123456789abcdef").unwrap();
        Arc::new(TableStore::new(id, Arc::new(MemoryBackend::new())))
    }

    fn json(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn get_columns_on_fresh_table_is_empty_array() {
        let router = table_router();
        let resp = router
            .handle(test_store(), Request::get("/columns"))
            .await
            .unwrap();
        assert_eq!(resp.into_json_body(), Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn post_columns_then_value_builds_the_expected_view() {
        let router = table_router();
        let store = test_store();

        let resp = router
            .handle(
                Arc::clone(&store),
                Request::post("/columns", json(r#"{"name":"age"}"#)),
            )
            .await
            .unwrap();
        assert_eq!(resp.into_json_body(), json(r#"[{"id":1,"name":"age"}]"#));

        let resp = router
            .handle(
                Arc::clone(&store),
                Request::post("/value", json(r#"{"rowID":"r1","columnID":1,"value":"30"}"#)),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.into_json_body(),
            json(r#"[{"id":"r1","values":[{"id":1,"value":"30"}]}]"#)
        );
    }

    #[tokio::test]
    async fn malformed_value_body_faults() {
        let router = table_router();
        let err = router
            .handle(
                test_store(),
                Request::post("/value", json(r#"{"rowID":"r1"}"#)),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("columnID"));
    }

    #[tokio::test]
    async fn wipe_answers_with_the_empty_raw_view() {
        let router = table_router();
        let store = test_store();

        router
            .handle(
                Arc::clone(&store),
                Request::post("/value", json(r#"{"rowID":"r1","columnID":1,"value":5}"#)),
            )
            .await
            .unwrap();

        let resp = router
            .handle(Arc::clone(&store), Request::get("/wipe"))
            .await
            .unwrap();
        assert_eq!(resp.into_json_body(), json("{}"));

        let resp = router
            .handle(store, Request::get("/raw"))
            .await
            .unwrap();
        assert_eq!(resp.into_json_body(), json("{}"));
    }

    #[tokio::test]
    async fn unknown_table_route_is_404() {
        let router = table_router();
        let resp = router
            .handle(test_store(), Request::get("/schema"))
            .await
            .unwrap();
        assert_eq!(resp, Response::not_found());
    }
}

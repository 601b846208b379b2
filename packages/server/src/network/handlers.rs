//! Axum handlers: health probes and the gateway fallback.
//!
//! Everything that is not a health probe falls through to
//! [`gateway_handler`], which translates the axum request into the
//! gateway's own request type and renders the result back. Body decode
//! failures are rendered with the same 200 `{message, stack}` shape as
//! handler faults so clients see one failure contract.

use std::sync::Arc;
use std::time::Instant;

use axum::body::to_bytes;
use axum::extract::{Request as HttpRequest, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response as HttpResponse};
use axum::Json;
use gridstore_core::{Method, Request, Response, ResponseBody, Value};
use serde_json::json;

use super::shutdown::{HealthState, ShutdownController};
use crate::gateway::Gateway;

/// Largest accepted request body. Cell values are small; anything bigger
/// is a client error.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub shutdown: Arc<ShutdownController>,
    pub start_time: Instant,
}

/// Detailed health JSON.
///
/// Always 200. The `state` field carries the actual condition so monitoring
/// can tell "up but draining" apart from "down".
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "state": state.shutdown.health_state().as_str(),
        "in_flight": state.shutdown.in_flight_count(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness probe. Always 200; a failed probe restarts the process.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe. 503 while starting, draining, or stopped.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Fallback for every non-probe route: translate, dispatch, render.
pub async fn gateway_handler(State(state): State<AppState>, req: HttpRequest) -> HttpResponse {
    let _guard = state.shutdown.in_flight_guard();

    // Verbs outside the surface never match a route.
    let Some(method) = Method::parse(req.method().as_str()) else {
        return render(Response::not_found());
    };
    let path = req.uri().path().to_string();

    let bytes = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let err = anyhow::Error::new(err).context("reading request body");
            return render(Response::fault(&err));
        }
    };

    let body = if bytes.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                let err = anyhow::Error::new(err).context("decoding request body as JSON");
                return render(Response::fault(&err));
            }
        }
    };

    let request = Request { method, path, body };
    render(state.gateway.dispatch(request).await)
}

fn render(response: Response) -> HttpResponse {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        ResponseBody::Empty => status.into_response(),
        ResponseBody::Json(value) => (status, Json(value.into_json())).into_response(),
        ResponseBody::Html(content) => (status, Html(content)).into_response(),
    }
}

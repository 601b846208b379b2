//! Network module with deferred startup lifecycle.
//!
//! `new()` creates resources, `start()` binds the TCP listener, and
//! `serve()` starts accepting connections. The split lets the caller learn
//! the bound port (port 0 binds an ephemeral one) before traffic flows.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::header::HeaderName;
use axum::http::{Method as HttpMethod, StatusCode};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    gateway_handler, health_handler, liveness_handler, readiness_handler, AppState,
};
use super::shutdown::ShutdownController;
use crate::gateway::Gateway;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` allocates the shutdown controller
/// 2. `start()` binds the TCP listener
/// 3. `serve()` accepts connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Shared handle to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router: health probes plus the gateway fallback.
    ///
    /// **Middleware ordering (outermost to innermost):** request id
    /// assignment, trace spans, gzip compression, CORS, request timeout,
    /// request id propagation onto the response.
    #[must_use]
    pub fn build_router(&self, gateway: Arc<Gateway>) -> Router {
        let state = AppState {
            gateway,
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
        };

        let x_request_id = HeaderName::from_static("x-request-id");

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .fallback(gateway_handler)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(CompressionLayer::new())
                    .layer(cors_layer(&self.config.cors_origins))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        self.config.request_timeout,
                    ))
                    .layer(PropagateRequestIdLayer::new(x_request_id)),
            )
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// port 0 requests an OS-assigned ephemeral port.
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then drains.
    ///
    /// After the shutdown signal the health state moves to Draining, in
    /// flight requests get up to 30 seconds to finish, and the state moves
    /// to Stopped on a clean drain.
    ///
    /// # Errors
    ///
    /// Fails on a fatal I/O error from the server.
    ///
    /// # Panics
    ///
    /// Panics when `start()` was not called first.
    pub async fn serve(
        self,
        gateway: Arc<Gateway>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router(gateway);
        let listener = self
            .listener
            .expect("start() must be called before serve()");
        let shutdown_ctrl = self.shutdown;

        shutdown_ctrl.set_ready();

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        shutdown_ctrl.trigger_shutdown();
        if shutdown_ctrl.wait_for_drain(DRAIN_TIMEOUT).await {
            info!("all in-flight requests drained");
        } else {
            warn!("drain timeout expired with in-flight requests remaining");
        }
        Ok(())
    }
}

/// CORS layer from the configured origin list. A wildcard entry allows any
/// origin; otherwise each origin is parsed into an explicit allowlist.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([HttpMethod::GET, HttpMethod::POST])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use crate::storage::BackendFactory;

    use super::*;

    fn test_gateway() -> Arc<Gateway> {
        Arc::new(Gateway::new(BackendFactory::default()).unwrap())
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = NetworkModule::new(NetworkConfig::default());
        assert!(module.listener.is_none());
    }

    #[test]
    fn build_router_assembles() {
        let module = NetworkModule::new(NetworkConfig::default());
        let _router = module.build_router(test_gateway());
    }

    #[test]
    fn cors_layer_accepts_wildcard_and_explicit_origins() {
        let _any = cors_layer(&["*".to_string()]);
        let _list = cors_layer(&[
            "http://localhost:3000".to_string(),
            "https://example.com".to_string(),
        ]);
    }

    #[tokio::test]
    async fn start_binds_an_os_assigned_port() {
        let mut module = NetworkModule::new(NetworkConfig::default());
        let port = module.start().await.expect("bind should succeed");
        assert!(port > 0);
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    #[should_panic(expected = "start() must be called before serve()")]
    async fn serve_panics_without_start() {
        let module = NetworkModule::new(NetworkConfig::default());
        let _ = module
            .serve(test_gateway(), std::future::pending::<()>())
            .await;
    }
}

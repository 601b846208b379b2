//! Ordered first-match request router.
//!
//! A `Router<S>` owns an immutable-after-build list of route descriptors.
//! Matching is first-match-wins in registration order with no
//! most-specific-match heuristic, so overlapping routes must be registered
//! narrowest first by the caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;

use crate::message::{Method, Request, Response};

/// Path matching strategy for one route.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Matches the path exactly (directory-style endpoints).
    Exact(String),
    /// Matches the path against a regex (prefix-style endpoints such as
    /// `/table/{id}/...`, where a nested router or handler resolves the id).
    Pattern(Regex),
}

impl PathMatcher {
    /// Exact-path matcher.
    #[must_use]
    pub fn exact(path: impl Into<String>) -> Self {
        PathMatcher::Exact(path.into())
    }

    /// Regex matcher. Anchor with `^` to avoid substring surprises.
    ///
    /// # Errors
    ///
    /// Fails when `pattern` is not a valid regex.
    pub fn pattern(pattern: &str) -> anyhow::Result<Self> {
        Ok(PathMatcher::Pattern(Regex::new(pattern)?))
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(p) => p == path,
            PathMatcher::Pattern(re) => re.is_match(path),
        }
    }
}

/// One route descriptor: method plus path matcher.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    matcher: PathMatcher,
}

impl Route {
    #[must_use]
    pub fn new(method: Method, matcher: PathMatcher) -> Self {
        Self { method, matcher }
    }

    /// Whether this route matches the request's method and path.
    #[must_use]
    pub fn matches(&self, request: &Request) -> bool {
        self.method == request.method && self.matcher.matches(&request.path)
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<Response>> + Send>>;
type BoxedHandler<S> = Box<dyn Fn(Arc<S>, Request) -> HandlerFuture + Send + Sync>;

/// Ordered list of `(Route, handler)` pairs dispatching over a shared state.
///
/// Handlers are async functions of `(Arc<S>, Request)`. Faults propagate out
/// of [`handle`](Router::handle) untouched; each layer's dispatch boundary
/// decides how to render them.
pub struct Router<S> {
    routes: Vec<(Route, BoxedHandler<S>)>,
}

impl<S: Send + Sync + 'static> Router<S> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route. Registration order is match precedence.
    #[must_use]
    pub fn route<F, Fut>(mut self, method: Method, matcher: PathMatcher, handler: F) -> Self
    where
        F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
    {
        let boxed: BoxedHandler<S> =
            Box::new(move |state, request| Box::pin(handler(state, request)));
        self.routes.push((Route::new(method, matcher), boxed));
        self
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs the first matching handler, or answers 404 with an empty body
    /// when nothing matches.
    ///
    /// # Errors
    ///
    /// Propagates the matched handler's fault; a route miss is `Ok`.
    pub async fn handle(&self, state: Arc<S>, request: Request) -> anyhow::Result<Response> {
        for (route, handler) in &self.routes {
            if route.matches(&request) {
                tracing::debug!(method = request.method.as_str(), path = %request.path, "route matched");
                return handler(state, request).await;
            }
        }
        tracing::debug!(method = request.method.as_str(), path = %request.path, "no route matched");
        Ok(Response::not_found())
    }
}

impl<S: Send + Sync + 'static> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    struct Hits;

    fn tagged(tag: i64) -> Response {
        Response::json_value(Value::Int(tag))
    }

    #[tokio::test]
    async fn first_registered_match_wins() {
        let router = Router::<Hits>::new()
            .route(Method::Get, PathMatcher::pattern("^/a/.*").unwrap(), |_, _| async {
                Ok(tagged(1))
            })
            .route(Method::Get, PathMatcher::exact("/a/b"), |_, _| async {
                Ok(tagged(2))
            });

        // "/a/b" matches both routes; the pattern was registered first.
        let resp = router
            .handle(Arc::new(Hits), Request::get("/a/b"))
            .await
            .unwrap();
        assert_eq!(resp.into_json_body(), Value::Int(1));
    }

    #[tokio::test]
    async fn no_match_is_404_with_empty_body() {
        let router = Router::<Hits>::new().route(
            Method::Get,
            PathMatcher::exact("/tables"),
            |_, _| async { Ok(tagged(1)) },
        );

        let resp = router
            .handle(Arc::new(Hits), Request::get("/missing"))
            .await
            .unwrap();
        assert_eq!(resp, Response::not_found());
    }

    #[tokio::test]
    async fn method_must_match() {
        let router = Router::<Hits>::new().route(
            Method::Post,
            PathMatcher::exact("/tables"),
            |_, _| async { Ok(tagged(1)) },
        );

        let resp = router
            .handle(Arc::new(Hits), Request::get("/tables"))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn pattern_routes_match_prefix_style_paths() {
        let router = Router::<Hits>::new().route(
            Method::Get,
            PathMatcher::pattern("^/table/.*").unwrap(),
            |_, req| async move {
                let id = req.path_segment(2).unwrap_or_default().to_string();
                Ok(Response::json_value(Value::String(id)))
            },
        );

        let resp = router
            .handle(Arc::new(Hits), Request::get("/table/deadbeef"))
            .await
            .unwrap();
        assert_eq!(resp.into_json_body(), Value::String("deadbeef".to_string()));
    }

    #[tokio::test]
    async fn handler_faults_propagate_to_the_caller() {
        let router = Router::<Hits>::new().route(
            Method::Get,
            PathMatcher::exact("/boom"),
            |_, _| async { anyhow::bail!("handler exploded") },
        );

        let err = router
            .handle(Arc::new(Hits), Request::get("/boom"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("handler exploded"));
    }

    #[tokio::test]
    async fn state_is_shared_across_calls() {
        struct Counter(std::sync::atomic::AtomicU64);

        let router = Router::<Counter>::new().route(
            Method::Get,
            PathMatcher::exact("/hit"),
            |state: Arc<Counter>, _| async move {
                let n = state.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(Response::json_value(Value::Int(i64::try_from(n)?)))
            },
        );

        let state = Arc::new(Counter(std::sync::atomic::AtomicU64::new(0)));
        for expected in 0..3 {
            let resp = router
                .handle(Arc::clone(&state), Request::get("/hit"))
                .await
                .unwrap();
            assert_eq!(resp.into_json_body(), Value::Int(expected));
        }
    }
}

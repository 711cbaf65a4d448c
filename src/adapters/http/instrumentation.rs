//! Request Instrumentation - axum Middleware
//!
//! Counts every inbound request against its `"[METHOD] /path"` key
//! before the handler runs, then adds the handler's wall time to the
//! request-latency sum. Never touches the response.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;

use crate::domain::registry::{LatencyKind, MetricRegistry};

/// Middleware body; mount with [`ObservedRouter::with_request_metrics`].
///
/// The request is counted before control passes downstream, so it is
/// recorded exactly once whether or not the handler succeeds.
pub async fn track_requests(
    State(registry): State<Arc<MetricRegistry>>,
    request: Request,
    next: Next,
) -> Response {
    // uri().path() excludes the query string.
    registry.record_request(request.method().as_str(), request.uri().path());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    registry.record_latency(LatencyKind::Request, elapsed_ms);

    response
}

/// Adds request metrics to any router.
pub trait ObservedRouter {
    /// Wrap every route of this router in [`track_requests`].
    #[must_use]
    fn with_request_metrics(self, registry: Arc<MetricRegistry>) -> Self;
}

impl<S> ObservedRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_request_metrics(self, registry: Arc<MetricRegistry>) -> Self {
        self.layer(middleware::from_fn_with_state(registry, track_requests))
    }
}

//! HTTP Integration Tests - Collector Client and Request Middleware
//!
//! Stands up real axum servers on loopback: a fake OTLP collector to
//! receive pushes from `OtlpHttpSink`, and an instrumented router to
//! exercise the request-counting middleware end-to-end.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use pizza_telemetry::adapters::collector::{CollectorConfig, OtlpHttpSink};
use pizza_telemetry::adapters::http::{HealthServer, HealthState, ObservedRouter};
use pizza_telemetry::domain::payload::{self, PayloadContext};
use pizza_telemetry::domain::registry::MetricRegistry;
use pizza_telemetry::domain::system::SystemSample;
use pizza_telemetry::error::{ExportError, SamplingError};
use pizza_telemetry::ports::sampler::SystemSampler;
use pizza_telemetry::ports::sink::MetricSink;
use pizza_telemetry::usecases::exporter::{Exporter, ExporterSettings, FlushOutcome};

type Received = Arc<Mutex<Vec<(HeaderMap, serde_json::Value)>>>;

// ---- Helpers ----

struct FixedSampler;

impl SystemSampler for FixedSampler {
    fn sample_cpu(&self) -> Result<f64, SamplingError> {
        Ok(12.0)
    }

    fn sample_memory(&self) -> Result<f64, SamplingError> {
        Ok(48.0)
    }
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Fake collector answering every push with `status`.
async fn spawn_collector(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route(
            "/v1/metrics",
            post(
                move |State(store): State<Received>,
                      headers: HeaderMap,
                      Json(body): Json<serde_json::Value>| async move {
                    store.lock().unwrap().push((headers, body));
                    (status, "collector says hi")
                },
            ),
        )
        .with_state(Arc::clone(&received));

    let base = serve(app).await;
    (format!("{base}/v1/metrics"), received)
}

fn sink(url: String) -> OtlpHttpSink {
    OtlpHttpSink::new(CollectorConfig {
        url,
        api_key: "glc_test_key".to_string(),
        timeout: Duration::from_secs(2),
    })
    .unwrap()
}

fn sample_payload() -> payload::MetricPayload {
    let registry = MetricRegistry::new();
    registry.record_request("GET", "/api/order");
    payload::build(
        &registry.snapshot(),
        &SystemSample::default(),
        &PayloadContext::with_source("jwt-pizza-service-test"),
    )
}

// ---- Collector Client ----

#[tokio::test]
async fn test_push_sends_bearer_json_body() {
    let (url, received) = spawn_collector(StatusCode::OK).await;
    let sink = sink(url);

    assert_ok!(sink.send(&sample_payload()).await);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (headers, body) = &received[0];
    assert_eq!(headers["authorization"], "Bearer glc_test_key");
    assert_eq!(headers["content-type"], "application/json");

    let metrics = &body["resourceMetrics"][0]["scopeMetrics"][0]["metrics"];
    assert_eq!(metrics[0]["name"], "requests");
    assert_eq!(
        metrics[0]["sum"]["dataPoints"][0]["attributes"][0]["value"]["stringValue"],
        "[GET] /api/order"
    );
    assert_eq!(
        metrics[0]["sum"]["aggregationTemporality"],
        "AGGREGATION_TEMPORALITY_CUMULATIVE"
    );
}

#[tokio::test]
async fn test_non_2xx_is_status_error() {
    let (url, received) = spawn_collector(StatusCode::UNAUTHORIZED).await;
    let sink = sink(url);

    let err = sink.send(&sample_payload()).await.unwrap_err();
    match err {
        ExportError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "collector says hi");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_collector_is_transport_error() {
    // Bind then drop to obtain a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = sink(format!("http://{addr}/v1/metrics"));
    let result = sink.send(&sample_payload()).await;
    assert_err!(&result);
    assert!(matches!(result, Err(ExportError::Transport(_))));
}

#[tokio::test]
async fn test_transport_failure_is_swallowed_by_exporter() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let registry = Arc::new(MetricRegistry::new());
    registry.record_auth_result(true);

    let exporter = Exporter::new(
        Arc::clone(&registry),
        Arc::new(FixedSampler),
        Arc::new(sink(format!("http://{addr}/v1/metrics"))),
        ExporterSettings::default(),
    );

    assert_eq!(exporter.flush().await, FlushOutcome::Dropped);
    assert_eq!(exporter.flush().await, FlushOutcome::Dropped);
    assert_eq!(registry.snapshot().auth_successes, 1);
}

// ---- Request Instrumentation ----

#[tokio::test]
async fn test_middleware_counts_each_request_once() {
    let registry = Arc::new(MetricRegistry::new());
    let app = Router::new()
        .route("/api/order", get(|| async { "orders" }))
        .route(
            "/api/order/fail",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .with_request_metrics(Arc::clone(&registry));
    let base = serve(app).await;

    let client = reqwest::Client::new();
    for _ in 0..3 {
        let resp = client
            .get(format!("{base}/api/order?page=2"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "orders");
    }
    let resp = client.get(format!("{base}/api/order/fail")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "boom");

    assert_eq!(registry.endpoint_count("GET", "/api/order"), Some(3));
    assert_eq!(registry.endpoint_count("GET", "/api/order/fail"), Some(1));
    assert_eq!(registry.endpoint_count("POST", "/api/order"), None);
}

#[tokio::test]
async fn test_middleware_accumulates_request_latency() {
    let registry = Arc::new(MetricRegistry::new());
    let app = Router::new()
        .route(
            "/api/order/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                "slow"
            }),
        )
        .with_request_metrics(Arc::clone(&registry));
    let base = serve(app).await;
    let client = reqwest::Client::new();

    assert_eq!(registry.snapshot().request_latency_ms, 0);

    let resp = client.get(format!("{base}/api/order/slow")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "slow");
    let first = registry.snapshot().request_latency_ms;
    assert!(first >= 20, "one slow request recorded {first} ms");

    let resp = client.get(format!("{base}/api/order/slow")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "slow");
    let second = registry.snapshot().request_latency_ms;
    assert!(second >= first + 20, "latency did not accumulate: {first} -> {second}");
    assert!(second >= 40);

    // Handler time only goes to request latency.
    assert_eq!(registry.snapshot().pizza_latency_ms, 0);
}

#[tokio::test]
async fn test_health_probes_are_instrumented() {
    let registry = Arc::new(MetricRegistry::new());
    let health = HealthState::new();
    let server = HealthServer::new(health.clone(), Arc::clone(&registry), "127.0.0.1:0".to_string());
    let base = serve(server.router()).await;

    let live = reqwest::get(format!("{base}/live")).await.unwrap();
    assert_eq!(live.status(), 200);

    health.mark_not_ready();
    let ready = reqwest::get(format!("{base}/ready")).await.unwrap();
    assert_eq!(ready.status(), 503);

    assert_eq!(registry.endpoint_count("GET", "/live"), Some(1));
    assert_eq!(registry.endpoint_count("GET", "/ready"), Some(1));
}

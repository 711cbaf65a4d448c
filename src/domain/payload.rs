//! OTLP/JSON Metrics Payload — Wire Types and Builder
//!
//! Turns a registry snapshot plus a host sample into the nested
//! resource → scope → metric → data-point structure accepted by
//! OTLP/HTTP JSON collectors.
//!
//! Every counter is reported as a cumulative monotonic `sum`; only the
//! host CPU and memory readings are `gauge`s. The builder is pure: the
//! data-point timestamp comes from the snapshot, so the same inputs
//! always produce the same payload.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::registry::RegistrySnapshot;
use super::system::SystemSample;

/// Instrumentation scope name attached to every export.
pub const SCOPE_NAME: &str = env!("CARGO_PKG_NAME");

/// Nanoseconds per millisecond, for `timeUnixNano`.
const NANOS_PER_MILLI: u64 = 1_000_000;

// ────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────

/// Top-level export request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPayload {
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<InstrumentationScope>,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
}

/// One named metric. `data` flattens to a `sum` or `gauge` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub unit: String,
    #[serde(flatten)]
    pub data: MetricData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricData {
    Sum(Sum),
    Gauge(Gauge),
}

impl MetricData {
    /// Data points regardless of kind.
    pub fn data_points(&self) -> &[DataPoint] {
        match self {
            Self::Sum(sum) => &sum.data_points,
            Self::Gauge(gauge) => &gauge.data_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sum {
    pub data_points: Vec<DataPoint>,
    pub aggregation_temporality: AggregationTemporality,
    pub is_monotonic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub data_points: Vec<DataPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregationTemporality {
    #[serde(rename = "AGGREGATION_TEMPORALITY_CUMULATIVE")]
    Cumulative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    #[serde(flatten)]
    pub value: NumberValue,
    pub time_unix_nano: u64,
    pub attributes: Vec<KeyValue>,
}

/// Numeric value of a data point; serializes as `asInt` or `asDouble`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NumberValue {
    #[serde(rename = "asInt")]
    Int(u64),
    #[serde(rename = "asDouble")]
    Double(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    pub string_value: String,
}

impl KeyValue {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue {
                string_value: value.into(),
            },
        }
    }
}

// ────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────

/// Aggregation shape of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Cumulative, monotonic counter.
    Sum,
    /// Instantaneous reading.
    Gauge,
}

/// Description of a single metric before it is shaped for the wire.
#[derive(Debug, Clone)]
struct MetricSpec {
    name: &'static str,
    unit: &'static str,
    kind: MetricKind,
    value: NumberValue,
    /// Metric-specific dimensions (e.g. `endpoint`).
    attributes: BTreeMap<String, String>,
}

impl MetricSpec {
    fn sum(name: &'static str, unit: &'static str, value: NumberValue) -> Self {
        Self {
            name,
            unit,
            kind: MetricKind::Sum,
            value,
            attributes: BTreeMap::new(),
        }
    }

    fn gauge(name: &'static str, unit: &'static str, value: f64) -> Self {
        Self {
            name,
            unit,
            kind: MetricKind::Gauge,
            value: NumberValue::Double(value),
            attributes: BTreeMap::new(),
        }
    }

    fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// Static attributes merged into every data point, plus resource identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PayloadContext {
    /// Attributes added to every data point (e.g. `source`).
    pub static_attributes: BTreeMap<String, String>,
    /// Reported as the resource's `service.name`; omitted when `None`.
    pub service_name: Option<String>,
}

impl PayloadContext {
    /// Context carrying only the `source` tag.
    pub fn with_source(source: impl Into<String>) -> Self {
        let mut static_attributes = BTreeMap::new();
        static_attributes.insert("source".to_string(), source.into());
        Self {
            static_attributes,
            service_name: None,
        }
    }
}

/// Build the export payload for one flush cycle.
pub fn build(
    snapshot: &RegistrySnapshot,
    system: &SystemSample,
    context: &PayloadContext,
) -> MetricPayload {
    let time_unix_nano = u64::try_from(snapshot.taken_at.timestamp_millis())
        .unwrap_or(0)
        .saturating_mul(NANOS_PER_MILLI);

    let metrics = metric_specs(snapshot, system)
        .into_iter()
        .map(|spec| create_metric(spec, time_unix_nano, &context.static_attributes))
        .collect();

    let resource = context.service_name.as_ref().map(|name| Resource {
        attributes: vec![KeyValue::string("service.name", name.clone())],
    });

    MetricPayload {
        resource_metrics: vec![ResourceMetrics {
            resource,
            scope_metrics: vec![ScopeMetrics {
                scope: Some(InstrumentationScope {
                    name: SCOPE_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                }),
                metrics,
            }],
        }],
    }
}

/// Every metric reported per cycle, in export order.
fn metric_specs(snapshot: &RegistrySnapshot, system: &SystemSample) -> Vec<MetricSpec> {
    let mut specs: Vec<MetricSpec> = snapshot
        .requests
        .iter()
        .map(|(endpoint, count)| {
            MetricSpec::sum("requests", "1", NumberValue::Int(*count))
                .with_attribute("endpoint", endpoint.as_str())
        })
        .collect();

    specs.extend([
        MetricSpec::gauge("cpu", "%", system.cpu_percent),
        MetricSpec::gauge("memory", "%", system.memory_percent),
        MetricSpec::sum("success", "1", NumberValue::Int(snapshot.auth_successes)),
        MetricSpec::sum("failure", "1", NumberValue::Int(snapshot.auth_failures)),
        MetricSpec::sum("active", "1", NumberValue::Int(snapshot.active_users)),
        MetricSpec::sum(
            "request latency",
            "ms",
            NumberValue::Int(snapshot.request_latency_ms),
        ),
        MetricSpec::sum(
            "pizza latency",
            "ms",
            NumberValue::Int(snapshot.pizza_latency_ms),
        ),
        MetricSpec::sum("pizza purchases", "1", NumberValue::Int(snapshot.pizzas_sold)),
        MetricSpec::sum(
            "purchase failures",
            "1",
            NumberValue::Int(snapshot.purchase_failures),
        ),
        MetricSpec::sum(
            "revenue",
            "1",
            NumberValue::Double(snapshot.revenue.to_f64().unwrap_or(0.0)),
        ),
    ]);

    specs
}

/// Shape one metric for the wire. Static attributes override dimensions
/// of the same name.
fn create_metric(
    spec: MetricSpec,
    time_unix_nano: u64,
    static_attributes: &BTreeMap<String, String>,
) -> Metric {
    let mut attributes = spec.attributes;
    attributes.extend(
        static_attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    let data_points = vec![DataPoint {
        value: spec.value,
        time_unix_nano,
        attributes: attributes
            .into_iter()
            .map(|(k, v)| KeyValue::string(k, v))
            .collect(),
    }];

    let data = match spec.kind {
        MetricKind::Sum => MetricData::Sum(Sum {
            data_points,
            aggregation_temporality: AggregationTemporality::Cumulative,
            is_monotonic: true,
        }),
        MetricKind::Gauge => MetricData::Gauge(Gauge { data_points }),
    };

    Metric {
        name: spec.name.to_string(),
        unit: spec.unit.to_string(),
        data,
    }
}

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref WEBHOOKS_RECEIVED_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "relay_webhooks_received_total",
        "Total number of webhook requests accepted by the /webhook endpoint."
    ))
    .expect("metric can be created");
    pub static ref ALERTS_ENQUEUED_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "relay_alerts_enqueued_total",
        "Total number of alert payloads accepted into the delivery queue."
    ))
    .expect("metric can be created");
    pub static ref ALERTS_DROPPED_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "relay_alerts_dropped_total",
        "Total number of alert payloads dropped because the queue was full."
    ))
    .expect("metric can be created");
    pub static ref FORWARDS_SUCCEEDED_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "relay_forwards_succeeded_total",
        "Total number of payloads successfully delivered to OpenClaw."
    ))
    .expect("metric can be created");
    pub static ref FORWARDS_FAILED_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "relay_forwards_failed_total",
        "Total number of payloads that failed delivery after all retries."
    ))
    .expect("metric can be created");
}

pub fn register_metrics() {
    REGISTRY
        .register(Box::new(WEBHOOKS_RECEIVED_TOTAL.clone()))
        .expect("Failed to register WEBHOOKS_RECEIVED_TOTAL");
    REGISTRY
        .register(Box::new(ALERTS_ENQUEUED_TOTAL.clone()))
        .expect("Failed to register ALERTS_ENQUEUED_TOTAL");
    REGISTRY
        .register(Box::new(ALERTS_DROPPED_TOTAL.clone()))
        .expect("Failed to register ALERTS_DROPPED_TOTAL");
    REGISTRY
        .register(Box::new(FORWARDS_SUCCEEDED_TOTAL.clone()))
        .expect("Failed to register FORWARDS_SUCCEEDED_TOTAL");
    REGISTRY
        .register(Box::new(FORWARDS_FAILED_TOTAL.clone()))
        .expect("Failed to register FORWARDS_FAILED_TOTAL");
}

/// Renders the registry in the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

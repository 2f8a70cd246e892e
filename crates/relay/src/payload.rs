use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grafana Alertmanager webhook payload (version 4 wire format).
///
/// Treated as an immutable unit of work: the HTTP boundary parses it, the
/// queue takes ownership, and the consumer forwards it unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertmanagerPayload {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "groupKey", default)]
    pub group_key: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(rename = "groupLabels", default)]
    pub group_labels: HashMap<String, String>,
    #[serde(rename = "commonLabels", default)]
    pub common_labels: HashMap<String, String>,
    #[serde(rename = "commonAnnotations", default)]
    pub common_annotations: HashMap<String, String>,
    #[serde(rename = "externalURL", default)]
    pub external_url: String,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// A single alert within a grouped webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(rename = "startsAt", default = "unix_epoch")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "endsAt", default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "generatorURL", default)]
    pub generator_url: String,
    #[serde(default)]
    pub fingerprint: String,
}

// Placeholder for alerts that omit `startsAt`, mirroring the zero-value
// timestamp Alertmanager itself emits for unset times.
fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl AlertmanagerPayload {
    /// The `alertname` common label, used as the key attribute in log records.
    pub fn alert_name(&self) -> &str {
        self.common_labels
            .get("alertname")
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_alertmanager_wire_format() {
        let body = json!({
            "version": "4",
            "groupKey": "{}:{alertname=\"HighCPU\"}",
            "status": "firing",
            "receiver": "openclaw",
            "groupLabels": {"alertname": "HighCPU"},
            "commonLabels": {"alertname": "HighCPU", "severity": "critical"},
            "commonAnnotations": {"summary": "CPU usage above 90%"},
            "externalURL": "http://grafana:3000",
            "alerts": [{
                "status": "firing",
                "labels": {"alertname": "HighCPU", "instance": "server1"},
                "annotations": {"summary": "CPU usage above 90%"},
                "startsAt": "2026-01-01T00:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z",
                "generatorURL": "http://prometheus:9090/graph",
                "fingerprint": "abc123"
            }]
        });

        let payload: AlertmanagerPayload = serde_json::from_value(body).unwrap();
        assert_eq!(payload.status, "firing");
        assert_eq!(payload.alert_name(), "HighCPU");
        assert_eq!(payload.alerts.len(), 1);
        assert_eq!(payload.alerts[0].labels["instance"], "server1");
        assert_eq!(payload.alerts[0].fingerprint, "abc123");
    }

    #[test]
    fn accepts_alert_without_starts_at() {
        let body = json!({
            "status": "firing",
            "commonLabels": {"alertname": "HighCPU"},
            "alerts": [{
                "status": "firing",
                "labels": {"alertname": "HighCPU"}
            }]
        });

        let payload: AlertmanagerPayload = serde_json::from_value(body).unwrap();
        assert_eq!(payload.alerts[0].starts_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn alert_name_falls_back_to_unknown() {
        let payload = AlertmanagerPayload::default();
        assert_eq!(payload.alert_name(), "unknown");
    }
}

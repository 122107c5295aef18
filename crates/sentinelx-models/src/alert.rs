//! Alert records produced by the detection pipeline.

use chrono::{DateTime, Local, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};

/// Unique alert identifier derived from the creation time (Unix epoch milliseconds).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct AlertId(i64);

impl AlertId {
    /// Derive an ID from a creation timestamp.
    pub fn from_timestamp(created_at: DateTime<Utc>) -> Self {
        Self(created_at.timestamp_millis())
    }

    /// Derive an ID from a creation timestamp that is strictly greater than `previous`.
    ///
    /// Two alerts created within the same millisecond (possible with a zero
    /// cooldown) or across a backwards clock step still get distinct IDs.
    pub fn after(previous: Option<AlertId>, created_at: DateTime<Utc>) -> Self {
        let candidate = Self::from_timestamp(created_at);
        match previous {
            Some(prev) if candidate <= prev => Self(prev.0 + 1),
            _ => candidate,
        }
    }

    /// Raw millisecond value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for AlertId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of event an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AlertKind {
    Smoke,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Smoke => "Smoke",
        }
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
        }
    }
}

/// A user-visible alert, created once per accepted smoke event.
///
/// Alerts are immutable once created; the store hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Alert {
    /// Creation-time derived identifier
    pub id: AlertId,

    /// Event kind
    #[serde(rename = "type")]
    pub kind: AlertKind,

    /// Monitored location name
    pub location: String,

    pub severity: AlertSeverity,

    /// Average frame intensity that triggered the event
    #[serde(serialize_with = "round_2dp")]
    #[schemars(with = "f64")]
    pub intensity: f64,

    /// Intensity minus baseline (negative means the scene darkened)
    #[serde(serialize_with = "round_2dp")]
    #[schemars(with = "f64")]
    pub delta: f64,

    /// Snapshot file name, absent when persistence failed
    pub snapshot: Option<String>,

    /// Wall-clock creation time
    pub created_at: DateTime<Utc>,

    /// Local display time (HH:MM:SS)
    pub time: String,
}

impl Alert {
    /// Create a smoke alert.
    pub fn smoke(
        id: AlertId,
        location: impl Into<String>,
        intensity: f64,
        delta: f64,
        snapshot: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: AlertKind::Smoke,
            location: location.into(),
            severity: AlertSeverity::High,
            intensity,
            delta,
            snapshot,
            created_at,
            time: created_at
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
        }
    }

    /// Whether a snapshot was persisted for this alert.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}

fn round_2dp<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_alert_id_from_timestamp() {
        let id = AlertId::from_timestamp(at(1_700_000_000_123));
        assert_eq!(id.as_i64(), 1_700_000_000_123);
        assert_eq!(id.to_string(), "1700000000123");
    }

    #[test]
    fn test_alert_id_after_is_strictly_increasing() {
        let first = AlertId::after(None, at(5_000));
        let same_ms = AlertId::after(Some(first), at(5_000));
        let clock_went_back = AlertId::after(Some(same_ms), at(4_000));

        assert_eq!(first.as_i64(), 5_000);
        assert_eq!(same_ms.as_i64(), 5_001);
        assert_eq!(clock_went_back.as_i64(), 5_002);

        let later = AlertId::after(Some(clock_went_back), at(9_000));
        assert_eq!(later.as_i64(), 9_000);
    }

    #[test]
    fn test_alert_serialization_shape() {
        let alert = Alert::smoke(
            AlertId::from(42),
            "Kitchen Module",
            89.98765,
            -10.01234,
            Some("snapshot_42.jpg".to_string()),
            at(42),
        );

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["type"], "Smoke");
        assert_eq!(json["severity"], "HIGH");
        assert_eq!(json["location"], "Kitchen Module");
        assert_eq!(json["intensity"], 89.99);
        assert_eq!(json["delta"], -10.01);
        assert_eq!(json["snapshot"], "snapshot_42.jpg");
        assert_eq!(json["time"].as_str().unwrap().len(), 8);
    }

    #[test]
    fn test_alert_without_snapshot() {
        let alert = Alert::smoke(AlertId::from(1), "Lab", 50.0, -6.0, None, at(1));
        assert!(!alert.has_snapshot());

        let json = serde_json::to_value(&alert).unwrap();
        assert!(json["snapshot"].is_null());
    }
}

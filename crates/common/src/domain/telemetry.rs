use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uplink_payload::ChannelMap;

/// Radio timestamps are concentrator ticks of one microsecond.
pub const RADIO_TICKS_PER_MILLI: i64 = 1_000;

/// A temperature/humidity pair as reported by the device-side formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadingPair {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl ReadingPair {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
        }
    }
}

/// When the primary reading pair is replaced by the secondary one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// A primary value that is missing or exactly zero counts as absent.
    #[default]
    ZeroSentinel,
    /// Only a missing primary value counts as absent; zero is a reading.
    AbsentOnly,
}

/// Channel section of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    Decoded(ChannelMap),
    /// The payload could not be decoded; keeps the original text and the reason.
    Undecoded { raw: String, error: String },
}

impl ChannelData {
    /// Mapping written to the `data` column.
    pub fn to_json_map(&self) -> Map<String, Value> {
        match self {
            Self::Decoded(channels) => channels.to_json_map(),
            Self::Undecoded { raw, error } => {
                let mut map = Map::new();
                map.insert("raw".to_string(), json!(raw));
                map.insert("error".to_string(), json!(error));
                map
            }
        }
    }

    pub fn decoded(&self) -> Option<&ChannelMap> {
        match self {
            Self::Decoded(channels) => Some(channels),
            Self::Undecoded { .. } => None,
        }
    }
}

/// Per-gateway reception details
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReception {
    pub gateway_id: String,
    pub rssi: Option<i32>,
    pub channel_rssi: Option<i32>,
    pub snr: Option<f64>,
    pub channel_index: Option<u32>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadioMetadata {
    pub frequency: Option<String>,
    pub gateways: Vec<GatewayReception>,
}

/// Canonical form of one uplink, built once per message
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub device_id: String,
    pub received_at: DateTime<Utc>,
    /// Raw concentrator ticks, see [`RADIO_TICKS_PER_MILLI`]
    pub radio_timestamp: Option<i64>,
    pub channels: ChannelData,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub radio: RadioMetadata,
}

impl TelemetryRecord {
    pub fn radio_timestamp_millis(&self) -> Option<i64> {
        self.radio_timestamp
            .map(|ticks| ticks / RADIO_TICKS_PER_MILLI)
    }
}

/// Repository trait for telemetry storage.
/// Infrastructure layer (e.g. ClickHouse) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Durably write one record. No retries are attempted here.
    async fn store(&self, record: &TelemetryRecord) -> DomainResult<()>;
}

//! Inbound uplink envelope as delivered by The Things Stack (v3) webhooks.
//!
//! Only the device identity and a receive time are required. Everything else
//! is optional so that partially populated messages still reach storage.

use crate::domain::result::{DomainError, DomainResult};
use crate::domain::ReadingPair;
use crate::garde::validate_struct;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Top-level uplink message
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UplinkEnvelope {
    #[garde(dive)]
    pub end_device_ids: EndDeviceIds,
    #[garde(skip)]
    #[serde(default, deserialize_with = "null_as_default")]
    pub correlation_ids: Vec<String>,
    #[garde(skip)]
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[garde(skip)]
    #[serde(default, deserialize_with = "null_as_default")]
    pub uplink_message: UplinkMessage,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EndDeviceIds {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(skip)]
    #[serde(default)]
    pub application_ids: Option<ApplicationIds>,
    #[garde(skip)]
    #[serde(default)]
    pub dev_eui: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub join_eui: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub dev_addr: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationIds {
    #[serde(default, deserialize_with = "null_as_default")]
    pub application_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UplinkMessage {
    #[serde(default)]
    pub session_key_id: Option<String>,
    #[serde(default)]
    pub f_port: Option<u32>,
    #[serde(default)]
    pub f_cnt: Option<u32>,
    /// Base64 encoded application payload
    #[serde(default)]
    pub frm_payload: Option<String>,
    #[serde(default)]
    pub decoded_payload: Option<DecodedPayload>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rx_metadata: Vec<RxMetadata>,
    #[serde(default)]
    pub settings: Option<TxSettings>,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub consumed_airtime: Option<String>,
}

/// Output of the device-side payload formatter configured in the network server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodedPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: DecodedMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodedMessage {
    #[serde(rename = "degreesC", default)]
    pub degrees_c: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(rename = "TempC_DS", default)]
    pub temp_c_ds: Option<f64>,
    #[serde(rename = "Hum_SHT", alias = "HumSHT", default)]
    pub hum_sht: Option<f64>,
}

impl DecodedMessage {
    pub fn primary(&self) -> ReadingPair {
        ReadingPair {
            temperature: self.degrees_c,
            humidity: self.humidity,
        }
    }

    pub fn secondary(&self) -> ReadingPair {
        ReadingPair {
            temperature: self.temp_c_ds,
            humidity: self.hum_sht,
        }
    }
}

/// Reception report of a single gateway
#[derive(Debug, Clone, Deserialize)]
pub struct RxMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub gateway_ids: GatewayIds,
    /// Gateway concentrator timestamp
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub channel_rssi: Option<i32>,
    #[serde(default)]
    pub snr: Option<f64>,
    #[serde(default)]
    pub channel_index: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayIds {
    #[serde(default, deserialize_with = "null_as_default")]
    pub gateway_id: String,
    #[serde(default)]
    pub eui: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxSettings {
    /// Modulation settings, kept opaque
    #[serde(default)]
    pub data_rate: Option<serde_json::Value>,
    #[serde(default)]
    pub coding_rate: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    /// Radio timestamp in concentrator ticks
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl UplinkEnvelope {
    /// Parse and validate a webhook body.
    ///
    /// Fails with `MalformedEnvelope` when the JSON does not match the
    /// envelope shape, the device id is missing or empty, or no receive time
    /// is present.
    pub fn from_json(body: &[u8]) -> DomainResult<Self> {
        let envelope: Self = serde_json::from_slice(body)
            .map_err(|e| DomainError::MalformedEnvelope(e.to_string()))?;

        validate_struct(&envelope)?;

        if envelope.received_at().is_none() {
            return Err(DomainError::MalformedEnvelope(
                "received_at: missing receive time".to_string(),
            ));
        }

        Ok(envelope)
    }

    pub fn device_id(&self) -> &str {
        &self.end_device_ids.device_id
    }

    /// Network server receive time, falling back to the uplink's own timestamp
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at.or(self.uplink_message.received_at)
    }

    pub fn frm_payload(&self) -> &str {
        self.uplink_message.frm_payload.as_deref().unwrap_or_default()
    }

    pub fn radio_timestamp(&self) -> Option<i64> {
        self.uplink_message
            .settings
            .as_ref()
            .and_then(|settings| settings.timestamp)
    }

    pub fn decoded_message(&self) -> DecodedMessage {
        self.uplink_message
            .decoded_payload
            .as_ref()
            .map(|payload| payload.message.clone())
            .unwrap_or_default()
    }
}

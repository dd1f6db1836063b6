use common::{GatewayReception, TelemetryRecord};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use uplink_payload::{ChannelValue, SensorKind};

/// Latest known state of a device, shaped for a live dashboard document.
///
/// Built from a stored record; the ingestion path does not produce it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStateSnapshot {
    pub device_id: String,
    pub serial: String,
    pub data: Map<String, Value>,
    pub meta: LiveStateMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveStateMeta {
    /// Radio timestamp in raw ticks
    pub updated: Option<i64>,
    pub frequency: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub gateways: BTreeMap<String, GatewaySnapshot>,
}

/// Gateway locations are not reported in uplinks and stay at zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewaySnapshot {
    pub id: String,
    pub rssi: Option<i32>,
    pub snr: Option<f64>,
    pub channel: Option<u32>,
    pub time: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl From<&GatewayReception> for GatewaySnapshot {
    fn from(gateway: &GatewayReception) -> Self {
        Self {
            id: gateway.gateway_id.clone(),
            rssi: gateway.rssi,
            snr: gateway.snr,
            channel: gateway.channel_index,
            time: gateway.timestamp,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
        }
    }
}

impl From<&TelemetryRecord> for LiveStateSnapshot {
    fn from(record: &TelemetryRecord) -> Self {
        let mut data = record.channels.to_json_map();
        if let Some(temperature) = record.temperature {
            data.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(humidity) = record.humidity {
            data.insert("humidity".to_string(), json!(humidity));
        }

        let (latitude, longitude, altitude) = record
            .channels
            .decoded()
            .and_then(|channels| channels.first_of_kind(SensorKind::Gps))
            .and_then(|reading| match reading.value {
                ChannelValue::Vector3(lat, lon, alt) => Some((lat, lon, alt)),
                _ => None,
            })
            .unwrap_or((0.0, 0.0, 0.0));

        let gateways = record
            .radio
            .gateways
            .iter()
            .map(|gateway| (gateway.gateway_id.clone(), GatewaySnapshot::from(gateway)))
            .collect();

        Self {
            device_id: record.device_id.clone(),
            serial: String::new(),
            data,
            meta: LiveStateMeta {
                updated: record.radio_timestamp,
                frequency: record.radio.frequency.clone(),
                latitude,
                longitude,
                altitude,
                gateways,
            },
        }
    }
}

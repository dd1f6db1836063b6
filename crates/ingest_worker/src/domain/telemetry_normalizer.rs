use common::{
    ChannelData, DecodedMessage, FallbackPolicy, GatewayReception, RadioMetadata, ReadingPair,
    TelemetryRecord, UplinkEnvelope,
};
use uplink_payload::{ChannelMap, PayloadError};

/// Build the canonical record for one uplink.
///
/// A failed decode never fails the message: the record keeps the raw payload
/// text and the error so the row can still be written.
pub fn normalize(
    envelope: &UplinkEnvelope,
    decoded: Result<ChannelMap, PayloadError>,
    policy: FallbackPolicy,
) -> TelemetryRecord {
    let channels = match decoded {
        Ok(channels) => ChannelData::Decoded(channels),
        Err(e) => ChannelData::Undecoded {
            raw: envelope.frm_payload().to_string(),
            error: e.to_string(),
        },
    };

    let promoted = resolve_promoted(&envelope.decoded_message(), policy);

    TelemetryRecord {
        device_id: envelope.device_id().to_string(),
        // Envelopes parsed through `from_json` always carry a receive time
        received_at: envelope.received_at().unwrap_or_default(),
        radio_timestamp: envelope.radio_timestamp(),
        channels,
        temperature: promoted.temperature,
        humidity: promoted.humidity,
        radio: radio_metadata(envelope),
    }
}

/// Pick the temperature/humidity pair to promote.
///
/// The pair is swapped as a whole: if either primary value counts as absent
/// under `policy`, both values come from the secondary sensor.
pub fn resolve_promoted(message: &DecodedMessage, policy: FallbackPolicy) -> ReadingPair {
    let primary = message.primary();

    if is_absent(primary.temperature, policy) || is_absent(primary.humidity, policy) {
        message.secondary()
    } else {
        primary
    }
}

fn is_absent(value: Option<f64>, policy: FallbackPolicy) -> bool {
    match policy {
        FallbackPolicy::ZeroSentinel => value.map_or(true, |v| v == 0.0),
        FallbackPolicy::AbsentOnly => value.is_none(),
    }
}

fn radio_metadata(envelope: &UplinkEnvelope) -> RadioMetadata {
    let uplink = &envelope.uplink_message;

    let gateways = uplink
        .rx_metadata
        .iter()
        .map(|rx| GatewayReception {
            gateway_id: rx.gateway_ids.gateway_id.clone(),
            rssi: rx.rssi,
            channel_rssi: rx.channel_rssi,
            snr: rx.snr,
            channel_index: rx.channel_index,
            timestamp: rx.timestamp,
        })
        .collect();

    RadioMetadata {
        frequency: uplink
            .settings
            .as_ref()
            .and_then(|settings| settings.frequency.clone()),
        gateways,
    }
}

use crate::domain::normalize;
use common::{DomainResult, FallbackPolicy, TelemetryRecord, TelemetryRepository, UplinkEnvelope};
use std::sync::Arc;
use tracing::{debug, field, info, instrument, warn, Span};
use uplink_payload::{
    decode_base64, CayenneLppDecoder, ChannelMap, PayloadDecoder, PayloadError,
};

/// Domain service turning one webhook body into one stored telemetry record
pub struct UplinkIngestionService {
    repository: Arc<dyn TelemetryRepository>,
    decoder: CayenneLppDecoder,
    policy: FallbackPolicy,
}

impl UplinkIngestionService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, policy: FallbackPolicy) -> Self {
        Self {
            repository,
            decoder: CayenneLppDecoder::new(),
            policy,
        }
    }

    /// Parse, decode, normalize and store a single uplink.
    ///
    /// Malformed envelopes are rejected before any decoding. Payload decode
    /// failures are absorbed into a degraded record, storage failures are not.
    #[instrument(skip(self, body), fields(body_len = body.len(), device_id = field::Empty))]
    pub async fn ingest(&self, body: &[u8]) -> DomainResult<TelemetryRecord> {
        let envelope = UplinkEnvelope::from_json(body).inspect_err(|e| {
            warn!(error = %e, "rejecting malformed uplink");
        })?;

        Span::current().record("device_id", envelope.device_id());
        debug!(
            device_id = %envelope.device_id(),
            payload_len = envelope.frm_payload().len(),
            "received uplink"
        );

        let decoded = self.decode_channels(envelope.frm_payload());
        match &decoded {
            Ok(channels) => debug!(channel_count = channels.len(), "decoded payload"),
            Err(e) => warn!(
                device_id = %envelope.device_id(),
                error = %e,
                "payload could not be decoded, storing raw payload"
            ),
        }

        let record = normalize(&envelope, decoded, self.policy);

        self.repository.store(&record).await?;

        info!(
            device_id = %record.device_id,
            received_at = %record.received_at,
            radio_timestamp_ms = ?record.radio_timestamp_millis(),
            "stored telemetry record"
        );

        Ok(record)
    }

    fn decode_channels(&self, payload: &str) -> Result<ChannelMap, PayloadError> {
        let bytes = decode_base64(payload)?;
        let readings = self.decoder.decode(&bytes)?;
        Ok(ChannelMap::aggregate(readings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ChannelData, DomainError, MockTelemetryRepository};
    use serde_json::{json, Value};

    fn body(payload: &str, message: Value) -> Vec<u8> {
        json!({
            "end_device_ids": {"device_id": "lht65-garden"},
            "received_at": "2024-05-01T12:00:00.123Z",
            "uplink_message": {
                "frm_payload": payload,
                "decoded_payload": {"message": message},
                "settings": {"timestamp": 1_500_000}
            }
        })
        .to_string()
        .into_bytes()
    }

    fn service(mock_repo: MockTelemetryRepository) -> UplinkIngestionService {
        UplinkIngestionService::new(Arc::new(mock_repo), FallbackPolicy::ZeroSentinel)
    }

    #[tokio::test]
    async fn test_ingest_decodes_and_stores() {
        let mut mock_repo = MockTelemetryRepository::new();
        mock_repo
            .expect_store()
            .withf(|record: &TelemetryRecord| {
                record.device_id == "lht65-garden"
                    && record.temperature == Some(21.3)
                    && record.humidity == Some(60.0)
                    && Value::Object(record.channels.to_json_map())
                        == json!({"temperature_3": 21.5})
            })
            .times(1)
            .return_once(|_| Ok(()));

        let message = json!({"degreesC": 0.0, "humidity": 55.0, "TempC_DS": 21.3, "Hum_SHT": 60.0});
        let record = service(mock_repo)
            .ingest(&body("A2cA1w==", message))
            .await
            .unwrap();

        assert_eq!(record.radio_timestamp_millis(), Some(1_500));
    }

    #[tokio::test]
    async fn test_ingest_stores_degraded_record_on_bad_base64() {
        let mut mock_repo = MockTelemetryRepository::new();
        mock_repo
            .expect_store()
            .withf(|record: &TelemetryRecord| {
                matches!(&record.channels, ChannelData::Undecoded { raw, .. } if raw == "%%%")
            })
            .times(1)
            .return_once(|_| Ok(()));

        let result = service(mock_repo).ingest(&body("%%%", json!({}))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ingest_stores_degraded_record_on_truncated_payload() {
        let mut mock_repo = MockTelemetryRepository::new();
        mock_repo
            .expect_store()
            .withf(|record: &TelemetryRecord| record.channels.decoded().is_none())
            .times(1)
            .return_once(|_| Ok(()));

        // 03 67 00: temperature entry missing its last value byte
        let result = service(mock_repo).ingest(&body("A2cA", json!({}))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ingest_empty_payload_is_storable() {
        let mut mock_repo = MockTelemetryRepository::new();
        mock_repo
            .expect_store()
            .withf(|record: &TelemetryRecord| {
                record.channels.decoded().is_some_and(|channels| channels.is_empty())
                    && record.temperature.is_none()
            })
            .times(1)
            .return_once(|_| Ok(()));

        let result = service(mock_repo).ingest(&body("", json!({}))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ingest_accepts_null_rx_metadata() {
        let mut mock_repo = MockTelemetryRepository::new();
        mock_repo
            .expect_store()
            .withf(|record: &TelemetryRecord| {
                record.radio.gateways.is_empty() && record.channels.decoded().is_some()
            })
            .times(1)
            .return_once(|_| Ok(()));

        let body = json!({
            "end_device_ids": {"device_id": "lht65-garden"},
            "received_at": "2024-05-01T12:00:00Z",
            "uplink_message": {"frm_payload": "A2cA1w==", "rx_metadata": null}
        })
        .to_string();

        let result = service(mock_repo).ingest(body.as_bytes()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ingest_rejects_missing_device_id_before_store() {
        let mut mock_repo = MockTelemetryRepository::new();
        mock_repo.expect_store().times(0);

        let body = json!({
            "end_device_ids": {},
            "received_at": "2024-05-01T12:00:00Z",
            "uplink_message": {"frm_payload": "A2cA1w=="}
        })
        .to_string();

        let result = service(mock_repo).ingest(body.as_bytes()).await;
        assert!(matches!(result, Err(DomainError::MalformedEnvelope(_))));
    }

    #[tokio::test]
    async fn test_ingest_propagates_storage_error() {
        let mut mock_repo = MockTelemetryRepository::new();
        mock_repo.expect_store().times(1).return_once(|_| {
            Err(DomainError::StorageWrite(anyhow::anyhow!(
                "Database connection failed"
            )))
        });

        let result = service(mock_repo).ingest(&body("A2cA1w==", json!({}))).await;
        assert!(matches!(result, Err(DomainError::StorageWrite(_))));
    }
}

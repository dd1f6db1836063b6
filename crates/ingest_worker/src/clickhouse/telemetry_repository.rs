use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clickhouse::Row;
use common::{ClickHouseClient, DomainError, DomainResult, TelemetryRecord, TelemetryRepository};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRow {
    pub device_id: String,
    /// Semantic channel mapping as JSON text
    pub data: String,
    #[serde(with = "clickhouse::serde::chrono::datetime64::millis")]
    pub time: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    /// Raw concentrator ticks
    pub radio_timestamp: Option<i64>,
}

/// Convert a domain record into its row; fails only if the channel data cannot be serialized
impl TryFrom<&TelemetryRecord> for TelemetryRow {
    type Error = DomainError;

    fn try_from(record: &TelemetryRecord) -> Result<Self, Self::Error> {
        let data = serde_json::to_string(&record.channels.to_json_map())?;

        Ok(TelemetryRow {
            device_id: record.device_id.clone(),
            data,
            time: record.received_at,
            temperature: record.temperature,
            humidity: record.humidity,
            radio_timestamp: record.radio_timestamp,
        })
    }
}

/// ClickHouse implementation of TelemetryRepository
#[derive(Clone)]
pub struct ClickHouseTelemetryRepository {
    client: ClickHouseClient,
    table: String,
}

impl ClickHouseTelemetryRepository {
    pub fn new(client: ClickHouseClient, table: String) -> Self {
        Self { client, table }
    }
}

#[async_trait]
impl TelemetryRepository for ClickHouseTelemetryRepository {
    #[instrument(skip(self, record), fields(device_id = %record.device_id, table = %self.table))]
    async fn store(&self, record: &TelemetryRecord) -> DomainResult<()> {
        let row = TelemetryRow::try_from(record)?;

        let mut insert = self
            .client
            .get_client()
            .insert::<TelemetryRow>(&self.table)
            .await
            .map_err(|e| {
                error!("failed to create ClickHouse inserter: {}", e);
                DomainError::StorageWrite(e.into())
            })?;

        insert.write(&row).await.map_err(|e| {
            error!("failed to write row to ClickHouse: {}", e);
            DomainError::StorageWrite(e.into())
        })?;

        insert.end().await.map_err(|e| {
            error!("failed to finalize ClickHouse insert: {}", e);
            DomainError::StorageWrite(e.into())
        })?;

        debug!("stored telemetry row");

        Ok(())
    }
}

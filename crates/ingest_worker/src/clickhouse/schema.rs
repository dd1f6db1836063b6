use anyhow::Result;
use common::ClickHouseClient;
use tracing::info;

/// Create the telemetry table if it does not exist yet.
///
/// Safe to run on every startup.
pub async fn ensure_table(client: &ClickHouseClient, table: &str) -> Result<()> {
    client
        .get_client()
        .query(&create_table_statement(table))
        .execute()
        .await?;

    info!(table = %table, "telemetry table ready");
    Ok(())
}

fn create_table_statement(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            deviceId String,
            data String,
            time DateTime64(3, 'UTC'),
            temperature Nullable(Float64),
            humidity Nullable(Float64),
            radioTimestamp Nullable(Int64)
        )
        ENGINE = MergeTree
        ORDER BY (deviceId, time)"
    )
}

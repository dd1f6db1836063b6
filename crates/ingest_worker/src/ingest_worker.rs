use crate::clickhouse::ClickHouseTelemetryRepository;
use crate::domain::UplinkIngestionService;
use crate::http::webhook_router;
use common::{ClickHouseClient, FallbackPolicy};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct IngestWorkerConfig {
    pub http_host: String,
    pub http_port: u16,
    pub table: String,
    pub fallback_policy: FallbackPolicy,
}

/// HTTP webhook receiver writing every uplink to ClickHouse
pub struct IngestWorker {
    service: Arc<UplinkIngestionService>,
    address: String,
}

impl IngestWorker {
    pub fn new(clickhouse_client: ClickHouseClient, config: IngestWorkerConfig) -> Self {
        info!("Initializing ingest worker");

        let repository = ClickHouseTelemetryRepository::new(clickhouse_client, config.table);
        let service = Arc::new(UplinkIngestionService::new(
            Arc::new(repository),
            config.fallback_policy,
        ));

        Self {
            service,
            address: format!("{}:{}", config.http_host, config.http_port),
        }
    }

    /// Serve webhooks until `ctx` is cancelled, then drain in-flight requests
    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.address).await?;
        info!(address = %self.address, "ingest worker listening");

        axum::serve(listener, webhook_router(self.service))
            .with_graceful_shutdown(ctx.cancelled_owned())
            .await?;

        info!("ingest worker stopped");
        Ok(())
    }
}

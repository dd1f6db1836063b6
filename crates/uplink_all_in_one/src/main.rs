mod config;

use common::{init_telemetry, shutdown_telemetry, ClickHouseClient, TelemetryConfig};
use config::ServiceConfig;
use ingest_worker::{ensure_table, IngestWorker, IngestWorkerConfig};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        otel_endpoint = %config.otel_endpoint,
        "Starting uplink-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
    let clickhouse_client =
        match tokio::time::timeout(startup_timeout, initialize_clickhouse(&config)).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                error!("Failed to initialize ClickHouse: {}", e);
                std::process::exit(1);
            }
            Err(_) => {
                error!(
                    timeout_secs = config.startup_timeout_secs,
                    "Timed out initializing ClickHouse"
                );
                std::process::exit(1);
            }
        };

    let ingest_worker = IngestWorker::new(
        clickhouse_client,
        IngestWorkerConfig {
            http_host: config.http_host.clone(),
            http_port: config.http_port,
            table: config.clickhouse_table.clone(),
            fallback_policy: config.fallback_policy,
        },
    );

    let shutdown_token = CancellationToken::new();
    spawn_signal_handlers(shutdown_token.clone());

    if let Err(e) = ingest_worker.run(shutdown_token).await {
        error!("Ingest worker failed: {}", e);
    }

    info!("Running cleanup tasks...");
    shutdown_telemetry(telemetry_providers);
}

async fn initialize_clickhouse(config: &ServiceConfig) -> anyhow::Result<ClickHouseClient> {
    info!("Initializing ClickHouse...");
    let client = ClickHouseClient::new(
        &config.clickhouse_url,
        &config.clickhouse_database,
        &config.clickhouse_username,
        &config.clickhouse_password,
    );
    client.ping().await?;
    ensure_table(&client, &config.clickhouse_table).await?;
    Ok(client)
}

/// Cancel `token` on SIGINT or, on Unix, SIGTERM
fn spawn_signal_handlers(token: CancellationToken) {
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                signal_token.cancel();
            }
            Err(err) => {
                error!("Error setting up signal handler: {}", err);
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => {
                error!("Error setting up SIGTERM handler: {}", err);
            }
        }
    });
}

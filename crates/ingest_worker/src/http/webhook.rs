use crate::domain::UplinkIngestionService;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::DomainError;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Body of every webhook response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    fn success() -> Self {
        Self {
            status: "success",
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error",
            message: Some(message),
        }
    }
}

/// Build the webhook router around a shared ingestion service
pub fn webhook_router(service: Arc<UplinkIngestionService>) -> Router {
    Router::new()
        .route("/uplink", post(uplink_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

async fn uplink_handler(
    State(service): State<Arc<UplinkIngestionService>>,
    body: Bytes,
) -> impl IntoResponse {
    match service.ingest(&body).await {
        Ok(_) => (StatusCode::OK, Json(WebhookResponse::success())),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!(error = %e, "failed to ingest uplink");
            }
            (status, Json(WebhookResponse::error(e.to_string())))
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::MalformedEnvelope(_) => StatusCode::BAD_REQUEST,
        DomainError::RecordEncoding(_) | DomainError::StorageWrite(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

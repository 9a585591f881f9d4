use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub storage: String,
    pub records: usize,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_status = if state.storage.file_exists(state.storage.root()).await {
        "available"
    } else {
        "unavailable"
    };

    let records = match state.records.list().await {
        Ok(all) => all.len(),
        Err(e) => {
            tracing::error!("Record store unavailable: {:?}", e);
            0
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        message: "DICOM Insight API is running".to_string(),
        storage: storage_status.to_string(),
        records,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

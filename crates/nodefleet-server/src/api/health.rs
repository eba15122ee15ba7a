use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub status: &'static str,
}

/// `GET /health`: reports ok once the store answers a read.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state
        .store
        .read(|tx| Box::pin(async move { tx.count_sites().await }))
        .await?;

    Ok(Json(HealthResponse { status: "ok" }))
}

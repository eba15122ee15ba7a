//! Config version routes.
//!
//! Payloads are opaque bytes. They travel as standard base64 in request
//! bodies and are served raw from the payload route; JSON responses carry a
//! `payloadUrl` pointing there instead of the bytes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    ApiError, ApiJson, ApiQuery, ApiResult, AppState, ListParams, ListResponse, parse_filter,
    parse_id, timestamp,
};
use crate::storage::{ConfigVersion, NewConfigVersion};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigVersionResponse {
    pub id: i64,
    pub node_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub payload_url: String,
    pub create_time: String,
}

impl ConfigVersionResponse {
    pub fn new(cv: ConfigVersion, base_url: &str) -> Self {
        Self {
            id: cv.id,
            node_id: cv.node_id,
            description: cv.description,
            payload_url: payload_url(base_url, cv.id),
            create_time: timestamp(cv.create_time),
        }
    }
}

pub(crate) fn payload_url(base_url: &str, id: i64) -> String {
    format!("{base_url}/api/v1/management/config-versions/{id}/payload")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateConfigVersionRequest {
    #[serde(default)]
    pub node_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    /// Standard base64.
    #[serde(default)]
    pub payload: String,
}

/// `GET /config-versions?nodeId=`
pub async fn list_config_versions(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<ConfigVersionResponse>>> {
    let page = params.page()?;
    let node_id = parse_filter(params.node_id.as_deref(), "nodeId")?;

    let (rows, total) = state
        .store
        .read(move |tx| {
            Box::pin(async move {
                let rows = tx
                    .list_config_versions(node_id, page.after_id, page.fetch_limit())
                    .await?;
                let total = tx.count_config_versions(node_id).await?;
                Ok::<_, ApiError>((rows, total))
            })
        })
        .await?;

    let base_url = state.base_url(&headers);
    let page = page
        .finish(rows, |cv| cv.id)
        .map(|cv| ConfigVersionResponse::new(cv, &base_url));
    Ok(Json(ListResponse::new(page, total)))
}

/// `POST /config-versions`
pub async fn create_config_version(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateConfigVersionRequest>,
) -> ApiResult<(StatusCode, Json<ConfigVersionResponse>)> {
    if req.node_id == 0 {
        return Err(ApiError::invalid_request("nodeId is required"));
    }
    let payload = STANDARD
        .decode(req.payload.as_bytes())
        .map_err(|_| ApiError::invalid_request("payload must be base64"))?;
    if payload.is_empty() {
        return Err(ApiError::invalid_request("payload is required"));
    }
    let node_id = req.node_id;
    let description = req.description.filter(|d| !d.is_empty());

    let cv = state
        .store
        .write(move |tx| {
            Box::pin(async move {
                tx.create_config_version(NewConfigVersion {
                    node_id,
                    description: description.as_deref(),
                    payload: &payload,
                })
                .await
            })
        })
        .await?;

    info!(
        config_version_id = cv.id,
        node_id = cv.node_id,
        payload_size = cv.payload_size,
        "Config version created"
    );
    let base_url = state.base_url(&headers);
    Ok((
        StatusCode::CREATED,
        Json(ConfigVersionResponse::new(cv, &base_url)),
    ))
}

/// `GET /config-versions/{id}`
pub async fn get_config_version(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ConfigVersionResponse>> {
    let id = parse_id(&id, "id")?;

    let cv = state
        .store
        .read(move |tx| Box::pin(async move { tx.get_config_version(id).await }))
        .await?;

    Ok(Json(ConfigVersionResponse::new(cv, &state.base_url(&headers))))
}

/// `GET /config-versions/{id}/payload`
pub async fn get_payload(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, "id")?;

    let payload = state
        .store
        .read(move |tx| Box::pin(async move { tx.get_config_version_payload(id).await }))
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"config-version-{id}.bin\""),
            ),
        ],
        payload,
    ))
}

/// `DELETE /config-versions/{id}`
///
/// Removes every deployment of the config version.
pub async fn delete_config_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "id")?;

    let deleted = state
        .store
        .write(move |tx| Box::pin(async move { tx.delete_config_version(id).await }))
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }

    info!(config_version_id = id, "Config version deleted");
    Ok(StatusCode::NO_CONTENT)
}

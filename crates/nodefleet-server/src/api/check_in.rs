//! Node-facing check-in route.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use serde::Serialize;

use super::check_ins::CheckInResponse;
use super::config_versions::ConfigVersionResponse;
use super::deployments::DeploymentResponse;
use super::{ApiResult, AppState};
use crate::checkin::check_in_with_header;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LatestConfig {
    pub deployment: DeploymentResponse,
    pub config_version: ConfigVersionResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeCheckInResponse {
    pub check_in: CheckInResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_config: Option<LatestConfig>,
}

/// `POST /check-in`
///
/// The request body is ignored. A header that is not valid UTF-8 is treated
/// like any other malformed credential.
pub async fn check_in(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<NodeCheckInResponse>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    let result = check_in_with_header(&state.store, authorization).await?;

    let base_url = state.base_url(&headers);
    let latest_config = result.active.map(|active| LatestConfig {
        deployment: active.deployment.into(),
        config_version: ConfigVersionResponse::new(active.config_version, &base_url),
    });

    Ok(Json(NodeCheckInResponse {
        check_in: result.check_in.into(),
        latest_config,
    }))
}

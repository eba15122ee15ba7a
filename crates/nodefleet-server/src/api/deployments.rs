//! Deployment routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    ApiError, ApiJson, ApiQuery, ApiResult, AppState, ListParams, ListResponse, parse_filter,
    parse_id, timestamp,
};
use crate::deployment::{DeploymentStatus, status_for_create, status_for_update};
use crate::storage::{Deployment, DeploymentFilter};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeploymentResponse {
    pub id: i64,
    pub config_version_id: i64,
    pub status: DeploymentStatus,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_time: Option<String>,
}

impl From<Deployment> for DeploymentResponse {
    fn from(d: Deployment) -> Self {
        Self {
            id: d.id,
            config_version_id: d.config_version_id,
            status: d.status,
            start_time: timestamp(d.start_time),
            finished_time: d.finished_time.map(timestamp),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateDeploymentRequest {
    #[serde(default)]
    pub config_version_id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateDeploymentRequest {
    #[serde(default)]
    pub status: String,
}

fn deployment_filter(params: &ListParams) -> ApiResult<DeploymentFilter> {
    let node_id = parse_filter(params.node_id.as_deref(), "nodeId")?;
    let config_version_id = parse_filter(params.config_version_id.as_deref(), "configVersionId")?;

    match (node_id, config_version_id) {
        (Some(_), Some(_)) => Err(ApiError::invalid_request(
            "nodeId and configVersionId cannot be combined",
        )),
        (Some(node_id), None) => Ok(DeploymentFilter::Node(node_id)),
        (None, Some(cv_id)) => Ok(DeploymentFilter::ConfigVersion(cv_id)),
        (None, None) => Ok(DeploymentFilter::All),
    }
}

/// `GET /deployments?nodeId=|configVersionId=`
pub async fn list_deployments(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<DeploymentResponse>>> {
    let page = params.page()?;
    let filter = deployment_filter(&params)?;

    let (rows, total) = state
        .store
        .read(move |tx| {
            Box::pin(async move {
                let rows = tx
                    .list_deployments(filter, page.after_id, page.fetch_limit())
                    .await?;
                let total = tx.count_deployments(filter).await?;
                Ok::<_, ApiError>((rows, total))
            })
        })
        .await?;

    let page = page.finish(rows, |d| d.id).map(DeploymentResponse::from);
    Ok(Json(ListResponse::new(page, total)))
}

/// `POST /deployments`
///
/// New deployments are always `PENDING`; asking for any other status is
/// rejected rather than ignored.
pub async fn create_deployment(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateDeploymentRequest>,
) -> ApiResult<(StatusCode, Json<DeploymentResponse>)> {
    if req.config_version_id == 0 {
        return Err(ApiError::invalid_request("configVersionId is required"));
    }
    let status = status_for_create(req.status.as_deref())?;
    let config_version_id = req.config_version_id;

    let deployment = state
        .store
        .write(move |tx| {
            Box::pin(async move { tx.create_deployment(config_version_id, status).await })
        })
        .await?;

    info!(
        deployment_id = deployment.id,
        config_version_id, "Deployment created"
    );
    Ok((StatusCode::CREATED, Json(deployment.into())))
}

/// `GET /deployments/{id}`
pub async fn get_deployment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeploymentResponse>> {
    let id = parse_id(&id, "id")?;

    let deployment = state
        .store
        .read(move |tx| Box::pin(async move { tx.get_deployment(id).await }))
        .await?;

    Ok(Json(deployment.into()))
}

/// `PATCH /deployments/{id}`
pub async fn update_deployment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateDeploymentRequest>,
) -> ApiResult<Json<DeploymentResponse>> {
    let id = parse_id(&id, "id")?;
    let status = status_for_update(&req.status)?;

    let deployment = state
        .store
        .write(move |tx| Box::pin(async move { tx.update_deployment_status(id, status).await }))
        .await?;

    info!(deployment_id = id, %status, "Deployment status updated");
    Ok(Json(deployment.into()))
}

/// `DELETE /deployments/{id}`
pub async fn delete_deployment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "id")?;

    let deleted = state
        .store
        .write(move |tx| Box::pin(async move { tx.delete_deployment(id).await }))
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }

    info!(deployment_id = id, "Deployment deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Read-only access to a node's check-in history.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use super::{
    ApiError, ApiQuery, ApiResult, AppState, ListParams, ListResponse, parse_id, timestamp,
};
use crate::storage::NodeCheckIn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckInResponse {
    pub id: i64,
    pub node_id: i64,
    pub check_in_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_deployment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installing_deployment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installing_deployment_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installing_deployment_attempts: Option<i64>,
}

impl From<NodeCheckIn> for CheckInResponse {
    fn from(c: NodeCheckIn) -> Self {
        Self {
            id: c.id,
            node_id: c.node_id,
            check_in_time: timestamp(c.check_in_time),
            current_deployment_id: c.current_deployment_id,
            installing_deployment_id: c.installing_deployment_id,
            installing_deployment_error: c.installing_deployment_error,
            installing_deployment_attempts: c.installing_deployment_attempts,
        }
    }
}

fn required_node_id(raw: &str) -> ApiResult<i64> {
    match parse_id(raw, "nodeId")? {
        0 => Err(ApiError::invalid_request("nodeId is required")),
        id => Ok(id),
    }
}

/// `GET /nodes/{node_id}/check-ins`
pub async fn list_check_ins(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<CheckInResponse>>> {
    let node_id = required_node_id(&node_id)?;
    let page = params.page()?;

    let (rows, total) = state
        .store
        .read(move |tx| {
            Box::pin(async move {
                let rows = tx
                    .list_node_check_ins(node_id, page.after_id, page.fetch_limit())
                    .await?;
                let total = tx.count_node_check_ins(node_id).await?;
                Ok::<_, ApiError>((rows, total))
            })
        })
        .await?;

    let page = page.finish(rows, |c| c.id).map(CheckInResponse::from);
    Ok(Json(ListResponse::new(page, total)))
}

/// `GET /nodes/{node_id}/check-ins/{id}`
///
/// A check-in that exists but belongs to another node is not found.
pub async fn get_check_in(
    State(state): State<AppState>,
    Path((node_id, id)): Path<(String, String)>,
) -> ApiResult<Json<CheckInResponse>> {
    let node_id = required_node_id(&node_id)?;
    let id = parse_id(&id, "id")?;

    let check_in = state
        .store
        .read(move |tx| Box::pin(async move { tx.get_node_check_in(id).await }))
        .await?;
    if check_in.node_id != node_id {
        return Err(ApiError::NotFound);
    }

    Ok(Json(check_in.into()))
}

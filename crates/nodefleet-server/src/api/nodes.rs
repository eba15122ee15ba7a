//! Node management routes.
//!
//! Creating a node and rotating its secret are the only two responses that
//! carry the node secret. Only its digest is stored.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    ApiError, ApiJson, ApiQuery, ApiResult, AppState, ListParams, ListResponse, parse_filter,
    parse_id, timestamp,
};
use crate::auth::NodeSecret;
use crate::storage::{NewNode, Node, NodeUpdate};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeResponse {
    pub id: i64,
    pub hostname: String,
    pub site_id: i64,
    pub create_time: String,
}

impl From<Node> for NodeResponse {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            hostname: node.hostname,
            site_id: node.site_id,
            create_time: timestamp(node.create_time),
        }
    }
}

/// A node plus its freshly issued secret, in bearer token form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeWithSecretResponse {
    #[serde(flatten)]
    pub node: NodeResponse,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNodeRequest {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub site_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateNodeRequest {
    #[serde(default)]
    pub hostname: String,
    /// Absent or 0 keeps the node at its current site.
    #[serde(default)]
    pub site_id: Option<i64>,
}

/// `GET /nodes?siteId=`
pub async fn list_nodes(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<NodeResponse>>> {
    let page = params.page()?;
    let site_id = parse_filter(params.site_id.as_deref(), "siteId")?;

    let (rows, total) = state
        .store
        .read(move |tx| {
            Box::pin(async move {
                let rows = tx
                    .list_nodes(site_id, page.after_id, page.fetch_limit())
                    .await?;
                let total = tx.count_nodes(site_id).await?;
                Ok::<_, ApiError>((rows, total))
            })
        })
        .await?;

    let page = page.finish(rows, |n| n.id).map(NodeResponse::from);
    Ok(Json(ListResponse::new(page, total)))
}

/// `POST /nodes`
pub async fn create_node(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateNodeRequest>,
) -> ApiResult<(StatusCode, Json<NodeWithSecretResponse>)> {
    if req.hostname.is_empty() {
        return Err(ApiError::invalid_request("hostname is required"));
    }
    if req.site_id == 0 {
        return Err(ApiError::invalid_request("siteId is required"));
    }

    let secret = NodeSecret::generate();
    let secret_hash = secret.hash();
    let node = state
        .store
        .write(move |tx| {
            Box::pin(async move {
                tx.create_node(NewNode {
                    hostname: &req.hostname,
                    site_id: req.site_id,
                    secret_hash: secret_hash.as_bytes(),
                })
                .await
            })
        })
        .await?;

    info!(node_id = node.id, site_id = node.site_id, "Node created");
    Ok((
        StatusCode::CREATED,
        Json(NodeWithSecretResponse {
            node: node.into(),
            secret: secret.to_token(),
        }),
    ))
}

/// `GET /nodes/{id}`
pub async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<NodeResponse>> {
    let id = parse_id(&id, "id")?;

    let node = state
        .store
        .read(move |tx| Box::pin(async move { tx.get_node(id).await }))
        .await?;

    Ok(Json(node.into()))
}

/// `PUT /nodes/{id}`
pub async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateNodeRequest>,
) -> ApiResult<Json<NodeResponse>> {
    let id = parse_id(&id, "id")?;
    if req.hostname.is_empty() {
        return Err(ApiError::invalid_request("hostname is required"));
    }

    let node = state
        .store
        .write(move |tx| {
            Box::pin(async move {
                tx.update_node(
                    id,
                    NodeUpdate {
                        hostname: &req.hostname,
                        site_id: req.site_id.filter(|site_id| *site_id != 0),
                    },
                )
                .await
            })
        })
        .await?;

    info!(node_id = node.id, "Node updated");
    Ok(Json(node.into()))
}

/// `POST /nodes/{id}/rotate-secret`
///
/// Issues a new secret; the previous one stops authenticating immediately.
pub async fn rotate_secret(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<NodeWithSecretResponse>> {
    let id = parse_id(&id, "id")?;
    if id == 0 {
        return Err(ApiError::invalid_request("id is required"));
    }

    let secret = NodeSecret::generate();
    let secret_hash = secret.hash();
    let node = state
        .store
        .write(move |tx| {
            Box::pin(async move { tx.update_node_secret_hash(id, secret_hash.as_bytes()).await })
        })
        .await?;

    info!(node_id = node.id, "Node secret rotated");
    Ok(Json(NodeWithSecretResponse {
        node: node.into(),
        secret: secret.to_token(),
    }))
}

/// `DELETE /nodes/{id}`
///
/// Removes the node's config versions, their deployments and its check-ins.
pub async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "id")?;

    let deleted = state
        .store
        .write(move |tx| Box::pin(async move { tx.delete_node(id).await }))
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }

    info!(node_id = id, "Node deleted");
    Ok(StatusCode::NO_CONTENT)
}

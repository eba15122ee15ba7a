//! Site management routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    ApiError, ApiJson, ApiQuery, ApiResult, AppState, ListParams, ListResponse, parse_id,
    timestamp,
};
use crate::storage::Site;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SiteResponse {
    pub id: i64,
    pub name: String,
    pub create_time: String,
}

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            name: site.name,
            create_time: timestamp(site.create_time),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SiteRequest {
    #[serde(default)]
    pub name: String,
}

fn validated_name(req: SiteRequest) -> ApiResult<String> {
    if req.name.is_empty() {
        return Err(ApiError::invalid_request("name is required"));
    }
    Ok(req.name)
}

/// `GET /sites`
pub async fn list_sites(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ListResponse<SiteResponse>>> {
    let page = params.page()?;

    let (rows, total) = state
        .store
        .read(move |tx| {
            Box::pin(async move {
                let rows = tx.list_sites(page.after_id, page.fetch_limit()).await?;
                let total = tx.count_sites().await?;
                Ok::<_, ApiError>((rows, total))
            })
        })
        .await?;

    let page = page.finish(rows, |s| s.id).map(SiteResponse::from);
    Ok(Json(ListResponse::new(page, total)))
}

/// `POST /sites`
pub async fn create_site(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SiteRequest>,
) -> ApiResult<(StatusCode, Json<SiteResponse>)> {
    let name = validated_name(req)?;

    let site = state
        .store
        .write(move |tx| Box::pin(async move { tx.create_site(&name).await }))
        .await?;

    info!(site_id = site.id, "Site created");
    Ok((StatusCode::CREATED, Json(site.into())))
}

/// `GET /sites/{id}`
pub async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SiteResponse>> {
    let id = parse_id(&id, "id")?;

    let site = state
        .store
        .read(move |tx| Box::pin(async move { tx.get_site(id).await }))
        .await?;

    Ok(Json(site.into()))
}

/// `PUT /sites/{id}`
pub async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SiteRequest>,
) -> ApiResult<Json<SiteResponse>> {
    let id = parse_id(&id, "id")?;
    let name = validated_name(req)?;

    let site = state
        .store
        .write(move |tx| Box::pin(async move { tx.update_site(id, &name).await }))
        .await?;

    info!(site_id = site.id, "Site updated");
    Ok(Json(site.into()))
}

/// `DELETE /sites/{id}`
///
/// Removes every node of the site and everything those nodes own.
pub async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id, "id")?;

    let deleted = state
        .store
        .write(move |tx| Box::pin(async move { tx.delete_site(id).await }))
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }

    info!(site_id = id, "Site deleted");
    Ok(StatusCode::NO_CONTENT)
}

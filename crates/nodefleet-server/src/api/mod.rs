//! HTTP/JSON surface of the control plane.
//!
//! Management routes live under `/api/v1/management`; nodes call
//! `POST /api/v1/check-in` with their bearer secret.

mod check_in;
mod check_ins;
mod config_versions;
mod deployments;
pub mod error;
mod health;
mod nodes;
mod sites;

use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::routing::{get, post};
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult, ErrorResponse};

use crate::pagination::{Page, PageRequest, parse_pagination};
use crate::storage::Store;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Externally visible base URL (scheme and authority, no trailing slash).
    /// When unset, payload URLs are derived from the request headers.
    pub public_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: Store, public_url: Option<&str>) -> Self {
        Self {
            store,
            public_url: public_url
                .map(|url| url.trim_end_matches('/'))
                .filter(|url| !url.is_empty())
                .map(Arc::from),
        }
    }

    /// Base URL for links handed back to clients.
    pub(crate) fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.public_url {
            return url.to_string();
        }
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        };
        let scheme = header("x-forwarded-proto").unwrap_or("http");
        let host = header("host").unwrap_or("localhost");
        format!("{scheme}://{host}")
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let management = Router::new()
        .route("/sites", get(sites::list_sites).post(sites::create_site))
        .route(
            "/sites/{id}",
            get(sites::get_site)
                .put(sites::update_site)
                .delete(sites::delete_site),
        )
        .route("/nodes", get(nodes::list_nodes).post(nodes::create_node))
        .route(
            "/nodes/{id}",
            get(nodes::get_node)
                .put(nodes::update_node)
                .delete(nodes::delete_node),
        )
        .route("/nodes/{id}/rotate-secret", post(nodes::rotate_secret))
        .route(
            "/nodes/{node_id}/check-ins",
            get(check_ins::list_check_ins),
        )
        .route(
            "/nodes/{node_id}/check-ins/{id}",
            get(check_ins::get_check_in),
        )
        .route(
            "/config-versions",
            get(config_versions::list_config_versions)
                .post(config_versions::create_config_version),
        )
        .route(
            "/config-versions/{id}",
            get(config_versions::get_config_version)
                .delete(config_versions::delete_config_version),
        )
        .route(
            "/config-versions/{id}/payload",
            get(config_versions::get_payload),
        )
        .route(
            "/deployments",
            get(deployments::list_deployments).post(deployments::create_deployment),
        )
        .route(
            "/deployments/{id}",
            get(deployments::get_deployment)
                .patch(deployments::update_deployment)
                .delete(deployments::delete_deployment),
        );

    let api = Router::new()
        .nest("/management", management)
        .route("/check-in", post(check_in::check_in))
        .route("/health", get(health::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON body extractor whose rejections use the API error shape.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string extractor whose rejections use the API error shape.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query parameters shared by every list route. Each route reads the filters
/// it understands and ignores the rest.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListParams {
    pub page_token: Option<String>,
    pub page_size: Option<String>,
    pub site_id: Option<String>,
    pub node_id: Option<String>,
    pub config_version_id: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> ApiResult<PageRequest> {
        Ok(parse_pagination(
            self.page_token.as_deref(),
            self.page_size.as_deref(),
        )?)
    }
}

/// Response body of every list route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    pub total_size: i64,
}

impl<T> ListResponse<T> {
    pub fn new(page: Page<T>, total_size: i64) -> Self {
        Self {
            items: page.items,
            next_page_token: page.next_page_token,
            total_size,
        }
    }
}

/// Parse an id. Empty means 0; negative or non-numeric values are rejected.
pub(crate) fn parse_id(raw: &str, field: &str) -> ApiResult<i64> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id >= 0)
        .ok_or_else(|| ApiError::invalid_request(format!("invalid {field} {raw:?}")))
}

/// Parse an optional filter id. Absent, empty or 0 means no filter.
pub(crate) fn parse_filter(raw: Option<&str>, field: &str) -> ApiResult<Option<i64>> {
    match raw {
        Some(raw) => Ok(Some(parse_id(raw, field)?).filter(|id| *id != 0)),
        None => Ok(None),
    }
}

/// Render a Unix-seconds timestamp as RFC 3339 in UTC.
pub(crate) fn timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

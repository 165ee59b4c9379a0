//! Middleware routing and dispatch
//!
//! Owns every route under the mount point: a status surface, the data
//! dispatch endpoint, and a catch-all that answers unmatched paths with the
//! middleware's own 404 envelope.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

use super::types::{
    ApiResponse, DataSource, DataSourceItem, ErrorResponse, MiddlewareStatus, UserContext,
};
use super::{MiddlewareError, MiddlewareOptions};

/// Shared middleware state
#[derive(Clone)]
struct MiddlewareState {
    options: MiddlewareOptions,
    http: reqwest::Client,
    start_time: Instant,
}

/// Build the middleware router from host-supplied options
///
/// The returned router expects to own the mount point: hosts nest or merge
/// it at `/` and layer their own middleware around it.
#[must_use]
pub fn middleware_router(options: MiddlewareOptions) -> Router {
    let http = reqwest::Client::builder()
        .timeout(options.request_timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());

    let state = MiddlewareState {
        options,
        http,
        start_time: Instant::now(),
    };

    info!("Dashboards middleware router created: {:?}", state.options);

    Router::new()
        .route("/", get(status))
        .route("/status", get(status))
        .route("/data", post(dispatch_data))
        .fallback(not_found)
        .with_state(state)
}

/// Data dispatch request body
///
/// Names either a data source item or a bare data source; items take
/// precedence when both are present.
#[derive(Debug, Deserialize)]
pub struct DataRequest {
    /// Item to resolve and execute
    #[serde(default)]
    pub item: Option<DataSourceItem>,
    /// Bare data source to resolve and execute
    #[serde(default)]
    pub data_source: Option<DataSource>,
}

/// Result of a data dispatch
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    /// Identifier of the executed item or source
    pub id: String,
    /// URL the middleware fetched
    pub url: String,
    /// Engine response body, passed through verbatim
    pub body: serde_json::Value,
}

async fn status(State(state): State<MiddlewareState>) -> Json<ApiResponse<MiddlewareStatus>> {
    Json(ApiResponse::success(MiddlewareStatus {
        name: "dashboards-middleware".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

/// Resolve the request's entity through the registered providers, then
/// execute the resolved REST URL with the resolved credential attached
async fn dispatch_data(
    State(state): State<MiddlewareState>,
    headers: HeaderMap,
    Json(request): Json<DataRequest>,
) -> Result<Json<ApiResponse<DataResponse>>, MiddlewareError> {
    let ctx = UserContext::from_headers(&headers);

    let (id, source, url) = match (request.item, request.data_source) {
        (Some(item), _) => {
            let item = state.options.resolve_item(&ctx, item).await?;
            let url = match &item {
                DataSourceItem::Rest(rest) => {
                    rest.url.clone().ok_or(MiddlewareError::MissingQueryUrl)?
                }
                DataSourceItem::Sql(_) => return Err(MiddlewareError::UnsupportedKind),
            };
            (item.id().to_string(), item.data_source().clone(), url)
        }
        (None, Some(source)) => {
            let source = state.options.resolve_data_source(&ctx, source).await?;
            let url = match &source {
                DataSource::Rest(rest) => {
                    rest.url.clone().ok_or(MiddlewareError::MissingQueryUrl)?
                }
                DataSource::Sql(_) => return Err(MiddlewareError::UnsupportedKind),
            };
            (source.id().to_string(), source, url)
        }
        (None, None) => return Err(MiddlewareError::EmptyDispatch),
    };

    let credential = state.options.resolve_credential(&ctx, &source).await?;

    let mut upstream = state.http.get(&url);
    if let Some(credential) = credential {
        upstream = upstream.header(header::AUTHORIZATION, credential.authorization_header());
    }

    let response = upstream.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("Analytics engine returned {} for {}: {}", status, url, body);
        return Err(MiddlewareError::UpstreamStatus(status));
    }

    let body: serde_json::Value = response.json().await?;

    Ok(Json(ApiResponse::success(DataResponse { id, url, body })))
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(ErrorResponse {
            error: "unknown_route".to_string(),
            message: format!("no dashboards route matches {uri}"),
            details: None,
        })),
    )
}

//! Embedded dashboards middleware
//!
//! In-process rendition of the vendor dashboards SDK surface the gateway
//! embeds: the entity types the middleware owns, the provider hooks a host
//! registers to resolve credentials, data sources, and items, and the router
//! that answers every route under the mount point. Hosts configure behavior
//! exclusively through [`MiddlewareOptions`]; routing, dispatch order, and
//! response envelopes are fixed here and must be treated as an external
//! contract.
//!
//! Dispatch pipeline for a data request: build the [`UserContext`] from
//! headers, resolve the item (or bare data source), resolve the credential
//! for the governing source, then execute the resolved REST URL with the
//! credential attached. Providers are awaited one at a time, so parent
//! resolution always completes before anything derived from it runs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

mod router;
mod types;

pub use router::{DataRequest, DataResponse, middleware_router};
pub use types::{
    ApiResponse, DataSource, DataSourceCredential, DataSourceItem, ErrorResponse,
    MiddlewareStatus, RestDataSource, RestDataSourceItem, SqlDataSource, SqlDataSourceItem,
    UserContext,
};

/// Resolves the credential presented to a data source
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Produce a credential for the given caller and data source
    ///
    /// Invoked once per request; implementations must be idempotent and are
    /// awaited before the middleware contacts the data source.
    async fn resolve_credential(
        &self,
        ctx: &UserContext,
        source: &DataSource,
    ) -> Result<DataSourceCredential>;
}

/// Resolves a data source before the middleware queries it
#[async_trait]
pub trait DataSourceProvider: Send + Sync {
    /// Return the data source, mutated as needed (typically its URL)
    async fn resolve_data_source(
        &self,
        ctx: &UserContext,
        source: DataSource,
    ) -> Result<DataSource>;
}

/// Resolves a data source item before the middleware executes it
#[async_trait]
pub trait DataSourceItemProvider: Send + Sync {
    /// Return the item, mutated as needed; implementations resolve the
    /// item's parent source before touching item fields derived from it
    async fn resolve_item(&self, ctx: &UserContext, item: DataSourceItem)
    -> Result<DataSourceItem>;
}

/// Host-supplied middleware configuration
///
/// Every provider is optional; an absent provider leaves the corresponding
/// entity untouched (and requests without an authentication provider go out
/// unauthenticated).
#[derive(Clone)]
pub struct MiddlewareOptions {
    pub(crate) authentication_provider: Option<Arc<dyn AuthenticationProvider>>,
    pub(crate) data_source_provider: Option<Arc<dyn DataSourceProvider>>,
    pub(crate) data_source_item_provider: Option<Arc<dyn DataSourceItemProvider>>,
    pub(crate) request_timeout: Duration,
}

impl Default for MiddlewareOptions {
    fn default() -> Self {
        Self {
            authentication_provider: None,
            data_source_provider: None,
            data_source_item_provider: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for MiddlewareOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareOptions")
            .field(
                "authentication_provider",
                &self.authentication_provider.is_some(),
            )
            .field("data_source_provider", &self.data_source_provider.is_some())
            .field(
                "data_source_item_provider",
                &self.data_source_item_provider.is_some(),
            )
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl MiddlewareOptions {
    /// Create options with no providers registered
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the credential resolver
    #[must_use]
    pub fn with_authentication_provider(mut self, provider: Arc<dyn AuthenticationProvider>) -> Self {
        self.authentication_provider = Some(provider);
        self
    }

    /// Register the data source resolver
    #[must_use]
    pub fn with_data_source_provider(mut self, provider: Arc<dyn DataSourceProvider>) -> Self {
        self.data_source_provider = Some(provider);
        self
    }

    /// Register the data source item resolver
    #[must_use]
    pub fn with_data_source_item_provider(
        mut self,
        provider: Arc<dyn DataSourceItemProvider>,
    ) -> Self {
        self.data_source_item_provider = Some(provider);
        self
    }

    /// Set the timeout for requests the middleware makes to data sources
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub(crate) async fn resolve_item(
        &self,
        ctx: &UserContext,
        item: DataSourceItem,
    ) -> Result<DataSourceItem, MiddlewareError> {
        match &self.data_source_item_provider {
            Some(provider) => provider
                .resolve_item(ctx, item)
                .await
                .map_err(|cause| MiddlewareError::Provider {
                    stage: "data source item",
                    cause,
                }),
            None => Ok(item),
        }
    }

    pub(crate) async fn resolve_data_source(
        &self,
        ctx: &UserContext,
        source: DataSource,
    ) -> Result<DataSource, MiddlewareError> {
        match &self.data_source_provider {
            Some(provider) => provider
                .resolve_data_source(ctx, source)
                .await
                .map_err(|cause| MiddlewareError::Provider {
                    stage: "data source",
                    cause,
                }),
            None => Ok(source),
        }
    }

    pub(crate) async fn resolve_credential(
        &self,
        ctx: &UserContext,
        source: &DataSource,
    ) -> Result<Option<DataSourceCredential>, MiddlewareError> {
        match &self.authentication_provider {
            Some(provider) => provider
                .resolve_credential(ctx, source)
                .await
                .map(Some)
                .map_err(|cause| MiddlewareError::Provider {
                    stage: "authentication",
                    cause,
                }),
            None => Ok(None),
        }
    }
}

/// Failures surfaced by the middleware's own dispatch pipeline
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// Dispatch body carried nothing to execute
    #[error("dispatch request names neither an item nor a data source")]
    EmptyDispatch,
    /// A registered provider returned an error
    #[error("{stage} provider failed: {cause}")]
    Provider {
        /// Pipeline stage that failed
        stage: &'static str,
        /// Underlying provider error
        cause: anyhow::Error,
    },
    /// REST execution was requested but resolution produced no URL
    #[error("no query URL resolved for REST execution")]
    MissingQueryUrl,
    /// Only REST entities can be executed directly by the middleware
    #[error("direct execution is not supported for this data source kind")]
    UnsupportedKind,
    /// The engine request could not be completed
    #[error("analytics engine request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    /// The engine answered with a non-success status
    #[error("analytics engine returned status {0}")]
    UpstreamStatus(StatusCode),
}

impl MiddlewareError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyDispatch => StatusCode::BAD_REQUEST,
            Self::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingQueryUrl | Self::UnsupportedKind => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) | Self::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDispatch => "empty_dispatch",
            Self::Provider { .. } => "provider_failed",
            Self::MissingQueryUrl => "missing_query_url",
            Self::UnsupportedKind => "unsupported_data_source",
            Self::Upstream(_) => "upstream_failed",
            Self::UpstreamStatus(_) => "upstream_status",
        }
    }
}

impl IntoResponse for MiddlewareError {
    fn into_response(self) -> Response {
        error!("Dashboards dispatch failed: {}", self);

        let envelope = ApiResponse::<()>::error(ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            details: None,
        });

        (self.status_code(), Json(envelope)).into_response()
    }
}

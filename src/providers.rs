//! Resolver callbacks wired into the dashboards middleware
//!
//! These are the gateway's entire contribution to request handling: point
//! REST data sources at the prebuilt Cube query URL and present the
//! configured bearer token. All three are stateless beyond their
//! configuration snapshot and idempotent, since the middleware decides when
//! and how often to invoke them.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::sdk::{
    AuthenticationProvider, DataSource, DataSourceCredential, DataSourceItem,
    DataSourceItemProvider, DataSourceProvider, UserContext,
};

/// Issues the engine bearer token for every credential request
pub struct CubeAuthenticationProvider {
    token: String,
}

impl CubeAuthenticationProvider {
    /// Create a provider around the configured engine token
    #[must_use]
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthenticationProvider for CubeAuthenticationProvider {
    async fn resolve_credential(
        &self,
        _ctx: &UserContext,
        _source: &DataSource,
    ) -> Result<DataSourceCredential> {
        // Fresh credential per request; the middleware owns its lifetime.
        Ok(DataSourceCredential::bearer(self.token.clone()))
    }
}

/// Points REST data sources at the prebuilt engine query URL
pub struct CubeDataSourceProvider {
    query_url: String,
}

impl CubeDataSourceProvider {
    /// Create a provider serving the given query URL
    #[must_use]
    pub fn new(query_url: String) -> Self {
        Self { query_url }
    }
}

#[async_trait]
impl DataSourceProvider for CubeDataSourceProvider {
    async fn resolve_data_source(
        &self,
        _ctx: &UserContext,
        mut source: DataSource,
    ) -> Result<DataSource> {
        if let DataSource::Rest(rest) = &mut source {
            rest.url = Some(self.query_url.clone());
        }
        Ok(source)
    }
}

/// Resolves an item's parent source, then mirrors the parent URL onto REST items
pub struct CubeDataSourceItemProvider {
    sources: Arc<dyn DataSourceProvider>,
}

impl CubeDataSourceItemProvider {
    /// Create a provider delegating parent resolution to `sources`
    #[must_use]
    pub fn new(sources: Arc<dyn DataSourceProvider>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl DataSourceItemProvider for CubeDataSourceItemProvider {
    async fn resolve_item(
        &self,
        ctx: &UserContext,
        item: DataSourceItem,
    ) -> Result<DataSourceItem> {
        match item {
            DataSourceItem::Rest(mut rest) => {
                // The parent must finish resolving before the item can
                // mirror its URL; a non-REST parent yields no URL at all.
                rest.data_source = self
                    .sources
                    .resolve_data_source(ctx, rest.data_source)
                    .await?;
                rest.url = rest.data_source.url().map(str::to_string);
                Ok(DataSourceItem::Rest(rest))
            }
            DataSourceItem::Sql(mut sql) => {
                sql.data_source = self
                    .sources
                    .resolve_data_source(ctx, sql.data_source)
                    .await?;
                Ok(DataSourceItem::Sql(sql))
            }
        }
    }
}

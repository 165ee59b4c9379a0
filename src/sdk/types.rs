//! Entity types owned by the dashboards middleware
//!
//! Data sources, items, and credentials are tagged unions resolved by
//! pattern matching; the middleware constructs them per request and host
//! providers return them mutated, never cached.

use axum::http::HeaderMap;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Caller identity forwarded with every provider invocation
///
/// Built from request headers: `x-user-id` carries the user, and any
/// `x-context-*` header becomes a property keyed by its suffix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    /// Authenticated user identifier, if the embedding page supplied one
    pub user_id: Option<String>,
    /// Free-form per-tenant properties
    pub properties: FxHashMap<String, String>,
}

impl UserContext {
    /// Extract the caller context from request headers
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut properties = FxHashMap::default();
        for (name, value) in headers {
            if let Some(key) = name.as_str().strip_prefix("x-context-")
                && let Ok(value) = value.to_str()
            {
                properties.insert(key.to_string(), value.to_string());
            }
        }

        Self {
            user_id,
            properties,
        }
    }
}

/// Connection descriptor an item queries against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    /// REST endpoint source; the only kind the middleware executes directly
    Rest(RestDataSource),
    /// SQL source handled by engine-side connectors
    Sql(SqlDataSource),
}

/// REST data source with a mutable query URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestDataSource {
    /// Source identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Query URL; providers set this before dispatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// SQL data source addressed by host and database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlDataSource {
    /// Source identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Database host
    pub host: String,
    /// Database name
    pub database: String,
}

impl DataSource {
    /// Source identifier
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Rest(source) => &source.id,
            Self::Sql(source) => &source.id,
        }
    }

    /// Resolved query URL; only REST sources carry one
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Rest(source) => source.url.as_deref(),
            Self::Sql(_) => None,
        }
    }
}

/// One queryable unit (chart or table) bound to a parent data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSourceItem {
    /// REST item fetching from its own URL
    Rest(RestDataSourceItem),
    /// SQL item selecting from a table
    Sql(SqlDataSourceItem),
}

/// REST data source item mirroring its parent's resolved URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestDataSourceItem {
    /// Item identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Fetch URL; mirrors the parent source after resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Parent data source
    pub data_source: DataSource,
}

/// SQL data source item bound to a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlDataSourceItem {
    /// Item identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Table the item selects from
    pub table: String,
    /// Parent data source
    pub data_source: DataSource,
}

impl DataSourceItem {
    /// Item identifier
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Rest(item) => &item.id,
            Self::Sql(item) => &item.id,
        }
    }

    /// Parent data source
    #[must_use]
    pub fn data_source(&self) -> &DataSource {
        match self {
            Self::Rest(item) => &item.data_source,
            Self::Sql(item) => &item.data_source,
        }
    }

    /// Resolved fetch URL; only REST items carry one
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Rest(item) => item.url.as_deref(),
            Self::Sql(_) => None,
        }
    }
}

/// Credential presented to the data source on the item's behalf
///
/// Constructed fresh for every authentication request; never serialized into
/// responses.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceCredential {
    /// Static bearer token
    Bearer {
        /// Secret token value
        token: String,
    },
    /// HTTP basic authentication
    Basic {
        /// Account name
        username: String,
        /// Account password
        password: String,
    },
}

impl DataSourceCredential {
    /// Create a bearer-token credential
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Render the credential as an `Authorization` header value
    #[must_use]
    pub fn authorization_header(&self) -> String {
        match self {
            Self::Bearer { token } => format!("Bearer {token}"),
            Self::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{username}:{password}"));
                format!("Basic {encoded}")
            }
        }
    }
}

/// Generic middleware response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error details (if failed)
    pub error: Option<ErrorResponse>,
    /// Response timestamp
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(error: ErrorResponse) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Error details carried inside [`ApiResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    pub details: Option<FxHashMap<String, String>>,
}

/// Middleware status reported on its root and `/status` routes
#[derive(Debug, Serialize, Deserialize)]
pub struct MiddlewareStatus {
    /// Middleware name
    pub name: String,
    /// Host crate version
    pub version: String,
    /// Seconds since the middleware router was created
    pub uptime_seconds: u64,
}

//! Query descriptor and URL construction for the Cube analytics engine

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Analytics query descriptor sent to the engine as URL-encoded JSON
///
/// Field order is part of the wire format: `dimensions` serializes before
/// `measures`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeQuery {
    /// Dimension field names to group by
    pub dimensions: Vec<String>,
    /// Measure field names to aggregate
    pub measures: Vec<String>,
}

impl Default for CubeQuery {
    fn default() -> Self {
        Self {
            dimensions: vec![
                "orders.status".to_string(),
                "orders.users_age".to_string(),
                "orders.users_city".to_string(),
                "orders.users_state".to_string(),
            ],
            measures: vec![
                "orders.completed_count".to_string(),
                "orders.completed_percentage".to_string(),
                "orders.count".to_string(),
                "orders.dau".to_string(),
                "orders.mau".to_string(),
                "orders.total".to_string(),
                "orders.wau".to_string(),
            ],
        }
    }
}

/// Build the complete engine query URL
///
/// Appends `?query=` plus the percent-encoded compact JSON serialization of
/// the descriptor to the base endpoint. Deterministic for a given base and
/// descriptor, so callers may cache the result freely.
pub fn build_query_url(base_url: &str, query: &CubeQuery) -> Result<String> {
    let descriptor =
        serde_json::to_string(query).context("failed to serialize query descriptor")?;
    Ok(format!(
        "{base_url}?query={}",
        urlencoding::encode(&descriptor)
    ))
}

//! Analytics dashboards gateway
//!
//! HTTP host for an embedded analytics dashboards middleware. Features:
//! - Middleware mounted at the root path with its own routing
//! - Cube query URL construction for REST data sources
//! - Bearer-token credential injection sourced from configuration
//! - Config-gated CORS for browser-embedded dashboards

use anyhow::Result;

pub mod config;
pub mod cube;
pub mod middleware;
pub mod providers;
pub mod sdk;
pub mod server;

pub use config::{CorsConfig, EngineConfig, GatewayConfig, ServerConfig};
pub use server::GatewayServer;

/// Start the analytics gateway server
pub async fn start_server(config: GatewayConfig) -> Result<()> {
    let server = GatewayServer::new(config)?;
    server.start().await
}

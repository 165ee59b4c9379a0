//! Analytics gateway server assembly

use anyhow::Result;
use axum::{Router, extract::DefaultBodyLimit, middleware};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    config::GatewayConfig,
    cube::{CubeQuery, build_query_url},
    middleware::{create_cors_layer, logging_middleware},
    providers::{CubeAuthenticationProvider, CubeDataSourceItemProvider, CubeDataSourceProvider},
    sdk::{MiddlewareOptions, middleware_router},
};

/// Analytics gateway server
pub struct GatewayServer {
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new gateway server from validated configuration
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = match self.config.server_address().parse() {
            Ok(addr) => addr,
            Err(e) => {
                error!(
                    "Invalid server address '{}': {}",
                    self.config.server_address(),
                    e
                );
                return Err(anyhow::anyhow!("Invalid server address: {}", e));
            }
        };

        let app = match self.create_app() {
            Ok(app) => {
                info!("Application routes and middleware configured successfully");
                app
            }
            Err(e) => {
                error!("Failed to create application: {}", e);
                return Err(e);
            }
        };

        info!("Starting analytics gateway on {}", addr);

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind TCP listener to {}: {}", addr, e);
                error!(
                    "Please check if the port is already in use or if you have sufficient permissions"
                );
                return Err(anyhow::anyhow!("Failed to bind to address {}: {}", addr, e));
            }
        };

        info!("Analytics gateway accepting HTTP requests");

        if let Err(e) = axum::serve(listener, app).await {
            error!("Server encountered a fatal error: {}", e);
            return Err(anyhow::anyhow!("Server error: {}", e));
        }

        Ok(())
    }

    /// Create the Axum application with the dashboards middleware at the root
    ///
    /// The gateway registers no routes of its own; every path is answered by
    /// the embedded middleware, with CORS, logging, and tracing layered
    /// around it.
    pub fn create_app(&self) -> Result<Router> {
        let query_url = build_query_url(&self.config.engine.base_url, &CubeQuery::default())?;
        info!("Engine query URL prepared for {}", self.config.engine.base_url);

        let source_provider = Arc::new(CubeDataSourceProvider::new(query_url));
        let options = MiddlewareOptions::new()
            .with_authentication_provider(Arc::new(CubeAuthenticationProvider::new(
                self.config.engine.bearer_token.clone(),
            )))
            .with_data_source_provider(source_provider.clone())
            .with_data_source_item_provider(Arc::new(CubeDataSourceItemProvider::new(
                source_provider,
            )))
            .with_request_timeout(Duration::from_secs(self.config.engine.request_timeout_secs));

        let mut app = middleware_router(options)
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(middleware::from_fn(logging_middleware))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = create_cors_layer(&self.config.cors)? {
            app = app.layer(cors);
        }

        Ok(app)
    }
}

/// Route documentation for `--routes`
pub fn print_routes() {
    println!("Analytics Gateway Routes:");
    println!("=========================");
    println!();
    println!("Dashboards middleware (mounted at /):");
    println!("  GET  /        - Middleware status");
    println!("  GET  /status  - Middleware status");
    println!("  POST /data    - Resolve and execute a data source item");
    println!("  *    /*       - Middleware 404 envelope");
    println!();
    println!("All endpoints support:");
    println!("- JSON request/response bodies");
    println!("- CORS (when enabled)");
    println!("- Request tracing");
}

//! CORS and request logging middleware

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::CorsConfig;

/// CORS layer factory
///
/// Returns `None` when CORS is disabled. Origins, methods, and headers that
/// fail to parse are configuration errors, not values to skip silently.
pub fn create_cors_layer(config: &CorsConfig) -> Result<Option<CorsLayer>> {
    if !config.enabled {
        return Ok(None);
    }

    let mut cors = CorsLayer::new()
        .allow_credentials(config.allow_credentials)
        .max_age(std::time::Duration::from_secs(config.max_age_seconds));

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        warn!("CORS allows any origin; this is a development-only configuration");
        cors = cors.allow_origin(Any);
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("invalid CORS origin '{origin}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        cors = cors.allow_origin(AllowOrigin::list(origins));
    }

    let methods = config
        .allowed_methods
        .iter()
        .map(|method| {
            method
                .parse::<Method>()
                .with_context(|| format!("invalid CORS method '{method}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    cors = cors.allow_methods(methods);

    let headers = config
        .allowed_headers
        .iter()
        .map(|header| {
            header
                .parse::<HeaderName>()
                .with_context(|| format!("invalid CORS header '{header}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    cors = cors.allow_headers(headers);

    Ok(Some(cors))
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = duration.as_millis(),
        client_ip = %client_ip,
        "Request processed"
    );

    response
}

/// Extract client IP from request
fn get_client_ip(request: &Request) -> String {
    // Try X-Forwarded-For first (common in load balancers/proxies)
    if let Some(forwarded_for) = request.headers().get("X-Forwarded-For")
        && let Ok(forwarded_str) = forwarded_for.to_str()
        && let Some(first_ip) = forwarded_str.split(',').next()
    {
        return first_ip.trim().to_string();
    }

    // Try X-Real-IP
    if let Some(real_ip) = request.headers().get("X-Real-IP")
        && let Ok(real_ip_str) = real_ip.to_str()
    {
        return real_ip_str.to_string();
    }

    "unknown".to_string()
}

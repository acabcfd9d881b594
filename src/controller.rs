mod health;
mod version;

use axum::{Router, http::uri::PathAndQuery, routing::get};

use tracing::info;

use crate::service::version_service::VersionService;

pub const HEALTH_PATH: &str = "/health";

/// Checks that `route_path` is a literal URL path axum can register as-is.
fn validate_route_path(route_path: &str) -> anyhow::Result<()> {
    if !route_path.starts_with('/') {
        anyhow::bail!("route_path {:?} must start with '/'", route_path);
    }

    if let Some(c) = route_path
        .chars()
        .find(|c| matches!(c, '?' | '#' | '{' | '}' | '*') || c.is_whitespace())
    {
        anyhow::bail!("route_path {:?} contains invalid character {:?}", route_path, c);
    }

    // axum 0.8 rejects the old capture syntax
    if route_path.split('/').any(|segment| segment.starts_with(':')) {
        anyhow::bail!("route_path {:?} contains a capture segment", route_path);
    }

    let path_and_query: PathAndQuery = route_path
        .parse()
        .map_err(|e| anyhow::anyhow!("route_path {:?} is not a valid path: {}", route_path, e))?;

    if path_and_query.as_str() != route_path {
        anyhow::bail!("route_path {:?} is not a plain path", route_path);
    }

    Ok(())
}

pub fn create_routes(route_path: &str, version_service: VersionService) -> anyhow::Result<Router> {
    validate_route_path(route_path)?;

    if route_path == HEALTH_PATH {
        anyhow::bail!(
            "route_path {:?} is already registered for health checks",
            route_path
        );
    }

    info!(
        "registering route_path = {:?} version = {:?}",
        route_path,
        version_service.version()
    );

    let version_routes = Router::new()
        .route(route_path, get(version::get_version))
        .with_state(version_service);

    Ok(Router::new()
        .route(HEALTH_PATH, get(health::health))
        .merge(version_routes))
}

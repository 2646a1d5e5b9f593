// GET / and GET /health

use std::sync::Arc;

use warp::http::StatusCode;

use crate::cache::CacheService;
use crate::db::Database;
use crate::models::{HealthResponse, RootResponse};

/// Probes the backing services for the health endpoint
#[derive(Clone, Default)]
pub struct HealthCheck {
    database: Option<Database>,
    cache: Option<CacheService>,
    claude_enabled: bool,
}

impl HealthCheck {
    pub fn new(database: Option<Database>, cache: Option<CacheService>, claude_enabled: bool) -> Self {
        Self {
            database,
            cache,
            claude_enabled,
        }
    }

    /// Unhealthy only when the database cannot be reached
    pub async fn report(&self) -> (StatusCode, HealthResponse) {
        let database_ok = match &self.database {
            Some(db) => match db.ping().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "database health check failed");
                    false
                }
            },
            None => false,
        };

        let redis = match &self.cache {
            Some(cache) => match cache.ping().await {
                Ok(()) => "connected",
                Err(e) => {
                    tracing::warn!(error = %e, "redis health check failed");
                    "disconnected"
                }
            },
            None => "not configured",
        };

        let response = HealthResponse {
            status: if database_ok { "healthy" } else { "unhealthy" }.to_string(),
            gemini: "configured".to_string(),
            claude: if self.claude_enabled { "configured" } else { "not configured" }.to_string(),
            redis: redis.to_string(),
            database: if database_ok { "connected" } else { "disconnected" }.to_string(),
        };

        let status = if database_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, response)
    }
}

pub async fn root_handler() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&RootResponse {
        message: "AI Assistant API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    }))
}

pub async fn health_handler(health: Arc<HealthCheck>) -> Result<impl warp::Reply, warp::Rejection> {
    let (status, response) = health.report().await;
    Ok(warp::reply::with_status(warp::reply::json(&response), status))
}

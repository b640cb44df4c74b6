use std::sync::Arc;

use glaze_gateway::GatewayClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; handlers themselves hold no mutable state, so
/// concurrency safety is delegated entirely to Postgres.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: glaze_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Upstream provider client.
    pub gateway: Arc<GatewayClient>,
}

use std::sync::Arc;

use shopfloor_db::PgWorkStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and store are handles, config is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: shopfloor_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Record store used by the add/remove/cancel sequences.
    pub store: PgWorkStore,
}

impl AppState {
    pub fn new(pool: shopfloor_db::DbPool, config: ServerConfig) -> Self {
        Self {
            store: PgWorkStore::new(pool.clone()),
            pool,
            config: Arc::new(config),
        }
    }
}

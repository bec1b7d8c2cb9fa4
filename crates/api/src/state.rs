use std::sync::Arc;

use lorekeep_core::clock::{Clock, SystemClock};
use lorekeep_core::coordinator::EditCoordinator;
use lorekeep_db::PgNoteStore;

use crate::config::ServerConfig;

/// Edit coordinator over Postgres with an injectable clock.
pub type NoteCoordinator = EditCoordinator<PgNoteStore, Arc<dyn Clock>>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: lorekeep_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub coordinator: Arc<NoteCoordinator>,
}

impl AppState {
    pub fn new(pool: lorekeep_db::DbPool, config: ServerConfig) -> Self {
        Self::with_clock(pool, config, Arc::new(SystemClock))
    }

    /// Build state whose lock and version timestamps come from `clock`.
    pub fn with_clock(
        pool: lorekeep_db::DbPool,
        config: ServerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let coordinator = EditCoordinator::new(
            Arc::new(PgNoteStore::new(pool.clone())),
            clock,
            config.edit,
        );
        Self {
            pool,
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        }
    }
}

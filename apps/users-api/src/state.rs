//! Application state management.
//!
//! Defines the shared state passed to request handlers: configuration and
//! the PostgreSQL connection pool.

use database::postgres::DatabaseConnection;

/// Shared application state.
///
/// Cloned per handler; only cheap Arc clones are involved.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: DatabaseConnection,
}

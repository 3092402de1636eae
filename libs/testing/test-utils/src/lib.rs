//! Shared test infrastructure.
//!
//! Currently provides [`TestDatabase`], a Testcontainers-backed PostgreSQL
//! instance with the workspace migrations applied.

pub mod postgres;

pub use postgres::TestDatabase;

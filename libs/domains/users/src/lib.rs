//! Users Domain
//!
//! Complete domain implementation for user management: CRUD plus a
//! filtered, sorted, paginated search.
//!
//! # Features
//!
//! - User CRUD operations (single and batch delete)
//! - Search with allow-listed sorting, bounded pagination, and optional
//!   name/email/phone filters
//! - Best-effort age enrichment via agify.io
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, validation, age lookup
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Search    │  ← Query validation: pagination, sort, filters
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{
//!     AgifyClient,
//!     handlers,
//!     repository::InMemoryUserRepository,
//!     service::UserService,
//! };
//!
//! // Create repository and service
//! let repository = InMemoryUserRepository::new();
//! let service = UserService::new(repository, AgifyClient::new());
//!
//! // Create Axum router
//! let router = handlers::router(service);
//! ```

pub mod agify;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod search;
pub mod service;

// Re-export commonly used types
pub use agify::{AgeLookup, AgifyClient};
pub use error::{UserError, UserResult};
pub use models::{CreateUser, UpdateUser, User, UserResponse};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use search::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageResponse, SearchParams, SearchQuery, Sort,
    SortDirection, SortField, UserFilters,
};
pub use service::{MAX_BATCH_DELETE, UserService};

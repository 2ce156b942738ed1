//! # switchyard-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `switchyard-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows (JSON columns for blobs)
//!
//! ## Dependency rule
//! Depends on `switchyard-app` (for port traits) and `switchyard-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod external_service_repo;
pub mod invocation_store;
pub mod pool;
pub mod recipe_repo;

pub use external_service_repo::SqliteExternalServiceRepository;
pub use invocation_store::SqliteInvocationStore;
pub use pool::{Config, Database};
pub use recipe_repo::SqliteRecipeRepository;

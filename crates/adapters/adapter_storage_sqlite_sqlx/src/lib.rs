//! # flowmate-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement [`SettingsRepository`](flowmate_app::ports::SettingsRepository)
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! ## Dependency rule
//! Depends on `flowmate-app` (for port traits) and `flowmate-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod settings_repo;

pub use pool::{Config, Database};
pub use settings_repo::SqliteSettingsRepository;

//! Database backends for Reinhardt fixture loading.
//!
//! Both stores implement [`FixtureStore`](reinhardt_fixtures::FixtureStore)
//! and [`TableCatalog`](reinhardt_fixtures::TableCatalog) on top of a `sqlx`
//! pool. Each fixture run uses exactly one transaction; concurrent statements
//! issued on it are serialized in issue order.
//!
//! # Features
//!
//! - `postgres` - PostgreSQL backend (enabled by default)
//! - `sqlite` - SQLite backend (enabled by default)
//!
//! # Example
//!
//! ```ignore
//! use reinhardt_fixtures_db::SqliteStore;
//!
//! let store = SqliteStore::connect("sqlite://app.db", 5).await?;
//! ```

#![warn(missing_docs)]

pub mod dialect;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use dialect::{Dialect, quote_ident};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresStore, PostgresTransaction};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteStore, SqliteTransaction};

//! # Reinhardt loaddata
//!
//! Loads declarative fixture files into a relational database as one
//! atomic, repeatable operation.
//!
//! This crate re-exports the fixture pipeline and, behind the `db` feature,
//! the `sqlx` storage backends.
//!
//! ## Feature Flags
//!
//! - `db` (default) - PostgreSQL and SQLite stores
//! - `postgres` - PostgreSQL store only
//! - `sqlite` - SQLite store only
//! - `yaml` - YAML fixture files
//! - `full` - Everything
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_loaddata::prelude::*;
//! use reinhardt_loaddata::db::SqliteStore;
//!
//! let settings = FixtureSettings::load("fixtures.toml".as_ref())?;
//! let store = SqliteStore::connect(settings.database_url()?, 5).await?;
//! let summary = LoadFixturesCommand::new()
//!     .execute(
//!         &store,
//!         &settings.schema_registry(),
//!         LoadFixturesOptions::from_settings(&settings),
//!         &SilentProgress,
//!     )
//!     .await?;
//! ```

pub use reinhardt_fixtures::*;

/// Storage backends.
#[cfg(feature = "db")]
pub mod db {
	pub use reinhardt_fixtures_db::*;
}

//! Transactional fixture loading for the Reinhardt framework.
//!
//! This crate loads a directory tree of declarative fixture files into a
//! relational database as one atomic, repeatable operation:
//!
//! - **Definitions**: YAML or JSON files declaring named fixtures, with
//!   templates, `extends` inheritance, ranges and parameters
//! - **Resolution**: `@name` references ordered so every referenced fixture
//!   is built first
//! - **Persistence**: entities grouped by type and written in fixed-size
//!   batches inside a single transaction, optionally clearing tables first
//!
//! # Features
//!
//! - `json` - JSON fixture format support (enabled by default)
//! - `yaml` - YAML fixture format support (enabled by default)
//! - `full` - All features enabled
//!
//! # Quick Start
//!
//! Create a fixture file (`fixtures/users/users.yml`):
//!
//! ```yaml
//! entity: User
//! parameters:
//!   domain: example.com
//! items:
//!   user_base (template):
//!     active: true
//!   user{1..3} (extends user_base):
//!     id: "{@current}"
//!     email: "user{@current}@<{domain}>"
//! ```
//!
//! and one referencing it (`fixtures/orders/orders.yml`):
//!
//! ```yaml
//! entity: Order
//! items:
//!   order1:
//!     id: 1
//!     user_id: "@user1"
//! ```
//!
//! Load the tree:
//!
//! ```ignore
//! use reinhardt_fixtures::prelude::*;
//!
//! let schema = SchemaRegistry::new()
//!     .with_kind(EntityKind::new("User", "users"))
//!     .with_kind(EntityKind::new("Order", "orders"));
//! let options = LoadFixturesOptions::new().with_delete(true);
//! let summary = LoadFixturesCommand::new()
//!     .execute(&store, &schema, options, &SilentProgress)
//!     .await?;
//! println!("total fixtures: {}", summary.total_fixtures);
//! ```
//!
//! # Architecture
//!
//! - [`fixtures`] - parsing, the [`FixtureRegistry`], resolution and entity
//!   construction
//! - [`schema`] - entity type to table mapping
//! - [`pipeline`] - directory scanning, grouping and the transactional writer
//! - [`store`] - storage traits implemented by database backends
//! - [`settings`] - TOML and environment settings
//! - [`commands`] - the `loadfixtures` command

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod commands;
pub mod entity;
pub mod error;
pub mod fixtures;
pub mod pipeline;
pub mod prelude;
pub mod schema;
pub mod settings;
pub mod store;

// Re-export commonly used types at crate root
pub use entity::{Entity, EntityKind};
pub use error::{FixtureError, FixtureResult};
pub use fixtures::{FixtureConfig, FixtureLoader, FixtureRegistry, FixtureResolver};
pub use pipeline::{FixturePipeline, LoadOptions, LoadSummary};
pub use schema::{SchemaMetadata, SchemaRegistry};
pub use store::{FixtureStore, StoreTransaction, TableCatalog};

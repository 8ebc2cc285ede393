//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use reinhardt_fixtures::prelude::*;
//! ```

// Error types
pub use crate::error::{FixtureError, FixtureResult};

// Definitions
pub use crate::fixtures::{
	EntityBuilder, FieldValue, FixtureConfig, FixtureFormat, FixtureLoader, FixtureParser,
	FixtureRegistry, FixtureResolver, ResolvedFixture, fixtures_iter,
};

// Entities and schema
pub use crate::entity::{Entity, EntityKind};
pub use crate::schema::{SchemaMetadata, SchemaRegistry, TableNaming};

// Pipeline
pub use crate::pipeline::{
	EntityGroup, EntityGroups, FixturePipeline, GroupReport, LoadOptions, LoadSummary,
	ProgressReporter, SilentProgress, TransactionalWriter, WriteReport,
};

// Storage
pub use crate::store::{FixtureStore, StoreTransaction, TableCatalog};

// Settings and commands
pub use crate::commands::{LoadFixturesCommand, LoadFixturesOptions};
pub use crate::settings::FixtureSettings;

//! Fixture loading pipeline.
//!
//! Stages run in this order:
//!
//! 1. [`scan_fixture_dirs`] lists the subdirectories of the fixtures root.
//! 2. [`FixtureLoader`] parses each subdirectory into one shared registry.
//! 3. [`FixtureResolver`] orders the definitions by their references.
//! 4. [`EntityBuilder`] turns each resolved fixture into an entity, feeding
//!    the [`Grouper`] one at a time.
//! 5. [`TransactionalWriter`] persists the groups in a single transaction.
//!
//! Everything up to step 5 happens in memory. The database is only touched
//! once every entity has been built and grouped.

mod grouping;
mod progress;
mod scanner;
mod writer;

pub use grouping::{EntityGroup, EntityGroups, Grouper};
pub use progress::{ProgressReporter, SilentProgress};
pub use scanner::scan_fixture_dirs;
pub use writer::{
	DEFAULT_BATCH_SIZE, GroupReport, TransactionalWriter, WriteReport, WriterState,
};

use std::num::NonZeroUsize;
use std::path::PathBuf;

use tracing::info;

use crate::error::FixtureResult;
use crate::fixtures::{
	EntityBuilder, FixtureLoader, FixtureRegistry, FixtureResolver, fixtures_iter,
};
use crate::schema::SchemaMetadata;
use crate::store::FixtureStore;

/// Default fixtures root directory.
pub const DEFAULT_FIXTURES_PATH: &str = "./fixtures";

/// Options of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
	/// Root directory whose subdirectories hold fixture files.
	pub fixtures_path: PathBuf,

	/// Maximum number of entities per batch insert.
	pub batch_size: NonZeroUsize,

	/// Clear every target table before inserting.
	pub delete: bool,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			fixtures_path: PathBuf::from(DEFAULT_FIXTURES_PATH),
			batch_size: DEFAULT_BATCH_SIZE,
			delete: false,
		}
	}
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
	/// Number of fixtures built and grouped.
	pub total_fixtures: usize,

	/// Committed write details.
	pub report: WriteReport,
}

/// Wires the pipeline stages together for one run.
pub struct FixturePipeline<'a, S: FixtureStore + ?Sized> {
	store: &'a S,
	schema: &'a dyn SchemaMetadata,
	options: LoadOptions,
	progress: &'a dyn ProgressReporter,
	loader: FixtureLoader,
	resolver: FixtureResolver,
}

impl<'a, S: FixtureStore + ?Sized> FixturePipeline<'a, S> {
	/// Creates a pipeline writing to `store` with silent progress.
	pub fn new(store: &'a S, schema: &'a dyn SchemaMetadata, options: LoadOptions) -> Self {
		Self {
			store,
			schema,
			options,
			progress: &SilentProgress,
			loader: FixtureLoader::new(),
			resolver: FixtureResolver::new(),
		}
	}

	/// Reports progress to `progress`.
	pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
		self.progress = progress;
		self
	}

	/// Returns the run options.
	pub fn options(&self) -> &LoadOptions {
		&self.options
	}

	/// Loads the fixtures registry from every subdirectory of the root.
	///
	/// # Errors
	///
	/// Propagates scanner and loader errors.
	pub fn load_registry(&self) -> FixtureResult<FixtureRegistry> {
		let mut registry = FixtureRegistry::new();
		for dir in scan_fixture_dirs(&self.options.fixtures_path)? {
			registry = self.loader.load(&dir, registry)?;
		}
		info!(definitions = registry.len(), "fixture definitions loaded");
		Ok(registry)
	}

	/// Runs every in-memory stage and returns the populated groups.
	///
	/// # Errors
	///
	/// Propagates scanner, loader, resolver, builder and schema errors.
	pub async fn collect_groups(&self) -> FixtureResult<EntityGroups> {
		let registry = self.load_registry()?;
		let resolved = self.resolver.resolve(&registry)?;

		let mut builder = EntityBuilder::new(self.schema);
		let mut grouper = Grouper::new(self.schema);
		for fixture in fixtures_iter(resolved) {
			let entity = builder.build(fixture)?;
			let total = grouper.push(entity).await?;
			self.progress.fixture_counted(total);
		}

		let total = grouper.total();
		self.progress.fixtures_collected(total);
		info!(total, "fixtures built");
		Ok(grouper.finish())
	}

	/// Runs the whole pipeline.
	///
	/// # Errors
	///
	/// Returns the first error of any stage. Errors raised after the
	/// transaction is opened are returned once it has been rolled back.
	pub async fn run(&self) -> FixtureResult<LoadSummary> {
		let groups = self.collect_groups().await?;
		let total_fixtures = groups.total_entities();

		let report = TransactionalWriter::new(self.options.batch_size)
			.with_delete(self.options.delete)
			.write(self.store, &groups, self.progress)
			.await?;

		Ok(LoadSummary {
			total_fixtures,
			report,
		})
	}
}

//! loadfixtures command implementation.
//!
//! This command loads a fixtures directory tree into the database in one
//! transaction.

use std::path::PathBuf;

use tracing::info;

use crate::error::{FixtureError, FixtureResult};
use crate::pipeline::{
	DEFAULT_BATCH_SIZE, DEFAULT_FIXTURES_PATH, FixturePipeline, LoadOptions, LoadSummary,
	ProgressReporter,
};
use crate::schema::SchemaMetadata;
use crate::settings::FixtureSettings;
use crate::store::FixtureStore;

/// Options for the loadfixtures command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFixturesOptions {
	/// Root directory whose subdirectories hold fixture files.
	pub fixtures_path: PathBuf,

	/// Maximum number of entities per batch insert.
	pub batch_size: usize,

	/// Clear every target table before inserting.
	pub delete: bool,

	/// Verbosity level.
	pub verbosity: u8,
}

impl Default for LoadFixturesOptions {
	fn default() -> Self {
		Self {
			fixtures_path: PathBuf::from(DEFAULT_FIXTURES_PATH),
			batch_size: DEFAULT_BATCH_SIZE.get(),
			delete: false,
			verbosity: 0,
		}
	}
}

impl LoadFixturesOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes the `[loader]` section of the settings as a starting point.
	pub fn from_settings(settings: &FixtureSettings) -> Self {
		Self {
			fixtures_path: settings.loader.fixtures_path.clone(),
			batch_size: settings.loader.batch_size,
			delete: settings.loader.delete,
			verbosity: 0,
		}
	}

	/// Sets the fixtures root directory.
	pub fn with_fixtures_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.fixtures_path = path.into();
		self
	}

	/// Sets the batch size.
	pub fn with_batch_size(mut self, size: usize) -> Self {
		self.batch_size = size;
		self
	}

	/// Sets delete mode.
	pub fn with_delete(mut self, delete: bool) -> Self {
		self.delete = delete;
		self
	}

	/// Sets verbosity level.
	pub fn with_verbosity(mut self, level: u8) -> Self {
		self.verbosity = level;
		self
	}

	/// Checks the options and converts them into pipeline options.
	///
	/// # Errors
	///
	/// - [`FixtureError::Validation`] if the batch size is zero.
	/// - [`FixtureError::Filesystem`] if the fixtures path does not exist.
	pub fn validate(&self) -> FixtureResult<LoadOptions> {
		let batch_size = std::num::NonZeroUsize::new(self.batch_size).ok_or_else(|| {
			FixtureError::Validation {
				field: "transaction_batch_size".to_string(),
				message: "must be at least 1".to_string(),
			}
		})?;

		if !self.fixtures_path.exists() {
			return Err(FixtureError::Filesystem(format!(
				"fixtures path {} does not exist",
				self.fixtures_path.display()
			)));
		}

		Ok(LoadOptions {
			fixtures_path: self.fixtures_path.clone(),
			batch_size,
			delete: self.delete,
		})
	}
}

/// The loadfixtures command for loading a fixtures tree into the database.
///
/// # Example
///
/// ```ignore
/// let command = LoadFixturesCommand::new();
/// let options = LoadFixturesOptions::new()
///     .with_fixtures_path("./fixtures")
///     .with_delete(true);
/// let summary = command.execute(&store, &schema, options, &SilentProgress).await?;
/// println!("Loaded {} fixtures", summary.total_fixtures);
/// ```
#[derive(Debug, Default)]
pub struct LoadFixturesCommand;

impl LoadFixturesCommand {
	/// Creates a new loadfixtures command.
	pub fn new() -> Self {
		Self
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"loadfixtures"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Loads a fixtures directory into the database in a single transaction"
	}

	/// Returns the command help text.
	pub fn help(&self) -> &str {
		r#"
Usage: loadfixtures [options]

Loads every fixture below the fixtures directory into the database.
All rows are written in one transaction: either every fixture is
committed or none is.

Options:
  --fixtures-path, -p DIR            Fixtures root directory (default: ./fixtures)
  --transaction-batch-size, -s N     Entities per insert statement (default: 250)
  --delete, -d                       Clear target tables before loading
  --database-url URL                 Database URL (default: $DATABASE_URL)
  --config, -c FILE                  Settings file (default: fixtures.toml)
  -v                                 Increase verbosity
"#
	}

	/// Executes the loadfixtures command.
	///
	/// The store is closed before returning, whether the run succeeded or
	/// not.
	pub async fn execute<S>(
		&self,
		store: &S,
		schema: &dyn SchemaMetadata,
		options: LoadFixturesOptions,
		progress: &dyn ProgressReporter,
	) -> FixtureResult<LoadSummary>
	where
		S: FixtureStore + ?Sized,
	{
		let result = Self::run(store, schema, &options, progress).await;
		store.close().await;

		if let Ok(summary) = &result
			&& options.verbosity > 1
		{
			self.print_result(summary);
		}
		result
	}

	async fn run<S>(
		store: &S,
		schema: &dyn SchemaMetadata,
		options: &LoadFixturesOptions,
		progress: &dyn ProgressReporter,
	) -> FixtureResult<LoadSummary>
	where
		S: FixtureStore + ?Sized,
	{
		let load_options = options.validate()?;
		info!(
			path = %load_options.fixtures_path.display(),
			batch_size = load_options.batch_size.get(),
			delete = load_options.delete,
			"loading fixtures"
		);

		FixturePipeline::new(store, schema, load_options)
			.with_progress(progress)
			.run()
			.await
	}

	/// Prints per-table statistics.
	fn print_result(&self, summary: &LoadSummary) {
		for group in &summary.report.groups {
			println!(
				"Installed {} object(s) into {} in {} batch(es)",
				group.entities, group.table, group.batches
			);
		}
	}
}

//! Fixture loader settings.
//!
//! Values are layered in this order, later layers winning:
//!
//! 1. built-in defaults
//! 2. the TOML settings file (optional)
//! 3. `.env` and process environment (`DATABASE_URL`)
//! 4. command-line flags, applied by the caller
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/app"
//! max_connections = 5
//!
//! [loader]
//! fixtures_path = "./fixtures"
//! batch_size = 250
//! delete = false
//!
//! [schema]
//! table_naming = "snake_case_plural"
//!
//! [entities.User]
//! table = "users"
//! primary_key = "id"
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{DEFAULT_PRIMARY_KEY, EntityKind};
use crate::error::{FixtureError, FixtureResult};
use crate::pipeline::{DEFAULT_BATCH_SIZE, DEFAULT_FIXTURES_PATH};
use crate::schema::{SchemaRegistry, TableNaming};

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "fixtures.toml";

/// Environment variable overriding `database.url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	/// Connection URL (`postgres://`, `postgresql://` or `sqlite:`).
	pub url: Option<String>,

	/// Maximum pool size.
	pub max_connections: u32,
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			url: None,
			max_connections: 5,
		}
	}
}

/// `[loader]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
	/// Fixtures root directory.
	pub fixtures_path: PathBuf,
	/// Entities per batch insert.
	pub batch_size: usize,
	/// Clear target tables before loading.
	pub delete: bool,
}

impl Default for LoaderSettings {
	fn default() -> Self {
		Self {
			fixtures_path: PathBuf::from(DEFAULT_FIXTURES_PATH),
			batch_size: DEFAULT_BATCH_SIZE.get(),
			delete: false,
		}
	}
}

/// `[schema]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
	/// Naming convention for entity types without an `[entities]` entry.
	pub table_naming: TableNaming,
}

/// One `[entities.<Type>]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySettings {
	/// Physical table name.
	pub table: String,
	/// Primary-key column, `id` when omitted.
	#[serde(default)]
	pub primary_key: Option<String>,
}

/// Complete settings of a fixture run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
	/// Connection settings.
	pub database: DatabaseSettings,
	/// Pipeline settings.
	pub loader: LoaderSettings,
	/// Table naming settings.
	pub schema: SchemaSettings,
	/// Entity kinds keyed by entity type name.
	pub entities: IndexMap<String, EntitySettings>,
}

impl FixtureSettings {
	/// Parses settings from TOML text.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Toml`] on malformed input.
	pub fn from_toml_str(content: &str) -> FixtureResult<Self> {
		Ok(toml::from_str(content)?)
	}

	/// Reads settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Configuration`] if the file cannot be read or
	/// parsed.
	pub fn from_file(path: &Path) -> FixtureResult<Self> {
		let content = fs::read_to_string(path)
			.map_err(|e| FixtureError::Configuration(format!("{}: {}", path.display(), e)))?;
		Self::from_toml_str(&content)
			.map_err(|e| FixtureError::Configuration(format!("{}: {}", path.display(), e)))
	}

	/// Loads `.env`, the settings file if it exists, then environment
	/// overrides.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Configuration`] if the file exists but cannot
	/// be read or parsed.
	pub fn load(path: &Path) -> FixtureResult<Self> {
		dotenv::dotenv().ok();

		let mut settings = match fs::metadata(path) {
			Ok(_) => Self::from_file(path)?,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				debug!(path = %path.display(), "no settings file, using defaults");
				Self::default()
			}
			Err(e) => {
				return Err(FixtureError::Configuration(format!(
					"{}: {}",
					path.display(),
					e
				)));
			}
		};
		settings.apply_env();
		Ok(settings)
	}

	/// Applies environment variable overrides.
	pub fn apply_env(&mut self) {
		if let Ok(url) = std::env::var(DATABASE_URL_ENV)
			&& !url.is_empty()
		{
			self.database.url = Some(url);
		}
	}

	/// Returns the database URL.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Configuration`] if no URL is configured.
	pub fn database_url(&self) -> FixtureResult<&str> {
		self.database.url.as_deref().ok_or_else(|| {
			FixtureError::Configuration(format!(
				"database URL is not set (use [database] url or {})",
				DATABASE_URL_ENV
			))
		})
	}

	/// Builds the schema registry from `[schema]` and `[entities]`.
	pub fn schema_registry(&self) -> SchemaRegistry {
		self.entities
			.iter()
			.fold(
				SchemaRegistry::new().with_naming(self.schema.table_naming),
				|registry, (name, entity)| {
					let primary_key = entity
						.primary_key
						.as_deref()
						.unwrap_or(DEFAULT_PRIMARY_KEY);
					registry.with_kind(
						EntityKind::new(name.as_str(), entity.table.as_str())
							.with_primary_key(primary_key),
					)
				},
			)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pipeline::LoadOptions;
	use crate::schema::SchemaMetadata;
	use rstest::rstest;
	use serial_test::serial;
	use tempfile::TempDir;

	const SAMPLE: &str = r#"
[database]
url = "sqlite://fixtures.db"

[loader]
fixtures_path = "data/fixtures"
batch_size = 50
delete = true

[schema]
table_naming = "snake_case_plural"

[entities.User]
table = "auth_users"
primary_key = "user_id"

[entities.Order]
table = "orders"
"#;

	#[rstest]
	fn test_defaults() {
		let settings = FixtureSettings::default();
		let options = LoadOptions::default();

		assert_eq!(settings.loader.fixtures_path, options.fixtures_path);
		assert_eq!(settings.loader.batch_size, options.batch_size.get());
		assert_eq!(settings.loader.delete, options.delete);
		assert_eq!(settings.database.max_connections, 5);
		assert!(settings.database_url().is_err());
	}

	#[rstest]
	fn test_parse_sections() {
		let settings = FixtureSettings::from_toml_str(SAMPLE).unwrap();

		assert_eq!(settings.database_url().unwrap(), "sqlite://fixtures.db");
		assert_eq!(settings.loader.fixtures_path, PathBuf::from("data/fixtures"));
		assert_eq!(settings.loader.batch_size, 50);
		assert!(settings.loader.delete);
		assert_eq!(settings.schema.table_naming, TableNaming::SnakeCasePlural);
		assert_eq!(settings.entities.len(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_schema_registry() {
		let registry = FixtureSettings::from_toml_str(SAMPLE)
			.unwrap()
			.schema_registry();

		assert_eq!(registry.table_name_for("User").await.unwrap(), "auth_users");
		assert_eq!(registry.primary_key_for("User"), "user_id");
		assert_eq!(registry.primary_key_for("Order"), "id");
		assert_eq!(registry.table_name_for("LineItem").await.unwrap(), "line_items");
	}

	#[rstest]
	fn test_malformed_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("fixtures.toml");
		fs::write(&path, "[loader\nbatch_size = ").unwrap();

		let result = FixtureSettings::from_file(&path);
		assert!(matches!(result, Err(FixtureError::Configuration(_))));
	}

	#[rstest]
	#[serial]
	fn test_missing_file_uses_defaults() {
		// SAFETY: serialized with every other test touching the environment.
		unsafe { std::env::remove_var(DATABASE_URL_ENV) };
		let dir = TempDir::new().unwrap();

		let settings = FixtureSettings::load(&dir.path().join("absent.toml")).unwrap();
		assert_eq!(settings.loader, LoaderSettings::default());
	}

	#[rstest]
	#[serial]
	fn test_database_url_env_override() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("fixtures.toml");
		fs::write(&path, SAMPLE).unwrap();

		// SAFETY: serialized with every other test touching the environment.
		unsafe { std::env::set_var(DATABASE_URL_ENV, "postgres://localhost/test") };
		let settings = FixtureSettings::load(&path).unwrap();
		unsafe { std::env::remove_var(DATABASE_URL_ENV) };

		assert_eq!(settings.database_url().unwrap(), "postgres://localhost/test");
		assert_eq!(settings.loader.batch_size, 50);
	}
}

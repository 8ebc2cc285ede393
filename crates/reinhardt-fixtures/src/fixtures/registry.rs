//! Fixture definition registry and directory loader.
//!
//! The registry is an explicit value owned by one pipeline run. It is moved
//! into every [`FixtureLoader::load`] call and handed back with the new
//! definitions added, so definitions from one directory can be referenced
//! by definitions from another without any process-wide state.

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;
use walkdir::WalkDir;

use super::{FixtureConfig, FixtureFormat, FixtureParser};
use crate::error::{FixtureError, FixtureResult};

/// Ordered collection of fixture definitions keyed by fixture name.
#[derive(Debug, Default, Clone)]
pub struct FixtureRegistry {
	configs: IndexMap<String, FixtureConfig>,
}

impl FixtureRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a definition.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::DefinitionParse`] if a definition with the same
	/// name is already registered.
	pub fn insert(&mut self, config: FixtureConfig) -> FixtureResult<()> {
		if let Some(existing) = self.configs.get(&config.name) {
			let origin = |c: &FixtureConfig| {
				c.source
					.as_ref()
					.map(|p| p.display().to_string())
					.unwrap_or_else(|| "<inline>".to_string())
			};
			return Err(FixtureError::DefinitionParse(format!(
				"duplicate fixture name '{}' (first defined in {}, redefined in {})",
				config.name,
				origin(existing),
				origin(&config)
			)));
		}
		self.configs.insert(config.name.clone(), config);
		Ok(())
	}

	/// Gets a definition by fixture name.
	pub fn get(&self, name: &str) -> Option<&FixtureConfig> {
		self.configs.get(name)
	}

	/// Checks if a definition is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.configs.contains_key(name)
	}

	/// Returns the position of a definition in registration order.
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.configs.get_index_of(name)
	}

	/// Returns the number of registered definitions, templates included.
	pub fn len(&self) -> usize {
		self.configs.len()
	}

	/// Returns true if no definitions are registered.
	pub fn is_empty(&self) -> bool {
		self.configs.is_empty()
	}

	/// Iterates over definitions in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &FixtureConfig> {
		self.configs.values()
	}
}

impl FromIterator<FixtureConfig> for FixtureRegistry {
	/// Collects definitions, keeping the first of any duplicated name.
	fn from_iter<I: IntoIterator<Item = FixtureConfig>>(iter: I) -> Self {
		let mut configs = IndexMap::new();
		for config in iter {
			configs.entry(config.name.clone()).or_insert(config);
		}
		Self { configs }
	}
}

/// Loads every fixture file below a directory into a registry.
#[derive(Debug, Default)]
pub struct FixtureLoader {
	parser: FixtureParser,
}

impl FixtureLoader {
	/// Creates a new loader.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses every `.yml`, `.yaml` and `.json` file below `dir` into
	/// `registry`.
	///
	/// Files are visited recursively in file-name order. Files with other
	/// extensions are skipped.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Filesystem`] if the directory cannot be walked
	/// and [`FixtureError::DefinitionParse`] for malformed or duplicated
	/// definitions.
	pub fn load(&self, dir: &Path, mut registry: FixtureRegistry) -> FixtureResult<FixtureRegistry> {
		for entry in WalkDir::new(dir).sort_by_file_name() {
			let entry = entry.map_err(|e| {
				FixtureError::Filesystem(format!("{}: {}", dir.display(), e))
			})?;
			if !entry.file_type().is_file() || FixtureFormat::from_path(entry.path()).is_none() {
				continue;
			}

			let configs = self.parser.parse_file(entry.path())?;
			debug!(
				path = %entry.path().display(),
				count = configs.len(),
				"parsed fixture file"
			);
			for config in configs {
				registry.insert(config)?;
			}
		}

		Ok(registry)
	}
}

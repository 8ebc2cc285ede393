//! Fixture file format definitions.
//!
//! A fixture file declares one entity type and an ordered set of named
//! items:
//!
//! ```yaml
//! entity: User
//! parameters:
//!   domain: example.com
//! items:
//!   user_base (template):
//!     active: true
//!   user1 (extends user_base):
//!     id: 1
//!     email: "alice@<{domain}>"
//!   user{2..4}:
//!     id: "{@current}"
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// On-disk shape of one fixture file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureFile {
	/// Entity type every item of this file materializes into.
	pub entity: String,

	/// File-scoped values available to `<{key}>` placeholders.
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub parameters: IndexMap<String, Value>,

	/// Item definitions keyed by item name expression.
	pub items: IndexMap<String, Value>,
}

/// One parsed fixture definition.
///
/// Field values may still contain `@name` references; the resolver turns
/// them into typed references.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureConfig {
	/// Unique fixture name (e.g., "user1").
	pub name: String,

	/// Entity type name (e.g., "User").
	pub entity: String,

	/// Field values in declaration order.
	pub fields: IndexMap<String, Value>,

	/// Fixture this one inherits fields from.
	pub extends: Option<String>,

	/// Templates are only used as `extends` parents and never persisted.
	pub template: bool,

	/// File the definition was read from.
	pub source: Option<PathBuf>,
}

impl FixtureConfig {
	/// Creates a new fixture definition.
	pub fn new(
		name: impl Into<String>,
		entity: impl Into<String>,
		fields: IndexMap<String, Value>,
	) -> Self {
		Self {
			name: name.into(),
			entity: entity.into(),
			fields,
			extends: None,
			template: false,
			source: None,
		}
	}

	/// Sets the parent fixture.
	pub fn with_extends(mut self, parent: impl Into<String>) -> Self {
		self.extends = Some(parent.into());
		self
	}

	/// Marks the definition as a template.
	pub fn as_template(mut self) -> Self {
		self.template = true;
		self
	}

	/// Sets the source file path.
	pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
		self.source = Some(source.into());
		self
	}
}

/// Supported fixture file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FixtureFormat {
	/// YAML format (default, requires `yaml` feature).
	#[default]
	Yaml,

	/// JSON format.
	Json,
}

impl FixtureFormat {
	/// Determines the fixture format from a file extension.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_fixtures::fixtures::FixtureFormat;
	/// assert_eq!(FixtureFormat::from_extension("json"), Some(FixtureFormat::Json));
	/// assert_eq!(FixtureFormat::from_extension("yml"), Some(FixtureFormat::Yaml));
	/// assert_eq!(FixtureFormat::from_extension("xml"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			_ => None,
		}
	}

	/// Determines the fixture format from a file path.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}

	/// Returns the default file extension for this format.
	pub fn extension(&self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yml",
		}
	}
}

impl std::fmt::Display for FixtureFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Json => write!(f, "JSON"),
			Self::Yaml => write!(f, "YAML"),
		}
	}
}

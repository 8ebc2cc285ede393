//! Built entities and static entity-type configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primary-key column used when an entity type does not declare one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// One entity built from a resolved fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
	/// Entity type name (e.g., "User").
	pub entity_type: String,

	/// Name of the fixture the entity was built from.
	pub fixture: String,

	/// Column values in declaration order.
	pub fields: IndexMap<String, Value>,
}

impl Entity {
	/// Creates a new entity.
	pub fn new(
		entity_type: impl Into<String>,
		fixture: impl Into<String>,
		fields: IndexMap<String, Value>,
	) -> Self {
		Self {
			entity_type: entity_type.into(),
			fixture: fixture.into(),
			fields,
		}
	}

	/// Returns the entity type name.
	pub fn type_name(&self) -> &str {
		&self.entity_type
	}

	/// Gets a field value.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.fields.get(field)
	}
}

/// Static description of a known entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKind {
	/// Entity type name as written in fixture files.
	pub name: String,

	/// Physical table name, optionally schema-qualified.
	pub table: String,

	/// Primary-key column used to resolve `@name` references.
	pub primary_key: String,
}

impl EntityKind {
	/// Creates a kind with the default `id` primary key.
	pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			table: table.into(),
			primary_key: DEFAULT_PRIMARY_KEY.to_string(),
		}
	}

	/// Sets the primary-key column.
	pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
		self.primary_key = column.into();
		self
	}
}

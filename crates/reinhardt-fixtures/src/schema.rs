//! Schema metadata: entity type → table name and primary key.
//!
//! Entity types are known up front as [`EntityKind`] entries. A naming
//! convention can be enabled for types without an entry; the derived table
//! name is then checked against the database catalog when one is attached.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{DEFAULT_PRIMARY_KEY, EntityKind};
use crate::error::{FixtureError, FixtureResult};
use crate::store::TableCatalog;

/// Source of table names and primary keys for entity types.
#[async_trait]
pub trait SchemaMetadata: Send + Sync {
	/// Returns the table name for an entity type.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::UnknownEntityType`] if the type has no table.
	async fn table_name_for(&self, entity_type: &str) -> FixtureResult<String>;

	/// Returns the primary-key column for an entity type.
	fn primary_key_for(&self, _entity_type: &str) -> String {
		DEFAULT_PRIMARY_KEY.to_string()
	}
}

/// How table names are derived for types without an explicit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNaming {
	/// Only explicitly configured types are accepted.
	#[default]
	Explicit,

	/// `OrderItem` → `order_item`.
	SnakeCase,

	/// `OrderItem` → `order_items`.
	SnakeCasePlural,
}

impl TableNaming {
	/// Derives a table name, or `None` for [`TableNaming::Explicit`].
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_fixtures::schema::TableNaming;
	/// assert_eq!(TableNaming::SnakeCase.table_name("OrderItem").as_deref(), Some("order_item"));
	/// assert_eq!(TableNaming::SnakeCasePlural.table_name("Category").as_deref(), Some("categories"));
	/// assert_eq!(TableNaming::Explicit.table_name("User"), None);
	/// ```
	pub fn table_name(&self, entity_type: &str) -> Option<String> {
		match self {
			Self::Explicit => None,
			Self::SnakeCase => Some(to_snake_case(entity_type)),
			Self::SnakeCasePlural => Some(pluralize(&to_snake_case(entity_type))),
		}
	}
}

fn to_snake_case(name: &str) -> String {
	let chars: Vec<char> = name.chars().collect();
	let mut out = String::with_capacity(name.len() + 4);
	for (i, &c) in chars.iter().enumerate() {
		if c.is_uppercase() {
			let prev = i.checked_sub(1).map(|p| chars[p]);
			let next = chars.get(i + 1);
			let boundary = match prev {
				Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
				Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
				_ => false,
			};
			if boundary {
				out.push('_');
			}
			out.extend(c.to_lowercase());
		} else {
			out.push(c);
		}
	}
	out
}

fn pluralize(word: &str) -> String {
	if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
		return format!("{}es", word);
	}
	if let Some(stem) = word.strip_suffix('y')
		&& !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
	{
		return format!("{}ies", stem);
	}
	format!("{}s", word)
}

/// Entity kinds resolved at startup.
#[derive(Default, Clone)]
pub struct SchemaRegistry {
	kinds: IndexMap<String, EntityKind>,
	naming: TableNaming,
	catalog: Option<Arc<dyn TableCatalog>>,
}

impl std::fmt::Debug for SchemaRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SchemaRegistry")
			.field("kinds", &self.kinds)
			.field("naming", &self.naming)
			.field("catalog", &self.catalog.is_some())
			.finish()
	}
}

impl SchemaRegistry {
	/// Creates an empty registry accepting only explicit kinds.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an entity kind, replacing any previous kind of the same name.
	pub fn with_kind(mut self, kind: EntityKind) -> Self {
		self.register(kind);
		self
	}

	/// Sets the naming convention for unregistered types.
	pub fn with_naming(mut self, naming: TableNaming) -> Self {
		self.naming = naming;
		self
	}

	/// Attaches a catalog used to verify derived table names.
	pub fn with_catalog(mut self, catalog: Arc<dyn TableCatalog>) -> Self {
		self.catalog = Some(catalog);
		self
	}

	/// Adds an entity kind.
	pub fn register(&mut self, kind: EntityKind) {
		self.kinds.insert(kind.name.clone(), kind);
	}

	/// Gets the kind registered for an entity type.
	pub fn kind(&self, entity_type: &str) -> Option<&EntityKind> {
		self.kinds.get(entity_type)
	}

	/// Returns the registered kinds in registration order.
	pub fn kinds(&self) -> impl Iterator<Item = &EntityKind> {
		self.kinds.values()
	}

	/// Returns the naming convention.
	pub fn naming(&self) -> TableNaming {
		self.naming
	}
}

#[async_trait]
impl SchemaMetadata for SchemaRegistry {
	async fn table_name_for(&self, entity_type: &str) -> FixtureResult<String> {
		if let Some(kind) = self.kinds.get(entity_type) {
			return Ok(kind.table.clone());
		}

		let table = self
			.naming
			.table_name(entity_type)
			.ok_or_else(|| FixtureError::UnknownEntityType(entity_type.to_string()))?;

		if let Some(catalog) = &self.catalog
			&& !catalog.table_exists(&table).await?
		{
			return Err(FixtureError::UnknownEntityType(format!(
				"{} (derived table '{}' does not exist)",
				entity_type, table
			)));
		}

		debug!(entity_type, table = %table, "derived table name");
		Ok(table)
	}

	fn primary_key_for(&self, entity_type: &str) -> String {
		self.kinds
			.get(entity_type)
			.map(|kind| kind.primary_key.clone())
			.unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string())
	}
}

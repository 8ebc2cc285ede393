//! Grouping of built entities by entity type.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::entity::Entity;
use crate::error::FixtureResult;
use crate::schema::SchemaMetadata;

/// Entities of one type, in the order they were built.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup {
	/// Entity type name.
	pub entity_type: String,

	/// Table the entities are written to.
	pub table: String,

	/// Entities in build order.
	pub entities: Vec<Entity>,
}

impl EntityGroup {
	/// Creates an empty group.
	pub fn new(entity_type: impl Into<String>, table: impl Into<String>) -> Self {
		Self {
			entity_type: entity_type.into(),
			table: table.into(),
			entities: Vec::new(),
		}
	}

	/// Returns the number of entities.
	pub fn len(&self) -> usize {
		self.entities.len()
	}

	/// Returns true if the group has no entities.
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	/// Splits the entities into chunks of at most `size`.
	///
	/// # Panics
	///
	/// Panics if `size` is zero.
	pub fn batches(&self, size: usize) -> std::slice::Chunks<'_, Entity> {
		self.entities.chunks(size)
	}
}

/// Groups keyed by entity type, in first-occurrence order.
#[derive(Debug, Default, Clone)]
pub struct EntityGroups {
	groups: IndexMap<String, EntityGroup>,
}

impl EntityGroups {
	/// Creates an empty collection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the number of groups.
	pub fn len(&self) -> usize {
		self.groups.len()
	}

	/// Returns true if there are no groups.
	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}

	/// Gets the group of an entity type.
	pub fn get(&self, entity_type: &str) -> Option<&EntityGroup> {
		self.groups.get(entity_type)
	}

	/// Iterates over groups in first-occurrence order.
	pub fn iter(&self) -> impl Iterator<Item = &EntityGroup> {
		self.groups.values()
	}

	/// Returns the distinct table names in group order.
	pub fn tables(&self) -> Vec<String> {
		let mut tables: Vec<String> = Vec::with_capacity(self.groups.len());
		for group in self.groups.values() {
			if !tables.contains(&group.table) {
				tables.push(group.table.clone());
			}
		}
		tables
	}

	/// Returns the number of entities over all groups.
	pub fn total_entities(&self) -> usize {
		self.groups.values().map(EntityGroup::len).sum()
	}

	fn index_of(&self, entity_type: &str) -> Option<usize> {
		self.groups.get_index_of(entity_type)
	}

	fn insert(&mut self, group: EntityGroup) -> usize {
		self.groups.insert_full(group.entity_type.clone(), group).0
	}

	fn push_at(&mut self, index: usize, entity: Entity) {
		self.groups[index].entities.push(entity);
	}
}

impl IntoIterator for EntityGroups {
	type Item = EntityGroup;
	type IntoIter = indexmap::map::IntoValues<String, EntityGroup>;

	fn into_iter(self) -> Self::IntoIter {
		self.groups.into_values()
	}
}

/// Accumulates entities into [`EntityGroups`].
///
/// The table of each entity type is looked up once, when the type is first
/// seen.
pub struct Grouper<'a> {
	schema: &'a dyn SchemaMetadata,
	groups: EntityGroups,
	total: usize,
}

impl<'a> Grouper<'a> {
	/// Creates a grouper resolving tables through `schema`.
	pub fn new(schema: &'a dyn SchemaMetadata) -> Self {
		Self {
			schema,
			groups: EntityGroups::new(),
			total: 0,
		}
	}

	/// Adds an entity and returns the running fixture count.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::UnknownEntityType`](crate::FixtureError::UnknownEntityType)
	/// if the schema has no table for the entity's type.
	pub async fn push(&mut self, entity: Entity) -> FixtureResult<usize> {
		let index = match self.groups.index_of(&entity.entity_type) {
			Some(index) => index,
			None => {
				let table = self.schema.table_name_for(&entity.entity_type).await?;
				debug!(entity_type = %entity.entity_type, table = %table, "new entity group");
				self.groups
					.insert(EntityGroup::new(entity.entity_type.clone(), table))
			}
		};
		self.groups.push_at(index, entity);

		self.total += 1;
		trace!(total = self.total, "fixture grouped");
		Ok(self.total)
	}

	/// Returns the number of entities pushed so far.
	pub fn total(&self) -> usize {
		self.total
	}

	/// Returns the collected groups.
	pub fn finish(self) -> EntityGroups {
		self.groups
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::FixtureError;
	use async_trait::async_trait;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct CountingSchema {
		lookups: AtomicUsize,
	}

	#[async_trait]
	impl SchemaMetadata for CountingSchema {
		async fn table_name_for(&self, entity_type: &str) -> FixtureResult<String> {
			self.lookups.fetch_add(1, Ordering::SeqCst);
			match entity_type {
				"User" => Ok("users".to_string()),
				"Order" => Ok("orders".to_string()),
				other => Err(FixtureError::UnknownEntityType(other.to_string())),
			}
		}
	}

	fn entity(entity_type: &str, name: &str) -> Entity {
		let mut fields = IndexMap::new();
		fields.insert("name".to_string(), json!(name));
		Entity::new(entity_type, name, fields)
	}

	#[rstest]
	#[tokio::test]
	async fn test_groups_keep_first_occurrence_and_insertion_order() {
		let schema = CountingSchema::default();
		let mut grouper = Grouper::new(&schema);

		for (entity_type, name) in [
			("User", "u1"),
			("Order", "o1"),
			("User", "u2"),
			("Order", "o2"),
			("User", "u3"),
		] {
			grouper.push(entity(entity_type, name)).await.unwrap();
		}
		assert_eq!(grouper.total(), 5);

		let groups = grouper.finish();
		let types: Vec<&str> = groups.iter().map(|g| g.entity_type.as_str()).collect();
		assert_eq!(types, vec!["User", "Order"]);

		let users: Vec<&str> = groups
			.get("User")
			.unwrap()
			.entities
			.iter()
			.map(|e| e.fixture.as_str())
			.collect();
		assert_eq!(users, vec!["u1", "u2", "u3"]);
		assert_eq!(groups.get("Order").unwrap().table, "orders");
		assert_eq!(groups.tables(), vec!["users", "orders"]);
		assert_eq!(groups.total_entities(), 5);
	}

	#[rstest]
	#[tokio::test]
	async fn test_table_lookup_once_per_type() {
		let schema = CountingSchema::default();
		let mut grouper = Grouper::new(&schema);

		for i in 0..300 {
			grouper.push(entity("User", &format!("user{}", i))).await.unwrap();
		}
		grouper.push(entity("Order", "order1")).await.unwrap();

		assert_eq!(schema.lookups.load(Ordering::SeqCst), 2);
		assert_eq!(grouper.finish().get("User").unwrap().len(), 300);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unknown_entity_type() {
		let schema = CountingSchema::default();
		let mut grouper = Grouper::new(&schema);

		let result = grouper.push(entity("Invoice", "inv1")).await;
		assert!(matches!(result, Err(FixtureError::UnknownEntityType(_))));
		assert_eq!(grouper.total(), 0);
	}

	#[rstest]
	fn test_batches_split() {
		let mut group = EntityGroup::new("User", "users");
		for i in 0..7 {
			group.entities.push(entity("User", &format!("u{}", i)));
		}

		let sizes: Vec<usize> = group.batches(3).map(<[Entity]>::len).collect();
		assert_eq!(sizes, vec![3, 3, 1]);
	}
}

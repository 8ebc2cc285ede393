//! Entity construction from resolved fixtures.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use super::{FieldValue, FixtureRef, ResolvedFixture};
use crate::entity::Entity;
use crate::error::{FixtureError, FixtureResult};
use crate::schema::SchemaMetadata;

/// Builds entities and resolves references against earlier builds.
///
/// Fixtures must be built in resolver order so every referenced fixture is
/// already known when a reference to it is materialized.
pub struct EntityBuilder<'a> {
	schema: &'a dyn SchemaMetadata,
	built: HashMap<String, Entity>,
}

impl<'a> EntityBuilder<'a> {
	/// Creates a builder reading primary keys from `schema`.
	pub fn new(schema: &'a dyn SchemaMetadata) -> Self {
		Self {
			schema,
			built: HashMap::new(),
		}
	}

	/// Builds one entity.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Resolution`] if a referenced fixture has not
	/// been built yet or lacks the referenced field.
	pub fn build(&mut self, fixture: ResolvedFixture) -> FixtureResult<Entity> {
		let mut fields = IndexMap::with_capacity(fixture.fields.len());
		for (key, value) in &fixture.fields {
			let value = self.materialize(&fixture.name, value)?;
			fields.insert(key.clone(), value);
		}

		let entity = Entity::new(fixture.entity, fixture.name, fields);
		self.built.insert(entity.fixture.clone(), entity.clone());
		Ok(entity)
	}

	fn materialize(&self, owner: &str, value: &FieldValue) -> FixtureResult<Value> {
		match value {
			FieldValue::Value(v) => Ok(v.clone()),
			FieldValue::Reference(reference) => self.lookup(owner, reference),
			FieldValue::List(items) => items
				.iter()
				.map(|item| self.materialize(owner, item))
				.collect::<FixtureResult<Vec<_>>>()
				.map(Value::Array),
		}
	}

	fn lookup(&self, owner: &str, reference: &FixtureRef) -> FixtureResult<Value> {
		let target = self.built.get(&reference.fixture).ok_or_else(|| {
			FixtureError::Resolution(format!(
				"fixture '{}' references '{}' before it was built",
				owner, reference.fixture
			))
		})?;

		let field = match &reference.field {
			Some(field) => field.clone(),
			None => self.schema.primary_key_for(&target.entity_type),
		};

		target.get(&field).cloned().ok_or_else(|| {
			FixtureError::Resolution(format!(
				"fixture '{}' references '{}.{}', which is not set",
				owner, reference.fixture, field
			))
		})
	}
}

//! Dependency resolution for fixture definitions.
//!
//! The resolver merges `extends` chains, parses `@name` / `@name.field`
//! references and orders fixtures so that every referenced fixture comes
//! before the fixtures referring to it.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::{FixtureConfig, FixtureRegistry};
use crate::error::{FixtureError, FixtureResult};

/// Reference to another fixture, optionally to one of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRef {
	/// Referenced fixture name.
	pub fixture: String,

	/// Referenced field; `None` means the primary key.
	pub field: Option<String>,
}

/// Field value of a resolved fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
	/// Plain value copied as-is.
	Value(Value),

	/// Value taken from another fixture once it is built.
	Reference(FixtureRef),

	/// Array containing at least one reference.
	List(Vec<FieldValue>),
}

impl FieldValue {
	/// Parses a raw value, recognizing `@name` and `@name.field` strings.
	///
	/// A leading `\@` escapes a literal `@`.
	pub fn parse(value: &Value) -> Self {
		match value {
			Value::String(s) => {
				if let Some(literal) = s.strip_prefix("\\@") {
					return Self::Value(Value::String(format!("@{}", literal)));
				}
				match s.strip_prefix('@') {
					Some(rest) if !rest.is_empty() && !rest.contains(char::is_whitespace) => {
						let (fixture, field) = match rest.split_once('.') {
							Some((fixture, field)) => (fixture, Some(field.to_string())),
							None => (rest, None),
						};
						Self::Reference(FixtureRef {
							fixture: fixture.to_string(),
							field,
						})
					}
					_ => Self::Value(value.clone()),
				}
			}
			Value::Array(items) => {
				let parsed: Vec<FieldValue> = items.iter().map(Self::parse).collect();
				if parsed.iter().any(|item| !matches!(item, Self::Value(_))) {
					Self::List(parsed)
				} else {
					Self::Value(value.clone())
				}
			}
			other => Self::Value(other.clone()),
		}
	}

	/// Collects referenced fixture names in order of appearance.
	fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
		match self {
			Self::Value(_) => {}
			Self::Reference(r) => out.push(&r.fixture),
			Self::List(items) => {
				for item in items {
					item.collect_references(out);
				}
			}
		}
	}
}

/// A fixture ready to be built into an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFixture {
	/// Unique fixture name.
	pub name: String,

	/// Entity type name.
	pub entity: String,

	/// Field values with `extends` merged and references parsed.
	pub fields: IndexMap<String, FieldValue>,

	/// Fixtures this one references directly, without duplicates.
	pub dependencies: Vec<String>,
}

/// Orders fixture definitions by their references.
#[derive(Debug, Default)]
pub struct FixtureResolver;

impl FixtureResolver {
	/// Creates a new resolver.
	pub fn new() -> Self {
		Self
	}

	/// Resolves every non-template definition of the registry.
	///
	/// The result is a topological order that keeps registration order
	/// wherever the references allow it.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Resolution`] for missing or cyclic `extends`
	/// parents, references to unknown fixtures or templates, and reference
	/// cycles.
	pub fn resolve(&self, registry: &FixtureRegistry) -> FixtureResult<Vec<ResolvedFixture>> {
		let mut fixtures = Vec::new();
		for config in registry.iter().filter(|c| !c.template) {
			let merged = self.merge_extends(config, registry)?;
			let fields: IndexMap<String, FieldValue> = merged
				.iter()
				.map(|(key, value)| (key.clone(), FieldValue::parse(value)))
				.collect();

			let dependencies = self.dependencies(config, &fields, registry)?;

			fixtures.push(ResolvedFixture {
				name: config.name.clone(),
				entity: config.entity.clone(),
				fields,
				dependencies,
			});
		}

		let ordered = self.sort(fixtures)?;
		debug!(count = ordered.len(), "resolved fixtures");
		Ok(ordered)
	}

	/// Validates the references of one fixture and lists their targets.
	fn dependencies(
		&self,
		config: &FixtureConfig,
		fields: &IndexMap<String, FieldValue>,
		registry: &FixtureRegistry,
	) -> FixtureResult<Vec<String>> {
		let mut refs = Vec::new();
		for value in fields.values() {
			value.collect_references(&mut refs);
		}
		let mut seen = HashSet::new();
		let mut dependencies = Vec::new();
		for name in refs {
			match registry.get(name) {
				None => {
					return Err(FixtureError::Resolution(format!(
						"fixture '{}' references unknown fixture '{}'",
						config.name, name
					)));
				}
				Some(target) if target.template => {
					return Err(FixtureError::Resolution(format!(
						"fixture '{}' references template '{}'",
						config.name, name
					)));
				}
				Some(_) => {
					if seen.insert(name) {
						dependencies.push(name.to_string());
					}
				}
			}
		}
		Ok(dependencies)
	}

	/// Merges the `extends` chain of `config`, parents first.
	fn merge_extends(
		&self,
		config: &FixtureConfig,
		registry: &FixtureRegistry,
	) -> FixtureResult<IndexMap<String, Value>> {
		let mut chain = vec![config];
		let mut visited = HashSet::from([config.name.as_str()]);
		let mut current = config;

		while let Some(parent_name) = current.extends.as_deref() {
			let parent = registry.get(parent_name).ok_or_else(|| {
				FixtureError::Resolution(format!(
					"fixture '{}' extends unknown fixture '{}'",
					current.name, parent_name
				))
			})?;
			if !visited.insert(parent.name.as_str()) {
				return Err(FixtureError::Resolution(format!(
					"circular extends chain starting at '{}'",
					config.name
				)));
			}
			chain.push(parent);
			current = parent;
		}

		let mut fields = IndexMap::new();
		for link in chain.into_iter().rev() {
			for (key, value) in &link.fields {
				fields.insert(key.clone(), value.clone());
			}
		}
		Ok(fields)
	}

	/// Kahn's algorithm; ties are broken by registration order.
	fn sort(&self, fixtures: Vec<ResolvedFixture>) -> FixtureResult<Vec<ResolvedFixture>> {
		let index: HashMap<&str, usize> = fixtures
			.iter()
			.enumerate()
			.map(|(i, f)| (f.name.as_str(), i))
			.collect();

		let mut in_degree = vec![0usize; fixtures.len()];
		let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); fixtures.len()];
		for (i, fixture) in fixtures.iter().enumerate() {
			for dependency in &fixture.dependencies {
				let Some(&j) = index.get(dependency.as_str()) else {
					continue;
				};
				in_degree[i] += 1;
				dependents[j].push(i);
			}
		}

		let mut ready: BTreeSet<usize> = in_degree
			.iter()
			.enumerate()
			.filter(|(_, degree)| **degree == 0)
			.map(|(i, _)| i)
			.collect();
		let mut order = Vec::with_capacity(fixtures.len());

		while let Some(i) = ready.pop_first() {
			order.push(i);
			for &dependent in &dependents[i] {
				in_degree[dependent] -= 1;
				if in_degree[dependent] == 0 {
					ready.insert(dependent);
				}
			}
		}

		if order.len() != fixtures.len() {
			let stuck: Vec<&str> = in_degree
				.iter()
				.enumerate()
				.filter(|(_, degree)| **degree > 0)
				.map(|(i, _)| fixtures[i].name.as_str())
				.collect();
			return Err(FixtureError::Resolution(format!(
				"circular references between fixtures: {}",
				stuck.join(", ")
			)));
		}

		let mut slots: Vec<Option<ResolvedFixture>> = fixtures.into_iter().map(Some).collect();
		Ok(order
			.into_iter()
			.filter_map(|i| slots[i].take())
			.collect())
	}
}

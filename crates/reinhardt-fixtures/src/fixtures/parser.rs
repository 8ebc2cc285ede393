//! Fixture parsing functionality.
//!
//! Turns fixture files (YAML or JSON) into flat [`FixtureConfig`] records:
//! item keys are decoded (`(template)`, `(extends parent)`, `{1..3}`,
//! `{a,b}`) and `{@current}` / `<{param}>` placeholders are substituted.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use super::{FixtureConfig, FixtureFile, FixtureFormat};
use crate::error::{FixtureError, FixtureResult};

const CURRENT_PLACEHOLDER: &str = "{@current}";

/// Largest number of items one `{a..b}` range may expand into.
const MAX_RANGE_ITEMS: i64 = 10_000;

/// Value bound to `{@current}` while expanding a range or list item.
#[derive(Debug, Clone, PartialEq)]
enum Current {
	Int(i64),
	Text(String),
}

impl Current {
	fn to_json(&self) -> Value {
		match self {
			Self::Int(i) => Value::from(*i),
			Self::Text(s) => Value::String(s.clone()),
		}
	}
}

impl std::fmt::Display for Current {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Int(i) => write!(f, "{}", i),
			Self::Text(s) => f.write_str(s),
		}
	}
}

/// Decoded item key.
#[derive(Debug, Clone, PartialEq)]
struct ItemKey {
	pattern: String,
	template: bool,
	extends: Option<String>,
}

/// Parser for fixture files.
///
/// Supports both JSON and YAML formats (YAML requires the `yaml` feature).
#[derive(Debug, Default)]
pub struct FixtureParser;

impl FixtureParser {
	/// Creates a new fixture parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a fixture file from the given path.
	///
	/// The format is detected from the file extension.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read, the extension is not
	/// recognized, or the content is not a valid fixture file.
	pub fn parse_file(&self, path: &Path) -> FixtureResult<Vec<FixtureConfig>> {
		let format = FixtureFormat::from_path(path).ok_or_else(|| {
			FixtureError::DefinitionParse(format!(
				"{}: unsupported file extension",
				path.display()
			))
		})?;

		let content = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				FixtureError::Filesystem(format!("{}: file not found", path.display()))
			} else {
				FixtureError::Io(e)
			}
		})?;

		let configs = self
			.parse_string(&content, format)
			.map_err(|e| match e {
				FixtureError::DefinitionParse(msg) => {
					FixtureError::DefinitionParse(format!("{}: {}", path.display(), msg))
				}
				other => FixtureError::DefinitionParse(format!("{}: {}", path.display(), other)),
			})?;

		Ok(configs
			.into_iter()
			.map(|config| config.with_source(path))
			.collect())
	}

	/// Parses fixture definitions from a string.
	pub fn parse_string(
		&self,
		content: &str,
		format: FixtureFormat,
	) -> FixtureResult<Vec<FixtureConfig>> {
		let file = match format {
			FixtureFormat::Json => serde_json::from_str::<FixtureFile>(content)?,
			FixtureFormat::Yaml => self.parse_yaml(content)?,
		};

		self.expand_file(file)
	}

	#[cfg(feature = "yaml")]
	fn parse_yaml(&self, content: &str) -> FixtureResult<FixtureFile> {
		Ok(serde_yaml::from_str(content)?)
	}

	/// Stub for YAML parsing when the feature is not enabled.
	#[cfg(not(feature = "yaml"))]
	fn parse_yaml(&self, _content: &str) -> FixtureResult<FixtureFile> {
		Err(FixtureError::DefinitionParse(
			"YAML support requires the 'yaml' feature".to_string(),
		))
	}

	/// Expands every item of a file into one or more definitions.
	fn expand_file(&self, file: FixtureFile) -> FixtureResult<Vec<FixtureConfig>> {
		if file.entity.trim().is_empty() {
			return Err(FixtureError::DefinitionParse(
				"'entity' must not be empty".to_string(),
			));
		}

		let mut configs = Vec::with_capacity(file.items.len());
		for (key, body) in &file.items {
			let item_key = parse_item_key(key)?;
			let fields = match body {
				Value::Object(map) => map.clone(),
				Value::Null => serde_json::Map::new(),
				_ => {
					return Err(FixtureError::DefinitionParse(format!(
						"item '{}' must be a mapping of fields",
						key
					)));
				}
			};

			for (name, current) in expand_pattern(&item_key.pattern)? {
				let mut resolved = IndexMap::with_capacity(fields.len());
				for (field, value) in &fields {
					let value = interpolate(value, current.as_ref(), &file.parameters)
						.map_err(|msg| {
							FixtureError::DefinitionParse(format!(
								"item '{}', field '{}': {}",
								name, field, msg
							))
						})?;
					resolved.insert(field.clone(), value);
				}

				let mut config = FixtureConfig::new(name, file.entity.trim(), resolved);
				config.template = item_key.template;
				config.extends = item_key.extends.clone();
				configs.push(config);
			}
		}

		Ok(configs)
	}
}

/// Splits `name (template)` / `name (extends parent)` into its parts.
fn parse_item_key(key: &str) -> FixtureResult<ItemKey> {
	let key = key.trim();
	let invalid = |reason: &str| {
		FixtureError::DefinitionParse(format!("invalid item key '{}': {}", key, reason))
	};

	let Some(open) = key.rfind(" (") else {
		if key.is_empty() {
			return Err(invalid("empty name"));
		}
		if key.contains('(') || key.contains(')') {
			return Err(invalid("unexpected parenthesis"));
		}
		return Ok(ItemKey {
			pattern: key.to_string(),
			template: false,
			extends: None,
		});
	};

	let modifier = key[open + 2..]
		.strip_suffix(')')
		.ok_or_else(|| invalid("unterminated modifier"))?
		.trim();
	let pattern = key[..open].trim();
	if pattern.is_empty() {
		return Err(invalid("empty name"));
	}

	if modifier == "template" {
		return Ok(ItemKey {
			pattern: pattern.to_string(),
			template: true,
			extends: None,
		});
	}

	match modifier.strip_prefix("extends ") {
		Some(parent) if !parent.trim().is_empty() => Ok(ItemKey {
			pattern: pattern.to_string(),
			template: false,
			extends: Some(parent.trim().to_string()),
		}),
		_ => Err(invalid("expected '(template)' or '(extends <name>)'")),
	}
}

/// Expands `user{1..3}` / `user{a,b}` into concrete names.
fn expand_pattern(pattern: &str) -> FixtureResult<Vec<(String, Option<Current>)>> {
	let invalid = |reason: &str| {
		FixtureError::DefinitionParse(format!("invalid item name '{}': {}", pattern, reason))
	};

	let Some(open) = pattern.find('{') else {
		if pattern.contains('}') {
			return Err(invalid("unbalanced '}'"));
		}
		return Ok(vec![(pattern.to_string(), None)]);
	};
	let close = pattern[open..]
		.find('}')
		.map(|offset| open + offset)
		.ok_or_else(|| invalid("unbalanced '{'"))?;

	let prefix = &pattern[..open];
	let inner = &pattern[open + 1..close];
	let suffix = &pattern[close + 1..];
	if suffix.contains('{') || suffix.contains('}') {
		return Err(invalid("only one range is allowed"));
	}

	let values: Vec<Current> = if let Some((start, end)) = inner.split_once("..") {
		let start: i64 = start
			.trim()
			.parse()
			.map_err(|_| invalid("range bounds must be integers"))?;
		let end: i64 = end
			.trim()
			.parse()
			.map_err(|_| invalid("range bounds must be integers"))?;
		if start > end {
			return Err(invalid("range start is greater than its end"));
		}
		if end
			.checked_sub(start)
			.is_none_or(|span| span >= MAX_RANGE_ITEMS)
		{
			return Err(invalid(&format!(
				"range expands to more than {} items",
				MAX_RANGE_ITEMS
			)));
		}
		(start..=end).map(Current::Int).collect()
	} else if inner.contains(',') {
		let items: Vec<&str> = inner.split(',').map(str::trim).collect();
		if items.iter().any(|item| item.is_empty()) {
			return Err(invalid("empty list element"));
		}
		items
			.into_iter()
			.map(|item| Current::Text(item.to_string()))
			.collect()
	} else {
		return Err(invalid("expected '{a..b}' or '{x,y}'"));
	};

	Ok(values
		.into_iter()
		.map(|current| (format!("{}{}{}", prefix, current, suffix), Some(current)))
		.collect())
}

/// Substitutes `{@current}` and `<{param}>` placeholders.
fn interpolate(
	value: &Value,
	current: Option<&Current>,
	parameters: &IndexMap<String, Value>,
) -> Result<Value, String> {
	match value {
		Value::String(s) => interpolate_str(s, current, parameters),
		Value::Array(items) => items
			.iter()
			.map(|item| interpolate(item, current, parameters))
			.collect::<Result<Vec<_>, _>>()
			.map(Value::Array),
		Value::Object(map) => {
			let mut out = serde_json::Map::with_capacity(map.len());
			for (key, item) in map {
				out.insert(key.clone(), interpolate(item, current, parameters)?);
			}
			Ok(Value::Object(out))
		}
		other => Ok(other.clone()),
	}
}

fn interpolate_str(
	s: &str,
	current: Option<&Current>,
	parameters: &IndexMap<String, Value>,
) -> Result<Value, String> {
	if s == CURRENT_PLACEHOLDER {
		return current
			.map(Current::to_json)
			.ok_or_else(|| "'{@current}' used outside a range item".to_string());
	}

	if let Some(key) = whole_parameter(s) {
		return parameters
			.get(key)
			.cloned()
			.ok_or_else(|| format!("unknown parameter '{}'", key));
	}

	let mut text = s.to_string();
	if text.contains(CURRENT_PLACEHOLDER) {
		let current =
			current.ok_or_else(|| "'{@current}' used outside a range item".to_string())?;
		text = text.replace(CURRENT_PLACEHOLDER, &current.to_string());
	}

	let mut out = String::with_capacity(text.len());
	let mut rest = text.as_str();
	while let Some(start) = rest.find("<{") {
		let Some(len) = rest[start + 2..].find("}>") else {
			break;
		};
		let key = &rest[start + 2..start + 2 + len];
		let param = parameters
			.get(key)
			.ok_or_else(|| format!("unknown parameter '{}'", key))?;
		out.push_str(&rest[..start]);
		match param {
			Value::String(p) => out.push_str(p),
			other => out.push_str(&other.to_string()),
		}
		rest = &rest[start + 2 + len + 2..];
	}
	out.push_str(rest);

	Ok(Value::String(out))
}

/// Returns the key when `s` is exactly one `<{key}>` placeholder.
fn whole_parameter(s: &str) -> Option<&str> {
	let key = s.strip_prefix("<{")?.strip_suffix("}>")?;
	if key.contains("<{") || key.contains("}>") {
		return None;
	}
	Some(key)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[rstest]
	fn test_parse_json_items() {
		let parser = FixtureParser::new();
		let content = r#"{
			"entity": "User",
			"items": {
				"user1": {"id": 1, "name": "alice"},
				"user2": {"id": 2, "name": "bob"}
			}
		}"#;

		let configs = parser.parse_string(content, FixtureFormat::Json).unwrap();
		assert_eq!(configs.len(), 2);
		assert_eq!(configs[0].name, "user1");
		assert_eq!(configs[0].entity, "User");
		assert_eq!(configs[0].fields["name"], json!("alice"));
		assert_eq!(configs[1].name, "user2");
	}

	#[cfg(feature = "yaml")]
	#[rstest]
	fn test_parse_yaml_template_and_extends() {
		let parser = FixtureParser::new();
		let content = r#"
entity: User
items:
  base (template):
    active: true
  user1 (extends base):
    id: 1
"#;

		let configs = parser.parse_string(content, FixtureFormat::Yaml).unwrap();
		assert_eq!(configs.len(), 2);
		assert!(configs[0].template);
		assert_eq!(configs[0].name, "base");
		assert_eq!(configs[1].extends.as_deref(), Some("base"));
		assert!(!configs[1].template);
	}

	#[cfg(feature = "yaml")]
	#[rstest]
	fn test_parse_yaml_range_with_current() {
		let parser = FixtureParser::new();
		let content = r#"
entity: User
items:
  user{1..3}:
    id: "{@current}"
    name: "user {@current}"
"#;

		let configs = parser.parse_string(content, FixtureFormat::Yaml).unwrap();
		let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, vec!["user1", "user2", "user3"]);
		assert_eq!(configs[2].fields["id"], json!(3));
		assert_eq!(configs[2].fields["name"], json!("user 3"));
	}

	#[rstest]
	fn test_parse_list_expansion() {
		let parser = FixtureParser::new();
		let content = r#"{
			"entity": "Tag",
			"items": {"tag_{red, blue}": {"label": "{@current}"}}
		}"#;

		let configs = parser.parse_string(content, FixtureFormat::Json).unwrap();
		assert_eq!(configs.len(), 2);
		assert_eq!(configs[0].name, "tag_red");
		assert_eq!(configs[1].fields["label"], json!("blue"));
	}

	#[rstest]
	fn test_parameters_keep_type_when_whole_value() {
		let parser = FixtureParser::new();
		let content = r#"{
			"entity": "User",
			"parameters": {"limit": 5, "domain": "example.com"},
			"items": {"user1": {"quota": "<{limit}>", "email": "a@<{domain}>", "note": "max <{limit}>"}}
		}"#;

		let configs = parser.parse_string(content, FixtureFormat::Json).unwrap();
		let fields = &configs[0].fields;
		assert_eq!(fields["quota"], json!(5));
		assert_eq!(fields["email"], json!("a@example.com"));
		assert_eq!(fields["note"], json!("max 5"));
	}

	#[rstest]
	fn test_unknown_parameter_is_rejected() {
		let parser = FixtureParser::new();
		let content = r#"{"entity": "User", "items": {"user1": {"email": "<{missing}>"}}}"#;

		let result = parser.parse_string(content, FixtureFormat::Json);
		assert!(matches!(result, Err(FixtureError::DefinitionParse(_))));
	}

	#[rstest]
	fn test_current_outside_range_is_rejected() {
		let parser = FixtureParser::new();
		let content = r#"{"entity": "User", "items": {"user1": {"id": "{@current}"}}}"#;

		let result = parser.parse_string(content, FixtureFormat::Json);
		assert!(matches!(result, Err(FixtureError::DefinitionParse(_))));
	}

	#[rstest]
	#[case("user (extends )")]
	#[case("user (parent)")]
	#[case(" (template)")]
	#[case("user{3..1}")]
	#[case("user{1..2}{3..4}")]
	#[case("user{x}")]
	#[case("user{1..2")]
	#[case("user{1..10000000000}")]
	#[case("user{-9223372036854775808..9223372036854775807}")]
	fn test_invalid_item_keys(#[case] key: &str) {
		let result = parse_item_key(key).and_then(|k| expand_pattern(&k.pattern));
		assert!(
			matches!(result, Err(FixtureError::DefinitionParse(_))),
			"key {:?} should be rejected",
			key
		);
	}

	#[rstest]
	fn test_range_size_limit() {
		let largest = format!("user{{1..{}}}", MAX_RANGE_ITEMS);
		assert_eq!(expand_pattern(&largest).unwrap().len(), MAX_RANGE_ITEMS as usize);

		let too_large = format!("user{{0..{}}}", MAX_RANGE_ITEMS);
		let result = expand_pattern(&too_large);
		assert!(matches!(result, Err(FixtureError::DefinitionParse(msg)) if msg.contains("more than")));
	}

	#[rstest]
	fn test_empty_entity_is_rejected() {
		let parser = FixtureParser::new();
		let content = r#"{"entity": " ", "items": {}}"#;

		let result = parser.parse_string(content, FixtureFormat::Json);
		assert!(matches!(result, Err(FixtureError::DefinitionParse(_))));
	}

	#[rstest]
	fn test_non_mapping_item_is_rejected() {
		let parser = FixtureParser::new();
		let content = r#"{"entity": "User", "items": {"user1": [1, 2]}}"#;

		let result = parser.parse_string(content, FixtureFormat::Json);
		assert!(matches!(result, Err(FixtureError::DefinitionParse(_))));
	}

	#[rstest]
	fn test_parse_file_sets_source() {
		let parser = FixtureParser::new();
		let mut file = NamedTempFile::with_suffix(".json").unwrap();
		writeln!(
			file,
			r#"{{"entity": "User", "items": {{"user1": {{"id": 1}}}}}}"#
		)
		.unwrap();

		let configs = parser.parse_file(file.path()).unwrap();
		assert_eq!(configs.len(), 1);
		assert_eq!(configs[0].source.as_deref(), Some(file.path()));
	}

	#[rstest]
	fn test_parse_file_not_found() {
		let parser = FixtureParser::new();
		let result = parser.parse_file(Path::new("/nonexistent/users.json"));
		assert!(matches!(result, Err(FixtureError::Filesystem(_))));
	}

	#[rstest]
	fn test_parse_unsupported_extension() {
		let parser = FixtureParser::new();
		let result = parser.parse_file(Path::new("users.xml"));
		assert!(matches!(result, Err(FixtureError::DefinitionParse(_))));
	}

	#[rstest]
	fn test_malformed_json_is_definition_error() {
		let parser = FixtureParser::new();
		let mut file = NamedTempFile::with_suffix(".json").unwrap();
		writeln!(file, "{{not json").unwrap();

		let result = parser.parse_file(file.path());
		assert!(matches!(result, Err(FixtureError::DefinitionParse(_))));
	}
}

//! SQL generation shared by the backends.
//!
//! A batch is sent as one JSON array parameter and expanded server-side, so
//! each batch is a single statement regardless of its size.

use std::fmt;

use reinhardt_fixtures::{Entity, FixtureError, FixtureResult};
use serde_json::{Map, Value};

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
	/// PostgreSQL.
	Postgres,
	/// SQLite.
	Sqlite,
}

impl Dialect {
	/// Detects the dialect from a connection URL scheme.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::Configuration`] for unsupported schemes.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_fixtures_db::Dialect;
	/// assert_eq!(Dialect::from_url("postgresql://localhost/app").unwrap(), Dialect::Postgres);
	/// assert_eq!(Dialect::from_url("sqlite::memory:").unwrap(), Dialect::Sqlite);
	/// assert!(Dialect::from_url("mysql://localhost/app").is_err());
	/// ```
	pub fn from_url(url: &str) -> FixtureResult<Self> {
		if url.starts_with("postgres://") || url.starts_with("postgresql://") {
			Ok(Self::Postgres)
		} else if url.starts_with("sqlite:") {
			Ok(Self::Sqlite)
		} else {
			let scheme = url.split(':').next().unwrap_or(url);
			Err(FixtureError::Configuration(format!(
				"unsupported database URL scheme '{}'",
				scheme
			)))
		}
	}

	/// Statement removing every row of `table`.
	pub fn truncate_sql(&self, table: &str) -> String {
		match self {
			Self::Postgres => format!("TRUNCATE TABLE {} CASCADE", quote_ident(table)),
			Self::Sqlite => format!("DELETE FROM {}", quote_ident(table)),
		}
	}

	/// Statement inserting a JSON array of rows bound as the only parameter.
	///
	/// `columns` must not be empty; see [`Dialect::insert_default_sql`].
	pub fn insert_batch_sql(&self, table: &str, columns: &[String]) -> String {
		let table = quote_ident(table);
		let column_list = columns
			.iter()
			.map(|c| quote_ident(c))
			.collect::<Vec<_>>()
			.join(", ");

		match self {
			Self::Postgres => format!(
				"INSERT INTO {table} ({column_list}) SELECT {column_list} FROM jsonb_populate_recordset(NULL::{table}, $1)"
			),
			Self::Sqlite => {
				let extracts = columns
					.iter()
					.map(|c| format!("json_extract(value, '{}')", json_path(c)))
					.collect::<Vec<_>>()
					.join(", ");
				format!("INSERT INTO {table} ({column_list}) SELECT {extracts} FROM json_each(?)")
			}
		}
	}

	/// Statement inserting one row of column defaults.
	pub fn insert_default_sql(&self, table: &str) -> String {
		format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
	}

	/// Query listing the tables whose foreign keys reference the table bound
	/// as the only parameter.
	///
	/// `None` when [`Dialect::truncate_sql`] already clears dependent tables.
	pub fn dependent_tables_sql(&self) -> Option<&'static str> {
		match self {
			Self::Postgres => None,
			Self::Sqlite => Some(
				"SELECT DISTINCT m.name FROM sqlite_master m \
				 JOIN pragma_foreign_key_list(m.name) p \
				 WHERE m.type = 'table' AND p.\"table\" = ? COLLATE NOCASE",
			),
		}
	}

	/// Query returning whether the table bound as the only parameter exists.
	pub fn table_exists_sql(&self) -> &'static str {
		match self {
			Self::Postgres => "SELECT to_regclass($1) IS NOT NULL",
			Self::Sqlite => {
				"SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)"
			}
		}
	}
}

impl fmt::Display for Dialect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Postgres => f.write_str("postgres"),
			Self::Sqlite => f.write_str("sqlite"),
		}
	}
}

/// Double-quotes each dot-separated segment of an identifier.
///
/// ```
/// # use reinhardt_fixtures_db::quote_ident;
/// assert_eq!(quote_ident("shop.orders"), r#""shop"."orders""#);
/// assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
/// ```
pub fn quote_ident(name: &str) -> String {
	name.split('.')
		.map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
		.collect::<Vec<_>>()
		.join(".")
}

/// SQLite JSON path selecting one object key, escaped for a string literal.
fn json_path(column: &str) -> String {
	format!("$.\"{}\"", column.replace('"', "\\\"")).replace('\'', "''")
}

/// Union of the field names of a batch in first-seen order.
pub fn batch_columns(entities: &[Entity]) -> Vec<String> {
	let mut columns: Vec<String> = Vec::new();
	for entity in entities {
		for key in entity.fields.keys() {
			if !columns.contains(key) {
				columns.push(key.clone());
			}
		}
	}
	columns
}

/// JSON array of row objects; a field missing from an entity becomes null.
pub fn batch_payload(entities: &[Entity], columns: &[String]) -> Value {
	Value::Array(
		entities
			.iter()
			.map(|entity| {
				let row: Map<String, Value> = columns
					.iter()
					.map(|c| (c.clone(), entity.get(c).cloned().unwrap_or(Value::Null)))
					.collect();
				Value::Object(row)
			})
			.collect(),
	)
}

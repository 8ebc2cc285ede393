//! Error types for the fixture loading pipeline.
//!
//! Errors raised before a transaction is opened (filesystem, parsing,
//! resolution, schema lookups) abort the run directly. Errors raised after
//! it is opened roll the transaction back before they reach the caller.

use thiserror::Error;

/// Errors that can occur while loading fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
	/// The fixtures path is missing or is not a directory.
	#[error("Filesystem error: {0}")]
	Filesystem(String),

	/// A fixture definition file is malformed.
	#[error("Definition parse error: {0}")]
	DefinitionParse(String),

	/// References or `extends` chains cannot be satisfied.
	#[error("Resolution error: {0}")]
	Resolution(String),

	/// An entity type has no schema metadata.
	#[error("Unknown entity type: {0}")]
	UnknownEntityType(String),

	/// The storage transaction could not be opened.
	#[error("Connection error: {0}")]
	Connection(String),

	/// A truncate or batch insert failed.
	#[error("Persist error on table {table}: {message}")]
	Persist {
		/// Table the failing statement targeted.
		table: String,
		/// Driver error message.
		message: String,
	},

	/// The final commit failed.
	#[error("Commit error: {0}")]
	Commit(String),

	/// An option or argument is invalid.
	#[error("Validation error: {field}: {message}")]
	Validation {
		/// Field that failed validation.
		field: String,
		/// Validation error message.
		message: String,
	},

	/// Settings could not be loaded.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// YAML deserialization error (when yaml feature is enabled).
	#[cfg(feature = "yaml")]
	#[error("YAML error: {0}")]
	Yaml(#[from] serde_yaml::Error),

	/// TOML settings error.
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),
}

impl FixtureError {
	/// Builds a [`FixtureError::Persist`] for the given table.
	pub fn persist(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
		Self::Persist {
			table: table.into(),
			message: message.to_string(),
		}
	}

	/// Returns true if the error was raised by the storage layer.
	pub fn is_storage_error(&self) -> bool {
		matches!(
			self,
			Self::Connection(_) | Self::Persist { .. } | Self::Commit(_)
		)
	}
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_unknown_entity_type_error() {
		let error = FixtureError::UnknownEntityType("Invoice".to_string());
		assert_eq!(error.to_string(), "Unknown entity type: Invoice");
	}

	#[rstest]
	fn test_persist_error_names_table() {
		let error = FixtureError::persist("orders", "no such column: bogus");
		assert_eq!(
			error.to_string(),
			"Persist error on table orders: no such column: bogus"
		);
		assert!(error.is_storage_error());
	}

	#[rstest]
	fn test_validation_error() {
		let error = FixtureError::Validation {
			field: "batch_size".to_string(),
			message: "must be greater than zero".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Validation error: batch_size: must be greater than zero"
		);
		assert!(!error.is_storage_error());
	}

	#[rstest]
	fn test_io_error_from() {
		let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
		let error: FixtureError = io_error.into();
		assert!(matches!(error, FixtureError::Io(_)));
	}

	#[rstest]
	fn test_json_error_from() {
		let json_error =
			serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
		let error: FixtureError = json_error.into();
		assert!(matches!(error, FixtureError::Json(_)));
	}
}

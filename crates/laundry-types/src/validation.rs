//! Configuration validation utilities.
//!
//! A small framework for validating the TOML blocks handed to pluggable
//! implementations (store backends, notifier channels). Each implementation
//! exposes a [`ConfigSchema`] that is checked before the implementation is
//! constructed, so malformed deployments fail at startup with a field-level
//! error instead of at first use.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug, Clone)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer value with optional inclusive bounds.
	Integer {
		min: Option<i64>,
		max: Option<i64>,
	},
	/// A boolean value.
	Boolean,
}

/// A named field within a schema.
#[derive(Debug, Clone)]
pub struct Field {
	name: String,
	field_type: FieldType,
	required: bool,
}

impl Field {
	/// A field that must be present.
	pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			required: true,
		}
	}

	/// A field that may be absent.
	pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			required: false,
		}
	}
}

/// A flat validation schema over a TOML table.
#[derive(Debug, Clone)]
pub struct Schema {
	fields: Vec<Field>,
}

impl Schema {
	pub fn new(fields: Vec<Field>) -> Self {
		Self { fields }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.fields {
			match table.get(&field.name) {
				Some(value) => check_type(&field.name, value, &field.field_type)?,
				None if field.required => {
					return Err(ValidationError::MissingField(field.name.clone()));
				}
				None => {}
			}
		}

		Ok(())
	}
}

fn check_type(name: &str, value: &toml::Value, expected: &FieldType) -> Result<(), ValidationError> {
	let mismatch = |expected: &str| ValidationError::TypeMismatch {
		field: name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch("string"));
			}
		}
		FieldType::Integer { min, max } => {
			let n = value.as_integer().ok_or_else(|| mismatch("integer"))?;
			if let Some(min) = min {
				if n < *min {
					return Err(ValidationError::InvalidValue {
						field: name.to_string(),
						message: format!("Value {} is less than minimum {}", n, min),
					});
				}
			}
			if let Some(max) = max {
				if n > *max {
					return Err(ValidationError::InvalidValue {
						field: name.to_string(),
						message: format!("Value {} is greater than maximum {}", n, max),
					});
				}
			}
		}
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch("boolean"));
			}
		}
	}

	Ok(())
}

/// Trait implemented by every pluggable implementation's config schema.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(vec![
			Field::required("endpoint", FieldType::String),
			Field::optional(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			),
		])
	}

	#[test]
	fn accepts_valid_table() {
		let value: toml::Value = toml::from_str("endpoint = \"http://mail\"\ntimeout_seconds = 5").unwrap();
		assert!(schema().validate(&value).is_ok());
	}

	#[test]
	fn rejects_missing_required_field() {
		let value: toml::Value = toml::from_str("timeout_seconds = 5").unwrap();
		let err = schema().validate(&value).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "endpoint"));
	}

	#[test]
	fn rejects_out_of_range_integer() {
		let value: toml::Value =
			toml::from_str("endpoint = \"http://mail\"\ntimeout_seconds = 0").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::InvalidValue { .. })
		));
	}

	#[test]
	fn rejects_wrong_type() {
		let value: toml::Value = toml::from_str("endpoint = 7").unwrap();
		assert!(matches!(
			schema().validate(&value),
			Err(ValidationError::TypeMismatch { .. })
		));
	}
}

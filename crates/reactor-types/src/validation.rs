//! Configuration validation for reactor components.
//!
//! Components that are built from TOML tables (fee controllers, fee models,
//! storage backends) describe their expected shape with a [`Schema`] and
//! validate raw values before any typed deserialization happens, so that
//! operators get field-level error messages.

use alloy::primitives::{Address, U256};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Boolean,
	Integer { min: Option<i64>, max: Option<i64> },
	/// 20-byte hex address with `0x` prefix.
	Address,
	/// Basis points, bounded by `max` (inclusive).
	Bps { max: u64 },
	/// Unsigned 256-bit integer given as a decimal or `0x` string.
	Uint,
	/// One of a fixed set of strings.
	OneOf(&'static [&'static str]),
	Array(Box<FieldType>),
	/// Table whose keys are addresses and whose values have the given type.
	AddressMap(Box<FieldType>),
	Table(Schema),
}

/// Extra check applied to a field once its type is known to be right.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field of a [`Schema`].
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Field({}: {:?}{})",
			self.name,
			self.field_type,
			if self.validator.is_some() { ", custom" } else { "" }
		)
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator run after the type check.
	pub fn with_validator<F>(self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		Self {
			validator: Some(Box::new(validator)),
			..self
		}
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		self.field_type.check(&self.name, value)?;
		match &self.validator {
			Some(validator) => validator(value).map_err(|message| invalid(&self.name, message)),
			None => Ok(()),
		}
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Checks `config` is a table holding every required field, and that each
	/// present field has the declared shape.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = expect(config, "root", "table", toml::Value::as_table)?;

		for field in &self.required {
			match table.get(&field.name) {
				Some(value) => field.check(value)?,
				None => return Err(ValidationError::MissingField(field.name.clone())),
			}
		}
		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}
		Ok(())
	}
}

/// Parses a `0x`-prefixed 20-byte address.
pub fn parse_address(value: &str) -> Result<Address, String> {
	if !value.starts_with("0x") || value.len() != 42 {
		return Err(format!("'{}' is not a 0x-prefixed 20-byte address", value));
	}
	Address::from_str(value).map_err(|e| e.to_string())
}

/// Parses a decimal or `0x` hex string into a 256-bit unsigned integer.
pub fn parse_uint(value: &str) -> Result<U256, String> {
	let parsed = match value.strip_prefix("0x") {
		Some(hex) => U256::from_str_radix(hex, 16),
		None => U256::from_str_radix(value, 10),
	};
	parsed.map_err(|e| format!("'{}' is not a valid uint256: {}", value, e))
}

/// Projects `value` with `project`, or reports it as the wrong TOML type.
fn expect<'a, T>(
	value: &'a toml::Value,
	path: &str,
	wanted: &str,
	project: impl FnOnce(&'a toml::Value) -> Option<T>,
) -> Result<T, ValidationError> {
	project(value).ok_or_else(|| ValidationError::TypeMismatch {
		field: path.to_string(),
		expected: wanted.to_string(),
		actual: value.type_str().to_string(),
	})
}

fn invalid(path: &str, message: String) -> ValidationError {
	ValidationError::InvalidValue {
		field: path.to_string(),
		message,
	}
}

impl FieldType {
	fn check(&self, path: &str, value: &toml::Value) -> Result<(), ValidationError> {
		match self {
			FieldType::String => expect(value, path, "string", toml::Value::as_str).map(drop),
			FieldType::Boolean => expect(value, path, "boolean", toml::Value::as_bool).map(drop),
			FieldType::Integer { min, max } => {
				let n = expect(value, path, "integer", toml::Value::as_integer)?;
				match (min, max) {
					(Some(lo), _) if n < *lo => {
						Err(invalid(path, format!("Value {} is less than minimum {}", n, lo)))
					}
					(_, Some(hi)) if n > *hi => {
						Err(invalid(path, format!("Value {} is greater than maximum {}", n, hi)))
					}
					_ => Ok(()),
				}
			}
			FieldType::Address => {
				let raw = expect(value, path, "address string", toml::Value::as_str)?;
				parse_address(raw).map(drop).map_err(|msg| invalid(path, msg))
			}
			FieldType::Bps { max } => {
				let bps = expect(value, path, "integer", toml::Value::as_integer)?;
				if (0..=*max as i64).contains(&bps) {
					Ok(())
				} else {
					Err(invalid(path, format!("{} bps is outside 0..={}", bps, max)))
				}
			}
			FieldType::Uint => {
				let raw = expect(value, path, "uint256 string", toml::Value::as_str)?;
				parse_uint(raw).map(drop).map_err(|msg| invalid(path, msg))
			}
			FieldType::OneOf(options) => {
				let raw = expect(value, path, "string", toml::Value::as_str)?;
				if options.contains(&raw) {
					Ok(())
				} else {
					Err(invalid(path, format!("'{}' is not one of {:?}", raw, options)))
				}
			}
			FieldType::Array(item_type) => {
				let items = expect(value, path, "array", toml::Value::as_array)?;
				items
					.iter()
					.enumerate()
					.try_for_each(|(i, item)| item_type.check(&format!("{}[{}]", path, i), item))
			}
			FieldType::AddressMap(item_type) => {
				let entries = expect(value, path, "table", toml::Value::as_table)?;
				entries.iter().try_for_each(|(key, item)| {
					let entry_path = format!("{}.{}", path, key);
					parse_address(key).map_err(|msg| invalid(&entry_path, msg))?;
					item_type.check(&entry_path, item)
				})
			}
			FieldType::Table(schema) => schema.validate(value).map_err(|e| e.under(path)),
		}
	}
}

impl ValidationError {
	/// Re-roots the field path of a nested table error under `parent`.
	fn under(self, parent: &str) -> Self {
		let join = |field: String| format!("{}.{}", parent, field);
		match self {
			Self::MissingField(field) => Self::MissingField(join(field)),
			Self::InvalidValue { field, message } => Self::InvalidValue {
				field: join(field),
				message,
			},
			Self::TypeMismatch {
				field,
				expected,
				actual,
			} => Self::TypeMismatch {
				field: join(field),
				expected,
				actual,
			},
			other => other,
		}
	}
}

/// A configurable component that can validate its own TOML table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

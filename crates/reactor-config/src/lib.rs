//! Configuration loading for reactor deployments.
//!
//! Configuration is a TOML file. `${VAR}` references are substituted from
//! the environment before parsing, then a handful of `REACTOR_*` variables
//! override individual fields, and finally every pluggable table is checked
//! against the schema of the component it configures.

use reactor_fees::implementations::bps::BpsFeeControllerSchema;
use reactor_fees::FeeModel;
use reactor_order::math::BPS;
use reactor_storage::StorageSchema;
use reactor_types::{parse_address, ConfigSchema, Address};
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "REACTOR_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<ReactorConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;
		info!(path = %file_path, "Loading reactor configuration");

		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.clone()))
			}
			Err(e) => return Err(e.into()),
		};
		self.load_str(&content)
	}

	/// Substitutes, parses, overrides and validates a TOML document.
	pub fn load_str(&self, content: &str) -> Result<ReactorConfig, ConfigError> {
		let substituted = self.substitute_env_vars(content)?;
		let mut config: ReactorConfig =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;
		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn env_address(&self, name: &str) -> Result<Option<Address>, ConfigError> {
		match env::var(format!("{}{}", self.env_prefix, name)) {
			Ok(raw) => parse_address(&raw)
				.map(Some)
				.map_err(|e| ConfigError::ValidationError(format!("{}{}: {}", self.env_prefix, name, e))),
			Err(_) => Ok(None),
		}
	}

	fn apply_env_overrides(&self, config: &mut ReactorConfig) -> Result<(), ConfigError> {
		if let Some(address) = self.env_address("ADDRESS")? {
			debug!("Overriding reactor address from environment");
			config.reactor.address = address;
		}

		if let Some(owner) = self.env_address("OWNER")? {
			debug!("Overriding reactor owner from environment");
			config.reactor.owner = owner;
		}

		if let Some(recipient) = self.env_address("PROTOCOL_FEE_RECIPIENT")? {
			debug!("Overriding protocol fee recipient from environment");
			config.reactor.protocol_fee_recipient = Some(recipient);
		}

		if let Ok(chain_id) = env::var(format!("{}CHAIN_ID", self.env_prefix)) {
			config.reactor.chain_id = chain_id
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid chain id: {}", e)))?;
		}

		if let Ok(path) = env::var(format!("{}STORAGE_PATH", self.env_prefix)) {
			debug!("Overriding storage path from environment");
			if let Some(table) = config.storage.as_table_mut() {
				table.insert("storage_path".to_string(), toml::Value::String(path));
			}
		}

		Ok(())
	}

	fn validate_config(&self, config: &ReactorConfig) -> Result<(), ConfigError> {
		let invalid = |message: String| ConfigError::ValidationError(message);

		if config.reactor.address == Address::ZERO {
			return Err(invalid("Reactor address must be set".to_string()));
		}
		if config.reactor.owner == Address::ZERO {
			return Err(invalid("Reactor owner must be set".to_string()));
		}
		if config.permit2.address == config.reactor.address {
			return Err(invalid(
				"Permit2 and reactor addresses must differ".to_string(),
			));
		}

		if let FeeModel::EscrowSplit {
			protocol_fee_bps, ..
		} = config.fees.model
		{
			if protocol_fee_bps > BPS {
				return Err(invalid(format!(
					"Protocol fee share of {} bps exceeds {}",
					protocol_fee_bps, BPS
				)));
			}
		}

		if let Some(controller) = &config.fees.controller {
			BpsFeeControllerSchema
				.validate(controller)
				.map_err(|e| invalid(format!("fees.controller: {}", e)))?;
		}

		StorageSchema
			.validate(&config.storage)
			.map_err(|e| invalid(format!("storage: {}", e)))?;

		Ok(())
	}
}

//! Persistence for reactor state.
//!
//! What outlives a settlement call (consumed nonces, escrowed fees and token
//! balances) is stored as JSON documents under namespaced keys through a
//! pluggable key/value backend.

use async_trait::async_trait;
use reactor_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::file::FileStorage;
pub use implementations::memory::MemoryStorage;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Invalid storage configuration: {0}")]
	Config(#[from] ValidationError),
}

/// Low-level key/value interface every storage backend implements.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Typed storage on top of a [`StorageInterface`] backend.
///
/// The namespace and id are combined into a `namespace:id` key and values
/// are serialized to JSON.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Convenience constructor for a service backed by [`MemoryStorage`].
	pub fn in_memory() -> Self {
		Self::new(Box::new(MemoryStorage::new()))
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Like [`retrieve`](Self::retrieve), but a missing key yields `None`.
	pub async fn retrieve_optional<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}
}

/// Configuration schema for the storage backends.
pub struct StorageSchema;

impl ConfigSchema for StorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![],
			// Optional fields
			vec![
				Field::new("backend", FieldType::OneOf(&["file", "memory"])),
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if path.trim().is_empty() => {
							Err("storage_path must not be empty".to_string())
						}
						_ => Ok(()),
					}
				}),
			],
		);

		schema.validate(config)
	}
}

/// Factory function to create a storage backend from configuration.
///
/// Configuration parameters:
/// - `backend`: `"file"` or `"memory"` (default: "memory")
/// - `storage_path`: Base directory for file storage (default: "./data/reactor")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	StorageSchema.validate(config)?;

	let backend = config
		.get("backend")
		.and_then(|v| v.as_str())
		.unwrap_or("memory");
	match backend {
		"file" => {
			let storage_path = config
				.get("storage_path")
				.and_then(|v| v.as_str())
				.unwrap_or("./data/reactor");
			Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
		}
		_ => Ok(Box::new(MemoryStorage::new())),
	}
}

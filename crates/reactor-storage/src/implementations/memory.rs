//! In-memory storage implementation.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory storage implementation. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
	data: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.data
			.get(key)
			.map(|entry| entry.value().clone())
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.data.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.data.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.data.contains_key(key))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_memory_storage() {
		let storage = MemoryStorage::new();
		let shared = storage.clone();

		storage.set_bytes("fees:reactor", vec![1, 2, 3]).await.unwrap();
		assert_eq!(shared.get_bytes("fees:reactor").await.unwrap(), vec![1, 2, 3]);
		assert_eq!(shared.len(), 1);

		shared.delete("fees:reactor").await.unwrap();
		assert!(storage.is_empty());
		assert!(matches!(
			storage.get_bytes("fees:reactor").await,
			Err(StorageError::NotFound)
		));
	}
}

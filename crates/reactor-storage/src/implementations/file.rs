//! File-based storage backend.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use tokio::fs;

/// Stores each key as a JSON document under a base directory.
///
/// Separators in keys (`:`, `/`, `\`) become `_`, so `world:0xab..` lives
/// in `world_0xab...json`.
pub struct FileStorage {
	base_path: PathBuf,
}

fn backend(error: io::Error) -> StorageError {
	StorageError::Backend(error.to_string())
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	fn document_path(&self, key: &str) -> PathBuf {
		let file_name = key.replace(['/', ':', '\\'], "_");
		self.base_path.join(format!("{}.json", file_name))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		fs::read(self.document_path(key)).await.map_err(|e| match e.kind() {
			ErrorKind::NotFound => StorageError::NotFound,
			_ => backend(e),
		})
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let document = self.document_path(key);
		fs::create_dir_all(&self.base_path).await.map_err(backend)?;

		// Readers never observe a partially written document.
		let staging = document.with_extension("tmp");
		fs::write(&staging, value).await.map_err(backend)?;
		fs::rename(&staging, &document).await.map_err(backend)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.document_path(key)).await {
			Err(e) if e.kind() != ErrorKind::NotFound => Err(backend(e)),
			_ => Ok(()),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.document_path(key))
			.await
			.map_err(backend)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_file_storage_lifecycle() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().join("nested"));

		assert!(matches!(
			storage.get_bytes("nonces:reactor").await,
			Err(StorageError::NotFound)
		));

		storage
			.set_bytes("nonces:reactor", b"[1,2]".to_vec())
			.await
			.unwrap();
		assert!(storage.exists("nonces:reactor").await.unwrap());
		assert_eq!(storage.get_bytes("nonces:reactor").await.unwrap(), b"[1,2]");
		assert!(!dir.path().join("nested/nonces_reactor.tmp").exists());

		storage.delete("nonces:reactor").await.unwrap();
		storage.delete("nonces:reactor").await.unwrap();
		assert!(!storage.exists("nonces:reactor").await.unwrap());
	}

	#[tokio::test]
	async fn test_overwrite_replaces_document() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		storage.set_bytes("fees:a", b"1".to_vec()).await.unwrap();
		storage.set_bytes("fees:a", b"2".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("fees:a").await.unwrap(), b"2");
	}
}

use reactor_storage::StorageError;
use reactor_types::ReactorError;
use thiserror::Error;

/// Errors surfaced by [`crate::ReactorService`].
#[derive(Error, Debug)]
pub enum CoreError {
	#[error(transparent)]
	Reactor(#[from] ReactorError),

	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl CoreError {
	/// The settlement error, when the failure came from the reactor itself.
	pub fn reactor_error(&self) -> Option<&ReactorError> {
		match self {
			CoreError::Reactor(error) => Some(error),
			_ => None,
		}
	}
}

//! Error types for backend and registry operations

use thiserror::Error;

/// Result alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Catastrophic backend failures
///
/// Ordinary unavailability and execution failure travel as structured
/// results; these errors cover the cases where the backend could not
/// produce a result at all.
#[derive(Error, Debug)]
pub enum BackendError {
	#[error("Backend timeout: {backend} after {timeout_ms}ms")]
	Timeout { backend: String, timeout_ms: u64 },

	#[error("Backend network error: {backend} - {message}")]
	Network { backend: String, message: String },

	#[error("Backend '{backend}' does not support operation: {operation}")]
	UnsupportedOperation { backend: String, operation: String },

	#[error("Backend execution error: {backend} - {message}")]
	Execution { backend: String, message: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Registry configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
	#[error("Backend already registered: {name} (pass replace to override)")]
	DuplicateBackend { name: String },

	#[error("Unknown backend: {name}")]
	UnknownBackend { name: String },
}

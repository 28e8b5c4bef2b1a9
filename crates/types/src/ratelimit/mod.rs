//! Admission-control types for the per-backend rate limiter

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for rate-limit operations
pub type RateLimitResult<T> = Result<T, RateLimitError>;

/// Options for a blocking token acquisition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AcquireOptions {
	/// Number of tokens to acquire
	pub tokens: u32,

	/// How long to wait for tokens before giving up, in milliseconds
	pub timeout_ms: u64,
}

impl Default for AcquireOptions {
	fn default() -> Self {
		Self {
			tokens: 1,
			timeout_ms: 5_000,
		}
	}
}

impl AcquireOptions {
	pub fn tokens(tokens: u32) -> Self {
		Self {
			tokens,
			..Self::default()
		}
	}

	pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
		self.timeout_ms = timeout_ms;
		self
	}
}

/// Running statistics for one backend's bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitStats {
	/// Backend name
	pub backend: String,

	/// Tokens currently available (post-refill)
	pub available_tokens: f64,

	/// Bucket capacity
	pub max_tokens: u32,

	/// Requests granted since the last reset
	pub allowed: u64,

	/// Requests rejected since the last reset
	pub rejected: u64,

	/// Tokens consumed since the last reset
	pub tokens_consumed: u64,

	/// Callers currently waiting in the queue
	pub queue_depth: usize,
}

/// Typed admission-control failures
///
/// Each variant carries enough context for the caller to decide whether to
/// retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateLimitError {
	#[error(
		"Rate limit exceeded for backend '{backend}': requested {requested}, available {available:.1}"
	)]
	Exceeded {
		backend: String,
		requested: u32,
		available: f64,
		/// Suggested wait before retrying, in milliseconds
		retry_after_ms: Option<u64>,
	},

	#[error("Rate limiter queue full for backend '{backend}' (capacity {capacity})")]
	QueueFull { backend: String, capacity: usize },

	#[error("Timed out acquiring tokens for backend '{backend}' after {waited_ms}ms")]
	AcquireTimeout { backend: String, waited_ms: u64 },

	#[error("Rate limiter has been disposed")]
	Disposed,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_acquire_options_defaults() {
		let opts = AcquireOptions::default();
		assert_eq!(opts.tokens, 1);
		assert_eq!(opts.timeout_ms, 5_000);

		let custom = AcquireOptions::tokens(3).with_timeout_ms(100);
		assert_eq!(custom.tokens, 3);
		assert_eq!(custom.timeout_ms, 100);
	}

	#[test]
	fn test_error_context() {
		let err = RateLimitError::Exceeded {
			backend: "mixnet".to_string(),
			requested: 2,
			available: 0.5,
			retry_after_ms: Some(1500),
		};
		let text = err.to_string();
		assert!(text.contains("mixnet"));
		assert!(text.contains("requested 2"));
	}
}

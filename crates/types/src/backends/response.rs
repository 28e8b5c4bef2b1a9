//! Result models returned across the dispatch boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a per-request availability probe
///
/// Ordinary unavailability is expressed through `available = false` plus a
/// reason; errors are reserved for catastrophic failures of the probe
/// itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityReport {
	/// Whether the backend can take this request right now
	pub available: bool,

	/// Why the backend is unavailable, when it is
	pub reason: Option<String>,

	/// Estimated cost of the operation in display units
	pub estimated_cost: Option<f64>,

	/// Estimated completion time in milliseconds
	pub estimated_time_ms: Option<u64>,
}

impl AvailabilityReport {
	/// An available backend with no estimates
	pub fn available() -> Self {
		Self {
			available: true,
			reason: None,
			estimated_cost: None,
			estimated_time_ms: None,
		}
	}

	/// An unavailable backend with a reason
	pub fn unavailable(reason: impl Into<String>) -> Self {
		Self {
			available: false,
			reason: Some(reason.into()),
			estimated_cost: None,
			estimated_time_ms: None,
		}
	}

	pub fn with_cost(mut self, cost: f64) -> Self {
		self.estimated_cost = Some(cost);
		self
	}

	pub fn with_time_ms(mut self, time_ms: u64) -> Self {
		self.estimated_time_ms = Some(time_ms);
		self
	}
}

/// Routing metadata attached to execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionMetadata {
	/// Name of the originally selected backend when this result came from a
	/// fallback attempt
	pub fallback_from: Option<String>,

	/// Number of backends actually attempted (primary included)
	pub attempts: u32,

	/// Wall-clock time spent across all attempts, in milliseconds
	pub total_time_ms: u64,
}

/// Result of a transfer execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferReceipt {
	/// Whether the transfer completed
	pub success: bool,

	/// Transaction signature or hash, when the backend produced one
	pub signature: Option<String>,

	/// Failure description for unsuccessful transfers
	pub error: Option<String>,

	/// Name of the backend that produced this receipt
	pub backend: String,

	/// When the receipt was produced
	pub completed_at: DateTime<Utc>,

	/// Routing metadata, populated by the router
	pub metadata: ExecutionMetadata,
}

impl TransferReceipt {
	/// A successful receipt with a signature
	pub fn success(backend: impl Into<String>, signature: impl Into<String>) -> Self {
		Self {
			success: true,
			signature: Some(signature.into()),
			error: None,
			backend: backend.into(),
			completed_at: Utc::now(),
			metadata: ExecutionMetadata::default(),
		}
	}

	/// A failed receipt with an error description
	pub fn failure(backend: impl Into<String>, error: impl Into<String>) -> Self {
		Self {
			success: false,
			signature: None,
			error: Some(error.into()),
			backend: backend.into(),
			completed_at: Utc::now(),
			metadata: ExecutionMetadata::default(),
		}
	}
}

/// Result of a confidential computation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComputationReceipt {
	/// Whether the computation completed
	pub success: bool,

	/// Circuit that was evaluated
	pub circuit: String,

	/// Encrypted or public output payload
	pub output: Option<String>,

	/// Attached validity proof, when the backend produces one
	pub proof: Option<String>,

	/// Failure description for unsuccessful computations
	pub error: Option<String>,

	/// Name of the backend that produced this receipt
	pub backend: String,

	/// When the receipt was produced
	pub completed_at: DateTime<Utc>,
}

impl ComputationReceipt {
	pub fn success(
		backend: impl Into<String>,
		circuit: impl Into<String>,
		output: impl Into<String>,
	) -> Self {
		Self {
			success: true,
			circuit: circuit.into(),
			output: Some(output.into()),
			proof: None,
			error: None,
			backend: backend.into(),
			completed_at: Utc::now(),
		}
	}

	pub fn failure(
		backend: impl Into<String>,
		circuit: impl Into<String>,
		error: impl Into<String>,
	) -> Self {
		Self {
			success: false,
			circuit: circuit.into(),
			output: None,
			proof: None,
			error: Some(error.into()),
			backend: backend.into(),
			completed_at: Utc::now(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_availability_report_builders() {
		let ok = AvailabilityReport::available()
			.with_cost(0.002)
			.with_time_ms(1500);
		assert!(ok.available);
		assert_eq!(ok.estimated_cost, Some(0.002));
		assert_eq!(ok.estimated_time_ms, Some(1500));

		let down = AvailabilityReport::unavailable("liquidity exhausted");
		assert!(!down.available);
		assert_eq!(down.reason.as_deref(), Some("liquidity exhausted"));
	}

	#[test]
	fn test_receipt_constructors() {
		let ok = TransferReceipt::success("mixnet", "0xsig");
		assert!(ok.success);
		assert_eq!(ok.signature.as_deref(), Some("0xsig"));
		assert!(ok.error.is_none());
		assert_eq!(ok.metadata.attempts, 0);

		let failed = TransferReceipt::failure("mixnet", "insufficient funds");
		assert!(!failed.success);
		assert!(failed.signature.is_none());
		assert_eq!(failed.error.as_deref(), Some("insufficient funds"));
	}

	#[test]
	fn test_receipt_serialization() {
		let receipt = TransferReceipt::success("pool-a", "0xabc");
		let json = serde_json::to_string(&receipt).unwrap();
		assert!(json.contains("pool-a"));

		let back: TransferReceipt = serde_json::from_str(&json).unwrap();
		assert_eq!(back, receipt);
	}
}

//! Backend capability contract and operation models
//!
//! A backend is any external collaborator able to carry out a private
//! transfer or confidential computation. The dispatch core never constructs
//! backends; callers implement [`TransferBackend`] and register instances
//! with the registry.

pub mod capabilities;
pub mod errors;
pub mod params;
pub mod response;
pub mod traits;

pub use capabilities::{BackendCapabilities, LatencyClass, TokenSupport};
pub use errors::{BackendError, BackendResult, RegistryError};
pub use params::{ComputationParams, OperationParams, PrivacyLevel, TransferParams};
pub use response::{AvailabilityReport, ComputationReceipt, ExecutionMetadata, TransferReceipt};
pub use traits::TransferBackend;

use serde::{Deserialize, Serialize};

/// Chain identifier (e.g. "ethereum", "solana", "near")
pub type ChainId = String;

/// What kinds of operations a backend can service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
	/// Private value transfers only
	Transaction,
	/// Confidential computation only
	Compute,
	/// Both transfers and computation
	Both,
}

impl BackendType {
	/// Whether a backend of this type can service transfers
	pub fn handles_transfers(&self) -> bool {
		matches!(self, BackendType::Transaction | BackendType::Both)
	}

	/// Whether a backend of this type can service computations
	pub fn handles_compute(&self) -> bool {
		matches!(self, BackendType::Compute | BackendType::Both)
	}
}

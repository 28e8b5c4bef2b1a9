//! Core backend trait for user implementations

use async_trait::async_trait;
use std::fmt::Debug;

use super::{
	AvailabilityReport, BackendCapabilities, BackendError, BackendResult, BackendType, ChainId,
	ComputationParams, ComputationReceipt, OperationParams, TransferParams, TransferReceipt,
};

/// Capability contract every execution backend must satisfy
///
/// Implementations wrap a specific third-party execution network. The
/// dispatch core only sees this trait: it registers instances by name,
/// probes availability per request, and dispatches transfers or
/// computations to them.
#[async_trait]
pub trait TransferBackend: Send + Sync + Debug {
	/// Unique backend name, used as the registry key
	fn name(&self) -> &str;

	/// What kinds of operations this backend services
	fn backend_type(&self) -> BackendType;

	/// Chains this backend can settle on
	fn supported_chains(&self) -> Vec<ChainId>;

	/// Version of the backend interface this implementation targets
	///
	/// Default implementation returns `None`; the registry treats that as
	/// version 1 and logs a deprecation warning at registration time.
	fn interface_version(&self) -> Option<u32> {
		None
	}

	/// Static privacy and performance facts
	///
	/// Must be a pure function of backend configuration: identical across
	/// calls for the same backend instance.
	fn capabilities(&self) -> BackendCapabilities;

	/// Per-request availability probe; may call out to the network
	///
	/// Ordinary unavailability must be reported through the result, not an
	/// error.
	async fn check_availability(&self, params: &OperationParams) -> AvailabilityReport;

	/// Execute a private transfer
	async fn execute(&self, params: &TransferParams) -> BackendResult<TransferReceipt>;

	/// Execute a confidential computation
	///
	/// Default implementation returns `UnsupportedOperation`. Override for
	/// compute-capable backends.
	async fn execute_computation(
		&self,
		_params: &ComputationParams,
	) -> BackendResult<ComputationReceipt> {
		Err(BackendError::UnsupportedOperation {
			backend: self.name().to_string(),
			operation: "execute_computation".to_string(),
		})
	}

	/// Estimate the cost of an operation in display units
	async fn estimate_cost(&self, params: &OperationParams) -> BackendResult<f64>;

	/// Whether this backend supports a specific chain
	fn supports_chain(&self, chain: &str) -> bool {
		self.supported_chains().iter().any(|c| c == chain)
	}
}

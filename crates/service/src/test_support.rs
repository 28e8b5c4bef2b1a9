//! Configurable backend stub shared by the service unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sip_types::{
	AvailabilityReport, BackendCapabilities, BackendError, BackendResult, BackendType, ChainId,
	ComputationParams, ComputationReceipt, OperationParams, TransferBackend, TransferParams,
	TransferReceipt,
};

/// What `execute` should do
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ExecutionBehavior {
	/// Return a success receipt
	Succeed,
	/// Return a failure receipt (ordinary operational failure)
	FailReceipt,
	/// Return a backend error (catastrophic failure)
	Error,
}

/// Scriptable backend for exercising the registry and router
pub(crate) struct TestBackend {
	name: String,
	backend_type: BackendType,
	chains: Vec<ChainId>,
	capabilities: BackendCapabilities,
	availability: AvailabilityReport,
	behavior: ExecutionBehavior,
	version: Option<u32>,
	cost: f64,
	calls: Arc<AtomicUsize>,
	execute_hook: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl std::fmt::Debug for TestBackend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TestBackend")
			.field("name", &self.name)
			.field("backend_type", &self.backend_type)
			.field("behavior", &self.behavior)
			.finish()
	}
}

impl TestBackend {
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			backend_type: BackendType::Transaction,
			chains: vec!["solana".to_string()],
			capabilities: BackendCapabilities::transparent(),
			availability: AvailabilityReport::available(),
			behavior: ExecutionBehavior::Succeed,
			version: Some(1),
			cost: 0.001,
			calls: Arc::new(AtomicUsize::new(0)),
			execute_hook: None,
		}
	}

	/// Run a side effect whenever `execute` is called, before the scripted
	/// behavior applies
	pub fn with_execute_hook(mut self, hook: Arc<dyn Fn() + Send + Sync>) -> Self {
		self.execute_hook = Some(hook);
		self
	}

	pub fn with_chains(mut self, chains: Vec<&str>) -> Self {
		self.chains = chains.into_iter().map(String::from).collect();
		self
	}

	pub fn with_type(mut self, backend_type: BackendType) -> Self {
		self.backend_type = backend_type;
		self
	}

	pub fn with_capabilities(mut self, capabilities: BackendCapabilities) -> Self {
		self.capabilities = capabilities;
		self
	}

	pub fn with_compliance(mut self) -> Self {
		self.capabilities.compliance_support = true;
		self
	}

	pub fn with_availability(mut self, availability: AvailabilityReport) -> Self {
		self.availability = availability;
		self
	}

	pub fn with_behavior(mut self, behavior: ExecutionBehavior) -> Self {
		self.behavior = behavior;
		self
	}

	pub fn without_version(mut self) -> Self {
		self.version = None;
		self
	}

	pub fn with_cost(mut self, cost: f64) -> Self {
		self.cost = cost;
		self
	}

	/// Handle for asserting how often this backend was executed
	pub fn call_counter(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.calls)
	}
}

#[async_trait]
impl TransferBackend for TestBackend {
	fn name(&self) -> &str {
		&self.name
	}

	fn backend_type(&self) -> BackendType {
		self.backend_type
	}

	fn supported_chains(&self) -> Vec<ChainId> {
		self.chains.clone()
	}

	fn interface_version(&self) -> Option<u32> {
		self.version
	}

	fn capabilities(&self) -> BackendCapabilities {
		self.capabilities.clone()
	}

	async fn check_availability(&self, _params: &OperationParams) -> AvailabilityReport {
		self.availability.clone()
	}

	async fn execute(&self, _params: &TransferParams) -> BackendResult<TransferReceipt> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(hook) = &self.execute_hook {
			hook();
		}
		match self.behavior {
			ExecutionBehavior::Succeed => Ok(TransferReceipt::success(
				&self.name,
				format!("0xsig-{}", self.name),
			)),
			ExecutionBehavior::FailReceipt => {
				Ok(TransferReceipt::failure(&self.name, "simulated failure"))
			},
			ExecutionBehavior::Error => Err(BackendError::Network {
				backend: self.name.clone(),
				message: "connection reset".to_string(),
			}),
		}
	}

	async fn execute_computation(
		&self,
		params: &ComputationParams,
	) -> BackendResult<ComputationReceipt> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if !self.backend_type.handles_compute() {
			return Err(BackendError::UnsupportedOperation {
				backend: self.name.clone(),
				operation: "execute_computation".to_string(),
			});
		}
		match self.behavior {
			ExecutionBehavior::Succeed => Ok(ComputationReceipt::success(
				&self.name,
				&params.circuit,
				"0xencrypted-output",
			)),
			ExecutionBehavior::FailReceipt => Ok(ComputationReceipt::failure(
				&self.name,
				&params.circuit,
				"simulated failure",
			)),
			ExecutionBehavior::Error => Err(BackendError::Network {
				backend: self.name.clone(),
				message: "connection reset".to_string(),
			}),
		}
	}

	async fn estimate_cost(&self, _params: &OperationParams) -> BackendResult<f64> {
		Ok(self.cost)
	}
}

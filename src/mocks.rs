//! Mock backends for examples and testing
//!
//! This module provides simple, working mock backends that can be used in
//! examples and integration tests without talking to any real execution
//! network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use sip_types::{
	AvailabilityReport, BackendCapabilities, BackendError, BackendResult, BackendType, ChainId,
	ComputationParams, ComputationReceipt, LatencyClass, OperationParams, TokenSupport,
	TransferBackend, TransferParams, TransferReceipt,
};

/// Configurable mock backend
///
/// Provides call tracking, configurable response delays for timeout
/// testing, and failure simulation for circuit breaker testing.
#[derive(Debug, Clone)]
pub struct MockBackend {
	name: String,
	backend_type: BackendType,
	chains: Vec<ChainId>,
	capabilities: BackendCapabilities,
	available: bool,
	unavailable_reason: Option<String>,
	estimated_cost: Option<f64>,
	estimated_time_ms: Option<u64>,
	should_fail: bool,
	raise_errors: bool,
	response_delay_ms: u64,
	calls: Arc<AtomicUsize>,
}

impl MockBackend {
	/// Create a transparent transaction backend on Solana
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			backend_type: BackendType::Transaction,
			chains: vec!["solana".to_string()],
			capabilities: BackendCapabilities::transparent(),
			available: true,
			unavailable_reason: None,
			estimated_cost: Some(0.001),
			estimated_time_ms: Some(1_200),
			should_fail: false,
			raise_errors: false,
			response_delay_ms: 0,
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// A shielded-pool backend: full transfer privacy, large anonymity set,
	/// slower settlement
	pub fn shielded_pool(name: &str) -> Self {
		let mut mock = Self::new(name);
		mock.capabilities = BackendCapabilities {
			hidden_amount: true,
			hidden_sender: true,
			hidden_recipient: true,
			hidden_compute: false,
			compliance_support: false,
			anonymity_set: Some(10_000),
			setup_required: true,
			latency: LatencyClass::Medium,
			token_support: TokenSupport::All,
			min_amount: Some(0.01),
			max_amount: None,
		};
		mock.estimated_time_ms = Some(45_000);
		mock
	}

	/// A stealth-address relay: hides the recipient only, settles fast
	pub fn stealth_relay(name: &str) -> Self {
		let mut mock = Self::new(name);
		mock.capabilities = BackendCapabilities {
			hidden_recipient: true,
			latency: LatencyClass::Fast,
			..BackendCapabilities::transparent()
		};
		mock
	}

	/// A compliant bridge: full privacy plus viewing-key disclosure
	pub fn compliant_bridge(name: &str) -> Self {
		let mut mock = Self::shielded_pool(name);
		mock.capabilities.compliance_support = true;
		mock.capabilities.setup_required = false;
		mock
	}

	/// A confidential-compute prover backend
	pub fn prover(name: &str) -> Self {
		let mut mock = Self::new(name);
		mock.backend_type = BackendType::Compute;
		mock.capabilities = BackendCapabilities {
			hidden_compute: true,
			latency: LatencyClass::Slow,
			..BackendCapabilities::transparent()
		};
		mock
	}

	/// A backend whose every execution fails with an ordinary failure
	/// receipt
	pub fn failing(name: &str) -> Self {
		let mut mock = Self::new(name);
		mock.should_fail = true;
		mock
	}

	/// A backend whose every execution raises a network error
	pub fn crashing(name: &str) -> Self {
		let mut mock = Self::new(name);
		mock.raise_errors = true;
		mock
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

	pub fn with_cost(mut self, cost: f64) -> Self {
		self.estimated_cost = Some(cost);
		self
	}

	pub fn with_response_delay_ms(mut self, delay_ms: u64) -> Self {
		self.response_delay_ms = delay_ms;
		self
	}

	/// Make every execution return an ordinary failure receipt
	pub fn with_failure(mut self) -> Self {
		self.should_fail = true;
		self
	}

	/// Make every execution raise a network error
	pub fn with_errors(mut self) -> Self {
		self.raise_errors = true;
		self
	}

	pub fn unavailable(mut self, reason: &str) -> Self {
		self.available = false;
		self.unavailable_reason = Some(reason.to_string());
		self
	}

	/// Number of times this backend executed an operation
	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	async fn simulate_delay(&self) {
		if self.response_delay_ms > 0 {
			tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
		}
	}

	fn mock_signature(&self) -> String {
		let nonce: u64 = rand::thread_rng().gen();
		format!("0x{:016x}{:016x}", nonce, self.calls.load(Ordering::SeqCst))
	}
}

#[async_trait]
impl TransferBackend for MockBackend {
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
		Some(1)
	}

	fn capabilities(&self) -> BackendCapabilities {
		self.capabilities.clone()
	}

	async fn check_availability(&self, _params: &OperationParams) -> AvailabilityReport {
		if self.available {
			AvailabilityReport {
				available: true,
				reason: None,
				estimated_cost: self.estimated_cost,
				estimated_time_ms: self.estimated_time_ms,
			}
		} else {
			AvailabilityReport::unavailable(
				self.unavailable_reason
					.clone()
					.unwrap_or_else(|| "unavailable".to_string()),
			)
		}
	}

	async fn execute(&self, _params: &TransferParams) -> BackendResult<TransferReceipt> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.simulate_delay().await;

		if self.raise_errors {
			return Err(BackendError::Network {
				backend: self.name.clone(),
				message: "simulated network failure".to_string(),
			});
		}
		if self.should_fail {
			return Ok(TransferReceipt::failure(&self.name, "simulated failure"));
		}
		Ok(TransferReceipt::success(&self.name, self.mock_signature()))
	}

	async fn execute_computation(
		&self,
		params: &ComputationParams,
	) -> BackendResult<ComputationReceipt> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.simulate_delay().await;

		if !self.backend_type.handles_compute() {
			return Err(BackendError::UnsupportedOperation {
				backend: self.name.clone(),
				operation: "execute_computation".to_string(),
			});
		}
		if self.raise_errors {
			return Err(BackendError::Network {
				backend: self.name.clone(),
				message: "simulated network failure".to_string(),
			});
		}
		if self.should_fail {
			return Ok(ComputationReceipt::failure(
				&self.name,
				&params.circuit,
				"simulated failure",
			));
		}
		Ok(ComputationReceipt::success(
			&self.name,
			&params.circuit,
			"0xencrypted-result",
		))
	}

	async fn estimate_cost(&self, _params: &OperationParams) -> BackendResult<f64> {
		self.estimated_cost.ok_or_else(|| BackendError::Execution {
			backend: self.name.clone(),
			message: "no cost model configured".to_string(),
		})
	}
}

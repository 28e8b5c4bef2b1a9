//! Static privacy and performance facts about a backend
//!
//! Capabilities are a pure function of backend configuration: the same
//! backend must return identical capabilities across calls. The router
//! relies on this when scoring candidates.

use serde::{Deserialize, Serialize};

/// Coarse latency classification for a backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LatencyClass {
	/// Sub-second to a few seconds
	Fast,
	/// Seconds to around a minute
	Medium,
	/// Minutes or longer (e.g. batched settlement)
	Slow,
}

/// Which token classes a backend can move
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenSupport {
	/// Native chain asset only
	Native,
	/// Issued tokens only (e.g. SPL / ERC-20)
	Tokens,
	/// Native asset and issued tokens
	All,
}

/// Immutable per-backend privacy and performance facts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendCapabilities {
	/// Transfer amounts are hidden on-chain
	pub hidden_amount: bool,

	/// Sender identity is hidden
	pub hidden_sender: bool,

	/// Recipient identity is hidden
	pub hidden_recipient: bool,

	/// Computation inputs/outputs are hidden (confidential compute)
	pub hidden_compute: bool,

	/// Supports selective disclosure through viewing keys
	pub compliance_support: bool,

	/// Approximate anonymity-set size, when the backend publishes one
	pub anonymity_set: Option<u64>,

	/// Whether the backend requires per-user setup before first use
	pub setup_required: bool,

	/// Coarse latency classification
	pub latency: LatencyClass,

	/// Token classes the backend can move
	pub token_support: TokenSupport,

	/// Minimum transferable amount, if the backend enforces one
	pub min_amount: Option<f64>,

	/// Maximum transferable amount, if the backend enforces one
	pub max_amount: Option<f64>,
}

impl BackendCapabilities {
	/// Capabilities of a fully transparent backend. Useful as a starting
	/// point for builders and tests.
	pub fn transparent() -> Self {
		Self {
			hidden_amount: false,
			hidden_sender: false,
			hidden_recipient: false,
			hidden_compute: false,
			compliance_support: false,
			anonymity_set: None,
			setup_required: false,
			latency: LatencyClass::Fast,
			token_support: TokenSupport::All,
			min_amount: None,
			max_amount: None,
		}
	}

	/// Whether an amount falls inside the backend's transferable range
	pub fn amount_in_range(&self, amount: f64) -> bool {
		if let Some(min) = self.min_amount {
			if amount < min {
				return false;
			}
		}
		if let Some(max) = self.max_amount {
			if amount > max {
				return false;
			}
		}
		true
	}

	/// Builder-style setters for tests and mock configuration
	pub fn with_hidden_transfer(mut self) -> Self {
		self.hidden_amount = true;
		self.hidden_sender = true;
		self.hidden_recipient = true;
		self
	}

	pub fn with_compliance(mut self) -> Self {
		self.compliance_support = true;
		self
	}

	pub fn with_anonymity_set(mut self, size: u64) -> Self {
		self.anonymity_set = Some(size);
		self
	}

	pub fn with_latency(mut self, latency: LatencyClass) -> Self {
		self.latency = latency;
		self
	}
}

//! Operation parameter models
//!
//! Transfer and computation parameters form an explicit tagged union so the
//! discriminator is first-class instead of being inferred from field
//! presence.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ChainId;

/// Privacy levels for SIP operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
	/// No privacy, all data public
	Transparent,
	/// Full privacy, sender/amount/recipient hidden
	Shielded,
	/// Privacy with viewing key for auditors
	Compliant,
}

impl fmt::Display for PrivacyLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PrivacyLevel::Transparent => write!(f, "transparent"),
			PrivacyLevel::Shielded => write!(f, "shielded"),
			PrivacyLevel::Compliant => write!(f, "compliant"),
		}
	}
}

/// Parameters for a private value transfer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferParams {
	/// Unique request identifier
	pub request_id: Uuid,

	/// Chain the transfer settles on
	pub chain: ChainId,

	/// Token symbol or address ("SOL", "USDC", "0x...")
	pub token: String,

	/// Transfer amount in display units
	pub amount: f64,

	/// Sender address or stealth meta-address
	pub sender: String,

	/// Recipient address or stealth meta-address
	pub recipient: String,

	/// Requested privacy level
	pub privacy: PrivacyLevel,
}

impl TransferParams {
	pub fn new(
		chain: impl Into<ChainId>,
		token: impl Into<String>,
		amount: f64,
		sender: impl Into<String>,
		recipient: impl Into<String>,
	) -> Self {
		Self {
			request_id: Uuid::new_v4(),
			chain: chain.into(),
			token: token.into(),
			amount,
			sender: sender.into(),
			recipient: recipient.into(),
			privacy: PrivacyLevel::Shielded,
		}
	}

	pub fn with_privacy(mut self, privacy: PrivacyLevel) -> Self {
		self.privacy = privacy;
		self
	}
}

/// Parameters for a confidential computation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComputationParams {
	/// Unique request identifier
	pub request_id: Uuid,

	/// Chain the computation is anchored to
	pub chain: ChainId,

	/// Identifier of the circuit to evaluate
	pub circuit: String,

	/// Encrypted inputs, one hex payload per circuit input
	pub encrypted_inputs: Vec<String>,
}

impl ComputationParams {
	pub fn new(
		chain: impl Into<ChainId>,
		circuit: impl Into<String>,
		encrypted_inputs: Vec<String>,
	) -> Self {
		Self {
			request_id: Uuid::new_v4(),
			chain: chain.into(),
			circuit: circuit.into(),
			encrypted_inputs,
		}
	}
}

/// Tagged union over the two operation kinds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationParams {
	Transfer(TransferParams),
	Computation(ComputationParams),
}

impl OperationParams {
	/// Chain this operation targets
	pub fn chain(&self) -> &ChainId {
		match self {
			OperationParams::Transfer(p) => &p.chain,
			OperationParams::Computation(p) => &p.chain,
		}
	}

	/// Request identifier, independent of operation kind
	pub fn request_id(&self) -> Uuid {
		match self {
			OperationParams::Transfer(p) => p.request_id,
			OperationParams::Computation(p) => p.request_id,
		}
	}

	pub fn is_transfer(&self) -> bool {
		matches!(self, OperationParams::Transfer(_))
	}

	pub fn is_computation(&self) -> bool {
		matches!(self, OperationParams::Computation(_))
	}
}

impl From<TransferParams> for OperationParams {
	fn from(params: TransferParams) -> Self {
		OperationParams::Transfer(params)
	}
}

impl From<ComputationParams> for OperationParams {
	fn from(params: ComputationParams) -> Self {
		OperationParams::Computation(params)
	}
}

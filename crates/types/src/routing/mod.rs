//! Router configuration, selection results, and routing errors

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::backends::{AvailabilityReport, ChainId, RegistryError, TransferBackend};

/// Result alias for router operations
pub type RouterResult<T> = Result<T, RouterError>;

/// What the router optimizes for when ranking candidates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoutePriority {
	/// Strongest privacy guarantees win
	Privacy,
	/// Fastest settlement wins
	Speed,
	/// Cheapest execution wins
	Cost,
	/// Auditability (viewing-key support) wins
	Compliance,
}

/// Per-request routing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterConfig {
	/// Scoring dimension to optimize for
	pub prioritize: RoutePriority,

	/// Only consider backends supporting viewing-key disclosure
	pub require_viewing_keys: bool,

	/// Allow backends whose privacy comes from confidential compute
	pub allow_compute_privacy: bool,

	/// Consider backends whose circuit is currently open
	pub include_unhealthy: bool,

	/// Minimum acceptable anonymity-set size
	pub min_anonymity_set: Option<u64>,

	/// Reject candidates whose estimated cost exceeds this ceiling
	pub max_cost: Option<f64>,

	/// Reject candidates whose estimated time exceeds this ceiling
	pub max_latency_ms: Option<u64>,

	/// Backend to favor when it scores close to the leader
	pub preferred_backend: Option<String>,

	/// Backends to exclude outright
	pub exclude_backends: Vec<String>,

	/// Retry failed executions on ranked alternatives
	pub enable_fallback: bool,

	/// Maximum number of fallback attempts after the primary
	pub max_fallback_attempts: u32,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			prioritize: RoutePriority::Privacy,
			require_viewing_keys: false,
			allow_compute_privacy: true,
			include_unhealthy: false,
			min_anonymity_set: None,
			max_cost: None,
			max_latency_ms: None,
			preferred_backend: None,
			exclude_backends: Vec::new(),
			enable_fallback: true,
			max_fallback_attempts: 3,
		}
	}
}

impl RouterConfig {
	pub fn prioritizing(priority: RoutePriority) -> Self {
		Self {
			prioritize: priority,
			..Self::default()
		}
	}

	pub fn with_preferred(mut self, backend: impl Into<String>) -> Self {
		self.preferred_backend = Some(backend.into());
		self
	}

	pub fn with_excluded(mut self, backends: Vec<String>) -> Self {
		self.exclude_backends = backends;
		self
	}
}

/// One scored candidate from a selection pass
#[derive(Debug, Clone)]
pub struct ScoredBackend {
	/// The candidate backend
	pub backend: Arc<dyn TransferBackend>,

	/// Score on the [0, 100] scale for the requested priority
	pub score: f64,

	/// The availability report gathered during filtering
	pub availability: AvailabilityReport,
}

impl ScoredBackend {
	/// Candidate backend name
	pub fn name(&self) -> &str {
		self.backend.name()
	}
}

/// Outcome of a selection pass: the winner plus ranked alternatives
#[derive(Debug, Clone)]
pub struct BackendSelection {
	/// The winning candidate
	pub selected: ScoredBackend,

	/// Remaining candidates in descending score order
	pub alternatives: Vec<ScoredBackend>,
}

impl BackendSelection {
	/// Name of the winning backend
	pub fn backend_name(&self) -> &str {
		self.selected.name()
	}

	/// Names of the ranked alternatives
	pub fn alternative_names(&self) -> Vec<&str> {
		self.alternatives.iter().map(|c| c.name()).collect()
	}
}

/// Routing failures
#[derive(Error, Debug)]
pub enum RouterError {
	/// No registered backend supports the requested chain at all
	#[error("No backend supports chain '{chain}'")]
	NoBackendsForChain { chain: ChainId },

	/// Candidates existed for the chain but every one was filtered out
	#[error(
		"All {candidates} candidate backend(s) for chain '{chain}' were filtered out during selection"
	)]
	AllCandidatesFiltered {
		chain: ChainId,
		candidates: usize,
		/// Why each filtered candidate was dropped
		reasons: HashMap<String, String>,
	},

	/// No compute-capable backend matched a computation request
	#[error("No compute-capable backend supports chain '{chain}'")]
	NoComputeBackend { chain: ChainId },

	/// Every attempted backend failed during execution
	#[error("All {} attempted backend(s) failed: {attempted:?}", .attempted.len())]
	AllAttemptsFailed {
		/// Backends attempted, in attempt order
		attempted: Vec<String>,
		/// Failure reason per attempted backend
		reasons: HashMap<String, String>,
	},

	#[error("Registry error: {0}")]
	Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_router_config_defaults() {
		let config = RouterConfig::default();

		assert_eq!(config.prioritize, RoutePriority::Privacy);
		assert!(!config.require_viewing_keys);
		assert!(config.allow_compute_privacy);
		assert!(config.enable_fallback);
		assert!(!config.include_unhealthy);
		assert_eq!(config.max_fallback_attempts, 3);
		assert!(config.exclude_backends.is_empty());
	}

	#[test]
	fn test_router_config_builders() {
		let config = RouterConfig::prioritizing(RoutePriority::Cost)
			.with_preferred("mixnet")
			.with_excluded(vec!["slow-pool".to_string()]);

		assert_eq!(config.prioritize, RoutePriority::Cost);
		assert_eq!(config.preferred_backend.as_deref(), Some("mixnet"));
		assert_eq!(config.exclude_backends, vec!["slow-pool".to_string()]);
	}

	#[test]
	fn test_error_distinguishes_empty_from_filtered() {
		let none = RouterError::NoBackendsForChain {
			chain: "near".to_string(),
		};
		let filtered = RouterError::AllCandidatesFiltered {
			chain: "near".to_string(),
			candidates: 2,
			reasons: HashMap::new(),
		};

		assert!(none.to_string().contains("No backend supports"));
		assert!(filtered.to_string().contains("filtered out"));
	}
}

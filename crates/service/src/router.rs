//! Smart routing: multi-criteria scoring and fallback orchestration
//!
//! The router sits on top of the registry. Selection fetches the
//! chain-matching candidates, applies the hard filters in a fixed order,
//! scores every survivor on a [0, 100] scale for the requested priority,
//! and returns the winner plus ranked alternatives. Execution runs the
//! winner and, when fallback is enabled, walks the alternatives in score
//! order until one succeeds or the attempt budget is exhausted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use sip_types::{
	AvailabilityReport, BackendCapabilities, BackendSelection, ComputationParams,
	ComputationReceipt, LatencyClass, OperationParams, RoutePriority, RouterConfig, RouterError,
	RouterResult, ScoredBackend, TransferBackend, TransferParams, TransferReceipt,
};
use tracing::{debug, info, warn};

use crate::registry::BackendRegistry;

/// Maximum score deficit at which a preferred backend is still promoted
/// over the leader.
const PREFERRED_MARGIN: f64 = 10.0;

/// Privacy scoring weights
const WEIGHT_HIDDEN_AMOUNT: f64 = 25.0;
const WEIGHT_HIDDEN_SENDER: f64 = 25.0;
const WEIGHT_HIDDEN_RECIPIENT: f64 = 25.0;
const WEIGHT_HIDDEN_COMPUTE: f64 = 15.0;
const ANONYMITY_BONUS: f64 = 10.0;
/// Anonymity-set size at which the bonus applies
const ANONYMITY_BONUS_THRESHOLD: u64 = 100;

/// Speed scoring weights
const SPEED_SCORE_FAST: f64 = 90.0;
const SPEED_SCORE_MEDIUM: f64 = 60.0;
const SPEED_SCORE_SLOW: f64 = 30.0;
const SETUP_PENALTY: f64 = 15.0;

/// Compliance scoring weights
const WEIGHT_COMPLIANCE: f64 = 55.0;
const WEIGHT_COMPLIANCE_HIDDEN: f64 = 15.0;

/// Trait for routing operations (enables easy testing and mocking)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Router: Send + Sync {
	/// Select the best backend for a transfer, with ranked alternatives
	async fn select_backend(
		&self,
		params: &TransferParams,
		config: &RouterConfig,
	) -> RouterResult<BackendSelection>;

	/// Execute a transfer with fallback orchestration
	async fn execute(
		&self,
		params: &TransferParams,
		config: &RouterConfig,
	) -> RouterResult<TransferReceipt>;

	/// Select the best compute-capable backend for a computation
	async fn select_compute_backend(
		&self,
		params: &ComputationParams,
		config: &RouterConfig,
	) -> RouterResult<BackendSelection>;

	/// Execute a confidential computation on the selected backend
	async fn execute_computation(
		&self,
		params: &ComputationParams,
		config: &RouterConfig,
	) -> RouterResult<ComputationReceipt>;
}

/// Health-aware scoring router over a backend registry
pub struct SmartRouter {
	registry: Arc<BackendRegistry>,
}

impl SmartRouter {
	pub fn new(registry: Arc<BackendRegistry>) -> Self {
		Self { registry }
	}

	/// The registry this router dispatches through
	pub fn registry(&self) -> &Arc<BackendRegistry> {
		&self.registry
	}

	/// Apply the hard filters in order, collecting a reason per dropped
	/// candidate
	///
	/// Availability checks run sequentially in registry order so that
	/// selection stays deterministic for fixed availability responses.
	async fn filter_candidates(
		&self,
		candidates: &[Arc<dyn TransferBackend>],
		op: &OperationParams,
		config: &RouterConfig,
		apply_health: bool,
	) -> (
		Vec<(Arc<dyn TransferBackend>, AvailabilityReport)>,
		HashMap<String, String>,
	) {
		let mut survivors = Vec::new();
		let mut reasons = HashMap::new();

		for backend in candidates {
			let name = backend.name().to_string();

			if config.exclude_backends.iter().any(|n| n == &name) {
				reasons.insert(name, "excluded by configuration".to_string());
				continue;
			}

			// should_attempt is the dispatch gate: it also performs the
			// lazy open-to-half-open transition once the reset timeout has
			// elapsed, so expired circuits heal through routing itself.
			if apply_health && !config.include_unhealthy && !self.registry.should_attempt(&name) {
				debug!("Dropping backend '{}': circuit open", name);
				reasons.insert(name, "circuit open".to_string());
				continue;
			}

			let mut report = backend.check_availability(op).await;
			if !report.available {
				let reason = report
					.reason
					.unwrap_or_else(|| "unavailable".to_string());
				debug!("Dropping backend '{}': {}", name, reason);
				reasons.insert(name, reason);
				continue;
			}

			let capabilities = backend.capabilities();

			if config.require_viewing_keys && !capabilities.compliance_support {
				reasons.insert(name, "no viewing-key support".to_string());
				continue;
			}

			if let Some(min) = config.min_anonymity_set {
				if capabilities.anonymity_set.unwrap_or(0) < min {
					reasons.insert(name, format!("anonymity set below {}", min));
					continue;
				}
			}

			if !config.allow_compute_privacy && capabilities.hidden_compute && op.is_transfer() {
				reasons.insert(name, "compute-based privacy disallowed".to_string());
				continue;
			}

			// The availability probe may omit a cost estimate; ask the
			// backend directly when cost actually matters for this request.
			if report.estimated_cost.is_none()
				&& (config.prioritize == RoutePriority::Cost || config.max_cost.is_some())
			{
				report.estimated_cost = backend.estimate_cost(op).await.ok();
			}

			if let (Some(ceiling), Some(cost)) = (config.max_cost, report.estimated_cost) {
				if cost > ceiling {
					reasons.insert(
						name,
						format!("estimated cost {:.6} exceeds ceiling {:.6}", cost, ceiling),
					);
					continue;
				}
			}

			if let (Some(ceiling), Some(time_ms)) =
				(config.max_latency_ms, report.estimated_time_ms)
			{
				if time_ms > ceiling {
					reasons.insert(
						name,
						format!("estimated time {}ms exceeds ceiling {}ms", time_ms, ceiling),
					);
					continue;
				}
			}

			survivors.push((Arc::clone(backend), report));
		}

		(survivors, reasons)
	}

	/// Score survivors, sort descending, and apply the preferred-backend
	/// tie-break
	fn rank(
		&self,
		survivors: Vec<(Arc<dyn TransferBackend>, AvailabilityReport)>,
		config: &RouterConfig,
	) -> Vec<ScoredBackend> {
		let mut scored: Vec<ScoredBackend> = survivors
			.into_iter()
			.map(|(backend, availability)| {
				let score =
					score_candidate(&backend.capabilities(), &availability, config.prioritize);
				ScoredBackend {
					backend,
					score,
					availability,
				}
			})
			.collect();

		// Stable sort: equal scores keep registry priority order
		scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

		if let Some(preferred) = &config.preferred_backend {
			promote_preferred(&mut scored, preferred);
		}

		scored
	}

	/// Run one transfer attempt, converting backend errors into failure
	/// receipts and recording the outcome against the backend's health
	async fn attempt_transfer(
		&self,
		backend: &Arc<dyn TransferBackend>,
		params: &TransferParams,
	) -> TransferReceipt {
		let name = backend.name().to_string();
		let started = Instant::now();
		let result = backend.execute(params).await;
		let latency_ms = started.elapsed().as_millis() as u64;

		match result {
			Ok(receipt) => {
				if receipt.success {
					self.registry.record_success(&name, latency_ms);
				} else {
					let reason = receipt.error.as_deref().unwrap_or("execution failed");
					self.registry.record_failure(&name, reason, latency_ms);
				}
				receipt
			},
			Err(err) => {
				let message = err.to_string();
				warn!("Backend '{}' raised during execution: {}", name, message);
				self.registry.record_failure(&name, &message, latency_ms);
				TransferReceipt::failure(&name, message)
			},
		}
	}
}

#[async_trait]
impl Router for SmartRouter {
	async fn select_backend(
		&self,
		params: &TransferParams,
		config: &RouterConfig,
	) -> RouterResult<BackendSelection> {
		let candidates: Vec<Arc<dyn TransferBackend>> = self
			.registry
			.get_by_chain(&params.chain)
			.into_iter()
			.filter(|backend| backend.backend_type().handles_transfers())
			.collect();

		if candidates.is_empty() {
			return Err(RouterError::NoBackendsForChain {
				chain: params.chain.clone(),
			});
		}

		let op = OperationParams::Transfer(params.clone());
		let (survivors, reasons) = self
			.filter_candidates(&candidates, &op, config, true)
			.await;

		if survivors.is_empty() {
			return Err(RouterError::AllCandidatesFiltered {
				chain: params.chain.clone(),
				candidates: candidates.len(),
				reasons,
			});
		}

		let mut scored = self.rank(survivors, config);
		let selected = scored.remove(0);

		info!(
			"Selected backend '{}' for chain '{}' (score {:.1}, {} alternative(s))",
			selected.name(),
			params.chain,
			selected.score,
			scored.len()
		);

		Ok(BackendSelection {
			selected,
			alternatives: scored,
		})
	}

	async fn execute(
		&self,
		params: &TransferParams,
		config: &RouterConfig,
	) -> RouterResult<TransferReceipt> {
		let selection = self.select_backend(params, config).await?;
		let primary_name = selection.backend_name().to_string();
		let started = Instant::now();

		let mut attempted: Vec<String> = Vec::new();
		let mut reasons: HashMap<String, String> = HashMap::new();

		let mut receipt = self.attempt_transfer(&selection.selected.backend, params).await;
		attempted.push(primary_name.clone());

		if receipt.success {
			receipt.metadata.attempts = 1;
			receipt.metadata.total_time_ms = started.elapsed().as_millis() as u64;
			return Ok(receipt);
		}

		reasons.insert(
			primary_name.clone(),
			receipt
				.error
				.clone()
				.unwrap_or_else(|| "execution failed".to_string()),
		);
		warn!(
			"Primary backend '{}' failed for request {}",
			primary_name, params.request_id
		);

		if config.enable_fallback {
			let mut fallback_attempts = 0u32;

			for alternative in &selection.alternatives {
				if fallback_attempts >= config.max_fallback_attempts {
					debug!(
						"Fallback budget of {} attempt(s) exhausted",
						config.max_fallback_attempts
					);
					break;
				}

				let name = alternative.name();
				if attempted.iter().any(|a| a == name) {
					continue;
				}

				// Skipped candidates do not consume an attempt slot
				if !config.include_unhealthy && !self.registry.should_attempt(name) {
					debug!("Skipping unhealthy fallback candidate '{}'", name);
					continue;
				}

				info!("Falling back to backend '{}'", name);
				let mut fallback_receipt =
					self.attempt_transfer(&alternative.backend, params).await;
				attempted.push(name.to_string());
				fallback_attempts += 1;

				if fallback_receipt.success {
					fallback_receipt.metadata.fallback_from = Some(primary_name);
					fallback_receipt.metadata.attempts = attempted.len() as u32;
					fallback_receipt.metadata.total_time_ms =
						started.elapsed().as_millis() as u64;
					return Ok(fallback_receipt);
				}

				reasons.insert(
					name.to_string(),
					fallback_receipt
						.error
						.unwrap_or_else(|| "execution failed".to_string()),
				);
			}
		}

		Err(RouterError::AllAttemptsFailed { attempted, reasons })
	}

	async fn select_compute_backend(
		&self,
		params: &ComputationParams,
		config: &RouterConfig,
	) -> RouterResult<BackendSelection> {
		let candidates: Vec<Arc<dyn TransferBackend>> = self
			.registry
			.get_by_chain(&params.chain)
			.into_iter()
			.filter(|backend| backend.backend_type().handles_compute())
			.collect();

		if candidates.is_empty() {
			return Err(RouterError::NoComputeBackend {
				chain: params.chain.clone(),
			});
		}

		let op = OperationParams::Computation(params.clone());
		// Compute selection intentionally skips the health and admission
		// gates applied to transfers; compute traffic is low-volume.
		let (survivors, reasons) = self
			.filter_candidates(&candidates, &op, config, false)
			.await;

		if survivors.is_empty() {
			return Err(RouterError::AllCandidatesFiltered {
				chain: params.chain.clone(),
				candidates: candidates.len(),
				reasons,
			});
		}

		let mut scored = self.rank(survivors, config);
		let selected = scored.remove(0);

		info!(
			"Selected compute backend '{}' for circuit '{}' (score {:.1})",
			selected.name(),
			params.circuit,
			selected.score
		);

		Ok(BackendSelection {
			selected,
			alternatives: scored,
		})
	}

	async fn execute_computation(
		&self,
		params: &ComputationParams,
		config: &RouterConfig,
	) -> RouterResult<ComputationReceipt> {
		let selection = self.select_compute_backend(params, config).await?;
		let backend = &selection.selected.backend;
		let name = backend.name().to_string();

		let started = Instant::now();
		let result = backend.execute_computation(params).await;
		let latency_ms = started.elapsed().as_millis() as u64;

		let receipt = match result {
			Ok(receipt) => {
				if receipt.success {
					self.registry.record_success(&name, latency_ms);
				} else {
					let reason = receipt.error.as_deref().unwrap_or("computation failed");
					self.registry.record_failure(&name, reason, latency_ms);
				}
				receipt
			},
			Err(err) => {
				let message = err.to_string();
				warn!("Backend '{}' raised during computation: {}", name, message);
				self.registry.record_failure(&name, &message, latency_ms);
				ComputationReceipt::failure(&name, &params.circuit, message)
			},
		};

		Ok(receipt)
	}
}

/// Score a candidate on the [0, 100] scale for the requested priority
fn score_candidate(
	capabilities: &BackendCapabilities,
	availability: &AvailabilityReport,
	priority: RoutePriority,
) -> f64 {
	let score = match priority {
		RoutePriority::Privacy => {
			let mut score = 0.0;
			if capabilities.hidden_amount {
				score += WEIGHT_HIDDEN_AMOUNT;
			}
			if capabilities.hidden_sender {
				score += WEIGHT_HIDDEN_SENDER;
			}
			if capabilities.hidden_recipient {
				score += WEIGHT_HIDDEN_RECIPIENT;
			}
			if capabilities.hidden_compute {
				score += WEIGHT_HIDDEN_COMPUTE;
			}
			if capabilities.anonymity_set.unwrap_or(0) >= ANONYMITY_BONUS_THRESHOLD {
				score += ANONYMITY_BONUS;
			}
			score
		},
		RoutePriority::Speed => {
			let mut score = match capabilities.latency {
				LatencyClass::Fast => SPEED_SCORE_FAST,
				LatencyClass::Medium => SPEED_SCORE_MEDIUM,
				LatencyClass::Slow => SPEED_SCORE_SLOW,
			};
			if capabilities.setup_required {
				score -= SETUP_PENALTY;
			}
			score
		},
		RoutePriority::Cost => match availability.estimated_cost {
			Some(cost) if cost > 0.0 => (70.0 - 5.0 * cost.log10()).max(0.0),
			Some(_) => 70.0,
			None => 0.0,
		},
		RoutePriority::Compliance => {
			let mut score = 0.0;
			if capabilities.compliance_support {
				score += WEIGHT_COMPLIANCE;
			}
			if capabilities.hidden_amount {
				score += WEIGHT_COMPLIANCE_HIDDEN;
			}
			if capabilities.hidden_sender {
				score += WEIGHT_COMPLIANCE_HIDDEN;
			}
			if capabilities.hidden_recipient {
				score += WEIGHT_COMPLIANCE_HIDDEN;
			}
			score
		},
	};

	score.clamp(0.0, 100.0)
}

/// Promote the preferred backend to the top only when it scores within
/// [`PREFERRED_MARGIN`] points of the leader
fn promote_preferred(scored: &mut Vec<ScoredBackend>, preferred: &str) {
	let Some(pos) = scored.iter().position(|c| c.name() == preferred) else {
		return;
	};
	if pos == 0 {
		return;
	}

	let deficit = scored[0].score - scored[pos].score;
	if deficit <= PREFERRED_MARGIN {
		let candidate = scored.remove(pos);
		debug!(
			"Promoting preferred backend '{}' ({:.1} points behind leader)",
			preferred, deficit
		);
		scored.insert(0, candidate);
	} else {
		debug!(
			"Preferred backend '{}' is {:.1} points behind the leader, keeping ranking",
			preferred, deficit
		);
	}
}

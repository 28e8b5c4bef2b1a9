//! SIP Types
//!
//! Shared models and traits for the SIP dispatch layer.
//! This crate contains all domain models organized by business entity.

pub mod backends;
pub mod health;
pub mod ratelimit;
pub mod routing;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

// Re-export commonly used types for convenience
pub use backends::{
	AvailabilityReport, BackendCapabilities, BackendError, BackendResult, BackendType, ChainId,
	ComputationParams, ComputationReceipt, ExecutionMetadata, LatencyClass, OperationParams,
	PrivacyLevel, RegistryError, TokenSupport, TransferBackend, TransferParams, TransferReceipt,
};

pub use health::{BackendHealthState, BackendMetrics, CircuitState, HealthSummary};

pub use ratelimit::{AcquireOptions, RateLimitError, RateLimitResult, RateLimitStats};

pub use routing::{
	BackendSelection, RoutePriority, RouterConfig, RouterError, RouterResult, ScoredBackend,
};

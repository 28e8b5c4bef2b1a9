//! SIP Dispatch Library
//!
//! The dispatch layer of the SIP privacy protocol: given a transfer or
//! confidential-computation request, it selects which of several
//! interchangeable execution backends should handle it, protects the
//! system from failing backends with a circuit breaker, throttles request
//! volume per backend with a token bucket, and falls back to ranked
//! alternatives on failure.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sip_dispatch::{
//!		BackendRegistry, RegisterOptions, Router, RouterConfig, Settings, SmartRouter,
//!		TransferParams,
//! };
//!
//! # async fn run(
//! #     my_backend: Arc<dyn sip_dispatch::TransferBackend>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(BackendRegistry::from_settings(&Settings::default()));
//! registry.register(my_backend, RegisterOptions::default())?;
//!
//! let router = SmartRouter::new(Arc::clone(&registry));
//! let params = TransferParams::new("solana", "SOL", 1.5, "alice", "bob");
//! let receipt = router.execute(&params, &RouterConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

// Core domain types - the most commonly used types
pub use sip_types::{
	chrono,
	// External dependencies for convenience
	serde_json,
	// Backend contract
	AvailabilityReport,
	BackendCapabilities,
	// Error types
	BackendError,
	BackendHealthState,
	BackendMetrics,
	BackendResult,
	BackendSelection,
	BackendType,
	ChainId,
	CircuitState,
	ComputationParams,
	ComputationReceipt,
	ExecutionMetadata,
	HealthSummary,
	LatencyClass,
	OperationParams,
	PrivacyLevel,
	RateLimitError,
	RateLimitStats,
	RegistryError,
	RoutePriority,
	RouterConfig,
	RouterError,
	ScoredBackend,
	TokenSupport,
	TransferBackend,
	TransferParams,
	TransferReceipt,
};

pub use sip_types::AcquireOptions;

// Service layer
pub use sip_service::{
	BackendRegistry, HealthTracker, RateLimiter, RegisterOptions, RegisteredBackend,
	RegistryBuilder, Router, SmartRouter,
};

// Config
pub use sip_config::{
	init_tracing, load_config, log_service_info, AcquirePolicy, CircuitBreakerSettings,
	LoggingSettings, RateLimiterSettings, RouterSettings, Settings,
};

pub mod mocks;

// Module aliases for direct access to each layer
pub mod types {
	pub use sip_types::*;
}

pub mod service {
	pub use sip_service::*;
}

pub mod config {
	pub use sip_config::*;
}

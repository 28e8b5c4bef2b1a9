//! SIP Service
//!
//! Core dispatch logic: backend registry, health tracking, rate limiting,
//! and smart routing.

pub mod health;
pub mod rate_limit;
pub mod registry;
pub mod router;

pub use health::HealthTracker;
pub use rate_limit::RateLimiter;
pub use registry::{BackendRegistry, RegisterOptions, RegisteredBackend, RegistryBuilder};
pub use router::{Router, SmartRouter};

#[cfg(test)]
pub(crate) mod test_support;

//! Token bucket admission control with optional queueing
//!
//! Each backend name owns an independent bucket refilled lazily at access
//! time; no clock is needed for the synchronous path. Blocking acquires can
//! either fail fast or join a bounded FIFO serviced by a periodic pump
//! task, which is the only background task in the dispatch core and must be
//! stopped with [`RateLimiter::dispose`] on shutdown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use sip_config::{AcquirePolicy, RateLimiterSettings};
use sip_types::{AcquireOptions, RateLimitError, RateLimitResult, RateLimitStats};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// A caller suspended until tokens become available
#[derive(Debug)]
struct Waiter {
	tokens: u32,
	tx: oneshot::Sender<()>,
}

/// Per-backend token bucket state
#[derive(Debug)]
struct Bucket {
	tokens: f64,
	last_refill: Instant,
	config: RateLimiterSettings,
	allowed: u64,
	rejected: u64,
	tokens_consumed: u64,
	queue: VecDeque<Waiter>,
}

impl Bucket {
	fn new(config: RateLimiterSettings) -> Self {
		Self {
			tokens: config.max_tokens as f64,
			last_refill: Instant::now(),
			config,
			allowed: 0,
			rejected: 0,
			tokens_consumed: 0,
			queue: VecDeque::new(),
		}
	}

	/// Add tokens for every full refill interval that has elapsed
	///
	/// Advances `last_refill` by whole intervals only, so partial intervals
	/// keep accruing toward the next refill.
	fn refill(&mut self) {
		let interval_ms = self.config.refill_interval_ms.max(1);
		let elapsed_ms = self.last_refill.elapsed().as_millis() as u64;
		let intervals = elapsed_ms / interval_ms;
		if intervals == 0 {
			return;
		}

		let added = intervals.saturating_mul(self.config.refill_rate as u64);
		self.tokens = (self.tokens + added as f64).min(self.config.max_tokens as f64);
		self.last_refill += Duration::from_millis(intervals * interval_ms);
	}

	/// Consume tokens if available, updating counters
	fn try_take(&mut self, tokens: u32) -> bool {
		if self.tokens >= tokens as f64 {
			self.tokens -= tokens as f64;
			self.allowed += 1;
			self.tokens_consumed += tokens as u64;
			true
		} else {
			false
		}
	}

	/// Estimated wait until `tokens` are available, in milliseconds
	fn estimate_wait_ms(&self, tokens: u32) -> Option<u64> {
		if self.config.refill_rate == 0 {
			return None;
		}
		let deficit = tokens as f64 - self.tokens;
		if deficit <= 0.0 {
			return Some(0);
		}
		let intervals = (deficit / self.config.refill_rate as f64).ceil() as u64;
		Some(intervals * self.config.refill_interval_ms)
	}

	/// Grant queued waiters in FIFO order while tokens last
	///
	/// Waiters whose receiver is gone (timed out or cancelled) are dropped
	/// without consuming tokens.
	fn drain_queue(&mut self) {
		while let Some(front) = self.queue.front() {
			if front.tx.is_closed() {
				self.queue.pop_front();
				continue;
			}
			if self.tokens < front.tokens as f64 {
				break;
			}
			if let Some(waiter) = self.queue.pop_front() {
				self.tokens -= waiter.tokens as f64;
				match waiter.tx.send(()) {
					Ok(()) => {
						self.allowed += 1;
						self.tokens_consumed += waiter.tokens as u64;
					},
					// Receiver gave up between the closed check and the
					// send; give the tokens back.
					Err(()) => self.tokens += waiter.tokens as f64,
				}
			}
		}
	}
}

/// Per-backend token bucket rate limiter
///
/// Buckets are created on first use from the default settings or a
/// per-backend override. Shared safely across tasks behind an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
	defaults: RateLimiterSettings,
	buckets: Arc<DashMap<String, Bucket>>,
	overrides: DashMap<String, RateLimiterSettings>,
	pump: Mutex<Option<JoinHandle<()>>>,
	disposed: AtomicBool,
}

impl RateLimiter {
	/// Create a rate limiter with the given default bucket settings
	pub fn new(defaults: RateLimiterSettings) -> Self {
		Self {
			defaults,
			buckets: Arc::new(DashMap::new()),
			overrides: DashMap::new(),
			pump: Mutex::new(None),
			disposed: AtomicBool::new(false),
		}
	}

	/// Create a rate limiter with default settings
	pub fn with_defaults() -> Self {
		Self::new(RateLimiterSettings::default())
	}

	fn config_for(&self, name: &str) -> RateLimiterSettings {
		self.overrides
			.get(name)
			.map(|c| c.clone())
			.unwrap_or_else(|| self.defaults.clone())
	}

	fn bucket_mut(&self, name: &str) -> dashmap::mapref::one::RefMut<'_, String, Bucket> {
		if let Some(bucket) = self.buckets.get_mut(name) {
			return bucket;
		}
		let config = self.config_for(name);
		self.buckets
			.entry(name.to_string())
			.or_insert_with(|| Bucket::new(config))
	}

	/// Non-blocking acquisition: consume `tokens` iff available after refill
	pub fn try_acquire(&self, name: &str, tokens: u32) -> bool {
		let mut bucket = self.bucket_mut(name);
		bucket.refill();
		let granted = bucket.try_take(tokens);
		if !granted {
			bucket.rejected += 1;
			debug!(
				"Rate limit rejection for backend '{}': requested {}, available {:.1}",
				name, tokens, bucket.tokens
			);
		}
		granted
	}

	/// The same availability check as `try_acquire`, without consuming
	pub fn can_acquire(&self, name: &str, tokens: u32) -> bool {
		let mut bucket = self.bucket_mut(name);
		bucket.refill();
		bucket.tokens >= tokens as f64
	}

	/// Blocking acquisition
	///
	/// Returns immediately when tokens are available. Otherwise the
	/// configured policy decides: `Reject` fails fast with a
	/// rate-limit-exceeded error; `Queue` suspends the caller in a bounded
	/// FIFO until tokens arrive or the timeout elapses. A timed-out acquire
	/// consumes no tokens.
	pub async fn acquire(&self, name: &str, options: AcquireOptions) -> RateLimitResult<()> {
		let rx = {
			let mut bucket = self.bucket_mut(name);
			bucket.refill();
			if bucket.try_take(options.tokens) {
				return Ok(());
			}

			match bucket.config.acquire_policy {
				AcquirePolicy::Reject => {
					bucket.rejected += 1;
					return Err(RateLimitError::Exceeded {
						backend: name.to_string(),
						requested: options.tokens,
						available: bucket.tokens,
						retry_after_ms: bucket.estimate_wait_ms(options.tokens),
					});
				},
				AcquirePolicy::Queue => {
					if self.disposed.load(Ordering::SeqCst) {
						return Err(RateLimitError::Disposed);
					}
					if bucket.queue.len() >= bucket.config.max_queue_size {
						bucket.rejected += 1;
						return Err(RateLimitError::QueueFull {
							backend: name.to_string(),
							capacity: bucket.config.max_queue_size,
						});
					}
					let (tx, rx) = oneshot::channel();
					bucket.queue.push_back(Waiter {
						tokens: options.tokens,
						tx,
					});
					rx
				},
			}
		};

		self.ensure_pump()?;

		let started = Instant::now();
		match tokio::time::timeout(Duration::from_millis(options.timeout_ms), rx).await {
			Ok(Ok(())) => Ok(()),
			// Sender dropped: the bucket was removed or the limiter disposed
			Ok(Err(_)) => Err(RateLimitError::Disposed),
			Err(_) => {
				if let Some(mut bucket) = self.buckets.get_mut(name) {
					bucket.rejected += 1;
				}
				Err(RateLimitError::AcquireTimeout {
					backend: name.to_string(),
					waited_ms: started.elapsed().as_millis() as u64,
				})
			},
		}
	}

	/// Start the queue pump if it is not already running
	fn ensure_pump(&self) -> RateLimitResult<()> {
		if self.disposed.load(Ordering::SeqCst) {
			return Err(RateLimitError::Disposed);
		}

		let mut guard = match self.pump.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		};
		if guard.is_some() {
			return Ok(());
		}

		let buckets = Arc::clone(&self.buckets);
		let pump_interval_ms = self.defaults.queue_pump_interval_ms.max(1);
		*guard = Some(tokio::spawn(async move {
			let mut ticker = interval(Duration::from_millis(pump_interval_ms));
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				for mut entry in buckets.iter_mut() {
					entry.refill();
					entry.drain_queue();
				}
			}
		}));
		debug!("Rate limiter queue pump started ({}ms interval)", pump_interval_ms);
		Ok(())
	}

	/// Running statistics for one backend's bucket
	pub fn stats(&self, name: &str) -> RateLimitStats {
		let mut bucket = self.bucket_mut(name);
		bucket.refill();
		RateLimitStats {
			backend: name.to_string(),
			available_tokens: bucket.tokens,
			max_tokens: bucket.config.max_tokens,
			allowed: bucket.allowed,
			rejected: bucket.rejected,
			tokens_consumed: bucket.tokens_consumed,
			queue_depth: bucket.queue.len(),
		}
	}

	/// Replace one backend's bucket configuration at runtime
	///
	/// Accumulated statistics are preserved; the token count is clamped to
	/// the new capacity.
	pub fn set_backend_config(&self, name: &str, config: RateLimiterSettings) {
		if let Some(mut bucket) = self.buckets.get_mut(name) {
			bucket.tokens = bucket.tokens.min(config.max_tokens as f64);
			bucket.config = config.clone();
		}
		self.overrides.insert(name.to_string(), config);
	}

	/// Refill a backend's bucket to capacity and zero its counters
	pub fn reset(&self, name: &str) {
		if let Some(mut bucket) = self.buckets.get_mut(name) {
			bucket.tokens = bucket.config.max_tokens as f64;
			bucket.last_refill = Instant::now();
			bucket.allowed = 0;
			bucket.rejected = 0;
			bucket.tokens_consumed = 0;
		}
	}

	/// Drop a backend's bucket entirely
	///
	/// Queued waiters are woken with a disposed error.
	pub fn remove(&self, name: &str) {
		self.buckets.remove(name);
		self.overrides.remove(name);
	}

	/// Stop the queue pump and wake all queued waiters
	///
	/// Required for clean shutdown; calling it more than once is a no-op.
	pub fn dispose(&self) {
		if self.disposed.swap(true, Ordering::SeqCst) {
			return;
		}

		let mut guard = match self.pump.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		};
		if let Some(handle) = guard.take() {
			handle.abort();
			debug!("Rate limiter queue pump stopped");
		}
		drop(guard);

		// Dropping the senders wakes every waiter with a disposed error
		for mut entry in self.buckets.iter_mut() {
			if !entry.queue.is_empty() {
				warn!(
					"Disposing rate limiter with {} queued waiter(s) for backend '{}'",
					entry.queue.len(),
					entry.key()
				);
			}
			entry.queue.clear();
		}
	}
}

impl Drop for RateLimiter {
	fn drop(&mut self) {
		let mut guard = match self.pump.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		};
		if let Some(handle) = guard.take() {
			handle.abort();
		}
	}
}

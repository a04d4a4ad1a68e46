// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for lifecycle operations.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	provider_lookups: AtomicU64,
	cache_hits: AtomicU64,
	invalidations: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_success: AtomicU64,
	refresh_failure: AtomicU64,
	sign_outs: AtomicU64,
}
impl LifecycleMetrics {
	/// Returns the number of calls made to the session provider.
	pub fn provider_lookups(&self) -> u64 {
		self.provider_lookups.load(Ordering::Relaxed)
	}

	/// Returns the number of lookups answered from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of cache invalidations triggered by authorization failures.
	pub fn invalidations(&self) -> u64 {
		self.invalidations.load(Ordering::Relaxed)
	}

	/// Returns the total number of refresh attempts.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that rotated the credential.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh calls (dead or transient).
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failure.load(Ordering::Relaxed)
	}

	/// Returns the number of forced sign-outs performed.
	pub fn sign_outs(&self) -> u64 {
		self.sign_outs.load(Ordering::Relaxed)
	}

	pub(crate) fn record_provider_lookup(&self) {
		self.provider_lookups.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_invalidation(&self) {
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_sign_out(&self) {
		self.sign_outs.fetch_add(1, Ordering::Relaxed);
	}
}

//! Single-flight session lookups backed by the credential cache.

// crates.io
use futures_util::{
	FutureExt,
	future::{BoxFuture, Shared},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	cache::CredentialCache,
	config::LifecycleConfig,
	flows::LifecycleMetrics,
	obs::{self, OpKind, OpOutcome, OpSpan},
	provider::SessionProvider,
};

type SharedFetch = Shared<BoxFuture<'static, Option<TokenSecret>>>;

#[derive(Default)]
struct InFlightSlot {
	generation: u64,
	pending: Option<SharedFetch>,
}

enum Lookup {
	Cached(TokenSecret),
	Pending(SharedFetch),
}

/// Clears the in-flight slot once the fetch that owns `generation` settles or is dropped.
struct InFlightGuard {
	slot: Arc<Mutex<InFlightSlot>>,
	generation: u64,
}
impl Drop for InFlightGuard {
	fn drop(&mut self) {
		let mut slot = self.slot.lock();

		if slot.generation == self.generation {
			slot.pending = None;
		}
	}
}

/// Resolves the current access token with at most one provider lookup in flight.
///
/// Callers that miss the cache while a lookup is running attach to it and receive the same
/// token (or the same absence). Dropping a caller's future never cancels the shared lookup.
/// A lookup that overlaps a cache write, such as an invalidation during sign-out, does not
/// store what it read.
#[derive(Clone)]
pub struct SessionFetcher {
	cache: Arc<CredentialCache>,
	provider: Arc<dyn SessionProvider>,
	config: Arc<LifecycleConfig>,
	metrics: Arc<LifecycleMetrics>,
	slot: Arc<Mutex<InFlightSlot>>,
}
impl SessionFetcher {
	pub(crate) fn new(
		cache: Arc<CredentialCache>,
		provider: Arc<dyn SessionProvider>,
		config: Arc<LifecycleConfig>,
		metrics: Arc<LifecycleMetrics>,
	) -> Self {
		Self { cache, provider, config, metrics, slot: Default::default() }
	}

	/// Returns the cached token when still usable, otherwise joins or starts a lookup.
	pub async fn resolve(&self) -> Option<TokenSecret> {
		match self.join_or_start() {
			Lookup::Cached(token) => Some(token),
			Lookup::Pending(fetch) => fetch.await,
		}
	}

	/// Returns `true` while a provider lookup is outstanding.
	pub fn is_in_flight(&self) -> bool {
		self.slot.lock().pending.is_some()
	}

	fn cached(&self) -> Option<TokenSecret> {
		let token = self.cache.usable_token_at(OffsetDateTime::now_utc())?;

		self.metrics.record_cache_hit();

		Some(token)
	}

	fn join_or_start(&self) -> Lookup {
		if let Some(token) = self.cached() {
			return Lookup::Cached(token);
		}

		let mut slot = self.slot.lock();

		if let Some(pending) = slot.pending.as_ref() {
			return Lookup::Pending(pending.clone());
		}
		// A lookup may have settled between the first cache read and taking the lock.
		if let Some(token) = self.cached() {
			return Lookup::Cached(token);
		}

		slot.generation = slot.generation.wrapping_add(1);

		let fetch = self.clone().fetch(slot.generation).boxed().shared();

		slot.pending = Some(fetch.clone());

		Lookup::Pending(fetch)
	}

	async fn fetch(self, generation: u64) -> Option<TokenSecret> {
		let _guard = InFlightGuard { slot: self.slot.clone(), generation };
		let span = OpSpan::new(OpKind::SessionFetch, "fetch");

		span.instrument(async move {
			obs::record_op_outcome(OpKind::SessionFetch, OpOutcome::Attempt);
			self.metrics.record_provider_lookup();

			let epoch = self.cache.epoch();
			let session = match self.provider.current_session().await {
				Ok(session) => session,
				Err(err) => {
					obs::warn_event(
						OpKind::SessionFetch,
						"session lookup failed; continuing unauthenticated",
						&err,
					);
					obs::record_op_outcome(OpKind::SessionFetch, OpOutcome::Failure);

					return None;
				},
			};

			obs::record_op_outcome(OpKind::SessionFetch, OpOutcome::Success);

			let Some(session) = session else {
				obs::debug_event(OpKind::SessionFetch, "no active session");

				return None;
			};
			let Some(token) = session.token().cloned() else {
				obs::debug_event(OpKind::SessionFetch, "session carries no access token");

				return None;
			};
			let now = OffsetDateTime::now_utc();
			let expires_at = self.config.session_expiry(now, session.expiry_hint());

			if !self.cache.set_if_unchanged(epoch, token.clone(), expires_at) {
				obs::debug_event(
					OpKind::SessionFetch,
					"cache changed during lookup; dropping the result",
				);

				return self.cache.usable_token_at(now);
			}
			if expires_at > now {
				Some(token)
			} else {
				obs::debug_event(OpKind::SessionFetch, "session token is already past its expiry");

				None
			}
		})
		.await
	}
}
impl Debug for SessionFetcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionFetcher").field("in_flight", &self.is_in_flight()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::Session,
		provider::{MemorySessionProvider, ProviderError},
	};

	fn config() -> Arc<LifecycleConfig> {
		let config = LifecycleConfig::builder()
			.refresh_endpoint(
				Url::parse("https://id.example.com/auth/refresh")
					.expect("Refresh endpoint fixture should parse."),
			)
			.sign_in_url(
				Url::parse("https://app.example.com/sign-in")
					.expect("Sign-in fixture should parse."),
			)
			.build()
			.expect("Lifecycle config fixture should be valid.");

		Arc::new(config)
	}

	fn fetcher(provider: &MemorySessionProvider) -> (SessionFetcher, Arc<CredentialCache>) {
		let cache = Arc::new(CredentialCache::default());
		let fetcher = SessionFetcher::new(
			cache.clone(),
			Arc::new(provider.clone()),
			config(),
			Arc::new(LifecycleMetrics::default()),
		);

		(fetcher, cache)
	}

	#[tokio::test]
	async fn cache_hit_skips_provider() {
		let provider = MemorySessionProvider::default();
		let (fetcher, cache) = fetcher(&provider);

		cache.set(TokenSecret::new("cached"), OffsetDateTime::now_utc() + Duration::minutes(5));

		let token = fetcher.resolve().await;

		assert_eq!(token.as_ref().map(TokenSecret::expose), Some("cached"));
		assert_eq!(provider.lookups(), 0);
		assert_eq!(fetcher.metrics.cache_hits(), 1);
	}

	#[tokio::test]
	async fn fetched_token_is_cached_with_margin() {
		let hint = OffsetDateTime::now_utc() + Duration::minutes(10);
		let provider = MemorySessionProvider::with_session(Session::new("A").with_expires_at(hint));
		let (fetcher, cache) = fetcher(&provider);
		let token = fetcher.resolve().await;

		assert_eq!(token.as_ref().map(TokenSecret::expose), Some("A"));
		assert!(!fetcher.is_in_flight());

		let credential = cache.get();
		let expected = hint - LifecycleConfig::DEFAULT_SAFETY_MARGIN;

		assert!((credential.expires_at - expected).abs() < Duration::milliseconds(2));

		fetcher.resolve().await;

		assert_eq!(provider.lookups(), 1);
	}

	#[tokio::test]
	async fn provider_failure_yields_none_and_clears_slot() {
		let provider = MemorySessionProvider::with_session(Session::new("A"));
		let (fetcher, cache) = fetcher(&provider);

		provider.fail_with(Some(ProviderError::Backend { message: "offline".into() }));

		assert!(fetcher.resolve().await.is_none());
		assert!(cache.get().is_missing());
		assert!(!fetcher.is_in_flight());

		provider.fail_with(None);

		let token = fetcher.resolve().await;

		assert_eq!(token.as_ref().map(TokenSecret::expose), Some("A"));
		assert_eq!(provider.lookups(), 2);
	}

	#[tokio::test]
	async fn stale_hint_is_cached_but_not_returned() {
		let past = OffsetDateTime::now_utc() - Duration::minutes(1);
		let provider =
			MemorySessionProvider::with_session(Session::new("old").with_expires_at(past));
		let (fetcher, cache) = fetcher(&provider);

		assert!(fetcher.resolve().await.is_none());
		assert!(!cache.get().is_missing());

		fetcher.resolve().await;

		assert_eq!(provider.lookups(), 2, "An expired cache entry should trigger a new lookup.");
	}

	#[tokio::test]
	async fn session_without_token_resolves_to_none() {
		let provider = MemorySessionProvider::with_session(Session::new("  "));
		let (fetcher, cache) = fetcher(&provider);

		assert!(fetcher.resolve().await.is_none());
		assert!(cache.get().is_missing());

		provider.replace(None);

		assert!(fetcher.resolve().await.is_none());
		assert_eq!(provider.lookups(), 2);
	}

	#[tokio::test]
	async fn earliest_representable_hint_does_not_panic() {
		let provider = MemorySessionProvider::with_session(
			Session::new("A").with_expires_at_ms(-377_705_116_800_000),
		);
		let (fetcher, cache) = fetcher(&provider);

		assert!(fetcher.resolve().await.is_none());
		assert!(!fetcher.is_in_flight());
		assert!(cache.get().expires_at <= OffsetDateTime::now_utc());
	}
}

//! Lifecycle orchestrators composed around one shared credential cache.

pub mod authorize;
pub mod fetch;
pub mod refresh;
pub mod sign_out;

mod metrics;
#[cfg(test)] mod fixtures;

pub use fetch::SessionFetcher;
pub use metrics::LifecycleMetrics;

// std
use std::sync::atomic::AtomicBool;
// self
use crate::{
	_prelude::*,
	cache::CredentialCache,
	config::LifecycleConfig,
	endpoint::TransportErrorMapper,
	http::AuthHttpClient,
	provider::{Navigator, SessionProvider},
};
#[cfg(feature = "reqwest")]
use crate::{endpoint::ReqwestTransportErrorMapper, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestSessionBroker = SessionBroker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Owns the lifecycle state of one client session.
///
/// The broker holds the credential cache, the single-flight session fetcher, the refresh
/// transport, and the sign-out collaborators. Clones share all of that state, so one broker
/// per signed-in client is enough; nothing lives in globals.
pub struct SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for refresh calls (and API calls on the reqwest stack).
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Validated lifecycle settings.
	pub config: Arc<LifecycleConfig>,
	/// External owner of the long-lived session.
	pub session_provider: Arc<dyn SessionProvider>,
	/// Performs the sign-out redirect.
	pub navigator: Arc<dyn Navigator>,
	/// Shared counters for lifecycle outcomes.
	pub metrics: Arc<LifecycleMetrics>,
	cache: Arc<CredentialCache>,
	fetcher: SessionFetcher,
	signing_out: Arc<AtomicBool>,
}
impl<C, M> SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: LifecycleConfig,
		session_provider: Arc<dyn SessionProvider>,
		navigator: Arc<dyn Navigator>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let config = Arc::new(config);
		let cache = Arc::new(CredentialCache::default());
		let metrics = Arc::new(LifecycleMetrics::default());
		let fetcher = SessionFetcher::new(
			cache.clone(),
			session_provider.clone(),
			config.clone(),
			metrics.clone(),
		);

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config,
			session_provider,
			navigator,
			metrics,
			cache,
			fetcher,
			signing_out: Default::default(),
		}
	}

	/// Returns the shared credential cache.
	pub fn cache(&self) -> &CredentialCache {
		&self.cache
	}

	/// Returns the single-flight session fetcher.
	pub fn fetcher(&self) -> &SessionFetcher {
		&self.fetcher
	}
}
#[cfg(feature = "reqwest")]
impl SessionBroker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new broker backed by a default reqwest transport.
	pub fn new(
		config: LifecycleConfig,
		session_provider: Arc<dyn SessionProvider>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self::with_http_client(
			config,
			session_provider,
			navigator,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Clone for SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			session_provider: self.session_provider.clone(),
			navigator: self.navigator.clone(),
			metrics: self.metrics.clone(),
			cache: self.cache.clone(),
			fetcher: self.fetcher.clone(),
			signing_out: self.signing_out.clone(),
		}
	}
}
impl<C, M> Debug for SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionBroker")
			.field("config", &self.config)
			.field("credential", &self.cache.get())
			.field("fetch_in_flight", &self.fetcher.is_in_flight())
			.finish()
	}
}

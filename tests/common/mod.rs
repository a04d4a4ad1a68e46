#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use httpmock::MockServer;
use parking_lot::Mutex;
// self
use session_broker::{
	auth::Session,
	config::LifecycleConfig,
	endpoint::ReqwestTransportErrorMapper,
	flows::{ReqwestSessionBroker, SessionBroker},
	http::ReqwestHttpClient,
	provider::{MemorySessionProvider, Navigator, ProviderError, ProviderFuture, SessionProvider},
	url::Url,
};

pub const CURRENT_LOCATION: &str = "/players/42?tab=reports";

/// Wraps [`MemorySessionProvider`] with an artificial lookup latency so concurrent callers
/// overlap.
#[derive(Clone)]
pub struct SlowSessionProvider {
	pub inner: MemorySessionProvider,
	delay: StdDuration,
	clear_delay: StdDuration,
	lookups: Arc<AtomicU64>,
}
impl SlowSessionProvider {
	pub fn new(session: Option<Session>, delay: StdDuration) -> Self {
		let inner = MemorySessionProvider::default();

		inner.replace(session);

		Self {
			inner,
			delay,
			clear_delay: StdDuration::ZERO,
			lookups: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Holds every `clear_session` call open for `delay` so sign-outs overlap.
	pub fn with_clear_delay(mut self, delay: StdDuration) -> Self {
		self.clear_delay = delay;

		self
	}

	pub fn lookups(&self) -> u64 {
		self.lookups.load(Ordering::SeqCst)
	}
}
impl SessionProvider for SlowSessionProvider {
	fn current_session(&self) -> ProviderFuture<'_, Option<Session>> {
		Box::pin(async move {
			self.lookups.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(self.delay).await;

			self.inner.current_session().await
		})
	}

	fn clear_session(&self) -> ProviderFuture<'_, ()> {
		Box::pin(async move {
			tokio::time::sleep(self.clear_delay).await;

			self.inner.clear_session().await
		})
	}
}

/// Reads the session as soon as a lookup starts but only answers after `delay`.
///
/// Models a backend whose response was already in flight when the session was destroyed.
#[derive(Clone)]
pub struct LaggingSessionProvider {
	pub inner: MemorySessionProvider,
	delay: StdDuration,
}
impl LaggingSessionProvider {
	pub fn new(session: Session, delay: StdDuration) -> Self {
		Self { inner: MemorySessionProvider::with_session(session), delay }
	}
}
impl SessionProvider for LaggingSessionProvider {
	fn current_session(&self) -> ProviderFuture<'_, Option<Session>> {
		Box::pin(async move {
			let snapshot = self.inner.current_session().await;

			tokio::time::sleep(self.delay).await;

			snapshot
		})
	}

	fn clear_session(&self) -> ProviderFuture<'_, ()> {
		self.inner.clear_session()
	}
}

/// Provider whose lookups always fail.
pub struct BrokenSessionProvider;
impl SessionProvider for BrokenSessionProvider {
	fn current_session(&self) -> ProviderFuture<'_, Option<Session>> {
		Box::pin(async { Err(ProviderError::Backend { message: "session store offline".into() }) })
	}

	fn clear_session(&self) -> ProviderFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
	pub redirects: Mutex<Vec<Url>>,
}
impl RecordingNavigator {
	pub fn redirect_count(&self) -> usize {
		self.redirects.lock().len()
	}

	pub fn callback_targets(&self) -> Vec<String> {
		self.redirects
			.lock()
			.iter()
			.filter_map(|url| {
				url.query_pairs().find(|(key, _)| key == "callbackUrl").map(|(_, value)| value.into())
			})
			.collect()
	}
}
impl Navigator for RecordingNavigator {
	fn current_location(&self) -> String {
		CURRENT_LOCATION.into()
	}

	fn redirect(&self, target: &Url) {
		self.redirects.lock().push(target.clone());
	}
}

pub fn lifecycle_config(server: &MockServer) -> LifecycleConfig {
	LifecycleConfig::builder()
		.identity_base(
			Url::parse(&server.base_url()).expect("Mock identity base should parse successfully."),
		)
		.sign_in_url(
			Url::parse("https://app.example.com/sign-in")
				.expect("Sign-in URL fixture should parse successfully."),
		)
		.build()
		.expect("Lifecycle config should build against the mock server.")
}

pub fn build_test_broker(
	server: &MockServer,
	provider: Arc<dyn SessionProvider>,
) -> (ReqwestSessionBroker, Arc<RecordingNavigator>) {
	let navigator = Arc::new(RecordingNavigator::default());
	let broker = SessionBroker::with_http_client(
		lifecycle_config(server),
		provider,
		navigator.clone(),
		ReqwestHttpClient::default(),
		ReqwestTransportErrorMapper,
	);

	(broker, navigator)
}

//! Thread-safe in-memory [`SessionProvider`] for local development, demos, and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Session,
	provider::{ProviderError, ProviderFuture, SessionProvider},
};

type SessionSlot = Arc<RwLock<Option<Session>>>;

/// Session provider that keeps the session in-process and counts lookups.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionProvider {
	session: SessionSlot,
	failure: Arc<RwLock<Option<ProviderError>>>,
	lookups: Arc<AtomicU64>,
	clears: Arc<AtomicU64>,
}
impl MemorySessionProvider {
	/// Creates a provider already holding `session`.
	pub fn with_session(session: Session) -> Self {
		let provider = Self::default();

		provider.replace(Some(session));

		provider
	}

	/// Replaces the stored session (`None` signs the user out).
	pub fn replace(&self, session: Option<Session>) {
		*self.session.write() = session;
	}

	/// Returns the stored session without counting a lookup.
	pub fn peek(&self) -> Option<Session> {
		self.session.read().clone()
	}

	/// Makes every subsequent lookup and clear fail with `error` until reset with `None`.
	pub fn fail_with(&self, error: Option<ProviderError>) {
		*self.failure.write() = error;
	}

	/// Number of [`SessionProvider::current_session`] calls observed.
	pub fn lookups(&self) -> u64 {
		self.lookups.load(Ordering::SeqCst)
	}

	/// Number of [`SessionProvider::clear_session`] calls observed.
	pub fn clears(&self) -> u64 {
		self.clears.load(Ordering::SeqCst)
	}

	fn lookup_now(&self) -> Result<Option<Session>, ProviderError> {
		self.lookups.fetch_add(1, Ordering::SeqCst);

		if let Some(err) = self.failure.read().clone() {
			return Err(err);
		}

		Ok(self.session.read().clone())
	}
}
impl SessionProvider for MemorySessionProvider {
	fn current_session(&self) -> ProviderFuture<'_, Option<Session>> {
		let result = self.lookup_now();

		Box::pin(async move { result })
	}

	fn clear_session(&self) -> ProviderFuture<'_, ()> {
		self.clears.fetch_add(1, Ordering::SeqCst);

		let result = match self.failure.read().clone() {
			Some(err) => Err(err),
			None => {
				self.replace(None);

				Ok(())
			},
		};

		Box::pin(async move { result })
	}
}

//! Contracts for the collaborators the broker consumes but never implements: the session
//! provider that owns the long-lived session, and the navigator that performs redirects.

pub mod memory;

pub use memory::MemorySessionProvider;

// self
use crate::{_prelude::*, auth::Session};

/// Boxed future returned by [`SessionProvider`] operations.
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Source of the current session (cookie jar, OS keychain, desktop auth bridge, etc.).
///
/// Lookups are treated as comparatively expensive; the broker never issues more than one at a
/// time per cache-miss episode.
pub trait SessionProvider
where
	Self: Send + Sync,
{
	/// Resolves the current session, or `None` when nobody is signed in.
	fn current_session(&self) -> ProviderFuture<'_, Option<Session>>;

	/// Destroys the long-lived session during forced sign-out.
	fn clear_session(&self) -> ProviderFuture<'_, ()>;
}

/// Performs the user-visible navigation for forced sign-out.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Returns the location the user is currently viewing, used as the post-login target.
	fn current_location(&self) -> String;

	/// Navigates to `target`.
	fn redirect(&self, target: &Url);
}

/// Error type produced by [`SessionProvider`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderError {
	/// Session payload could not be decoded.
	#[error("Session payload is malformed: {message}.")]
	Malformed {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the session source.
	#[error("Session provider failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

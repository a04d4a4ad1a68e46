//! Forced sign-out and the watcher that applies it to broken sessions.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use futures_util::{Stream, StreamExt, pin_mut};
// self
use crate::{
	_prelude::*,
	auth::{Session, TokenSecret},
	endpoint::TransportErrorMapper,
	flows::SessionBroker,
	http::AuthHttpClient,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Releases the sign-out latch when the teardown that set it settles or is dropped.
struct SignOutLatch<'a>(&'a AtomicBool);
impl<'a> SignOutLatch<'a> {
	fn acquire(flag: &'a AtomicBool) -> Option<Self> {
		(!flag.swap(true, Ordering::AcqRel)).then_some(Self(flag))
	}
}
impl Drop for SignOutLatch<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

impl<C, M> SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Tears down the session and sends the user to sign-in, returning to `return_path` after.
	///
	/// Calls that arrive while another sign-out is still tearing down return `Ok(None)`
	/// without navigating. Once a sign-out finishes, the next call navigates again. Navigation
	/// happens even when the provider fails to clear the session, in which case that failure
	/// is returned.
	pub async fn force_sign_out(&self, return_path: &str) -> Result<Option<Url>> {
		const KIND: OpKind = OpKind::SignOut;

		let Some(_latch) = SignOutLatch::acquire(&self.signing_out) else {
			obs::debug_event(KIND, "sign-out already in progress");

			return Ok(None);
		};

		let span = OpSpan::new(KIND, "force_sign_out");

		span.instrument(async move {
			obs::record_op_outcome(KIND, OpOutcome::Attempt);
			self.cache.invalidate();

			let cleared = self.session_provider.clear_session().await;
			let target = self.config.sign_in_redirect(return_path);

			self.navigator.redirect(&target);
			self.metrics.record_sign_out();

			match cleared {
				Ok(()) => {
					obs::record_op_outcome(KIND, OpOutcome::Success);

					Ok(Some(target))
				},
				Err(err) => {
					obs::warn_event(KIND, "session provider failed to clear the session", &err);
					obs::record_op_outcome(KIND, OpOutcome::Failure);

					Err(err.into())
				},
			}
		})
		.await
	}

	/// Signs out when an otherwise authenticated session carries the provider's error flag.
	pub async fn observe_session(&self, session: Option<&Session>) -> Result<Option<Url>> {
		match session {
			Some(session) if session.is_authenticated() && session.has_error() => {
				obs::debug_event(OpKind::SignOut, "session reports a failed background refresh");

				let return_path = self.navigator.current_location();

				self.force_sign_out(&return_path).await
			},
			_ => Ok(None),
		}
	}

	/// Applies [`Self::observe_session`] to every snapshot until `sessions` ends.
	///
	/// A session that stays flagged across consecutive snapshots is signed out once; the
	/// watcher reacts again only after the flag clears or the token changes. Returns how many
	/// snapshots led to a sign-out redirect. Provider failures during teardown are logged and
	/// do not stop the watcher.
	pub async fn watch_sessions<S>(&self, sessions: S) -> u64
	where
		S: Stream<Item = Option<Session>>,
	{
		pin_mut!(sessions);

		let mut sign_outs = 0;
		let mut handled: Option<TokenSecret> = None;

		while let Some(session) = sessions.next().await {
			let flagged = session
				.as_ref()
				.filter(|session| session.has_error())
				.and_then(|session| session.token().cloned());

			if flagged.is_some() && flagged == handled {
				continue;
			}

			handled = flagged;

			match self.observe_session(session.as_ref()).await {
				Ok(Some(_)) => sign_outs += 1,
				Ok(None) => (),
				Err(err) => {
					obs::warn_event(OpKind::SignOut, "watcher sign-out was incomplete", &err);

					sign_outs += 1;
				},
			}
		}

		sign_outs
	}
}

//! Refresh token exchange with dead-token escalation.
//!
//! [`SessionBroker::refresh`] posts the refresh token to the identity provider and drives one
//! attempt to a terminal state. Transient failures leave the cache and the session untouched.
//! A dead token invalidates the cache and forces the user back through sign-in before the
//! error reaches the caller.

// crates.io
use oauth2::AsyncHttpClient;
// self
use crate::{
	_prelude::*,
	auth::{RotatedCredential, TokenSecret},
	endpoint::{self, RefreshGrant, RefreshOutcome, TransportErrorMapper},
	flows::SessionBroker,
	http::{AuthHttpClient, ResponseMetadataSlot},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

impl<C, M> SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges `refresh_token` for a new credential pair.
	///
	/// # Errors
	///
	/// - [`Error::Transient`] / [`Error::Transport`] when the endpoint or network failed
	///   temporarily; the cache and the session are left as they were.
	/// - [`Error::RefreshDead`] after the cache was invalidated and the forced sign-out ran.
	pub async fn refresh(&self, refresh_token: &str) -> Result<RotatedCredential> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		let outcome = span.instrument(self.exchange(refresh_token)).await;

		match outcome {
			Ok(RefreshOutcome::Rotated(grant)) => {
				let rotated = self.store_rotation(refresh_token, grant);

				obs::record_op_outcome(KIND, OpOutcome::Success);
				self.metrics.record_refresh_success();

				Ok(rotated)
			},
			Ok(RefreshOutcome::Dead { reason }) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				self.metrics.record_refresh_failure();

				Err(self.escalate(reason).await)
			},
			Ok(RefreshOutcome::TransientFailure(err)) | Err(err) => {
				obs::warn_event(KIND, "refresh failed; session left intact", &err);
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				self.metrics.record_refresh_failure();

				Err(err)
			},
		}
	}

	async fn exchange(&self, refresh_token: &str) -> Result<RefreshOutcome> {
		if refresh_token.trim().is_empty() {
			return Ok(RefreshOutcome::Dead { reason: "refresh token is empty".into() });
		}

		let request =
			endpoint::build_refresh_request(&self.config.refresh_endpoint, refresh_token)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());

		match handle.call(request).await {
			Ok(response) =>
				Ok(endpoint::classify_refresh_response(&response, slot.take().as_ref())),
			Err(err) => {
				let meta = slot.take();

				Ok(RefreshOutcome::TransientFailure(
					self.transport_mapper.map_transport_error(meta.as_ref(), err),
				))
			},
		}
	}

	fn store_rotation(&self, refresh_token: &str, grant: RefreshGrant) -> RotatedCredential {
		let now = OffsetDateTime::now_utc();
		let expires_at = self.config.rotated_expiry(now, grant.expires_in);

		self.cache.set(grant.access_token.clone(), expires_at);

		let refresh_rotated = grant.refresh_token.is_some();

		RotatedCredential {
			access_token: grant.access_token,
			refresh_token: grant.refresh_token.unwrap_or_else(|| TokenSecret::new(refresh_token)),
			refresh_rotated,
			expires_at,
		}
	}

	async fn escalate(&self, reason: String) -> Error {
		obs::warn_event(OpKind::Refresh, "refresh token is dead; forcing sign-out", &reason);
		self.cache.invalidate();

		let return_path = self.navigator.current_location();

		if let Err(err) = self.force_sign_out(&return_path).await {
			obs::warn_event(OpKind::SignOut, "session teardown failed during escalation", &err);
		}

		Error::RefreshDead { reason }
	}
}

//! Read-only view of the session object owned by the external session provider.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Session snapshot published by the session provider.
///
/// The broker only reads the access token, the optional expiry hint, and the error marker;
/// everything else about the session stays with the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	/// Access token issued for the session, if any.
	#[serde(default)]
	pub access_token: Option<TokenSecret>,
	/// Provider-reported expiry as milliseconds since the Unix epoch.
	#[serde(default)]
	pub expires_at: Option<i64>,
	/// Error marker set when a background refresh elsewhere failed.
	#[serde(default)]
	pub error: Option<String>,
}
impl Session {
	/// Creates a session carrying `access_token` and no expiry hint.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::non_blank(access_token), expires_at: None, error: None }
	}

	/// Sets the expiry hint in epoch milliseconds.
	pub fn with_expires_at_ms(mut self, epoch_ms: i64) -> Self {
		self.expires_at = Some(epoch_ms);

		self
	}

	/// Sets the expiry hint from an absolute instant.
	pub fn with_expires_at(self, instant: OffsetDateTime) -> Self {
		let epoch_ms = (instant.unix_timestamp_nanos() / 1_000_000) as i64;

		self.with_expires_at_ms(epoch_ms)
	}

	/// Sets the error marker.
	pub fn with_error(mut self, error: impl Into<String>) -> Self {
		self.error = Some(error.into());

		self
	}

	/// Returns the usable access token, skipping blank values.
	pub fn token(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref().filter(|token| !token.expose().trim().is_empty())
	}

	/// Converts the epoch-millisecond hint into an instant, if present and representable.
	pub fn expiry_hint(&self) -> Option<OffsetDateTime> {
		let epoch_ms = self.expires_at?;

		OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000).ok()
	}

	/// Returns `true` when the session carries an access token.
	pub fn is_authenticated(&self) -> bool {
		self.token().is_some()
	}

	/// Returns `true` when the provider flagged the session as broken.
	pub fn has_error(&self) -> bool {
		self.error.as_deref().is_some_and(|error| !error.is_empty())
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("error", &self.error)
			.finish()
	}
}

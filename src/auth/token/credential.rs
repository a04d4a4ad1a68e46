//! Cached credential snapshots and rotation results.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Current lifecycle status for a cached credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// No access token is cached.
	Missing,
	/// Token may be attached to requests.
	Active,
	/// Token reached its (margin-adjusted) expiry instant.
	Expired,
}

/// Access token plus the instant after which it must not be attached to requests.
///
/// `expires_at` is already shrunk by the safety margin, so the token stops being usable
/// before the provider would actually reject it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Cached access token, if any.
	pub access_token: Option<TokenSecret>,
	/// Conservative expiry instant.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Credential reported after invalidation or before the first lookup.
	pub fn missing() -> Self {
		Self { access_token: None, expires_at: OffsetDateTime::UNIX_EPOCH }
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> CredentialStatus {
		if self.access_token.is_none() {
			return CredentialStatus::Missing;
		}
		if self.expires_at <= instant {
			return CredentialStatus::Expired;
		}

		CredentialStatus::Active
	}

	/// Returns the token only when it is still usable at `instant`.
	pub fn usable_at(&self, instant: OffsetDateTime) -> Option<&TokenSecret> {
		match self.status_at(instant) {
			CredentialStatus::Active => self.access_token.as_ref(),
			CredentialStatus::Missing | CredentialStatus::Expired => None,
		}
	}

	/// Returns `true` if no access token is cached.
	pub fn is_missing(&self) -> bool {
		self.access_token.is_none()
	}
}
impl Default for Credential {
	fn default() -> Self {
		Self::missing()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Credential pair returned by a successful refresh exchange.
#[derive(Clone)]
pub struct RotatedCredential {
	/// New access token, already written into the cache.
	pub access_token: TokenSecret,
	/// Rotated refresh token, or the original one when the provider did not rotate it.
	pub refresh_token: TokenSecret,
	/// Whether the provider actually issued a new refresh token.
	pub refresh_rotated: bool,
	/// Margin-adjusted expiry stored in the cache.
	pub expires_at: OffsetDateTime,
}
impl Debug for RotatedCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RotatedCredential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("refresh_rotated", &self.refresh_rotated)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

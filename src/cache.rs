//! In-process credential cache shared by the fetcher, authorizer, and refresh coordinator.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
};

#[derive(Debug, Default)]
struct Entry {
	credential: Credential,
	epoch: u64,
}
impl Entry {
	fn replace(&mut self, credential: Credential) {
		self.credential = credential;
		self.epoch = self.epoch.wrapping_add(1);
	}
}

/// Holds the current access token and its conservative expiry instant.
///
/// Every operation is synchronous; readers see either the previous credential or the new one,
/// never a token paired with another token's expiry. Each write advances an epoch so a
/// lookup that started before the write can tell its result is outdated.
#[derive(Debug, Default)]
pub struct CredentialCache(RwLock<Entry>);
impl CredentialCache {
	/// Returns a snapshot of the cached credential. Never performs I/O.
	pub fn get(&self) -> Credential {
		self.0.read().credential.clone()
	}

	/// Returns the cached token when it is still usable at `now`.
	pub fn usable_token_at(&self, now: OffsetDateTime) -> Option<TokenSecret> {
		self.0.read().credential.usable_at(now).cloned()
	}

	/// Returns the number of writes applied so far.
	pub fn epoch(&self) -> u64 {
		self.0.read().epoch
	}

	/// Replaces both fields in one write.
	pub fn set(&self, access_token: TokenSecret, expires_at: OffsetDateTime) {
		self.0.write().replace(Credential { access_token: Some(access_token), expires_at });
	}

	/// Stores the credential only if nothing was written since `epoch` was read.
	///
	/// Returns `false` and leaves the cache untouched when a newer write or an invalidation
	/// got there first.
	pub fn set_if_unchanged(
		&self,
		epoch: u64,
		access_token: TokenSecret,
		expires_at: OffsetDateTime,
	) -> bool {
		let mut entry = self.0.write();

		if entry.epoch != epoch {
			return false;
		}

		entry.replace(Credential { access_token: Some(access_token), expires_at });

		true
	}

	/// Drops the cached credential so the next lookup resolves a fresh one.
	pub fn invalidate(&self) {
		self.0.write().replace(Credential::missing());
	}
}

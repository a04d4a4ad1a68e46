//! Bearer attachment for outgoing API requests.

// crates.io
use oauth2::http::header::{AUTHORIZATION, HeaderValue};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Request types the authorizer can inspect and decorate with a bearer credential.
pub trait BearerTarget {
	/// Returns `true` when the caller already supplied an `Authorization` header.
	fn has_authorization(&self) -> bool;

	/// Sets `Authorization: Bearer <token>`.
	fn attach_bearer(&mut self, token: &TokenSecret) -> Result<()>;
}
impl<B> BearerTarget for oauth2::http::Request<B> {
	fn has_authorization(&self) -> bool {
		self.headers().contains_key(AUTHORIZATION)
	}

	fn attach_bearer(&mut self, token: &TokenSecret) -> Result<()> {
		self.headers_mut().insert(AUTHORIZATION, bearer_value(token)?);

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl BearerTarget for reqwest::Request {
	fn has_authorization(&self) -> bool {
		self.headers().contains_key(AUTHORIZATION)
	}

	fn attach_bearer(&mut self, token: &TokenSecret) -> Result<()> {
		self.headers_mut().insert(AUTHORIZATION, bearer_value(token)?);

		Ok(())
	}
}

fn bearer_value(token: &TokenSecret) -> Result<HeaderValue> {
	let mut value = HeaderValue::from_str(&token.bearer()).map_err(ConfigError::from)?;

	value.set_sensitive(true);

	Ok(value)
}

//! Status inspection for responses observed by the post-response hook.

/// Exposes the HTTP status of a response, or of an error that carries one.
pub trait ResponseStatus {
	/// HTTP status code, when known.
	fn status_code(&self) -> Option<u16>;

	/// Returns `true` when the status reports an authorization failure.
	fn is_unauthorized(&self) -> bool {
		self.status_code() == Some(401)
	}
}
impl<B> ResponseStatus for oauth2::http::Response<B> {
	fn status_code(&self) -> Option<u16> {
		Some(self.status().as_u16())
	}
}
#[cfg(feature = "reqwest")]
impl ResponseStatus for reqwest::Response {
	fn status_code(&self) -> Option<u16> {
		Some(self.status().as_u16())
	}
}
#[cfg(feature = "reqwest")]
impl ResponseStatus for reqwest::Error {
	fn status_code(&self) -> Option<u16> {
		self.status().map(|code| code.as_u16())
	}
}
impl<T, E> ResponseStatus for Result<T, E>
where
	T: ResponseStatus,
	E: ResponseStatus,
{
	fn status_code(&self) -> Option<u16> {
		match self {
			Ok(response) => response.status_code(),
			Err(err) => err.status_code(),
		}
	}
}

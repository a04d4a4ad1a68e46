//! Pre-request and post-response hooks that keep outgoing API calls authorized.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	endpoint::TransportErrorMapper,
	ext::{BearerTarget, ResponseStatus},
	flows::SessionBroker,
	http::AuthHttpClient,
	obs::{self, OpKind, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

impl<C, M> SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Resolves the current access token through the cache and the single-flight fetcher.
	pub async fn resolve_token(&self) -> Option<TokenSecret> {
		self.fetcher.resolve().await
	}

	/// Attaches `Authorization: Bearer <token>` unless the request already carries a header.
	///
	/// When no token can be resolved the request is returned unauthenticated and the server
	/// decides.
	pub async fn authorize<R>(&self, mut request: R) -> Result<R>
	where
		R: BearerTarget,
	{
		if request.has_authorization() {
			obs::debug_event(OpKind::Authorize, "request carries its own authorization");

			return Ok(request);
		}

		let span = OpSpan::new(OpKind::Authorize, "authorize");

		span.instrument(async move {
			obs::record_op_outcome(OpKind::Authorize, OpOutcome::Attempt);

			if let Some(token) = self.resolve_token().await {
				if let Err(err) = request.attach_bearer(&token) {
					obs::record_op_outcome(OpKind::Authorize, OpOutcome::Failure);

					return Err(err);
				}
			} else {
				obs::debug_event(OpKind::Authorize, "no token available; sending anonymously");
			}

			obs::record_op_outcome(OpKind::Authorize, OpOutcome::Success);

			Ok(request)
		})
		.await
	}

	/// Invalidates the cache when `response` reports HTTP 401, then hands it back unchanged.
	///
	/// The request is never retried here; the next call resolves a fresh credential.
	pub fn on_response<R>(&self, response: R) -> R
	where
		R: ResponseStatus,
	{
		if response.is_unauthorized() {
			obs::debug_event(OpKind::Authorize, "unauthorized response; invalidating credential");
			self.cache.invalidate();
			self.metrics.record_invalidation();
		}

		response
	}

	/// Drops the cached credential.
	pub fn invalidate(&self) {
		self.cache.invalidate();
	}
}

#[cfg(feature = "reqwest")]
impl<C, M> SessionBroker<C, M>
where
	C: ?Sized + AuthHttpClient + AsRef<ReqwestClient>,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends `request` through the broker's reqwest client with both hooks applied.
	///
	/// Non-2xx responses, 401 included, come back as `Ok`; only transport failures are errors.
	pub async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response> {
		let request = self.authorize(request).await?;
		let client: &ReqwestClient = (*self.http_client).as_ref();

		match client.execute(request).await {
			Ok(response) => Ok(self.on_response(response)),
			Err(err) =>
				Err(TransportError::network("the API server", self.on_response(err)).into()),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{Request, Response, StatusCode, header::AUTHORIZATION};
	// self
	use super::*;
	use crate::{
		auth::Session,
		flows::fixtures::{self, OfflineBroker},
		provider::MemorySessionProvider,
	};

	fn broker(provider: &MemorySessionProvider) -> OfflineBroker {
		fixtures::offline_broker(provider).0
	}

	fn request() -> Request<Vec<u8>> {
		Request::builder()
			.uri("https://api.example.com/players")
			.body(Vec::new())
			.expect("Request fixture should build.")
	}

	#[tokio::test]
	async fn attaches_resolved_token() {
		let provider = MemorySessionProvider::with_session(Session::new("A"));
		let broker = broker(&provider);
		let request = broker.authorize(request()).await.expect("Authorization should succeed.");

		assert_eq!(
			request.headers().get(AUTHORIZATION).map(|value| value.as_bytes()),
			Some(b"Bearer A".as_slice())
		);
	}

	#[tokio::test]
	async fn explicit_authorization_is_left_alone() {
		let provider = MemorySessionProvider::with_session(Session::new("A"));
		let broker = broker(&provider);
		let mut request = request();

		request.headers_mut().insert(
			AUTHORIZATION,
			"Basic Zm9vOmJhcg==".parse().expect("Header fixture should parse."),
		);

		let request = broker.authorize(request).await.expect("Authorization should succeed.");

		assert_eq!(
			request.headers().get(AUTHORIZATION).map(|value| value.as_bytes()),
			Some(b"Basic Zm9vOmJhcg==".as_slice())
		);
		assert_eq!(provider.lookups(), 0);
	}

	#[tokio::test]
	async fn missing_session_sends_anonymously() {
		let provider = MemorySessionProvider::default();
		let broker = broker(&provider);
		let request = broker.authorize(request()).await.expect("Authorization should succeed.");

		assert!(!request.headers().contains_key(AUTHORIZATION));
	}

	#[tokio::test]
	async fn unauthorized_response_invalidates_and_passes_through() {
		let provider = MemorySessionProvider::with_session(Session::new("A"));
		let broker = broker(&provider);

		broker.resolve_token().await;

		let mut response = Response::new("denied");

		*response.status_mut() = StatusCode::UNAUTHORIZED;

		let response = broker.on_response(response);

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(*response.body(), "denied");
		assert!(broker.cache().get().is_missing());
		assert_eq!(broker.metrics.invalidations(), 1);

		let response = broker.on_response(Response::new("ok"));

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(broker.metrics.invalidations(), 1);
	}
}

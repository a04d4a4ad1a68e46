//! Transport seam for the refresh endpoint.
//!
//! Refresh classification needs the HTTP status and `Retry-After` hint even when the body
//! cannot be read, so transports report both through a [`ResponseMetadataSlot`] that the
//! refresh coordinator inspects after every call.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use oauth2::http::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// A transport the broker can post refresh requests through.
///
/// One transport is shared by every clone of a broker. Each refresh gets its own handle, and
/// the handle owns what its request future needs.
pub trait AuthHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Error raised by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Per-call handle that reports into a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle for one refresh call.
	///
	/// The handle empties `slot` before sending and stores the response status and retry hint
	/// as soon as the headers arrive, before the body is read.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Status line details of the last refresh response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Hands [`ResponseMetadata`] from a transport handle back to the refresh coordinator.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Records the metadata of the response being handled.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Removes and returns the recorded metadata.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// The reqwest client behind a broker.
///
/// API calls made through `SessionBroker::send` use the client as is. Refresh calls go through
/// [`RefreshCall`], which also records the status and `Retry-After` hint of each response.
/// A redirect from the refresh endpoint usually means the identity provider wants a fresh
/// login, so custom clients should not follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl AuthHttpClient for ReqwestHttpClient {
	type Handle = RefreshCall;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		RefreshCall { client: self.0.clone(), slot }
	}
}

/// One refresh exchange over reqwest, reporting response metadata into its slot.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct RefreshCall {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl RefreshCall {
	async fn exchange(
		&self,
		request: HttpRequest,
	) -> Result<HttpResponse, HttpClientError<ReqwestError>> {
		self.slot.take();

		let request = reqwest::Request::try_from(request).map_err(Box::new)?;
		let response = self.client.execute(request).await.map_err(Box::new)?;
		let status = response.status();
		let headers = response.headers().clone();

		self.slot.store(ResponseMetadata {
			status: Some(status.as_u16()),
			retry_after: parse_retry_after(&headers),
		});

		let body = response.bytes().await.map_err(Box::new)?;
		let mut refreshed = HttpResponse::new(body.to_vec());

		*refreshed.status_mut() = status;
		*refreshed.headers_mut() = headers;

		Ok(refreshed)
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for RefreshCall {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(self.exchange(request))
	}
}

#[cfg(feature = "reqwest")]
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

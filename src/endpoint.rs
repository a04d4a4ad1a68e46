//! Wire format and outcome classification for the identity provider's refresh endpoint.
//!
//! The endpoint accepts `POST { "refreshToken": ... }` and answers with
//! `{ "accessToken", "refreshToken"?, "expiresIn"? }` (seconds). [`classify_refresh_response`]
//! turns the raw HTTP status and body into a [`RefreshOutcome`] so the coordinator only has to
//! act on the three terminal states.

// crates.io
use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE, HeaderValue},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransientError, TransportError},
	http::ResponseMetadata,
};

#[cfg(feature = "reqwest")]
const TARGET: &str = "the refresh endpoint";
const JSON: &str = "application/json";

/// JSON body sent to the refresh endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequestBody<'a> {
	/// Refresh token being exchanged.
	pub refresh_token: &'a str,
}

/// JSON body returned by the refresh endpoint on success.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponseBody {
	/// New access token; absence makes the response unusable.
	#[serde(default)]
	pub access_token: Option<String>,
	/// Rotated refresh token, when the provider rotates.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Lifetime of the new access token in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
}
impl Debug for RefreshResponseBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshResponseBody")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Tokens extracted from a well-formed refresh response.
#[derive(Clone, Debug)]
pub struct RefreshGrant {
	/// New access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Reported lifetime of the access token.
	pub expires_in: Option<Duration>,
}

/// Terminal state of one refresh attempt.
#[derive(Debug)]
pub enum RefreshOutcome {
	/// A well-formed response carried a new access token.
	Rotated(RefreshGrant),
	/// The refresh token can never succeed again (authorization failure or malformed body).
	Dead {
		/// Why the refresh token was declared dead.
		reason: String,
	},
	/// Temporary failure; the session stays intact and the caller may retry.
	TransientFailure(Error),
}

/// Builds the `POST` request for `refresh_token`.
pub fn build_refresh_request(endpoint: &Url, refresh_token: &str) -> Result<HttpRequest> {
	let body = serde_json::to_vec(&RefreshRequestBody { refresh_token })
		.map_err(ConfigError::RequestEncode)?;
	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static(JSON))
		.header(ACCEPT, HeaderValue::from_static(JSON))
		.body(body)
		.map_err(ConfigError::from)?;

	Ok(request)
}

/// Classifies a completed HTTP exchange with the refresh endpoint.
pub fn classify_refresh_response(
	response: &HttpResponse,
	meta: Option<&ResponseMetadata>,
) -> RefreshOutcome {
	let status = response.status();

	if matches!(status.as_u16(), 401 | 403) {
		return RefreshOutcome::Dead {
			reason: format!("refresh endpoint rejected the token with HTTP {}", status.as_u16()),
		};
	}
	if !status.is_success() {
		return RefreshOutcome::TransientFailure(
			TransientError::RefreshEndpoint {
				message: format!("HTTP {} {}", status.as_u16(), body_preview(response.body())),
				status: Some(status.as_u16()),
				retry_after: meta.and_then(|value| value.retry_after),
			}
			.into(),
		);
	}

	let deserializer = &mut serde_json::Deserializer::from_slice(response.body());
	let body: RefreshResponseBody = match serde_path_to_error::deserialize(deserializer) {
		Ok(body) => body,
		Err(err) =>
			return RefreshOutcome::Dead {
				reason: format!("refresh response is malformed at `{}`", err.path()),
			},
	};
	let Some(access_token) = body.access_token.and_then(TokenSecret::non_blank) else {
		return RefreshOutcome::Dead { reason: "refresh response is missing accessToken".into() };
	};

	RefreshOutcome::Rotated(RefreshGrant {
		access_token,
		refresh_token: body.refresh_token.and_then(TokenSecret::non_blank),
		expires_in: body.expires_in.map(Duration::seconds),
	})
}

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a broker error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown transport failure"),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::RefreshEndpoint {
			message: "request timed out".into(),
			status: meta
				.and_then(|value| value.status)
				.or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta.and_then(|value| value.retry_after),
		}
		.into();
	}

	TransportError::network(TARGET, err).into()
}

/// Wraps an opaque transport failure as a transient refresh error.
pub fn map_generic_transport_error(
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::RefreshEndpoint {
		message: format!("HTTP client error: {message}"),
		status: meta.and_then(|value| value.status),
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

fn body_preview(body: &[u8]) -> String {
	const LIMIT: usize = 256;

	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= LIMIT {
		return text.into_owned();
	}

	let mut buf: String = text.chars().take(LIMIT).collect();

	buf.push('…');

	buf
}

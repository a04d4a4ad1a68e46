//! Lifecycle-level error types shared across the cache, flows, and transports.

// self
use crate::_prelude::*;

/// Lifecycle-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session provider failure surfaced while clearing or reading the external session.
	#[error("{0}")]
	Provider(
		#[from]
		#[source]
		crate::provider::ProviderError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The refresh token can never succeed again; the session was signed out.
	#[error("Refresh token is no longer usable: {reason}.")]
	RefreshDead {
		/// Identity provider- or broker-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns `true` when the failure is safe to retry later.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transient(_) | Self::Transport(_))
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Refresh request body could not be encoded.
	#[error("Refresh request body could not be encoded.")]
	RequestEncode(#[source] serde_json::Error),
	/// Bearer token cannot be represented as an HTTP header value.
	#[error("Access token cannot be used as an Authorization header value.")]
	InvalidHeaderValue(#[from] oauth2::http::header::InvalidHeaderValue),
	/// Lifecycle configuration failed validation.
	#[error(transparent)]
	Lifecycle(#[from] crate::config::LifecycleConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Refresh endpoint returned a non-fatal error response.
	#[error("Refresh endpoint returned an unexpected response: {message}.")]
	RefreshEndpoint {
		/// Broker-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Which remote the request was addressed to.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error raised while calling `target`.
	pub fn network(
		target: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { target, source: Box::new(src) }
	}
}

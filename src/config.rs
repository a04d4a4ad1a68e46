//! Lifecycle configuration: identity endpoints, sign-in entry point, and expiry tuning.
//!
//! The values are validated once by [`LifecycleConfigBuilder::build`] so flows never have to
//! re-check them on the request path.

// self
use crate::_prelude::*;

/// Errors raised while constructing or validating a [`LifecycleConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LifecycleConfigError {
	/// Refresh endpoint is mandatory.
	#[error("Missing refresh endpoint.")]
	MissingRefreshEndpoint,
	/// Sign-in entry point is mandatory for forced sign-out.
	#[error("Missing sign-in URL.")]
	MissingSignInUrl,
	/// Identity base URL cannot be joined with the refresh path.
	#[error("Identity base URL cannot be joined with `{path}`: {url}.")]
	InvalidIdentityBase {
		/// Base URL that failed to join.
		url: String,
		/// Relative path that was appended.
		path: &'static str,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Safety margin cannot be negative.
	#[error("Safety margin must not be negative.")]
	NegativeSafetyMargin,
	/// Default TTL must leave room for at least one request.
	#[error("Default TTL must be positive.")]
	NonPositiveDefaultTtl,
	/// Callback query parameter name is empty.
	#[error("Callback parameter name must not be empty.")]
	EmptyCallbackParam,
}

/// Validated settings shared by every lifecycle component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
	/// Identity provider endpoint accepting `POST { refreshToken }`.
	pub refresh_endpoint: Url,
	/// Re-authentication entry point used by forced sign-out.
	pub sign_in_url: Url,
	/// Time subtracted from provider-reported expiries.
	pub safety_margin: Duration,
	/// Lifetime assumed for sessions without an expiry hint.
	pub default_ttl: Duration,
	/// Query parameter that carries the return path on the sign-in URL.
	pub callback_param: String,
}
impl LifecycleConfig {
	/// Path joined onto an identity base URL to reach the refresh endpoint.
	pub const REFRESH_PATH: &'static str = "auth/refresh";
	/// Default safety margin.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);
	/// Default lifetime for sessions that carry no expiry hint.
	pub const DEFAULT_TTL: Duration = Duration::seconds(60);
	/// Default callback query parameter.
	pub const DEFAULT_CALLBACK_PARAM: &'static str = "callbackUrl";

	/// Creates a new builder populated with defaults.
	pub fn builder() -> LifecycleConfigBuilder {
		LifecycleConfigBuilder::default()
	}

	/// Computes the cached expiry for a session-provided hint.
	///
	/// With a hint the result is `max(now, hint - safety_margin)`; without one it is
	/// `now + default_ttl`. Hints too far in the past to subtract from clamp to `now`.
	pub fn session_expiry(
		&self,
		now: OffsetDateTime,
		hint: Option<OffsetDateTime>,
	) -> OffsetDateTime {
		match hint {
			Some(hint) =>
				hint.checked_sub(self.safety_margin).map_or(now, |trimmed| trimmed.max(now)),
			None => self.default_expiry(now),
		}
	}

	/// Computes the cached expiry after a refresh that reported `expires_in`.
	///
	/// The result is always strictly after `now`. A lifetime that overflows the representable
	/// range is treated like a missing one.
	pub fn rotated_expiry(
		&self,
		now: OffsetDateTime,
		expires_in: Option<Duration>,
	) -> OffsetDateTime {
		let Some(expires_at) = expires_in
			.filter(|lifetime| lifetime.is_positive())
			.and_then(|lifetime| now.checked_add(lifetime))
		else {
			return self.default_expiry(now);
		};

		match expires_at.checked_sub(self.safety_margin) {
			Some(trimmed) if trimmed > now => trimmed,
			_ => expires_at,
		}
	}

	fn default_expiry(&self, now: OffsetDateTime) -> OffsetDateTime {
		now.checked_add(self.default_ttl).unwrap_or(now)
	}

	/// Builds the sign-in redirect that returns the user to `return_path` afterwards.
	pub fn sign_in_redirect(&self, return_path: &str) -> Url {
		let mut url = self.sign_in_url.clone();

		url.query_pairs_mut().append_pair(&self.callback_param, return_path);

		url
	}

	fn validate(&self) -> Result<(), LifecycleConfigError> {
		validate_endpoint("refresh", &self.refresh_endpoint)?;
		validate_endpoint("sign-in", &self.sign_in_url)?;

		if self.safety_margin.is_negative() {
			return Err(LifecycleConfigError::NegativeSafetyMargin);
		}
		if !self.default_ttl.is_positive() {
			return Err(LifecycleConfigError::NonPositiveDefaultTtl);
		}
		if self.callback_param.is_empty() {
			return Err(LifecycleConfigError::EmptyCallbackParam);
		}

		Ok(())
	}
}

/// Builder for [`LifecycleConfig`] values.
#[derive(Debug)]
pub struct LifecycleConfigBuilder {
	/// Refresh endpoint, set directly or derived from an identity base URL.
	pub refresh_endpoint: Option<Url>,
	/// Sign-in entry point.
	pub sign_in_url: Option<Url>,
	/// Safety margin applied to provider expiries.
	pub safety_margin: Duration,
	/// Lifetime for sessions without an expiry hint.
	pub default_ttl: Duration,
	/// Callback query parameter name.
	pub callback_param: String,
	base_error: Option<LifecycleConfigError>,
}
impl LifecycleConfigBuilder {
	/// Sets the refresh endpoint.
	pub fn refresh_endpoint(mut self, url: Url) -> Self {
		self.refresh_endpoint = Some(url);

		self
	}

	/// Derives the refresh endpoint by joining `auth/refresh` onto `base`.
	pub fn identity_base(mut self, mut base: Url) -> Self {
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		match base.join(LifecycleConfig::REFRESH_PATH) {
			Ok(url) => self.refresh_endpoint = Some(url),
			Err(_) =>
				self.base_error = Some(LifecycleConfigError::InvalidIdentityBase {
					url: base.to_string(),
					path: LifecycleConfig::REFRESH_PATH,
				}),
		}

		self
	}

	/// Sets the sign-in entry point.
	pub fn sign_in_url(mut self, url: Url) -> Self {
		self.sign_in_url = Some(url);

		self
	}

	/// Overrides the safety margin (defaults to 60 seconds).
	pub fn safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = margin;

		self
	}

	/// Overrides the default TTL (defaults to 60 seconds).
	pub fn default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = ttl;

		self
	}

	/// Overrides the callback query parameter (defaults to `callbackUrl`).
	pub fn callback_param(mut self, name: impl Into<String>) -> Self {
		self.callback_param = name.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<LifecycleConfig, LifecycleConfigError> {
		if let Some(err) = self.base_error {
			return Err(err);
		}

		let refresh_endpoint =
			self.refresh_endpoint.ok_or(LifecycleConfigError::MissingRefreshEndpoint)?;
		let sign_in_url = self.sign_in_url.ok_or(LifecycleConfigError::MissingSignInUrl)?;
		let config = LifecycleConfig {
			refresh_endpoint,
			sign_in_url,
			safety_margin: self.safety_margin,
			default_ttl: self.default_ttl,
			callback_param: self.callback_param,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for LifecycleConfigBuilder {
	fn default() -> Self {
		Self {
			refresh_endpoint: None,
			sign_in_url: None,
			safety_margin: LifecycleConfig::DEFAULT_SAFETY_MARGIN,
			default_ttl: LifecycleConfig::DEFAULT_TTL,
			callback_param: LifecycleConfig::DEFAULT_CALLBACK_PARAM.into(),
			base_error: None,
		}
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), LifecycleConfigError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(LifecycleConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	}
}

//! Broker configuration: credentials, endpoints, default route, and the expiry safety margin.

// self
use crate::{
	_prelude::*,
	auth::{
		ACCESS_TOKEN_VAR, CLIENT_ID_VAR, CLIENT_SECRET_VAR, CredentialSettings, Credentials,
		REFRESH_TOKEN_VAR, TokenSecret,
	},
	error::ConfigError,
	route::RouteId,
};

/// Environment name for the default route identifier.
pub const ROUTE_ID_VAR: &str = "STRAVA_ROUTE_ID";
/// Environment name overriding the token endpoint.
pub const TOKEN_URL_VAR: &str = "STRAVA_TOKEN_URL";
/// Environment name overriding the API base URL.
pub const API_BASE_URL_VAR: &str = "STRAVA_API_BASE_URL";
/// Environment name overriding the safety margin, in seconds.
pub const SAFETY_MARGIN_VAR: &str = "STRAVA_TOKEN_SAFETY_MARGIN_SECS";

const DEFAULT_TOKEN_ENDPOINT: &str = "https://www.strava.com/oauth/token";
const DEFAULT_API_BASE: &str = "https://www.strava.com/api/v3";

/// Settings consumed by [`Broker`](crate::flows::Broker).
#[derive(Clone, Debug)]
pub struct BrokerConfig {
	/// Credential settings, validated lazily on every token resolution.
	pub credentials: CredentialSettings,
	/// Route served when a request names none.
	pub default_route_id: Option<RouteId>,
	/// OAuth token endpoint.
	pub token_endpoint: Url,
	/// Base URL of the REST API (`{api_base}/routes/{id}`).
	pub api_base: Url,
	/// Tokens expiring within this window are treated as expired.
	pub safety_margin: Duration,
}
impl BrokerConfig {
	/// Default safety margin applied before a token's expiry.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(30);

	/// Loads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads settings from an arbitrary key lookup; blank values count as absent.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| {
			lookup(name).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
		};
		let mut config = Self::default();

		config.credentials = CredentialSettings {
			static_token: read(ACCESS_TOKEN_VAR).map(TokenSecret::new),
			client_id: read(CLIENT_ID_VAR),
			client_secret: read(CLIENT_SECRET_VAR).map(TokenSecret::new),
			refresh_token: read(REFRESH_TOKEN_VAR).map(TokenSecret::new),
		};

		if let Some(route_id) = read(ROUTE_ID_VAR) {
			config.default_route_id =
				Some(RouteId::new(route_id).map_err(ConfigError::InvalidDefaultRoute)?);
		}
		if let Some(raw) = read(TOKEN_URL_VAR) {
			config.token_endpoint = parse_url(TOKEN_URL_VAR, &raw)?;
		}
		if let Some(raw) = read(API_BASE_URL_VAR) {
			config.api_base = parse_url(API_BASE_URL_VAR, &raw)?;
		}
		if let Some(raw) = read(SAFETY_MARGIN_VAR) {
			let secs = raw
				.parse::<u32>()
				.map_err(|_| ConfigError::InvalidNumber { name: SAFETY_MARGIN_VAR, value: raw })?;

			config.safety_margin = Duration::seconds(i64::from(secs));
		}

		Ok(config)
	}

	/// Sets a static, always-valid access token.
	pub fn with_static_token(mut self, token: impl Into<String>) -> Self {
		self.credentials.static_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the refresh-token triple.
	pub fn with_refresh_credentials(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		refresh_token: impl Into<String>,
	) -> Self {
		self.credentials.client_id = Some(client_id.into());
		self.credentials.client_secret = Some(TokenSecret::new(client_secret));
		self.credentials.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets the default route.
	pub fn with_default_route(mut self, route_id: RouteId) -> Self {
		self.default_route_id = Some(route_id);

		self
	}

	/// Overrides the token endpoint.
	pub fn with_token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = url;

		self
	}

	/// Overrides the API base URL.
	pub fn with_api_base(mut self, url: Url) -> Self {
		self.api_base = url;

		self
	}

	/// Overrides the safety margin; negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Resolves the configured credential source.
	pub fn credentials(&self) -> Result<Credentials, ConfigError> {
		self.credentials.resolve()
	}

	/// Builds the URL of a single route resource.
	pub fn route_url(&self, route_id: &RouteId) -> Result<Url, ConfigError> {
		let mut url = self.api_base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::OpaqueApiBase { url: self.api_base.to_string() })?
			.pop_if_empty()
			.push("routes")
			.push(route_id);

		Ok(url)
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			credentials: CredentialSettings::default(),
			default_route_id: None,
			token_endpoint: Url::parse(DEFAULT_TOKEN_ENDPOINT)
				.expect("Default token endpoint must be a valid URL."),
			api_base: Url::parse(DEFAULT_API_BASE).expect("Default API base must be a valid URL."),
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
		}
	}
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { name, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
		move |name| pairs.iter().find(|(key, _)| *key == name).map(|(_, value)| (*value).to_owned())
	}

	#[test]
	fn defaults_point_at_strava() {
		let config = BrokerConfig::from_lookup(lookup(&[])).expect("Empty lookup should load.");

		assert_eq!(config.token_endpoint.as_str(), "https://www.strava.com/oauth/token");
		assert_eq!(config.api_base.as_str(), "https://www.strava.com/api/v3");
		assert_eq!(config.safety_margin, Duration::seconds(30));
		assert!(config.default_route_id.is_none());
		assert!(matches!(
			config.credentials(),
			Err(ConfigError::MissingCredentials { missing }) if missing.len() == 3
		));
	}

	#[test]
	fn reads_every_setting_and_ignores_blanks() {
		let config = BrokerConfig::from_lookup(lookup(&[
			(ACCESS_TOKEN_VAR, "   "),
			(CLIENT_ID_VAR, "1234"),
			(CLIENT_SECRET_VAR, "shh"),
			(REFRESH_TOKEN_VAR, " refresh "),
			(ROUTE_ID_VAR, "3344556677"),
			(API_BASE_URL_VAR, "http://127.0.0.1:9000/api/v3/"),
			(SAFETY_MARGIN_VAR, "45"),
		]))
		.expect("Complete lookup should load.");

		assert!(config.credentials.static_token.is_none());
		assert_eq!(config.default_route_id.as_deref(), Some("3344556677"));
		assert_eq!(config.safety_margin, Duration::seconds(45));

		match config.credentials().expect("Triple should resolve.") {
			Credentials::Refresh(credentials) => {
				assert_eq!(credentials.client_id, "1234");
				assert_eq!(credentials.refresh_token.expose(), "refresh");
			},
			other => panic!("Unexpected credentials: {other:?}."),
		}
	}

	#[test]
	fn rejects_malformed_settings() {
		assert!(matches!(
			BrokerConfig::from_lookup(lookup(&[(SAFETY_MARGIN_VAR, "-5")])),
			Err(ConfigError::InvalidNumber { name: SAFETY_MARGIN_VAR, .. })
		));
		assert!(matches!(
			BrokerConfig::from_lookup(lookup(&[(TOKEN_URL_VAR, "not a url")])),
			Err(ConfigError::InvalidUrl { name: TOKEN_URL_VAR, .. })
		));
		assert!(matches!(
			BrokerConfig::from_lookup(lookup(&[(ROUTE_ID_VAR, "12/34")])),
			Err(ConfigError::InvalidDefaultRoute(_))
		));
	}

	#[test]
	fn route_url_handles_trailing_slashes() {
		let route = RouteId::new("987").expect("Route id fixture should be valid.");
		let plain = BrokerConfig::default();
		let slashed = BrokerConfig::default().with_api_base(
			Url::parse("http://localhost:8080/api/v3/").expect("Fixture URL should parse."),
		);

		assert_eq!(
			plain.route_url(&route).expect("Route URL should build.").as_str(),
			"https://www.strava.com/api/v3/routes/987"
		);
		assert_eq!(
			slashed.route_url(&route).expect("Route URL should build.").as_str(),
			"http://localhost:8080/api/v3/routes/987"
		);
	}

	#[test]
	fn negative_margin_clamps_to_zero() {
		let config = BrokerConfig::default().with_safety_margin(Duration::seconds(-10));

		assert_eq!(config.safety_margin, Duration::ZERO);
	}
}

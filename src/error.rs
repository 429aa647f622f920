//! Broker-level error types shared by the token broker, route fetches, and configuration.

// self
use crate::{_prelude::*, geometry::ViewportError, route::IdentifierError};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (missing credentials, invalid endpoints).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream returned a payload the broker could not interpret.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the refresh exchange.
	#[error("Token refresh was rejected with HTTP {status}: {body}.")]
	UpstreamAuth {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Raw response body for diagnostics.
		body: String,
	},
	/// Route endpoint rejected the fetch.
	#[error("Route fetch was rejected with HTTP {status}.")]
	UpstreamFetch {
		/// HTTP status returned by the route endpoint.
		status: u16,
		/// Raw response body surfaced as `details`.
		body: String,
	},
	/// A required request parameter was absent and no default is configured.
	#[error("Missing required parameter `{name}` and no default is configured.")]
	MissingParameter {
		/// Parameter name as seen by callers.
		name: &'static str,
	},
	/// The supplied route identifier failed validation.
	#[error(transparent)]
	InvalidRouteId(#[from] IdentifierError),
	/// The requested drawing surface cannot hold a projected route.
	#[error(transparent)]
	InvalidViewport(#[from] ViewportError),
	/// The refresh this caller waited on failed for every caller queued behind it.
	#[error("Concurrent token refresh failed: {0}")]
	SharedRefresh(RefreshFailure),
}
impl Error {
	/// HTTP status the route handler reports for this error.
	///
	/// Upstream rejections mirror the upstream status, caller mistakes map to `400`, and all
	/// other failures map to `500`.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::UpstreamAuth { status, .. } | Self::UpstreamFetch { status, .. } => *status,
			Self::SharedRefresh(failure) => failure.status,
			Self::MissingParameter { .. } | Self::InvalidRouteId(_) | Self::InvalidViewport(_) =>
				400,
			Self::Config(_) | Self::Transient(_) | Self::Transport(_) => 500,
		}
	}

	/// Upstream response body attached to the error, if any.
	pub fn details(&self) -> Option<&str> {
		match self {
			Self::UpstreamAuth { body, .. } | Self::UpstreamFetch { body, .. } => Some(body),
			Self::SharedRefresh(failure) => failure.details.as_deref(),
			_ => None,
		}
	}
}

/// Cloneable summary of a failed refresh, handed to callers that waited on it.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct RefreshFailure {
	/// Status the original failure maps to.
	pub status: u16,
	/// Rendered message of the original failure.
	pub message: String,
	/// Upstream body of the original failure, if any.
	pub details: Option<String>,
}
impl From<&Error> for RefreshFailure {
	fn from(err: &Error) -> Self {
		match err {
			Error::SharedRefresh(failure) => failure.clone(),
			_ => Self {
				status: err.status_code(),
				message: err.to_string(),
				details: err.details().map(str::to_owned),
			},
		}
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Neither a static token nor the full refresh credential triple is configured.
	#[error("Missing Strava credentials: {}.", .missing.join(", "))]
	MissingCredentials {
		/// Names of the absent settings, in declaration order.
		missing: Vec<&'static str>,
	},
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
	/// Token endpoint URL cannot be used by the OAuth client.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// A configured URL cannot be parsed.
	#[error("Setting `{name}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// API base URL cannot carry path segments (e.g. `mailto:` or `data:` URLs).
	#[error("API base URL `{url}` cannot be extended with path segments.")]
	OpaqueApiBase {
		/// Offending URL.
		url: String,
	},
	/// A numeric setting could not be parsed.
	#[error("Setting `{name}` must be a non-negative integer, got `{value}`.")]
	InvalidNumber {
		/// Setting name.
		name: &'static str,
		/// Raw value.
		value: String,
	},
	/// The configured default route id failed validation.
	#[error("Default route id is invalid.")]
	InvalidDefaultRoute(#[source] IdentifierError),
	/// Token endpoint response omitted both `expires_at` and `expires_in`.
	#[error("Token endpoint response is missing expires_at and expires_in.")]
	MissingExpiry,
	/// Token endpoint returned an expiry that cannot be represented.
	#[error("The token expiry exceeds the supported range.")]
	ExpiryOutOfRange,
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

/// Upstream responded successfully at the HTTP level but the payload was unusable.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Broker-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Route endpoint responded with JSON that does not describe a route.
	#[error("Route endpoint returned malformed JSON.")]
	RouteResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling Strava.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling Strava.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_credentials_enumerates_every_name() {
		let err = Error::from(ConfigError::MissingCredentials {
			missing: vec!["STRAVA_CLIENT_ID", "STRAVA_REFRESH_TOKEN"],
		});

		assert_eq!(
			err.to_string(),
			"Missing Strava credentials: STRAVA_CLIENT_ID, STRAVA_REFRESH_TOKEN."
		);
		assert_eq!(err.status_code(), 500);
		assert!(err.details().is_none());
	}

	#[test]
	fn upstream_errors_mirror_status_and_expose_body() {
		let err = Error::UpstreamFetch { status: 404, body: "{\"message\":\"Not Found\"}".into() };

		assert_eq!(err.status_code(), 404);
		assert_eq!(err.details(), Some("{\"message\":\"Not Found\"}"));

		let err = Error::UpstreamAuth { status: 401, body: "bad refresh".into() };

		assert_eq!(err.status_code(), 401);
		assert!(err.to_string().contains("bad refresh"));
	}

	#[test]
	fn shared_refresh_keeps_status_and_details() {
		let original = Error::UpstreamAuth { status: 401, body: "invalid refresh_token".into() };
		let shared = Error::SharedRefresh(RefreshFailure::from(&original));

		assert_eq!(shared.status_code(), 401);
		assert_eq!(shared.details(), Some("invalid refresh_token"));
		assert!(shared.to_string().contains("HTTP 401"));
		assert_eq!(RefreshFailure::from(&shared), RefreshFailure::from(&original));
	}

	#[test]
	fn caller_mistakes_map_to_bad_request() {
		assert_eq!(Error::MissingParameter { name: "routeId" }.status_code(), 400);
		assert_eq!(
			Error::InvalidRouteId(IdentifierError::Empty { kind: "Route" }).status_code(),
			400
		);
		assert_eq!(
			Error::from(ViewportError { parameter: "padding", reason: "must not be negative" })
				.status_code(),
			400
		);
	}
}

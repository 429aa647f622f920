//! OAuth client facade for Strava's `grant_type=refresh_token` exchange.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, ExtraTokenFields,
	HttpClientError, RefreshToken, RequestTokenError, StandardRevocableToken,
	StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, RefreshCredentials},
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, UpstreamHttpClient},
};

/// Strava-specific fields returned next to the standard token response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StravaTokenFields {
	/// Absolute expiry in Unix epoch seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
}
impl ExtraTokenFields for StravaTokenFields {}

/// Token response shape returned by Strava's token endpoint.
pub type StravaTokenResponse = StandardTokenResponse<StravaTokenFields, BasicTokenType>;

type StravaClient<HasTokenUrl = EndpointSet> = oauth2::Client<
	BasicErrorResponse,
	StravaTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	HasTokenUrl,
>;

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
			_ => map_unknown_transport_error(meta),
		}
	}
}

/// Refresh exchange bound to one credential triple and token endpoint.
pub(crate) struct RefreshFacade<'a, C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: StravaClient,
	http_client: &'a C,
	error_mapper: &'a M,
}
impl<'a, C, M> RefreshFacade<'a, C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		token_endpoint: &Url,
		credentials: &RefreshCredentials,
		http_client: &'a C,
		error_mapper: &'a M,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		let client_id = ClientId::new(credentials.client_id.clone());
		let client_secret = ClientSecret::new(credentials.client_secret.expose().to_owned());
		let oauth_client = StravaClient::<EndpointNotSet>::new(client_id)
			.set_client_secret(client_secret)
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Exchanges `refresh_token`, returning the minted token and any rotated refresh token.
	pub(crate) async fn refresh(
		&self,
		refresh_token: &str,
	) -> Result<(CachedToken, Option<String>)> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper))?;

		map_refresh_response(response, OffsetDateTime::now_utc())
	}
}

fn map_refresh_response(
	response: StravaTokenResponse,
	now: OffsetDateTime,
) -> Result<(CachedToken, Option<String>)> {
	let access_token = response.access_token().secret().to_owned();
	let token = match (response.extra_fields().expires_at, response.expires_in()) {
		(Some(expires_at), _) => CachedToken::from_unix(access_token, expires_at)?,
		(None, Some(expires_in)) => {
			let secs =
				i64::try_from(expires_in.as_secs()).map_err(|_| ConfigError::ExpiryOutOfRange)?;
			let expires_at = now
				.checked_add(Duration::seconds(secs))
				.ok_or(ConfigError::ExpiryOutOfRange)?;

			CachedToken::new(access_token, expires_at)
		},
		(None, None) => return Err(ConfigError::MissingExpiry.into()),
	};
	let new_refresh = response.refresh_token().map(|token| token.secret().to_owned());

	Ok((token, new_refresh))
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();
	let failure_status = meta_ref.and_then(ResponseMetadata::failure_status);

	match (err, failure_status) {
		(RequestTokenError::Request(error), _) => mapper.map_transport_error(meta_ref, error),
		// Any non-success status is an upstream rejection, whatever shape the body has.
		(_, Some(status)) => Error::UpstreamAuth {
			status,
			body: meta_ref.and_then(|value| value.body.clone()).unwrap_or_default(),
		},
		(RequestTokenError::Parse(error, _body), None) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		(RequestTokenError::ServerResponse(response), None) => TransientError::TokenEndpoint {
			message: format!("OAuth error `{}`", response.error().as_ref()),
			status: meta_status(meta_ref),
		}
		.into(),
		(RequestTokenError::Other(message), None) =>
			TransientError::TokenEndpoint { message, status: meta_status(meta_ref) }.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling Strava".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling Strava: {message}"),
		status: meta_status(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_unknown_transport_error(meta: Option<&ResponseMetadata>) -> Error {
	TransientError::TokenEndpoint {
		message: "HTTP client error occurred while calling Strava".into(),
		status: meta_status(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[derive(Debug, ThisError)]
	#[error("mock transport failure")]
	struct MockTransportError;

	struct MockMapper;
	impl TransportErrorMapper<MockTransportError> for MockMapper {
		fn map_transport_error(
			&self,
			_: Option<&ResponseMetadata>,
			error: HttpClientError<MockTransportError>,
		) -> Error {
			TransportError::network(error).into()
		}
	}

	fn map_with_mock(
		meta: Option<ResponseMetadata>,
		err: BasicRequestTokenError<HttpClientError<MockTransportError>>,
	) -> Error {
		map_request_error(meta, err, &MockMapper)
	}

	fn token_response(json: &str) -> StravaTokenResponse {
		serde_json::from_str(json).expect("Token response fixture should deserialize.")
	}

	fn parse_error() -> serde_path_to_error::Error<serde_json::Error> {
		serde_path_to_error::deserialize::<_, StravaTokenResponse>(
			&mut serde_json::Deserializer::from_str("{\"message\":\"Bad Request\"}"),
		)
		.expect_err("Fixture should fail to deserialize.")
	}

	#[test]
	fn refresh_response_prefers_expires_at() {
		let response = token_response(
			"{\"token_type\":\"Bearer\",\"access_token\":\"a1\",\"expires_at\":1750000000,\
			 \"expires_in\":21600,\"refresh_token\":\"r2\"}",
		);
		let (token, rotated) = map_refresh_response(response, datetime!(2020-01-01 00:00 UTC))
			.expect("Response should map.");

		assert_eq!(token.access_token.expose(), "a1");
		assert_eq!(token.expires_at.unix_timestamp(), 1_750_000_000);
		assert_eq!(rotated.as_deref(), Some("r2"));
	}

	#[test]
	fn refresh_response_falls_back_to_expires_in() {
		let now = datetime!(2025-06-01 08:00 UTC);
		let response =
			token_response("{\"token_type\":\"bearer\",\"access_token\":\"a1\",\"expires_in\":600}");
		let (token, rotated) = map_refresh_response(response, now).expect("Response should map.");

		assert_eq!(token.expires_at, now + Duration::minutes(10));
		assert!(rotated.is_none());
	}

	#[test]
	fn refresh_response_without_expiry_is_rejected() {
		let response = token_response("{\"token_type\":\"Bearer\",\"access_token\":\"a1\"}");

		assert!(matches!(
			map_refresh_response(response, OffsetDateTime::now_utc()),
			Err(Error::Config(ConfigError::MissingExpiry))
		));
	}

	#[test]
	fn non_success_status_becomes_upstream_auth() {
		let meta = ResponseMetadata::from_response(401, b"{\"message\":\"Authorization Error\"}");
		let err = map_with_mock(Some(meta), RequestTokenError::Parse(parse_error(), Vec::new()));

		match err {
			Error::UpstreamAuth { status, body } => {
				assert_eq!(status, 401);
				assert_eq!(body, "{\"message\":\"Authorization Error\"}");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn malformed_success_body_is_transient() {
		let meta = ResponseMetadata::from_response(200, b"{}");
		let err = map_with_mock(Some(meta), RequestTokenError::Parse(parse_error(), Vec::new()));

		assert!(matches!(
			err,
			Error::Transient(TransientError::TokenResponseParse { status: Some(200), .. })
		));
	}

	#[test]
	fn transport_failures_use_mapper() {
		let err = map_with_mock(
			None,
			RequestTokenError::Request(HttpClientError::Reqwest(Box::new(MockTransportError))),
		);

		assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	}
}

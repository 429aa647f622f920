//! Credential sources the broker can mint bearer tokens from.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Environment name for the static access token.
pub const ACCESS_TOKEN_VAR: &str = "STRAVA_ACCESS_TOKEN";
/// Environment name for the OAuth client identifier.
pub const CLIENT_ID_VAR: &str = "STRAVA_CLIENT_ID";
/// Environment name for the OAuth client secret.
pub const CLIENT_SECRET_VAR: &str = "STRAVA_CLIENT_SECRET";
/// Environment name for the long-lived refresh token.
pub const REFRESH_TOKEN_VAR: &str = "STRAVA_REFRESH_TOKEN";

/// Resolved credential source.
#[derive(Clone, Debug)]
pub enum Credentials {
	/// Pre-issued token returned as-is; its lifetime is the operator's responsibility.
	Static(TokenSecret),
	/// Refresh-token triple exchanged at the token endpoint.
	Refresh(RefreshCredentials),
}

/// Client credentials plus the refresh token used for `grant_type=refresh_token`.
#[derive(Clone)]
pub struct RefreshCredentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Refresh token exchanged for short-lived bearer tokens.
	pub refresh_token: TokenSecret,
}
impl Debug for RefreshCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

/// Raw, possibly incomplete credential settings as read from configuration.
#[derive(Clone, Debug, Default)]
pub struct CredentialSettings {
	/// Static access token, when supplied.
	pub static_token: Option<TokenSecret>,
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// OAuth client secret.
	pub client_secret: Option<TokenSecret>,
	/// Refresh token.
	pub refresh_token: Option<TokenSecret>,
}
impl CredentialSettings {
	/// Resolves the settings into a usable credential source.
	///
	/// A static token wins over everything else. Otherwise the full refresh triple is required
	/// and every missing member is reported by its environment name.
	pub fn resolve(&self) -> Result<Credentials, ConfigError> {
		if let Some(token) = &self.static_token {
			return Ok(Credentials::Static(token.clone()));
		}

		match (&self.client_id, &self.client_secret, &self.refresh_token) {
			(Some(client_id), Some(client_secret), Some(refresh_token)) =>
				Ok(Credentials::Refresh(RefreshCredentials {
					client_id: client_id.clone(),
					client_secret: client_secret.clone(),
					refresh_token: refresh_token.clone(),
				})),
			(client_id, client_secret, refresh_token) => {
				let missing = [
					(client_id.is_none(), CLIENT_ID_VAR),
					(client_secret.is_none(), CLIENT_SECRET_VAR),
					(refresh_token.is_none(), REFRESH_TOKEN_VAR),
				]
				.into_iter()
				.filter_map(|(absent, name)| absent.then_some(name))
				.collect();

				Err(ConfigError::MissingCredentials { missing })
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn static_token_wins_over_partial_triple() {
		let settings = CredentialSettings {
			static_token: Some(TokenSecret::new("manual")),
			client_id: Some("123".into()),
			..Default::default()
		};

		match settings.resolve().expect("Static token should resolve.") {
			Credentials::Static(token) => assert_eq!(token.expose(), "manual"),
			other => panic!("Unexpected credentials: {other:?}."),
		}
	}

	#[test]
	fn missing_members_are_enumerated() {
		let settings =
			CredentialSettings { client_secret: Some(TokenSecret::new("s")), ..Default::default() };
		let err = settings.resolve().expect_err("Partial triple should be rejected.");

		match err {
			ConfigError::MissingCredentials { missing } =>
				assert_eq!(missing, vec![CLIENT_ID_VAR, REFRESH_TOKEN_VAR]),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn full_triple_resolves_to_refresh_credentials() {
		let settings = CredentialSettings {
			static_token: None,
			client_id: Some("42".into()),
			client_secret: Some(TokenSecret::new("secret")),
			refresh_token: Some(TokenSecret::new("refresh")),
		};
		let Credentials::Refresh(credentials) =
			settings.resolve().expect("Full triple should resolve.")
		else {
			panic!("Refresh credentials expected.");
		};

		assert_eq!(credentials.client_id, "42");
		assert!(!format!("{credentials:?}").contains("\"secret\""));
	}
}

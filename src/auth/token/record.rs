//! Cached bearer token record and its expiry lifecycle.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::ConfigError};

/// Lifecycle status of a cached token relative to an instant and a safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Token remains valid beyond the safety margin.
	Active,
	/// Token is still valid but expires within the safety margin.
	Expiring,
	/// Token reached its expiry instant.
	Expired,
}

/// Bearer token minted by a refresh call, held in the broker's single cache slot.
#[derive(Clone)]
pub struct CachedToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Absolute expiry instant reported by the token endpoint.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Creates a record for the provided token and absolute expiry.
	pub fn new(access_token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { access_token: TokenSecret::new(access_token), expires_at }
	}

	/// Creates a record from an expiry expressed in Unix epoch seconds.
	pub fn from_unix(access_token: impl Into<String>, expires_at: i64) -> Result<Self> {
		let expires_at = OffsetDateTime::from_unix_timestamp(expires_at)
			.map_err(|_| ConfigError::ExpiryOutOfRange)?;

		Ok(Self::new(access_token, expires_at))
	}

	/// Computes the lifecycle status at `instant` with the provided safety margin.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> TokenStatus {
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		// An expiry too close to the earliest representable instant has no room for a margin.
		match self.expires_at.checked_sub(margin) {
			None => TokenStatus::Expired,
			Some(refresh_at) if refresh_at <= instant => TokenStatus::Expiring,
			Some(_) => TokenStatus::Active,
		}
	}

	/// Returns `true` when the token can be handed out at `instant`.
	///
	/// The margin is exclusive: a token whose expiry sits exactly `margin` after `instant` is
	/// no longer usable.
	pub fn is_usable_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), TokenStatus::Active)
	}

	/// Time left until expiry, negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const MARGIN: Duration = Duration::seconds(30);

	#[test]
	fn status_transitions_cover_all_states() {
		let token = CachedToken::new("access", macros::datetime!(2025-01-01 01:00 UTC));

		assert_eq!(token.status_at(macros::datetime!(2025-01-01 00:30 UTC), MARGIN), TokenStatus::Active);
		assert_eq!(
			token.status_at(macros::datetime!(2025-01-01 00:59:45 UTC), MARGIN),
			TokenStatus::Expiring
		);
		assert_eq!(token.status_at(macros::datetime!(2025-01-01 01:00 UTC), MARGIN), TokenStatus::Expired);
	}

	#[test]
	fn margin_boundary_is_exclusive() {
		let now = macros::datetime!(2025-06-01 12:00 UTC);
		let at_boundary = CachedToken::new("boundary", now + MARGIN);
		let past_boundary = CachedToken::new("fresh", now + MARGIN + Duration::seconds(1));

		assert!(!at_boundary.is_usable_at(now, MARGIN));
		assert!(past_boundary.is_usable_at(now, MARGIN));
	}

	#[test]
	fn margin_near_earliest_instant_is_expired() {
		let earliest = time::Date::MIN.midnight().assume_utc();
		let token = CachedToken::new("ancient", earliest + Duration::seconds(10));

		assert_eq!(token.status_at(earliest, MARGIN), TokenStatus::Expired);
		assert!(!token.is_usable_at(earliest, MARGIN));
		assert_eq!(token.status_at(earliest, Duration::seconds(5)), TokenStatus::Active);
	}

	#[test]
	fn from_unix_builds_absolute_expiry() {
		let token = CachedToken::from_unix("unix", 1_735_693_200)
			.expect("Epoch seconds within range should build a token.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(
			token.remaining_at(macros::datetime!(2025-01-01 00:00 UTC)),
			Duration::hours(1)
		);
		assert!(CachedToken::from_unix("overflow", i64::MAX).is_err());
	}

	#[test]
	fn debug_redacts_access_token() {
		let token = CachedToken::new("top-secret", macros::datetime!(2025-01-01 00:00 UTC));

		assert!(!format!("{token:?}").contains("top-secret"));
	}
}

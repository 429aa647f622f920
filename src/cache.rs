//! Single-slot, in-process cache for the broker's bearer token.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, TokenSecret},
};

/// Thread-safe cache holding at most one [`CachedToken`].
///
/// Writers swap the whole value under the write lock, so readers observe either the previous
/// token or the new one and never a mix of both.
#[derive(Clone, Debug, Default)]
pub struct TokenCache(Arc<RwLock<Option<CachedToken>>>);
impl TokenCache {
	/// Returns a copy of the cached token, if any.
	pub fn current(&self) -> Option<CachedToken> {
		self.0.read().clone()
	}

	/// Returns the cached secret when it stays usable past `now + margin`.
	pub fn usable_at(&self, now: OffsetDateTime, margin: Duration) -> Option<TokenSecret> {
		self.0
			.read()
			.as_ref()
			.filter(|token| token.is_usable_at(now, margin))
			.map(|token| token.access_token.clone())
	}

	/// Replaces the cached token, returning the previous value.
	pub fn replace(&self, token: CachedToken) -> Option<CachedToken> {
		self.0.write().replace(token)
	}

	/// Drops the cached token.
	pub fn clear(&self) -> Option<CachedToken> {
		self.0.write().take()
	}
}

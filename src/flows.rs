//! Broker orchestration: token resolution and route fetches.

pub mod resolve;
mod route;

pub use resolve::*;

// std
use std::sync::atomic::AtomicU64;
// self
use crate::{
	_prelude::*, auth::TokenSecret, cache::TokenCache, config::BrokerConfig,
	error::RefreshFailure, http::UpstreamHttpClient, oauth::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Owns the cached Strava token and serves route payloads.
///
/// Clones share the cache, the singleflight guard, the rotated refresh token, and the
/// metrics, so one broker can be handed to every request handler.
///
/// The guard holds the failure of the latest refresh, if it failed; `refresh_generation`
/// counts completed refreshes so queued callers can tell whether one finished while they
/// waited.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every upstream request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Credentials, endpoints, and defaults.
	pub config: BrokerConfig,
	/// Shared counters for upstream refresh calls.
	pub refresh_metrics: Arc<RefreshMetrics>,
	cache: TokenCache,
	refresh_guard: Arc<AsyncMutex<Option<RefreshFailure>>>,
	refresh_generation: Arc<AtomicU64>,
	rotated_refresh: Arc<Mutex<Option<TokenSecret>>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport and mapper pair.
	pub fn with_http_client(
		config: BrokerConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config,
			refresh_metrics: Default::default(),
			cache: Default::default(),
			refresh_guard: Default::default(),
			refresh_generation: Default::default(),
			rotated_refresh: Default::default(),
		}
	}

	/// Token cache shared by every clone of this broker.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Refresh token the next exchange will present, if Strava rotated the configured one.
	pub fn rotated_refresh_token(&self) -> Option<TokenSecret> {
		self.rotated_refresh.lock().clone()
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker with its own reqwest-backed transport.
	pub fn new(config: BrokerConfig) -> Self {
		Self::with_http_client(
			config,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("token_endpoint", &self.config.token_endpoint.as_str())
			.field("api_base", &self.config.api_base.as_str())
			.field("default_route_id", &self.config.default_route_id)
			.field("cached", &self.cache.current())
			.finish()
	}
}

//! Token resolution with a single cached token, singleflight refreshes, and refresh-token
//! rotation.
//!
//! [`Broker::resolve_token`] returns a static token untouched when one is configured. Otherwise
//! it checks the cache without locking, then serializes refreshes behind one async mutex and
//! re-checks the cache once the mutex is held, so concurrent callers that raced on an expired
//! token share the result of a single `grant_type=refresh_token` call. A failed exchange is
//! shared the same way: callers queued behind it receive [`Error::SharedRefresh`] instead of
//! sending their own request.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::Ordering;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credentials, RefreshCredentials, TokenSecret},
	error::RefreshFailure,
	flows::Broker,
	http::UpstreamHttpClient,
	oauth::{RefreshFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a bearer token usable for at least the configured safety margin.
	pub async fn resolve_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::ResolveToken;

		let span = FlowSpan::new(KIND, "resolve_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<TokenSecret> = span
			.instrument(async move {
				let credentials = match self.config.credentials()? {
					Credentials::Static(token) => return Ok(token),
					Credentials::Refresh(credentials) => credentials,
				};
				let margin = self.config.safety_margin;
				let observed = self.refresh_generation.load(Ordering::Acquire);

				if let Some(token) = self.cache.usable_at(OffsetDateTime::now_utc(), margin) {
					return Ok(token);
				}

				let mut last_failure = self.refresh_guard.lock().await;

				// Another caller may have refreshed while this one waited.
				if let Some(token) = self.cache.usable_at(OffsetDateTime::now_utc(), margin) {
					return Ok(token);
				}
				// A refresh finished while this caller waited; its failure is this caller's too.
				let refreshed_meanwhile =
					self.refresh_generation.load(Ordering::Acquire) != observed;

				if let Some(failure) = last_failure.as_ref().filter(|_| refreshed_meanwhile) {
					return Err(Error::SharedRefresh(failure.clone()));
				}

				let result = self.refresh(&credentials).await;

				*last_failure = result.as_ref().err().map(RefreshFailure::from);
				self.refresh_generation.fetch_add(1, Ordering::Release);

				result.map(|token| token.access_token)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Performs one refresh exchange and publishes its result. Callers hold the refresh guard.
	async fn refresh(&self, credentials: &RefreshCredentials) -> Result<CachedToken> {
		const KIND: FlowKind = FlowKind::RefreshToken;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let refresh_token =
			self.rotated_refresh_token().unwrap_or_else(|| credentials.refresh_token.clone());
		let result: Result<(CachedToken, Option<String>)> = span
			.instrument(async {
				let facade = RefreshFacade::new(
					&self.config.token_endpoint,
					credentials,
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
				)?;

				facade.refresh(refresh_token.expose()).await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		match result {
			Ok((token, rotated)) => {
				self.cache.replace(token.clone());

				if let Some(rotated) = rotated {
					*self.rotated_refresh.lock() = Some(TokenSecret::new(rotated));
				}

				self.refresh_metrics.record_success();

				Ok(token)
			},
			Err(err) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %err, "token refresh failed");

				self.refresh_metrics.record_failure();

				Err(err)
			},
		}
	}
}

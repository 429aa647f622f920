//! Route fetch: resolve a token, read `/routes/{id}`, and shape the response payload.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		Method,
		header::{ACCEPT, AUTHORIZATION},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransientError},
	flows::Broker,
	geometry::Viewport,
	http::{ResponseMetadataSlot, UpstreamHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	route::{RouteId, RoutePayload, RouteQuery, RouteResponse, RouteSummary},
};

const ROUTE_ID_PARAM: &str = "routeId";

impl<C, M> Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches a route and shapes it for the page.
	///
	/// A missing or blank `route_id` falls back to the configured default route. Geometry is
	/// only computed when a `viewport` is supplied, and an unusable viewport is rejected before
	/// any request is sent.
	pub async fn fetch_route(
		&self,
		route_id: Option<&str>,
		viewport: Option<Viewport>,
	) -> Result<RoutePayload> {
		const KIND: FlowKind = FlowKind::FetchRoute;

		let span = FlowSpan::new(KIND, "fetch_route");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<RoutePayload> = span
			.instrument(async move {
				let route_id = self.select_route(route_id)?;

				if let Some(viewport) = &viewport {
					viewport.validate()?;
				}

				let url = self.config.route_url(&route_id)?;
				let token = self.resolve_token().await?;
				let summary = self.get_route(&url, &token).await?;

				Ok(RoutePayload::from_summary(summary, viewport))
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Runs [`Broker::fetch_route`] for an HTTP query and converts the outcome into a response.
	pub async fn handle_route_request(&self, query: RouteQuery) -> RouteResponse {
		let result = match query.viewport() {
			Ok(viewport) => self.fetch_route(query.route_id.as_deref(), viewport).await,
			Err(err) => Err(err.into()),
		};

		match result {
			Ok(payload) => RouteResponse::ok(&payload),
			Err(err) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %err, status = err.status_code(), "route request failed");

				RouteResponse::from_error(&err)
			},
		}
	}

	fn select_route(&self, requested: Option<&str>) -> Result<RouteId> {
		match requested.map(str::trim).filter(|value| !value.is_empty()) {
			Some(raw) => Ok(RouteId::new(raw)?),
			None => self
				.config
				.default_route_id
				.clone()
				.ok_or(Error::MissingParameter { name: ROUTE_ID_PARAM }),
		}
	}

	async fn get_route(&self, url: &Url, token: &TokenSecret) -> Result<RouteSummary> {
		let request: HttpRequest = oauth2::http::Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, token.bearer_header())
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = handle
			.call(request)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(meta.take().as_ref(), err))?;
		let status = response.status();

		if !status.is_success() {
			return Err(Error::UpstreamFetch {
				status: status.as_u16(),
				body: String::from_utf8_lossy(response.body()).into_owned(),
			});
		}

		serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(response.body()))
			.map_err(|source| TransientError::RouteResponseParse { source }.into())
	}
}

//! Serves the weekly long run route against a mocked Strava: refreshes a token from the
//! credential triple, fetches the configured default route, and prints the page payload.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use strava_route_broker::{
	auth::{CLIENT_ID_VAR, CLIENT_SECRET_VAR, REFRESH_TOKEN_VAR},
	config::{API_BASE_URL_VAR, BrokerConfig, ROUTE_ID_VAR, TOKEN_URL_VAR},
	flows::ReqwestBroker,
	geometry::{self, GeoPoint},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	reqwest::Client,
	route::RouteQuery,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let polyline = geometry::encode(&[
		GeoPoint::new(52.52001, 13.40495),
		GeoPoint::new(52.51627, 13.37769),
		GeoPoint::new(52.50931, 13.37603),
		GeoPoint::new(52.50722, 13.39044),
	]);
	let route_body = format!(
		"{{\"id\":3344556677,\"name\":\"Spree Long Run\",\"distance\":28400.0,\
		 \"elevation_gain\":64.0,\"map\":{{\"summary_polyline\":{}}}}}",
		serde_json::to_string(&polyline)?
	);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"token_type\":\"Bearer\",\"access_token\":\"demo-access\",\
				 \"expires_at\":4102444800,\"refresh_token\":\"demo-refresh\"}",
			);
		})
		.await;
	let route_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v3/routes/3344556677")
				.header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(route_body.as_str());
		})
		.await;
	let token_url = server.url("/oauth/token");
	let api_base = server.url("/api/v3");
	let config = BrokerConfig::from_lookup(|name| match name {
		CLIENT_ID_VAR => Some("demo-client".to_owned()),
		CLIENT_SECRET_VAR => Some("demo-secret".to_owned()),
		REFRESH_TOKEN_VAR => Some("demo-refresh".to_owned()),
		ROUTE_ID_VAR => Some("3344556677".to_owned()),
		TOKEN_URL_VAR => Some(token_url.clone()),
		API_BASE_URL_VAR => Some(api_base.clone()),
		_ => None,
	})?;
	// The mock serves a self-signed certificate.
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let broker =
		ReqwestBroker::with_http_client(config, http_client, Arc::new(ReqwestTransportErrorMapper));
	let response =
		broker.handle_route_request(RouteQuery::default().with_viewport(640., 360., 24.)).await;

	println!("HTTP {}", response.status);
	println!("{}", serde_json::to_string_pretty(&response.body)?);

	token_mock.assert_async().await;
	route_mock.assert_async().await;

	Ok(())
}

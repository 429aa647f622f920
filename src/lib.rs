//! Strava token broker and route geometry codec for the weekly long run challenge: cached OAuth
//! refreshes with singleflight guards, polyline decoding, and viewport projection.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod geometry;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod route;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::BrokerConfig, flows::Broker, http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a configuration whose token and API endpoints live on the provided mock base URL.
	pub fn mock_config(base_url: &str) -> BrokerConfig {
		let token_endpoint = Url::parse(&format!("{base_url}/oauth/token"))
			.expect("Mock token endpoint should parse successfully.");
		let api_base = Url::parse(&format!("{base_url}/api/v3"))
			.expect("Mock API base URL should parse successfully.");

		BrokerConfig::default().with_token_endpoint(token_endpoint).with_api_base(api_base)
	}

	/// Constructs a [`Broker`] backed by the reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(config: BrokerConfig) -> ReqwestTestBroker {
		Broker::with_http_client(
			config,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};

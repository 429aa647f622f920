//! Transport primitives for Strava token refreshes and route fetches.
//!
//! The module exposes [`UpstreamHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so callers can plug in custom HTTP stacks without losing the
//! broker's error classification. Implementations call [`ResponseMetadataSlot::take`] before
//! dispatching a request and [`ResponseMetadataSlot::store`] once the response status is known;
//! non-success responses also record their body so upstream rejections can be surfaced
//! verbatim.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports used for both the OAuth refresh and the route fetch.
///
/// The broker requests a short-lived [`AsyncHttpClient`] handle per upstream call, each carrying
/// a clone of a [`ResponseMetadataSlot`]. Implementations must be `Send + Sync + 'static` so one
/// transport can back every clone of a broker, and the request futures their handles return
/// must be `Send`.
pub trait UpstreamHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the request.
	/// - Once a response arrives, save its status with [`ResponseMetadataSlot::store`], including
	///   the body when the status is not a success.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned upstream, if available.
	pub status: Option<u16>,
	/// Response body, recorded only for non-success statuses.
	pub body: Option<String>,
}
impl ResponseMetadata {
	/// Builds metadata for a response, keeping the body only when `status` is not `2xx`.
	pub fn from_response(status: u16, body: &[u8]) -> Self {
		let body = (!(200..300).contains(&status))
			.then(|| String::from_utf8_lossy(body).into_owned());

		Self { status: Some(status), body }
	}

	/// Returns the status when it falls outside `2xx`.
	pub fn failure_status(&self) -> Option<u16> {
		self.status.filter(|status| !(200..300).contains(status))
	}
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints answer directly, so custom clients passed in via
/// [`ReqwestHttpClient::with_client`] should keep redirect following disabled.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
#[cfg(feature = "reqwest")]
impl UpstreamHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}
}

#[cfg(feature = "reqwest")]
struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that records [`ResponseMetadata`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(Box::new)?.to_vec();

			client.slot.store(ResponseMetadata::from_response(status.as_u16(), &body));

			let mut response_new = HttpResponse::new(body);

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_keeps_body_only_for_failures() {
		let ok = ResponseMetadata::from_response(200, b"{\"access_token\":\"secret\"}");
		let rejected = ResponseMetadata::from_response(401, b"{\"message\":\"Authorization Error\"}");

		assert_eq!(ok.status, Some(200));
		assert!(ok.body.is_none());
		assert!(ok.failure_status().is_none());
		assert_eq!(rejected.failure_status(), Some(401));
		assert_eq!(rejected.body.as_deref(), Some("{\"message\":\"Authorization Error\"}"));
	}

	#[test]
	fn slot_take_consumes_metadata() {
		let slot = ResponseMetadataSlot::default();
		let shared = slot.clone();

		shared.store(ResponseMetadata::from_response(404, b"missing"));

		assert_eq!(slot.take().and_then(|meta| meta.failure_status()), Some(404));
		assert!(shared.take().is_none());
	}
}

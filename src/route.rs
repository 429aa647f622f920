//! Route payloads exchanged with Strava and with the HTTP layer that calls the broker.

pub mod id;

pub use id::*;

// self
use crate::{
	_prelude::*,
	geometry::{self, BoundingBox, Viewport, ViewportError},
};

const STRAVA_ROUTE_URL: &str = "https://www.strava.com/routes";

/// Route metadata as returned by Strava's `GET /routes/{id}`.
///
/// Only the fields the challenge page needs are modeled; everything else is ignored.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RouteSummary {
	/// Numeric route identifier.
	pub id: u64,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Route length in meters.
	#[serde(default)]
	pub distance: f64,
	/// Cumulative elevation gain in meters.
	#[serde(default)]
	pub elevation_gain: f64,
	/// Nested map object carrying the encoded polylines.
	#[serde(default)]
	pub map: Option<RouteMap>,
}
impl RouteSummary {
	/// Encoded polyline for the route, preferring the summary variant.
	pub fn encoded_polyline(&self) -> Option<&str> {
		let map = self.map.as_ref()?;

		map.summary_polyline
			.as_deref()
			.filter(|line| !line.is_empty())
			.or_else(|| map.polyline.as_deref().filter(|line| !line.is_empty()))
	}
}

/// Polyline container nested in [`RouteSummary`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RouteMap {
	/// Low-resolution polyline.
	#[serde(default)]
	pub summary_polyline: Option<String>,
	/// Full-resolution polyline.
	#[serde(default)]
	pub polyline: Option<String>,
}

/// Projected route geometry attached to a payload when a viewport was requested.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteGeometry {
	/// SVG path description (`M x,y L x,y ...`).
	pub path: String,
	/// Geographic bounding box the path was projected from.
	pub bounds: BoundingBox,
	/// Drawing surface width.
	pub width: f64,
	/// Drawing surface height.
	pub height: f64,
}

/// Success payload returned to the page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoutePayload {
	/// Numeric route identifier.
	pub id: u64,
	/// Display name.
	pub name: String,
	/// Route length in meters.
	pub distance: f64,
	/// Cumulative elevation gain in meters.
	pub elevation_gain: f64,
	/// Encoded polyline, when Strava supplied one.
	pub summary_polyline: Option<String>,
	/// Public Strava page for the route.
	pub strava_url: String,
	/// Projected geometry, when requested and drawable.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub geometry: Option<RouteGeometry>,
}
impl RoutePayload {
	/// Shapes a payload from upstream data, projecting the polyline into `viewport` if given.
	///
	/// Undecodable polylines degrade to a payload without geometry.
	pub fn from_summary(summary: RouteSummary, viewport: Option<Viewport>) -> Self {
		let geometry = viewport.and_then(|viewport| {
			let encoded = summary.encoded_polyline()?;
			let points = geometry::decode_or_empty(encoded);
			let projected = geometry::project(&points, viewport);
			let bounds = projected.bounds?;

			Some(RouteGeometry {
				path: projected.path,
				bounds,
				width: viewport.width,
				height: viewport.height,
			})
		});
		let summary_polyline = summary.encoded_polyline().map(str::to_owned);

		Self {
			id: summary.id,
			strava_url: format!("{STRAVA_ROUTE_URL}/{}", summary.id),
			name: summary.name,
			distance: summary.distance,
			elevation_gain: summary.elevation_gain,
			summary_polyline,
			geometry,
		}
	}
}

/// Query parameters accepted by the route endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RouteQuery {
	/// Requested route; falls back to the configured default.
	#[serde(default, rename = "routeId")]
	pub route_id: Option<String>,
	/// Drawing surface width; geometry is only produced when both dimensions are present.
	#[serde(default)]
	pub width: Option<f64>,
	/// Drawing surface height.
	#[serde(default)]
	pub height: Option<f64>,
	/// Inner padding of the drawing surface, defaults to zero.
	#[serde(default)]
	pub padding: Option<f64>,
}
impl RouteQuery {
	/// Creates a query for the provided route identifier.
	pub fn for_route(route_id: impl Into<String>) -> Self {
		Self { route_id: Some(route_id.into()), ..Default::default() }
	}

	/// Requests projected geometry on a `width` x `height` surface.
	pub fn with_viewport(mut self, width: f64, height: f64, padding: f64) -> Self {
		self.width = Some(width);
		self.height = Some(height);
		self.padding = Some(padding);

		self
	}

	/// Viewport described by the query, if both dimensions are present.
	pub fn viewport(&self) -> Result<Option<Viewport>, ViewportError> {
		let (Some(width), Some(height)) = (self.width, self.height) else {
			return Ok(None);
		};

		Viewport::checked(width, height, self.padding.unwrap_or(0.)).map(Some)
	}
}

/// Error body returned by the route endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Human-readable error message.
	pub error: String,
	/// Upstream response body, when the failure originated upstream.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
}
impl From<&Error> for ErrorBody {
	fn from(err: &Error) -> Self {
		Self { error: err.to_string(), details: err.details().map(str::to_owned) }
	}
}

/// Framework-neutral response handed back to the HTTP layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteResponse {
	/// HTTP status code.
	pub status: u16,
	/// JSON body.
	pub body: serde_json::Value,
}
impl RouteResponse {
	/// Builds a `200` response carrying the payload.
	pub fn ok(payload: &RoutePayload) -> Self {
		Self { status: 200, body: to_json_value(payload) }
	}

	/// Builds an error response whose status follows [`Error::status_code`].
	pub fn from_error(err: &Error) -> Self {
		Self { status: err.status_code(), body: to_json_value(&ErrorBody::from(err)) }
	}
}

fn to_json_value<T>(value: &T) -> serde_json::Value
where
	T: Serialize,
{
	// Payload types only hold strings, integers, and floats; non-finite floats become null.
	serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

//! Route geometry: encoded polyline decoding and projection onto a bounded drawing surface.
//!
//! Both halves are pure and deterministic so identical inputs always produce byte-identical
//! output, which keeps shareable links and snapshots stable.

pub mod polyline;
pub mod projection;

pub use polyline::*;
pub use projection::*;

// self
use crate::_prelude::*;

/// Geographic coordinate in decimal degrees at 1e-5 precision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	/// Latitude in degrees.
	pub lat: f64,
	/// Longitude in degrees.
	pub lng: f64,
}
impl GeoPoint {
	/// Creates a point from decimal degrees.
	pub const fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}
}

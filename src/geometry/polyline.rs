//! Encoded polyline codec (precision 5, offset 63, 5-bit chunks, zig-zag deltas).
//!
//! Each coordinate is stored as the delta from its predecessor. A delta is zig-zag mapped to an
//! unsigned value and emitted least significant chunk first; every chunk except the last sets
//! the `0x20` continuation bit and is offset by 63 into printable ASCII.

// self
use crate::{_prelude::*, geometry::GeoPoint};

const PRECISION: f64 = 1e5;
const CHAR_OFFSET: u8 = 63;
const CHUNK_MASK: u64 = 0x1f;
const CONTINUATION: u64 = 0x20;
// Twelve chunks carry 60 bits, far beyond any valid coordinate delta.
const MAX_SHIFT: u32 = 55;

/// Errors raised by [`decode`] for malformed input.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PolylineError {
	/// Input ended inside a value whose last chunk still had the continuation bit set.
	#[error("Polyline ends inside a value at byte {offset}.")]
	UnexpectedEnd {
		/// Byte offset where more input was expected.
		offset: usize,
	},
	/// Input ended after a latitude without the matching longitude.
	#[error("Polyline ends after a latitude starting at byte {offset}.")]
	DanglingLatitude {
		/// Byte offset of the unmatched latitude.
		offset: usize,
	},
	/// A byte outside the printable polyline alphabet (`?` through `~`).
	#[error("Polyline contains invalid byte {byte:#04x} at {offset}.")]
	InvalidByte {
		/// Byte offset of the offending byte.
		offset: usize,
		/// Offending byte.
		byte: u8,
	},
	/// A value or running coordinate exceeded 64-bit range.
	#[error("Polyline value starting at byte {offset} overflows.")]
	Overflow {
		/// Byte offset of the value.
		offset: usize,
	},
}

/// Decodes an encoded polyline into coordinates, preserving traversal order.
///
/// An empty string yields an empty vector. A trailing half pair is an error; no partial
/// coordinate is ever emitted.
pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, PolylineError> {
	let bytes = encoded.as_bytes();
	let mut cursor = 0;
	let mut lat = 0_i64;
	let mut lng = 0_i64;
	let mut points = Vec::new();

	while cursor < bytes.len() {
		let pair_start = cursor;
		let lat_delta = next_delta(bytes, &mut cursor)?;

		if cursor >= bytes.len() {
			return Err(PolylineError::DanglingLatitude { offset: pair_start });
		}

		let lng_start = cursor;
		let lng_delta = next_delta(bytes, &mut cursor)?;

		lat = lat.checked_add(lat_delta).ok_or(PolylineError::Overflow { offset: pair_start })?;
		lng = lng.checked_add(lng_delta).ok_or(PolylineError::Overflow { offset: lng_start })?;

		points.push(GeoPoint::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
	}

	Ok(points)
}

/// Decodes `encoded`, substituting an empty vector for malformed input.
///
/// The route is still meaningful without a drawable path, so callers that only decorate a
/// response with geometry use this instead of [`decode`].
pub fn decode_or_empty(encoded: &str) -> Vec<GeoPoint> {
	match decode(encoded) {
		Ok(points) => points,
		Err(err) => {
			#[cfg(feature = "tracing")]
			tracing::debug!(error = %err, "discarding malformed polyline");
			#[cfg(not(feature = "tracing"))]
			let _ = err;

			Vec::new()
		},
	}
}

/// Encodes coordinates, rounding each to the 1e-5 grid.
pub fn encode(points: &[GeoPoint]) -> String {
	let mut buf = String::new();
	let mut prev_lat = 0_i64;
	let mut prev_lng = 0_i64;

	for point in points {
		let lat = to_fixed(point.lat);
		let lng = to_fixed(point.lng);

		push_delta(&mut buf, lat.wrapping_sub(prev_lat));
		push_delta(&mut buf, lng.wrapping_sub(prev_lng));

		prev_lat = lat;
		prev_lng = lng;
	}

	buf
}

fn next_delta(bytes: &[u8], cursor: &mut usize) -> Result<i64, PolylineError> {
	let start = *cursor;
	let mut value = 0_u64;
	let mut shift = 0_u32;

	loop {
		let offset = *cursor;
		let byte = *bytes.get(offset).ok_or(PolylineError::UnexpectedEnd { offset })?;
		let chunk = match byte.checked_sub(CHAR_OFFSET) {
			Some(chunk) if chunk < 64 => u64::from(chunk),
			_ => return Err(PolylineError::InvalidByte { offset, byte }),
		};

		if shift > MAX_SHIFT {
			return Err(PolylineError::Overflow { offset: start });
		}

		value |= (chunk & CHUNK_MASK) << shift;
		shift += 5;
		*cursor += 1;

		if chunk & CONTINUATION == 0 {
			break;
		}
	}

	Ok(unzigzag(value))
}

fn unzigzag(value: u64) -> i64 {
	let magnitude = (value >> 1) as i64;

	if value & 1 == 1 { !magnitude } else { magnitude }
}

fn zigzag(delta: i64) -> u64 {
	((delta << 1) ^ (delta >> 63)) as u64
}

fn push_delta(buf: &mut String, delta: i64) {
	let mut value = zigzag(delta);

	while value >= CONTINUATION {
		buf.push(char::from((CONTINUATION | (value & CHUNK_MASK)) as u8 + CHAR_OFFSET));
		value >>= 5;
	}

	buf.push(char::from(value as u8 + CHAR_OFFSET));
}

fn to_fixed(degrees: f64) -> i64 {
	(degrees * PRECISION).round() as i64
}

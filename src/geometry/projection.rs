//! Aspect-preserving projection of coordinates onto a padded drawing surface.

// self
use crate::{_prelude::*, geometry::GeoPoint};

/// Viewport parameter that cannot describe a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Invalid parameter `{parameter}`: {reason}.")]
pub struct ViewportError {
	/// Offending parameter: `width`, `height`, or `padding`.
	pub parameter: &'static str,
	/// What is wrong with its value.
	pub reason: &'static str,
}

/// Target drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
	/// Surface width.
	pub width: f64,
	/// Surface height.
	pub height: f64,
	/// Margin kept free on every side.
	pub padding: f64,
}
impl Viewport {
	/// Creates a viewport.
	pub const fn new(width: f64, height: f64, padding: f64) -> Self {
		Self { width, height, padding }
	}

	/// Creates a viewport, rejecting values [`Viewport::validate`] would refuse.
	pub fn checked(width: f64, height: f64, padding: f64) -> Result<Self, ViewportError> {
		let viewport = Self::new(width, height, padding);

		viewport.validate()?;

		Ok(viewport)
	}

	/// Checks that the surface is finite, positive, and leaves room inside the padding.
	pub fn validate(&self) -> Result<(), ViewportError> {
		let reject = |parameter: &'static str, reason: &'static str| {
			Err(ViewportError { parameter, reason })
		};

		for (parameter, value) in
			[("width", self.width), ("height", self.height), ("padding", self.padding)]
		{
			if !value.is_finite() {
				return reject(parameter, "must be a finite number");
			}
		}
		for (parameter, value) in [("width", self.width), ("height", self.height)] {
			if value <= 0. {
				return reject(parameter, "must be greater than zero");
			}
		}
		if self.padding < 0. {
			return reject("padding", "must not be negative");
		}
		if 2. * self.padding >= self.width.min(self.height) {
			return reject("padding", "must be less than half of width and height");
		}

		Ok(())
	}

	fn inner_width(&self) -> f64 {
		(self.width - 2. * self.padding).max(0.)
	}

	fn inner_height(&self) -> f64 {
		(self.height - 2. * self.padding).max(0.)
	}
}

/// Axis-aligned geographic bounds of a point set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
	/// Westernmost longitude.
	pub min_lng: f64,
	/// Easternmost longitude.
	pub max_lng: f64,
	/// Southernmost latitude.
	pub min_lat: f64,
	/// Northernmost latitude.
	pub max_lat: f64,
}
impl BoundingBox {
	/// Computes bounds over `points`; `None` when empty.
	pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
		let (first, rest) = points.split_first()?;
		let seed = Self { min_lng: first.lng, max_lng: first.lng, min_lat: first.lat, max_lat: first.lat };

		Some(rest.iter().fold(seed, |bounds, point| Self {
			min_lng: bounds.min_lng.min(point.lng),
			max_lng: bounds.max_lng.max(point.lng),
			min_lat: bounds.min_lat.min(point.lat),
			max_lat: bounds.max_lat.max(point.lat),
		}))
	}

	/// Longitude extent.
	pub fn lng_span(&self) -> f64 {
		self.max_lng - self.min_lng
	}

	/// Latitude extent.
	pub fn lat_span(&self) -> f64 {
		self.max_lat - self.min_lat
	}
}

/// Point in drawing-surface coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProjectedPoint {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

/// Output of [`project`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProjectedRoute {
	/// SVG path description; empty when fewer than two points were supplied.
	pub path: String,
	/// Projected points in traversal order, unrounded.
	pub points: Vec<ProjectedPoint>,
	/// Geographic bounds the projection was computed from.
	pub bounds: Option<BoundingBox>,
}
impl ProjectedRoute {
	/// Returns `true` when nothing is drawable.
	pub fn is_empty(&self) -> bool {
		self.path.is_empty()
	}
}

/// Projects `points` onto `viewport` with a single uniform scale, centered in the padded area.
///
/// Longitude maps to x and latitude to y with north at the top. Fewer than two points, or a
/// viewport that fails [`Viewport::validate`], produce an empty route. Path coordinates are fixed to two decimals so identical inputs render
/// byte-identical paths.
pub fn project(points: &[GeoPoint], viewport: Viewport) -> ProjectedRoute {
	if points.len() < 2 || viewport.validate().is_err() {
		return ProjectedRoute::default();
	}

	let Some(bounds) = BoundingBox::from_points(points) else {
		return ProjectedRoute::default();
	};
	let inner_width = viewport.inner_width();
	let inner_height = viewport.inner_height();
	let lng_span = bounds.lng_span();
	let lat_span = bounds.lat_span();
	let scale = (inner_width / non_zero(lng_span)).min(inner_height / non_zero(lat_span));
	let offset_x = viewport.padding + (inner_width - lng_span * scale) / 2.;
	let offset_y = viewport.padding + (inner_height - lat_span * scale) / 2.;
	let projected = points
		.iter()
		.map(|point| ProjectedPoint {
			x: offset_x + (point.lng - bounds.min_lng) * scale,
			y: offset_y + (bounds.max_lat - point.lat) * scale,
		})
		.collect::<Vec<_>>();
	let path = projected
		.iter()
		.enumerate()
		.map(|(idx, point)| {
			let command = if idx == 0 { 'M' } else { 'L' };

			format!("{command}{:.2},{:.2}", point.x, point.y)
		})
		.collect::<Vec<_>>()
		.join(" ");

	ProjectedRoute { path, points: projected, bounds: Some(bounds) }
}

fn non_zero(span: f64) -> f64 {
	if span == 0. { 1. } else { span }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const EPSILON: f64 = 1e-9;

	fn reference_points() -> Vec<GeoPoint> {
		vec![
			GeoPoint::new(38.5, -120.2),
			GeoPoint::new(40.7, -120.95),
			GeoPoint::new(43.252, -126.453),
		]
	}

	fn spans(points: &[ProjectedPoint]) -> (f64, f64) {
		let (min_x, max_x, min_y, max_y) = points.iter().fold(
			(f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
			|(min_x, max_x, min_y, max_y), p| {
				(min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
			},
		);

		(max_x - min_x, max_y - min_y)
	}

	#[test]
	fn fewer_than_two_points_is_empty() {
		let viewport = Viewport::new(100., 100., 10.);

		assert!(project(&[], viewport).is_empty());

		let single = project(&[GeoPoint::new(1., 2.)], viewport);

		assert!(single.is_empty());
		assert!(single.points.is_empty());
		assert!(single.bounds.is_none());
	}

	#[test]
	fn preserves_aspect_ratio() {
		let points = reference_points();
		let route = project(&points, Viewport::new(400., 250., 12.));
		let bounds = route.bounds.expect("Bounds should be reported for drawable routes.");
		let (x_span, y_span) = spans(&route.points);

		assert!((x_span / y_span - bounds.lng_span() / bounds.lat_span()).abs() < EPSILON);
	}

	#[test]
	fn stays_inside_padding_and_touches_limiting_axis() {
		let viewport = Viewport::new(400., 250., 12.);
		let route = project(&reference_points(), viewport);

		for point in &route.points {
			assert!(point.x >= viewport.padding - EPSILON);
			assert!(point.x <= viewport.width - viewport.padding + EPSILON);
			assert!(point.y >= viewport.padding - EPSILON);
			assert!(point.y <= viewport.height - viewport.padding + EPSILON);
		}

		let (x_span, y_span) = spans(&route.points);

		// 226 / 4.752 is smaller than 376 / 6.253, so latitude limits the scale.
		assert!((y_span - 226.).abs() < EPSILON);
		assert!(x_span < 376.);
	}

	#[test]
	fn north_is_up_and_path_is_formatted() {
		let points = vec![GeoPoint::new(0., 0.), GeoPoint::new(1., 1.)];
		let route = project(&points, Viewport::new(100., 100., 10.));

		assert_eq!(route.path, "M10.00,90.00 L90.00,10.00");
	}

	#[test]
	fn zero_span_axis_is_centered() {
		let points = vec![GeoPoint::new(10., 5.), GeoPoint::new(12., 5.)];
		let route = project(&points, Viewport::new(100., 60., 5.));

		assert_eq!(route.path, "M50.00,55.00 L50.00,5.00");

		let same = vec![GeoPoint::new(3., 3.), GeoPoint::new(3., 3.)];

		assert_eq!(project(&same, Viewport::new(80., 40., 0.)).path, "M40.00,20.00 L40.00,20.00");
	}

	#[test]
	fn unusable_viewports_are_rejected_and_project_nothing() {
		let cases = [
			(Viewport::new(100., 100., f64::NAN), "padding"),
			(Viewport::new(f64::INFINITY, 100., 0.), "width"),
			(Viewport::new(100., f64::NAN, 0.), "height"),
			(Viewport::new(0., 100., 0.), "width"),
			(Viewport::new(100., -5., 0.), "height"),
			(Viewport::new(100., 100., -1.), "padding"),
			(Viewport::new(100., 100., 80.), "padding"),
			(Viewport::new(200., 100., 50.), "padding"),
		];

		for (viewport, parameter) in cases {
			let err = viewport.validate().expect_err("Viewport should be rejected.");

			assert_eq!(err.parameter, parameter, "{viewport:?}");
			assert!(project(&reference_points(), viewport).is_empty(), "{viewport:?}");
		}

		assert!(Viewport::checked(200., 100., 49.9).is_ok());
		assert!(Viewport::checked(100., 100., 50.).is_err());
	}

	#[test]
	fn projection_is_deterministic() {
		let viewport = Viewport::new(321., 123., 7.5);
		let first = project(&reference_points(), viewport);
		let second = project(&reference_points(), viewport);

		assert_eq!(first.path, second.path);
		assert_eq!(first, second);
	}
}

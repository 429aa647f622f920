// self
use strava_route_broker::geometry::{self, GeoPoint, PolylineError, Viewport};

const REFERENCE_LINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

#[test]
fn reference_polyline_decodes_to_known_points() {
	let points = geometry::decode(REFERENCE_LINE).expect("Reference polyline should decode.");

	assert_eq!(
		points,
		[
			GeoPoint::new(38.5, -120.2),
			GeoPoint::new(40.7, -120.95),
			GeoPoint::new(43.252, -126.453),
		]
	);
}

#[test]
fn decode_errors_carry_offsets() {
	assert_eq!(geometry::decode(""), Ok(Vec::new()));
	assert!(matches!(
		geometry::decode("_p~iF"),
		Err(PolylineError::DanglingLatitude { offset: 0 })
	));
	assert!(geometry::decode_or_empty("_p~iF").is_empty());
}

#[test]
fn projected_route_fits_the_padded_viewport() {
	let points = geometry::decode(REFERENCE_LINE).expect("Reference polyline should decode.");
	let viewport = Viewport::new(640., 360., 20.);
	let route = geometry::project(&points, viewport);

	assert_eq!(route.points.len(), points.len());

	for point in &route.points {
		assert!((20.0 - 1e-9..=620.0 + 1e-9).contains(&point.x));
		assert!((20.0 - 1e-9..=340.0 + 1e-9).contains(&point.y));
	}

	// The northernmost point is drawn highest.
	let top = route
		.points
		.iter()
		.map(|point| point.y)
		.fold(f64::INFINITY, f64::min);

	assert_eq!(top, route.points[2].y);
}

#[test]
fn identical_inputs_render_identical_paths() {
	let points = geometry::decode(REFERENCE_LINE).expect("Reference polyline should decode.");
	let viewport = Viewport::new(300., 300., 0.);

	assert_eq!(geometry::project(&points, viewport).path, geometry::project(&points, viewport).path);
	assert!(geometry::project(&points[..1], viewport).is_empty());
}

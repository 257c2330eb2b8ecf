#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Great-circle distance and bounding box planning for proximity search.
//!
//! Proximity queries run in two phases: a cheap axis-aligned bounding box
//! pre-filter pushed down to the document store, then exact haversine
//! distance on the candidates that survive it. The box is an
//! over-approximation (rectangle superset of the circle), so the second
//! phase is what actually decides membership.

use disaster_map_models::BoundingBox;

/// Mean earth radius in miles, matching the haversine constant used by
/// the ingestion pipeline.
pub const EARTH_RADIUS_MILES: f64 = 3956.0;

/// Miles per degree of latitude (roughly constant everywhere).
pub const MILES_PER_LAT_DEGREE: f64 = 69.0;

/// Miles per degree of longitude at the equator; shrinks with
/// `cos(latitude)` toward the poles.
pub const MILES_PER_LON_DEGREE_EQUATOR: f64 = 69.172;

/// Below this value of `cos(latitude)` the longitude span of the box
/// would blow up, so the planner stops restricting longitude entirely.
const POLE_COS_EPSILON: f64 = 1e-6;

/// Great-circle distance in miles between two WGS84 points.
///
/// Haversine formula. Numerically stable for coincident points (returns
/// exactly 0) and for antipodal points, where floating-point error can
/// push the haversine term slightly above 1; the term is clamped before
/// the inverse sine.
#[must_use]
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

/// Plans the bounding box for a radius search around a center point.
///
/// The latitude band is `radius / 69` degrees either side; the longitude
/// band widens by `1 / cos(latitude)` away from the equator. Close enough
/// to a pole that the cosine vanishes, the box spans all longitudes
/// rather than dividing toward infinity.
#[must_use]
pub fn plan_bounding_box(center_lat: f64, center_lon: f64, radius_miles: f64) -> BoundingBox {
    let lat_degree = radius_miles / MILES_PER_LAT_DEGREE;
    let lat_min = center_lat - lat_degree;
    let lat_max = center_lat + lat_degree;

    let cos_lat = center_lat.to_radians().cos();
    if cos_lat < POLE_COS_EPSILON {
        return BoundingBox::new(lat_min, lat_max, -180.0, 180.0);
    }

    let lon_degree = radius_miles / (MILES_PER_LON_DEGREE_EQUATOR * cos_lat);
    BoundingBox::new(
        lat_min,
        lat_max,
        center_lon - lon_degree,
        center_lon + lon_degree,
    )
}

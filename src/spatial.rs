//! Geometry utilities: destination points, great-circle distance, and
//! bounding-box expansion.
//!
//! All formulas assume a spherical Earth of radius 6371 km. These are pure
//! functions over lon/lat `geo::Point`s; nothing here touches an index or a
//! network.

use crate::error::{PlaceCoverError, Result};
use geo::Point;

/// Mean Earth radius in kilometers used by every spherical formula in this
/// crate. Descriptor coordinates are derived from it, so it is part of the
/// persisted plan format and must not drift.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default half-extent applied to each side of an expanded bounding box.
pub const DEFAULT_BBOX_EXPANSION_KM: f64 = 10.0;

/// Validates a point has a valid longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use placecover::spatial::validate_geographic_point;
/// use geo::Point;
///
/// let riyadh = Point::new(46.6753, 24.7136);
/// assert!(validate_geographic_point(&riyadh).is_ok());
///
/// let invalid = Point::new(200.0, 40.0);
/// assert!(validate_geographic_point(&invalid).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(PlaceCoverError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(PlaceCoverError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(PlaceCoverError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(PlaceCoverError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Calculate the point at a given distance and bearing from a start point.
///
/// The bearing is measured in degrees clockwise from north. The result is
/// not range-validated: a destination may legitimately cross the
/// antimeridian.
///
/// # Examples
///
/// ```
/// use placecover::spatial::destination_point;
/// use geo::Point;
///
/// let origin = Point::new(0.0, 0.0);
/// let north = destination_point(origin, 0.0, 111.0);
/// assert!((north.y() - 1.0).abs() < 0.01);
/// assert!(north.x().abs() < 1e-9);
/// ```
pub fn destination_point(origin: Point, bearing_deg: f64, distance_km: f64) -> Point {
    let lat1 = origin.y().to_radians();
    let lon1 = origin.x().to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    Point::new(lon2.to_degrees(), lat2.to_degrees())
}

/// Great-circle distance between two points in kilometers (Haversine).
///
/// Symmetric, and zero for identical points. Coordinates are validated here
/// because callers feed raw feature geometry straight in.
///
/// # Examples
///
/// ```
/// use placecover::spatial::haversine_km;
/// use geo::Point;
///
/// let jeddah = Point::new(39.1925, 21.4858);
/// let riyadh = Point::new(46.6753, 24.7136);
///
/// let dist = haversine_km(jeddah, riyadh).unwrap();
/// assert!(dist > 800.0 && dist < 900.0);
/// assert_eq!(haversine_km(jeddah, jeddah).unwrap(), 0.0);
/// ```
pub fn haversine_km(p1: Point, p2: Point) -> Result<f64> {
    validate_geographic_point(&p1)?;
    validate_geographic_point(&p2)?;

    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let dlat = lat2 - lat1;
    let dlon = (p2.x() - p1.x()).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Ok(EARTH_RADIUS_KM * c)
}

/// Great-circle distance in meters.
pub fn haversine_m(p1: Point, p2: Point) -> Result<f64> {
    Ok(haversine_km(p1, p2)? * 1000.0)
}

/// Expand a center coordinate into a bounding box.
///
/// Returns `[south_lat, north_lat, west_lon, east_lon]`, each side pushed
/// `half_extent_km` away from the center. The box math itself cannot fail
/// for finite in-range inputs; only the center is validated.
pub fn expand_bbox(lat: f64, lon: f64, half_extent_km: f64) -> Result<[f64; 4]> {
    let center = Point::new(lon, lat);
    validate_geographic_point(&center)?;

    let north = destination_point(center, 0.0, half_extent_km);
    let south = destination_point(center, 180.0, half_extent_km);
    let east = destination_point(center, 90.0, half_extent_km);
    let west = destination_point(center, 270.0, half_extent_km);

    Ok([south.y(), north.y(), west.x(), east.x()])
}

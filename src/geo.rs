//! Geographic helpers: great-circle math for aircraft-scale distances and the
//! flat-earth offset used for canopy legs.

use crate::constants::{EARTH_RADIUS_M, METERS_PER_DEGREE_FLAT};
use crate::wind::normalize_angle;
use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Wrap a longitude into [-180, 180]
fn normalize_longitude(lng: f64) -> f64 {
    (lng + 540.0).rem_euclid(360.0) - 180.0
}

/// Great-circle destination from `origin` after `distance_m` along `bearing_deg`
pub fn destination_point(origin: LatLng, distance_m: f64, bearing_deg: f64) -> LatLng {
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();
    let brg = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * brg.cos()).asin();
    let lng2 = lng1
        + (brg.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    LatLng {
        lat: lat2.to_degrees(),
        lng: normalize_longitude(lng2.to_degrees()),
    }
}

/// Flat-earth offset, fine for the few hundred meters of a landing leg
pub fn planar_offset(origin: LatLng, distance_m: f64, bearing_deg: f64) -> LatLng {
    let brg = bearing_deg.to_radians();
    let d_lat = (distance_m / METERS_PER_DEGREE_FLAT) * brg.cos();
    let d_lng = (distance_m / METERS_PER_DEGREE_FLAT) * brg.sin() / origin.lat.to_radians().cos();
    LatLng {
        lat: origin.lat + d_lat,
        lng: origin.lng + d_lng,
    }
}

/// Initial great-circle bearing from `from` to `to` in [0, 360)
pub fn bearing(from: LatLng, to: LatLng) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    normalize_angle(y.atan2(x).to_degrees())
}

/// Haversine distance in meters
pub fn haversine_distance(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Convex hull in (lng, lat) space, counter-clockwise, without the closing point
///
/// Andrew's monotone chain. Collinear points are dropped; fewer than three
/// distinct points come back unchanged.
pub fn convex_hull(points: &[LatLng]) -> Vec<LatLng> {
    let mut pts: Vec<LatLng> = points.iter().copied().filter(LatLng::is_valid).collect();
    pts.sort_by(|a, b| a.lng.total_cmp(&b.lng).then(a.lat.total_cmp(&b.lat)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: &LatLng, a: &LatLng, b: &LatLng| (a.lng - o.lng) * (b.lat - o.lat) - (a.lat - o.lat) * (b.lng - o.lng);

    let mut lower: Vec<LatLng> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<LatLng> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bearing_east() {
        let b = bearing(LatLng::new(48.0, 11.0), LatLng::new(48.0, 12.0));
        assert!((b - 89.6).abs() < 0.05);
    }

    #[test]
    fn test_destination_point() {
        let p = destination_point(LatLng::new(52.52, 13.405), 100_000.0, 90.0);
        assert!((p.lat - 52.511).abs() < 5e-4);
        assert!((p.lng - 14.883).abs() < 5e-4);
    }

    #[test]
    fn test_destination_and_distance_agree() {
        let origin = LatLng::new(47.0, 8.0);
        let p = destination_point(origin, 2500.0, 215.0);
        assert_relative_eq!(haversine_distance(origin, p), 2500.0, epsilon = 1e-6);
        assert!((bearing(origin, p) - 215.0).abs() < 0.01);
    }

    #[test]
    fn test_longitude_wraps() {
        let p = destination_point(LatLng::new(0.0, 179.99), 5000.0, 90.0);
        assert!(p.lng < -179.9);
        assert!(p.is_valid());
    }

    #[test]
    fn test_planar_offset() {
        let origin = LatLng::new(0.0, 0.0);
        let north = planar_offset(origin, 111_000.0, 0.0);
        assert_relative_eq!(north.lat, 1.0, epsilon = 1e-12);
        assert_relative_eq!(north.lng, 0.0, epsilon = 1e-12);

        // Longitude degrees shrink with latitude
        let east = planar_offset(LatLng::new(60.0, 10.0), 111_000.0, 90.0);
        assert_relative_eq!(east.lng, 12.0, epsilon = 1e-9);

        // Negative distances go the other way
        let back = planar_offset(origin, -111_000.0, 0.0);
        assert_relative_eq!(back.lat, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_convex_hull_square_with_interior() {
        let pts = [
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 0.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(0.5, 0.5),
            LatLng::new(0.5, 0.0),
            LatLng::new(1.0, 1.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&LatLng::new(0.5, 0.5)));
        assert!(!hull.contains(&LatLng::new(0.5, 0.0)));
        assert_eq!(hull[0], LatLng::new(0.0, 0.0));
    }

    #[test]
    fn test_convex_hull_degenerate() {
        assert!(convex_hull(&[]).is_empty());
        let two = [LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)];
        assert_eq!(convex_hull(&two).len(), 2);
    }
}

//! Wind vector kernel and wind-triangle primitives.
//!
//! Directions follow the meteorological convention: a wind direction is where
//! the wind blows FROM, measured clockwise from true north. Components are
//! `u` (east) and `v` (north) of the air motion, so a 270° wind of 10 m/s has
//! `u = 10, v = 0`.

use crate::constants::NUMERICAL_TOLERANCE;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Normalize an angle in degrees to [0, 360)
pub fn normalize_angle(angle_deg: f64) -> f64 {
    let a = angle_deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Decompose speed and FROM direction into (u, v)
pub fn wind_vector(speed: f64, direction_deg: f64) -> Vector2<f64> {
    let ang = direction_deg.to_radians();
    Vector2::new(-speed * ang.sin(), -speed * ang.cos())
}

pub fn wind_speed(u: f64, v: f64) -> f64 {
    u.hypot(v)
}

/// FROM direction of the wind with components (u, v), in [0, 360)
pub fn wind_direction(u: f64, v: f64) -> f64 {
    normalize_angle((-u).atan2(-v).to_degrees())
}

/// Vector pointing along `bearing_deg` with length `magnitude`, as (east, north)
pub fn heading_vector(magnitude: f64, bearing_deg: f64) -> Vector2<f64> {
    let ang = bearing_deg.to_radians();
    Vector2::new(magnitude * ang.sin(), magnitude * ang.cos())
}

/// Angle of the wind relative to a course, in (-180, 180]
///
/// Positive when the wind comes from the right of the course.
pub fn wind_angle(course_deg: f64, wind_direction_deg: f64) -> f64 {
    let angle = normalize_angle(wind_direction_deg - course_deg);
    if angle > 180.0 {
        angle - 360.0
    } else {
        angle
    }
}

/// Wind split into the components across and along a course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindComponents {
    /// Positive from the right
    pub crosswind: f64,
    /// Positive on the nose, negative for a tailwind
    pub headwind: f64,
}

pub fn wind_components(wind_speed: f64, wind_angle_deg: f64) -> WindComponents {
    let ang = wind_angle_deg.to_radians();
    WindComponents {
        crosswind: wind_speed * ang.sin(),
        headwind: wind_speed * ang.cos(),
    }
}

/// Unsigned wind correction angle in degrees
///
/// Falls back to 0° when the crosswind exceeds the airspeed (no heading can hold
/// the course) or the airspeed is zero.
pub fn wind_correction_angle(crosswind: f64, airspeed: f64) -> f64 {
    let wca = (crosswind / airspeed).asin().to_degrees().abs();
    if wca.is_finite() {
        wca
    } else {
        0.0
    }
}

/// Result of flying a fixed course through a wind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightParameters {
    pub crosswind: f64,
    pub headwind: f64,
    pub wca: f64,
    /// Signed ground speed along the course; negative means drifting backwards
    pub ground_speed: f64,
}

/// Ground speed and correction angle for holding `course_deg`
///
/// Speeds may be in any unit as long as wind and airspeed agree.
pub fn flight_parameters(
    course_deg: f64,
    wind_direction_deg: f64,
    wind_speed: f64,
    airspeed: f64,
) -> FlightParameters {
    let angle = wind_angle(course_deg, wind_direction_deg);
    let WindComponents { crosswind, headwind } = wind_components(wind_speed, angle);
    let wca = wind_correction_angle(crosswind, airspeed);

    let ground_speed = if airspeed > crosswind.abs() {
        (airspeed * airspeed - crosswind * crosswind).sqrt() - headwind
    } else {
        -headwind
    };

    FlightParameters {
        crosswind,
        headwind,
        wca,
        ground_speed,
    }
}

/// Ground track produced by holding a heading through a wind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTrack {
    pub true_course: f64,
    pub ground_speed: f64,
    /// Signed like the crosswind
    pub wca: f64,
}

/// Vector sum of the airspeed along `heading_deg` and the wind
pub fn course_from_heading(
    heading_deg: f64,
    wind_direction_deg: f64,
    wind_speed: f64,
    airspeed: f64,
) -> GroundTrack {
    let angle = wind_angle(heading_deg, wind_direction_deg);
    let crosswind = wind_components(wind_speed, angle).crosswind;

    let ground = heading_vector(airspeed, heading_deg) + wind_vector(wind_speed, wind_direction_deg);
    let ground_speed = ground.norm();
    let true_course = if ground_speed < NUMERICAL_TOLERANCE {
        normalize_angle(heading_deg)
    } else {
        normalize_angle(ground.x.atan2(ground.y).to_degrees())
    };

    let wca = wind_correction_angle(crosswind, airspeed) * crosswind.signum();

    GroundTrack {
        true_course,
        ground_speed,
        wca,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(370.0), 10.0);
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(360.0), 0.0);
        assert!(normalize_angle(-1e-15) < 360.0);
    }

    #[test]
    fn test_wind_vector_round_trip() {
        for speed in [0.5, 3.0, 12.7, 40.0] {
            for step in 0..72 {
                let dir = step as f64 * 5.0;
                let vec = wind_vector(speed, dir);
                assert_relative_eq!(wind_speed(vec.x, vec.y), speed, epsilon = 1e-9);
                let back = wind_direction(vec.x, vec.y);
                let diff = (back - dir + 540.0).rem_euclid(360.0) - 180.0;
                assert!(diff.abs() < 1e-9, "dir {dir} came back as {back}");
            }
        }
    }

    #[test]
    fn test_west_wind_components() {
        let vec = wind_vector(10.0, 270.0);
        assert_relative_eq!(vec.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(vec.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(wind_direction(10.0, 0.0), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_direct_headwind_and_tailwind() {
        // Course west, wind from the east
        let params = flight_parameters(270.0, 90.0, 20.0, 100.0);
        assert_relative_eq!(params.headwind, -20.0, epsilon = 1e-9);
        assert!(params.crosswind.abs() < 1e-9);
        assert_relative_eq!(params.ground_speed, 120.0, epsilon = 1e-9);
        assert!(params.wca.abs() < 1e-9);
    }

    #[test]
    fn test_direct_crosswind() {
        let params = flight_parameters(360.0, 90.0, 20.0, 100.0);
        assert!(params.headwind.abs() < 1e-9);
        assert_relative_eq!(params.crosswind, 20.0, epsilon = 1e-9);
        assert!((params.wca - 11.537).abs() < 0.01);
        assert!((params.ground_speed - 97.98).abs() < 0.01);
    }

    #[test]
    fn test_wind_stronger_than_airspeed() {
        let params = flight_parameters(0.0, 0.0, 15.0, 10.0);
        assert_eq!(params.wca, 0.0);
        assert_relative_eq!(params.ground_speed, -15.0, epsilon = 1e-9);

        assert_eq!(wind_correction_angle(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_course_from_heading() {
        // Heading north at 100 with a 20 knot wind from the east drifts the track west
        let track = course_from_heading(0.0, 90.0, 20.0, 100.0);
        assert!(track.true_course > 348.0 && track.true_course < 349.0);
        assert_relative_eq!(track.ground_speed, (100.0f64.powi(2) + 20.0f64.powi(2)).sqrt(), epsilon = 1e-9);
        assert!(track.wca > 0.0);

        let calm = course_from_heading(123.0, 0.0, 0.0, 50.0);
        assert_relative_eq!(calm.true_course, 123.0, epsilon = 1e-9);
        assert_relative_eq!(calm.ground_speed, 50.0, epsilon = 1e-9);
    }
}

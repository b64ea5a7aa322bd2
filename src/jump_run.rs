//! Jump-run track and approach geometry for a single aircraft.

use crate::atmosphere::true_airspeed;
use crate::constants::{
    APPROACH_MAX_LENGTH_M, APPROACH_MIN_LENGTH_M, APPROACH_TIME_S, JUMP_RUN_MAX_TRACK_M, JUMP_RUN_MIN_TRACK_M,
    KNOTS_TO_MPS,
};
use crate::error::{ensure_finite, ensure_positive, PlannerError, Result};
use crate::geo::{destination_point, LatLng};
use crate::mean_wind::{HeightBand, MeanWind};
use crate::profile::Profile;
use crate::units::meters_to_feet;
use crate::wind::{course_from_heading, normalize_angle, wind_direction, wind_speed};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Exit separation (s) by true airspeed (kt), ascending by speed
const SEPARATION_BY_TAS: [(f64, f64); 27] = [
    (5.0, 119.0),
    (10.0, 60.0),
    (15.0, 40.0),
    (20.0, 30.0),
    (25.0, 24.0),
    (30.0, 20.0),
    (35.0, 17.0),
    (40.0, 15.0),
    (45.0, 14.0),
    (50.0, 12.0),
    (55.0, 11.0),
    (60.0, 10.0),
    (65.0, 10.0),
    (70.0, 9.0),
    (75.0, 8.0),
    (80.0, 8.0),
    (85.0, 7.0),
    (90.0, 7.0),
    (95.0, 7.0),
    (100.0, 6.0),
    (105.0, 5.0),
    (110.0, 5.0),
    (115.0, 5.0),
    (120.0, 5.0),
    (125.0, 5.0),
    (130.0, 5.0),
    (135.0, 5.0),
];

/// Seconds between exits at a true airspeed in knots
///
/// Uses the first table speed at or above `tas_kt`; faster aircraft get the
/// last entry.
pub fn separation_for_tas(tas_kt: f64) -> f64 {
    SEPARATION_BY_TAS
        .iter()
        .find(|(speed, _)| *speed >= tas_kt)
        .or(SEPARATION_BY_TAS.last())
        .map(|(_, sep)| *sep)
        .unwrap_or(5.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpRunParams {
    pub exit_altitude_agl_m: f64,
    pub opening_altitude_agl_m: f64,
    pub aircraft_ias_kt: f64,
    pub number_of_jumpers: u32,
    /// Seconds between exits; `None` picks it from the airspeed table
    pub separation_s: Option<f64>,
    /// Fixed track heading instead of the mean wind
    pub custom_direction_deg: Option<f64>,
    /// Right of track when positive
    pub lateral_offset_m: f64,
    /// Along track when positive
    pub forward_offset_m: f64,
}

impl Default for JumpRunParams {
    fn default() -> Self {
        Self {
            exit_altitude_agl_m: 3000.0,
            opening_altitude_agl_m: 1200.0,
            aircraft_ias_kt: 90.0,
            number_of_jumpers: 5,
            separation_s: None,
            custom_direction_deg: None,
            lateral_offset_m: 0.0,
            forward_offset_m: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpRunTrack {
    pub direction_deg: f64,
    pub mean_wind: MeanWind,
    pub true_airspeed_kt: f64,
    pub ground_speed_mps: f64,
    pub separation_s: f64,
    pub track_length_m: f64,
    pub start: LatLng,
    pub end: LatLng,
    pub approach_start: LatLng,
    pub approach_length_m: f64,
    pub approach_time_s: f64,
}

/// Jump run anchored at `anchor` and flown along the mean wind (or a custom heading)
pub fn plan_jump_run(anchor: LatLng, profile: &Profile, params: &JumpRunParams) -> Result<JumpRunTrack> {
    ensure_positive("aircraft airspeed", params.aircraft_ias_kt)?;
    ensure_positive("exit altitude", params.exit_altitude_agl_m)?;
    ensure_finite("lateral offset", params.lateral_offset_m)?;
    ensure_finite("forward offset", params.forward_offset_m)?;
    if params.number_of_jumpers == 0 {
        return Err(PlannerError::range("jump run needs at least one jumper"));
    }
    if profile.is_empty() {
        return Err(PlannerError::insufficient("jump run needs a profile"));
    }

    let elevation = profile.elevation_m;
    let band = HeightBand::new(elevation, elevation + params.opening_altitude_agl_m)?;
    let mean_wind = profile.mean_wind(band)?;

    let direction = match params.custom_direction_deg {
        Some(dir) if (0.0..=360.0).contains(&dir) => normalize_angle(dir),
        Some(dir) => {
            warn!(dir, "custom jump run direction out of range, using mean wind");
            mean_wind.direction_deg.round()
        }
        None => mean_wind.direction_deg.round(),
    };
    let direction = normalize_angle(direction);

    let exit_height = elevation + params.exit_altitude_agl_m;
    let tas_kt = true_airspeed(params.aircraft_ias_kt, meters_to_feet(exit_height)).unwrap_or(params.aircraft_ias_kt);
    let tas_mps = tas_kt * KNOTS_TO_MPS;

    let ground_speed = match profile.wind_at(exit_height) {
        Some(w) => course_from_heading(direction, wind_direction(w.x, w.y), wind_speed(w.x, w.y), tas_mps).ground_speed,
        None => {
            warn!(exit_height, "no wind at exit altitude, using indicated airspeed");
            params.aircraft_ias_kt * KNOTS_TO_MPS
        }
    };

    let separation = params.separation_s.unwrap_or_else(|| separation_for_tas(tas_kt));
    let track_length = (params.number_of_jumpers as f64 * separation * ground_speed)
        .round()
        .clamp(JUMP_RUN_MIN_TRACK_M, JUMP_RUN_MAX_TRACK_M);
    let approach_length = (ground_speed * APPROACH_TIME_S)
        .round()
        .clamp(APPROACH_MIN_LENGTH_M, APPROACH_MAX_LENGTH_M);

    // Forward first, then lateral
    let mut start = anchor;
    if params.forward_offset_m != 0.0 {
        start = destination_point(start, params.forward_offset_m, direction);
    }
    if params.lateral_offset_m != 0.0 {
        start = destination_point(start, params.lateral_offset_m, normalize_angle(direction + 90.0));
    }
    let end = destination_point(start, track_length, direction);
    let approach_start = destination_point(start, approach_length, normalize_angle(direction + 180.0));

    debug!(direction, track_length, ground_speed, separation, "jump run planned");

    Ok(JumpRunTrack {
        direction_deg: direction,
        mean_wind,
        true_airspeed_kt: tas_kt,
        ground_speed_mps: ground_speed,
        separation_s: separation,
        track_length_m: track_length,
        start,
        end,
        approach_start,
        approach_length_m: approach_length,
        approach_time_s: APPROACH_TIME_S,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{bearing, haversine_distance};
    use crate::profile::ProfileLevel;
    use crate::wind::wind_vector;
    use approx::assert_relative_eq;

    fn profile(speed: f64, direction: f64) -> Profile {
        let w = wind_vector(speed, direction);
        let levels = (0..=20)
            .map(|k| ProfileLevel {
                height_asl: k as f64 * 200.0,
                display_height: k as f64 * 200.0,
                pressure_hpa: None,
                temperature_c: 15.0,
                relative_humidity_pct: 50.0,
                dewpoint_c: None,
                wind_direction_deg: direction,
                wind_speed_mps: speed,
                u: w.x,
                v: w.y,
            })
            .collect();
        Profile {
            elevation_m: 0.0,
            surface_pressure_hpa: 1013.0,
            levels,
        }
    }

    const DIP: LatLng = LatLng { lat: 47.0, lng: 9.0 };

    #[test]
    fn test_separation_table() {
        assert_eq!(separation_for_tas(4.0), 119.0);
        assert_eq!(separation_for_tas(5.0), 119.0);
        assert_eq!(separation_for_tas(88.0), 7.0);
        assert_eq!(separation_for_tas(101.0), 5.0);
        assert_eq!(separation_for_tas(200.0), 5.0);
    }

    #[test]
    fn test_direction_follows_mean_wind() {
        let track = plan_jump_run(DIP, &profile(8.0, 243.4), &JumpRunParams::default()).unwrap();
        assert_eq!(track.direction_deg, 243.0);
        assert!((bearing(track.start, track.end) - 243.0).abs() < 0.05);
        assert_eq!(track.approach_time_s, 120.0);
    }

    #[test]
    fn test_track_length_from_separation() {
        let params = JumpRunParams {
            separation_s: Some(5.0),
            ..Default::default()
        };
        let track = plan_jump_run(DIP, &profile(0.0, 0.0), &params).unwrap();
        // Calm: ground speed equals TAS
        assert_relative_eq!(track.ground_speed_mps, track.true_airspeed_kt * KNOTS_TO_MPS, epsilon = 1e-9);
        assert_eq!(track.track_length_m, (5.0 * 5.0 * track.ground_speed_mps).round());
        assert!((haversine_distance(track.start, track.end) - track.track_length_m).abs() < 0.01);
        assert_eq!(track.approach_length_m, (track.ground_speed_mps * 120.0).round());
    }

    #[test]
    fn test_headwind_slows_ground_speed() {
        // Flying into a 15 m/s wind
        let track = plan_jump_run(DIP, &profile(15.0, 270.0), &JumpRunParams::default()).unwrap();
        let tas = track.true_airspeed_kt * KNOTS_TO_MPS;
        assert_relative_eq!(track.ground_speed_mps, tas - 15.0, epsilon = 1e-6);
        // Approach comes from downwind
        assert!((bearing(track.start, track.approach_start) - 90.0).abs() < 0.05);
    }

    #[test]
    fn test_lengths_are_clamped() {
        let params = JumpRunParams {
            number_of_jumpers: 200,
            separation_s: Some(30.0),
            ..Default::default()
        };
        let track = plan_jump_run(DIP, &profile(0.0, 0.0), &params).unwrap();
        assert_eq!(track.track_length_m, 10_000.0);

        let params = JumpRunParams {
            number_of_jumpers: 1,
            separation_s: Some(1.0),
            ..Default::default()
        };
        let track = plan_jump_run(DIP, &profile(0.0, 0.0), &params).unwrap();
        assert_eq!(track.track_length_m, 100.0);
    }

    #[test]
    fn test_custom_direction_and_offsets() {
        let params = JumpRunParams {
            custom_direction_deg: Some(0.0),
            forward_offset_m: 500.0,
            lateral_offset_m: 300.0,
            ..Default::default()
        };
        let track = plan_jump_run(DIP, &profile(5.0, 200.0), &params).unwrap();
        assert_eq!(track.direction_deg, 0.0);
        // North 500 m, then east 300 m
        assert!(track.start.lat > DIP.lat);
        assert!(track.start.lng > DIP.lng);
        assert!((haversine_distance(DIP, track.start) - (500.0f64.powi(2) + 300.0f64.powi(2)).sqrt()).abs() < 0.5);

        let bad = JumpRunParams {
            custom_direction_deg: Some(400.0),
            ..Default::default()
        };
        let track = plan_jump_run(DIP, &profile(5.0, 200.0), &bad).unwrap();
        assert_eq!(track.direction_deg, 200.0);
    }

    #[test]
    fn test_rejects_bad_params() {
        let p = JumpRunParams { number_of_jumpers: 0, ..Default::default() };
        assert!(plan_jump_run(DIP, &profile(0.0, 0.0), &p).is_err());
        assert!(plan_jump_run(DIP, &Profile::empty(0.0), &JumpRunParams::default()).is_err());
    }
}

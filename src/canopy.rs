//! Where to open and where to exit.
//!
//! A canopy area is the set of opening points from which the landing point (or
//! the start of the downwind leg) can still be reached. Its center sits upwind
//! of the target by the drift of the mean wind over the canopy descent; its
//! radius is the still-air distance the canopy flies in that time. Exit areas
//! shift the canopy areas back along the freefall displacement.

use crate::constants::{
    CANOPY_CIRCLE_MIN_SPAN_M, CANOPY_CIRCLE_STEP_M, CANOPY_CIRCLE_WIDE_SPAN_M, CANOPY_CIRCLE_WIDE_STEP_M,
    CANOPY_OPENING_BUFFER_M, CUTAWAY_RADIUS_M,
};
use crate::error::{ensure_finite, ensure_positive, PlannerError, Result};
use crate::freefall::FreefallResult;
use crate::geo::{destination_point, LatLng};
use crate::mean_wind::{HeightBand, MeanWind};
use crate::profile::Profile;
use crate::wind::normalize_angle;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanopyParams {
    pub opening_altitude_agl_m: f64,
    /// Height kept in reserve above the pattern
    pub safety_height_m: f64,
    pub downwind_leg_m: f64,
    pub canopy_speed_mps: f64,
    pub descent_rate_mps: f64,
}

impl CanopyParams {
    fn validate(&self) -> Result<()> {
        ensure_finite("opening altitude", self.opening_altitude_agl_m)?;
        ensure_finite("safety height", self.safety_height_m)?;
        ensure_finite("downwind leg height", self.downwind_leg_m)?;
        ensure_positive("canopy speed", self.canopy_speed_mps)?;
        ensure_positive("descent rate", self.descent_rate_mps)?;
        if self.safety_height_m < 0.0 {
            return Err(PlannerError::range("safety height must not be negative"));
        }
        Ok(())
    }

    /// Still-air distance lost to the safety height
    fn reduction_m(&self) -> f64 {
        self.safety_height_m / self.descent_rate_mps * self.canopy_speed_mps
    }
}

/// A reachable area on the ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaCircle {
    pub center: LatLng,
    pub radius_m: f64,
    /// Band whose mean wind displaced the center
    pub band: HeightBand,
    pub mean_wind: MeanWind,
    /// Wind drift applied to the center
    pub drift_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanopyAreas {
    /// Opening points that still reach the landing point
    pub full: AreaCircle,
    /// Opening points that still reach the start of the downwind leg
    pub tight: AreaCircle,
    /// Downwind-start circles for progressively lower opening heights
    pub additional: Vec<AreaCircle>,
}

/// Canopy area around `target` for a canopy flight over `band`
fn reach_circle(profile: &Profile, target: LatLng, band: HeightBand, fly_time: f64, params: &CanopyParams) -> Result<AreaCircle> {
    let mean_wind = profile.mean_wind(band)?;
    let drift = mean_wind.speed * fly_time;
    let radius = (fly_time * params.canopy_speed_mps - params.reduction_m()).max(0.0);

    Ok(AreaCircle {
        // Upwind of the target: toward where the wind comes from
        center: destination_point(target, drift, mean_wind.direction_deg),
        radius_m: radius,
        band,
        mean_wind,
        drift_m: drift,
    })
}

/// Canopy areas for a landing point and the downwind-leg start of its pattern
pub fn canopy_areas(profile: &Profile, landing_point: LatLng, downwind_start: LatLng, params: &CanopyParams) -> Result<CanopyAreas> {
    params.validate()?;
    if profile.is_empty() {
        return Err(PlannerError::insufficient("canopy areas need a profile"));
    }

    let elevation = profile.elevation_m;
    let canopy_top = params.opening_altitude_agl_m - CANOPY_OPENING_BUFFER_M;
    let upper = elevation + canopy_top;

    let full_band = HeightBand::new(elevation + params.safety_height_m, upper).inspect_err(|err| {
        warn!(%err, "opening altitude leaves no canopy flight");
    })?;
    let full_time = canopy_top / params.descent_rate_mps;
    let full = reach_circle(profile, landing_point, full_band, full_time, params)?;

    let tight_band = HeightBand::new(elevation + params.safety_height_m + params.downwind_leg_m, upper)
        .inspect_err(|err| {
            warn!(%err, "opening altitude below the landing pattern");
        })?;
    let tight_time = (canopy_top - params.downwind_leg_m) / params.descent_rate_mps;
    let tight = reach_circle(profile, downwind_start, tight_band, tight_time, params)?;

    let lower = elevation + params.downwind_leg_m;
    let decrement = if upper - lower <= CANOPY_CIRCLE_WIDE_SPAN_M {
        CANOPY_CIRCLE_STEP_M
    } else {
        CANOPY_CIRCLE_WIDE_STEP_M
    };
    let mut additional = Vec::new();
    let mut current = upper;
    while current >= lower + CANOPY_CIRCLE_MIN_SPAN_M {
        let band = HeightBand::new(lower, current)?;
        let time = band.thickness() / params.descent_rate_mps;
        additional.push(reach_circle(profile, downwind_start, band, time, params)?);
        current -= decrement;
    }

    debug!(
        full_radius = full.radius_m,
        tight_radius = tight.radius_m,
        additional = additional.len(),
        "canopy areas"
    );

    Ok(CanopyAreas { full, tight, additional })
}

/// Exit areas: canopy areas moved back along the freefall displacement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitAreas {
    pub full: AreaCircle,
    pub tight: AreaCircle,
    pub freefall_direction_deg: f64,
    pub freefall_distance_m: f64,
    pub freefall_time_s: f64,
}

pub fn exit_areas(canopy: &CanopyAreas, freefall: &FreefallResult) -> ExitAreas {
    let back = normalize_angle(freefall.direction_deg + 180.0);
    let shift = |circle: &AreaCircle| AreaCircle {
        center: destination_point(circle.center, freefall.distance_m, back),
        ..*circle
    };

    ExitAreas {
        full: shift(&canopy.full),
        tight: shift(&canopy.tight),
        freefall_direction_deg: freefall.direction_deg,
        freefall_distance_m: freefall.distance_m,
        freefall_time_s: freefall.time_s,
    }
}

/// Condition of a released main canopy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CanopyState {
    Open,
    #[default]
    Partially,
    Collapsed,
}

impl CanopyState {
    /// Typical sink rate (m/s)
    pub fn vertical_speed_mps(self) -> f64 {
        match self {
            CanopyState::Open => 4.1,
            CanopyState::Partially => 12.8,
            CanopyState::Collapsed => 39.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutawayParams {
    pub altitude_agl_m: f64,
    pub state: CanopyState,
}

impl Default for CutawayParams {
    fn default() -> Self {
        Self {
            altitude_agl_m: 1000.0,
            state: CanopyState::Partially,
        }
    }
}

/// Expected landing area of a released main canopy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutawayArea {
    pub center: LatLng,
    pub radius_m: f64,
    pub mean_wind: MeanWind,
    pub descent_time_s: f64,
    pub drift_m: f64,
}

pub fn cutaway_area(profile: &Profile, cutaway_point: LatLng, params: &CutawayParams) -> Result<CutawayArea> {
    let altitude = ensure_positive("cutaway altitude", params.altitude_agl_m)?;
    let elevation = profile.elevation_m;
    let mean_wind = profile.mean_wind(HeightBand::new(elevation, elevation + altitude)?)?;

    let descent_time = altitude / params.state.vertical_speed_mps();
    let drift = mean_wind.speed * descent_time;
    // Downwind of the release point
    let center = destination_point(cutaway_point, drift, normalize_angle(mean_wind.direction_deg + 180.0));

    Ok(CutawayArea {
        center,
        radius_m: CUTAWAY_RADIUS_M,
        mean_wind,
        descent_time_s: descent_time,
        drift_m: drift,
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
                height_asl: 38.0 + k as f64 * 200.0,
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
            elevation_m: 38.0,
            surface_pressure_hpa: 1007.2,
            levels,
        }
    }

    fn params(safety: f64) -> CanopyParams {
        CanopyParams {
            opening_altitude_agl_m: 1200.0,
            safety_height_m: safety,
            downwind_leg_m: 300.0,
            canopy_speed_mps: 20.0 * 0.514444,
            descent_rate_mps: 3.5,
        }
    }

    const DIP: LatLng = LatLng { lat: 52.52, lng: 13.41 };

    #[test]
    fn test_radii_follow_geometry() {
        let areas = canopy_areas(&profile(0.0, 0.0), DIP, DIP, &params(0.0)).unwrap();
        let canopy = 20.0 * 0.514444;
        assert_relative_eq!(areas.full.radius_m, 1000.0 / 3.5 * canopy, epsilon = 1e-9);
        assert_relative_eq!(areas.tight.radius_m, 700.0 / 3.5 * canopy, epsilon = 1e-9);
        // No wind, centers stay on their targets
        assert!(haversine_distance(areas.full.center, DIP) < 1e-6);
    }

    #[test]
    fn test_safety_height_reduces_radii() {
        let areas = canopy_areas(&profile(5.0, 230.0), DIP, DIP, &params(300.0)).unwrap();
        assert_relative_eq!(areas.full.radius_m, 2057.78, epsilon = 0.1);
        assert_relative_eq!(areas.tight.radius_m, 1175.87, epsilon = 0.1);
    }

    #[test]
    fn test_center_is_upwind() {
        let areas = canopy_areas(&profile(5.0, 270.0), DIP, DIP, &params(0.0)).unwrap();
        let drift = 5.0 * 1000.0 / 3.5;
        assert_relative_eq!(areas.full.drift_m, drift, epsilon = 1e-6);
        assert!((haversine_distance(DIP, areas.full.center) - drift).abs() < 0.5);
        assert!((bearing(DIP, areas.full.center) - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_additional_circles() {
        let areas = canopy_areas(&profile(3.0, 180.0), DIP, DIP, &params(0.0)).unwrap();
        // Span 700 m steps by 200 m: uppers at 1000, 800, 600 above ground
        assert_eq!(areas.additional.len(), 3);
        let radii: Vec<f64> = areas.additional.iter().map(|c| c.radius_m).collect();
        assert!(radii.windows(2).all(|w| w[1] < w[0]));
        assert_relative_eq!(areas.additional[0].band.upper, 38.0 + 1000.0, epsilon = 1e-9);

        // Wide spans step by 500 m
        let high = CanopyParams { opening_altitude_agl_m: 2500.0, ..params(0.0) };
        let areas = canopy_areas(&profile(3.0, 180.0), DIP, DIP, &high).unwrap();
        let uppers: Vec<f64> = areas.additional.iter().map(|c| c.band.upper - 38.0).collect();
        assert_eq!(uppers, vec![2300.0, 1800.0, 1300.0, 800.0]);
    }

    #[test]
    fn test_exit_areas_shift_back() {
        let areas = canopy_areas(&profile(0.0, 0.0), DIP, DIP, &params(0.0)).unwrap();
        let freefall = FreefallResult {
            points: Vec::new(),
            north_m: 0.0,
            east_m: 165.0,
            direction_deg: 90.0,
            distance_m: 165.0,
            time_s: 45.0,
            stop_height_asl: 1038.0,
        };
        let exit = exit_areas(&areas, &freefall);
        assert!((haversine_distance(exit.full.center, DIP) - 165.0).abs() < 0.01);
        assert!((bearing(DIP, exit.full.center) - 270.0).abs() < 0.01);
        assert_eq!(exit.full.radius_m, areas.full.radius_m);
        assert_eq!(exit.freefall_distance_m, 165.0);
    }

    #[test]
    fn test_cutaway_drifts_downwind() {
        let area = cutaway_area(&profile(6.0, 270.0), DIP, &CutawayParams::default()).unwrap();
        let expected = 6.0 * 1000.0 / 12.8;
        assert_relative_eq!(area.drift_m, expected, epsilon = 1e-6);
        assert!((bearing(DIP, area.center) - 90.0).abs() < 0.1);
        assert_eq!(area.radius_m, 150.0);

        let collapsed = CutawayParams { state: CanopyState::Collapsed, ..Default::default() };
        let fast = cutaway_area(&profile(6.0, 270.0), DIP, &collapsed).unwrap();
        assert!(fast.drift_m < area.drift_m);
    }

    #[test]
    fn test_opening_below_pattern_is_rejected() {
        let low = CanopyParams { opening_altitude_agl_m: 400.0, ..params(0.0) };
        assert!(matches!(
            canopy_areas(&profile(0.0, 0.0), DIP, DIP, &low),
            Err(PlannerError::InvalidRange(_))
        ));
    }
}

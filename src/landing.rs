//! Three-leg landing pattern (downwind, base, final) flown backwards from the
//! landing point.
//!
//! Each leg covers its own height band and is flown through that band's mean
//! wind. The legs are computed in reverse flight order: final ends at the
//! landing point, base ends where final starts, and downwind ends where base
//! starts.

use crate::error::{ensure_finite, ensure_positive, PlannerError, Result};
use crate::geo::{planar_offset, LatLng};
use crate::mean_wind::{HeightBand, MeanWind};
use crate::profile::Profile;
use crate::wind::{flight_parameters, normalize_angle, wind_angle, wind_components, wind_correction_angle};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Turn direction of the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatternSide {
    /// Left turns, base leg flown at landing direction + 90°
    #[default]
    #[serde(rename = "LL")]
    Left,
    #[serde(rename = "RR")]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegKind {
    Final,
    Base,
    Downwind,
}

/// Heights above ground where each leg begins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegHeights {
    pub final_m: f64,
    pub base_m: f64,
    pub downwind_m: f64,
}

impl Default for LegHeights {
    fn default() -> Self {
        Self {
            final_m: 100.0,
            base_m: 200.0,
            downwind_m: 300.0,
        }
    }
}

impl LegHeights {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("final leg height", self.final_m)?;
        ensure_finite("base leg height", self.base_m)?;
        ensure_finite("downwind leg height", self.downwind_m)?;
        if self.final_m <= 0.0 || self.base_m <= self.final_m || self.downwind_m <= self.base_m {
            return Err(PlannerError::range(format!(
                "leg heights must satisfy 0 < final < base < downwind (got {}/{}/{})",
                self.final_m, self.base_m, self.downwind_m
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandingPatternParams {
    pub leg_heights: LegHeights,
    pub canopy_speed_mps: f64,
    pub descent_rate_mps: f64,
    pub side: PatternSide,
    /// Heading on final; defaults to the surface wind direction (into the wind)
    pub landing_direction_deg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandingLeg {
    pub kind: LegKind,
    pub band: HeightBand,
    pub mean_wind: MeanWind,
    pub heading_deg: f64,
    /// Ground track flown
    pub course_deg: f64,
    /// Signed; negative when the canopy is pushed backwards
    pub ground_speed_mps: f64,
    pub duration_s: f64,
    pub length_m: f64,
    pub start: LatLng,
    pub end: LatLng,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingPattern {
    pub landing_direction_deg: f64,
    pub landing_point: LatLng,
    pub final_leg: LandingLeg,
    pub base_leg: LandingLeg,
    pub downwind_leg: LandingLeg,
}

impl LandingPattern {
    /// Legs in reverse flight order: final, base, downwind
    pub fn legs(&self) -> [&LandingLeg; 3] {
        [&self.final_leg, &self.base_leg, &self.downwind_leg]
    }

    pub fn downwind_start(&self) -> LatLng {
        self.downwind_leg.start
    }
}

/// Leg start for a leg ending at `end`
///
/// A canopy drifting backwards (negative ground speed) started on the far side
/// of `end`, so the bearing flips.
fn leg_start(end: LatLng, ground_speed: f64, duration: f64, course: f64) -> (LatLng, f64) {
    let mut bearing = course + 180.0;
    if ground_speed < 0.0 {
        bearing += 180.0;
    }
    let length = ground_speed.abs() * duration;
    (planar_offset(end, length, normalize_angle(bearing)), length)
}

/// Leg held on a fixed course with the heading crabbed into the wind
fn course_leg(kind: LegKind, band: HeightBand, wind: MeanWind, course: f64, end: LatLng, params: &LandingPatternParams) -> LandingLeg {
    let fp = flight_parameters(course, wind.direction_deg, wind.speed, params.canopy_speed_mps);
    let duration = band.thickness() / params.descent_rate_mps;
    let (start, length) = leg_start(end, fp.ground_speed, duration, course);

    LandingLeg {
        kind,
        band,
        mean_wind: wind,
        heading_deg: normalize_angle(course + fp.wca * fp.crosswind.signum()),
        course_deg: normalize_angle(course),
        ground_speed_mps: fp.ground_speed,
        duration_s: duration,
        length_m: length,
        start,
        end,
    }
}

/// Base leg held on a fixed heading, drifting with the crosswind
fn heading_leg(band: HeightBand, wind: MeanWind, heading: f64, end: LatLng, params: &LandingPatternParams) -> LandingLeg {
    let airspeed = params.canopy_speed_mps;
    let crosswind = wind_components(wind.speed, wind_angle(heading, wind.direction_deg)).crosswind;
    let wca = wind_correction_angle(crosswind, airspeed) * crosswind.signum();
    // Crosswind from the right drifts the track left of the heading
    let course = normalize_angle(heading - wca);
    let headwind = wind_components(wind.speed, wind_angle(course, wind.direction_deg)).headwind;
    let ground_speed = airspeed - headwind;

    let duration = band.thickness() / params.descent_rate_mps;
    let (start, length) = leg_start(end, ground_speed, duration, course);
    if ground_speed < 0.0 {
        debug!(ground_speed, course, "base leg reversed, wind exceeds canopy speed");
    }

    LandingLeg {
        kind: LegKind::Base,
        band,
        mean_wind: wind,
        heading_deg: normalize_angle(heading),
        course_deg: course,
        ground_speed_mps: ground_speed,
        duration_s: duration,
        length_m: length,
        start,
        end,
    }
}

/// Plan the landing pattern ending at `landing_point`
pub fn plan_landing_pattern(landing_point: LatLng, profile: &Profile, params: &LandingPatternParams) -> Result<LandingPattern> {
    params.leg_heights.validate()?;
    ensure_positive("canopy speed", params.canopy_speed_mps)?;
    ensure_positive("descent rate", params.descent_rate_mps)?;
    if !landing_point.is_valid() {
        return Err(PlannerError::degenerate(format!("invalid landing point {landing_point:?}")));
    }
    let surface = profile
        .surface()
        .ok_or_else(|| PlannerError::insufficient("landing pattern needs a profile"))?;

    let landing_direction = match params.landing_direction_deg {
        Some(dir) => normalize_angle(ensure_finite("landing direction", dir)?),
        None => surface.wind_direction_deg,
    };

    let elevation = profile.elevation_m;
    let legs = &params.leg_heights;

    let final_band = HeightBand::new(elevation, elevation + legs.final_m)?;
    let final_leg = course_leg(
        LegKind::Final,
        final_band,
        profile.mean_wind(final_band)?,
        landing_direction,
        landing_point,
        params,
    );

    let base_band = HeightBand::new(elevation + legs.final_m, elevation + legs.base_m)?;
    let base_heading = match params.side {
        PatternSide::Left => landing_direction + 90.0,
        PatternSide::Right => landing_direction - 90.0,
    };
    let base_leg = heading_leg(base_band, profile.mean_wind(base_band)?, base_heading, final_leg.start, params);

    let downwind_band = HeightBand::new(elevation + legs.base_m, elevation + legs.downwind_m)?;
    let downwind_leg = course_leg(
        LegKind::Downwind,
        downwind_band,
        profile.mean_wind(downwind_band)?,
        landing_direction + 180.0,
        base_leg.start,
        params,
    );

    for leg in [&final_leg, &base_leg, &downwind_leg] {
        debug!(
            kind = ?leg.kind,
            course = leg.course_deg,
            ground_speed = leg.ground_speed_mps,
            length = leg.length_m,
            "landing leg"
        );
    }

    Ok(LandingPattern {
        landing_direction_deg: landing_direction,
        landing_point,
        final_leg,
        base_leg,
        downwind_leg,
    })
}

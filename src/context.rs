//! User settings and the immutable planning context handed to the pipeline.

use crate::canopy::{CanopyParams, CutawayParams};
use crate::constants::{CANOPY_OPENING_BUFFER_M, KNOTS_TO_MPS};
use crate::error::{ensure_finite, ensure_positive, PlannerError, Result};
use crate::freefall::FreefallPhysics;
use crate::geo::LatLng;
use crate::jump_run::JumpRunParams;
use crate::landing::{LandingPatternParams, LegHeights, PatternSide};
use crate::profile::ProfileOptions;
use serde::{Deserialize, Serialize};

/// Every configurable planning input; altitudes are above ground
///
/// Missing fields in a settings file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpSettings {
    pub profile: ProfileOptions,
    pub exit_altitude_m: f64,
    pub opening_altitude_m: f64,
    pub safety_height_m: f64,
    pub canopy_speed_kt: f64,
    pub descent_rate_mps: f64,
    pub pattern_side: PatternSide,
    pub landing_direction_deg: Option<f64>,
    pub leg_heights: LegHeights,
    pub aircraft_ias_kt: f64,
    pub number_of_jumpers: u32,
    pub jumper_separation_s: Option<f64>,
    pub jump_run_direction_deg: Option<f64>,
    pub jump_run_lateral_offset_m: f64,
    pub jump_run_forward_offset_m: f64,
    pub cutaway: Option<CutawayParams>,
    /// Release point for the cutaway finder; defaults to the landing point
    pub cutaway_point: Option<LatLng>,
    pub physics: FreefallPhysics,
}

impl Default for JumpSettings {
    fn default() -> Self {
        Self {
            profile: ProfileOptions::default(),
            exit_altitude_m: 3000.0,
            opening_altitude_m: 1200.0,
            safety_height_m: 0.0,
            canopy_speed_kt: 20.0,
            descent_rate_mps: 3.5,
            pattern_side: PatternSide::Left,
            landing_direction_deg: None,
            leg_heights: LegHeights::default(),
            aircraft_ias_kt: 90.0,
            number_of_jumpers: 5,
            jumper_separation_s: None,
            jump_run_direction_deg: None,
            jump_run_lateral_offset_m: 0.0,
            jump_run_forward_offset_m: 0.0,
            cutaway: None,
            cutaway_point: None,
            physics: FreefallPhysics::default(),
        }
    }
}

impl JumpSettings {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn canopy_speed_mps(&self) -> f64 {
        self.canopy_speed_kt * KNOTS_TO_MPS
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("exit altitude", self.exit_altitude_m)?;
        ensure_positive("opening altitude", self.opening_altitude_m)?;
        ensure_positive("canopy speed", self.canopy_speed_kt)?;
        ensure_positive("descent rate", self.descent_rate_mps)?;
        ensure_positive("aircraft airspeed", self.aircraft_ias_kt)?;
        ensure_positive("interpolation step", self.profile.step)?;
        ensure_finite("safety height", self.safety_height_m)?;
        self.leg_heights.validate()?;

        if self.opening_altitude_m >= self.exit_altitude_m {
            return Err(PlannerError::range(format!(
                "opening altitude {} must be below exit altitude {}",
                self.opening_altitude_m, self.exit_altitude_m
            )));
        }
        let canopy_top = self.opening_altitude_m - CANOPY_OPENING_BUFFER_M;
        if canopy_top <= self.safety_height_m + self.leg_heights.downwind_m {
            return Err(PlannerError::range(format!(
                "opening altitude {} leaves no room above the pattern",
                self.opening_altitude_m
            )));
        }
        if self.number_of_jumpers == 0 {
            return Err(PlannerError::range("number of jumpers must be at least one"));
        }
        Ok(())
    }

    pub fn landing_params(&self) -> LandingPatternParams {
        LandingPatternParams {
            leg_heights: self.leg_heights,
            canopy_speed_mps: self.canopy_speed_mps(),
            descent_rate_mps: self.descent_rate_mps,
            side: self.pattern_side,
            landing_direction_deg: self.landing_direction_deg,
        }
    }

    pub fn canopy_params(&self) -> CanopyParams {
        CanopyParams {
            opening_altitude_agl_m: self.opening_altitude_m,
            safety_height_m: self.safety_height_m,
            downwind_leg_m: self.leg_heights.downwind_m,
            canopy_speed_mps: self.canopy_speed_mps(),
            descent_rate_mps: self.descent_rate_mps,
        }
    }

    pub fn jump_run_params(&self) -> JumpRunParams {
        JumpRunParams {
            exit_altitude_agl_m: self.exit_altitude_m,
            opening_altitude_agl_m: self.opening_altitude_m,
            aircraft_ias_kt: self.aircraft_ias_kt,
            number_of_jumpers: self.number_of_jumpers,
            separation_s: self.jumper_separation_s,
            custom_direction_deg: self.jump_run_direction_deg,
            lateral_offset_m: self.jump_run_lateral_offset_m,
            forward_offset_m: self.jump_run_forward_offset_m,
        }
    }
}

/// Where and how to plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningContext {
    /// Landing point (DIP)
    pub location: LatLng,
    pub elevation_m: f64,
    pub settings: JumpSettings,
}

impl PlanningContext {
    pub fn new(location: LatLng, elevation_m: f64, settings: JumpSettings) -> Result<Self> {
        let ctx = Self {
            location,
            elevation_m,
            settings,
        };
        ctx.validate()?;
        Ok(ctx)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.location.is_valid() {
            return Err(PlannerError::degenerate(format!("invalid location {:?}", self.location)));
        }
        if !self.elevation_m.is_finite() {
            return Err(PlannerError::insufficient("ground elevation unknown"));
        }
        self.settings.validate()
    }
}

//! End-to-end planning pipeline: sounding in, jump plan out.

use crate::canopy::{canopy_areas, cutaway_area, exit_areas, CanopyAreas, CutawayArea, ExitAreas};
use crate::constants::KNOTS_TO_MPS;
use crate::context::PlanningContext;
use crate::error::{PlannerError, Result};
use crate::freefall::{simulate_freefall, FreefallInput, FreefallResult};
use crate::jump_run::{plan_jump_run, JumpRunTrack};
use crate::landing::{plan_landing_pattern, LandingPattern};
use crate::profile::{build_profile, Profile};
use crate::sounding::SoundingSample;
use crate::wind::heading_vector;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Everything computed for one sounding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpPlan {
    pub profile: Profile,
    pub jump_run: JumpRunTrack,
    /// `None` when the integrator gave up
    pub freefall: Option<FreefallResult>,
    pub landing: LandingPattern,
    pub canopy: CanopyAreas,
    pub exit: Option<ExitAreas>,
    pub cutaway: Option<CutawayArea>,
}

/// Run profile, landing pattern, jump run, freefall and area stages in order
pub fn plan_jump(ctx: &PlanningContext, sample: &SoundingSample) -> Result<JumpPlan> {
    ctx.validate()?;
    let settings = &ctx.settings;

    let profile = build_profile(sample, ctx.elevation_m, &settings.profile);
    if profile.is_empty() {
        return Err(PlannerError::insufficient("sounding yields no usable profile"));
    }

    let landing = plan_landing_pattern(ctx.location, &profile, &settings.landing_params())?;
    let canopy = canopy_areas(&profile, ctx.location, landing.downwind_start(), &settings.canopy_params())?;
    let jump_run = plan_jump_run(ctx.location, &profile, &settings.jump_run_params())?;

    // Aircraft heading plus the wind at exit
    let exit_height = ctx.elevation_m + settings.exit_altitude_m;
    let air_velocity = heading_vector(jump_run.true_airspeed_kt * KNOTS_TO_MPS, jump_run.direction_deg);
    let exit_wind = profile.wind_at(exit_height).unwrap_or_else(Vector2::zeros);
    let input = FreefallInput {
        exit_altitude_agl_m: settings.exit_altitude_m,
        opening_altitude_agl_m: settings.opening_altitude_m,
        initial_ground_velocity: air_velocity + exit_wind,
    };

    let freefall = simulate_freefall(&profile, &input, &settings.physics);
    let exit = match &freefall {
        Some(ff) => Some(exit_areas(&canopy, ff)),
        None => {
            warn!(exit_height, "freefall did not converge, no exit areas");
            None
        }
    };

    let cutaway = match &settings.cutaway {
        Some(params) => {
            let point = settings.cutaway_point.unwrap_or(ctx.location);
            Some(cutaway_area(&profile, point, params)?)
        }
        None => None,
    };

    info!(
        levels = profile.len(),
        jump_run_direction = jump_run.direction_deg,
        freefall = freefall.is_some(),
        "jump planned"
    );

    Ok(JumpPlan {
        profile,
        jump_run,
        freefall,
        landing,
        canopy,
        exit,
        cutaway,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canopy::CutawayParams;
    use crate::context::JumpSettings;
    use crate::geo::{haversine_distance, LatLng};
    use crate::sounding::{LevelSample, SurfaceSample};
    use crate::units::WindSpeedUnit;

    fn sample(speed_kt: f64, direction: f64) -> SoundingSample {
        let levels = [
            (1000.0, 110.0, 15.0),
            (925.0, 760.0, 11.0),
            (850.0, 1460.0, 7.0),
            (700.0, 3010.0, -2.0),
            (600.0, 4200.0, -9.0),
            (500.0, 5570.0, -18.0),
        ]
        .iter()
        .map(|&(p, h, t)| LevelSample::new(p, h, t, 60.0, speed_kt, direction))
        .collect();
        SoundingSample {
            time: Some("2026-06-01T12:00".into()),
            wind_speed_unit: WindSpeedUnit::Knots,
            surface: SurfaceSample::new(1013.0, 16.0, 55.0, speed_kt, direction),
            levels,
        }
    }

    fn context(settings: JumpSettings) -> PlanningContext {
        PlanningContext::new(LatLng::new(47.0, 9.0), 0.0, settings).unwrap()
    }

    #[test]
    fn test_plan_without_cutaway() {
        let plan = plan_jump(&context(JumpSettings::default()), &sample(15.0, 270.0)).unwrap();
        assert!(!plan.profile.is_empty());
        assert_eq!(plan.jump_run.direction_deg, 270.0);
        assert!(plan.freefall.is_some());
        assert!(plan.exit.is_some());
        assert!(plan.cutaway.is_none());
    }

    #[test]
    fn test_exit_area_lies_upwind() {
        let plan = plan_jump(&context(JumpSettings::default()), &sample(15.0, 270.0)).unwrap();
        let exit = plan.exit.unwrap();
        // Wind from the west: release west of the landing point
        assert!(exit.full.center.lng < 9.0);
    }

    #[test]
    fn test_cutaway_defaults_to_landing_point() {
        let settings = JumpSettings {
            cutaway: Some(CutawayParams::default()),
            ..Default::default()
        };
        let plan = plan_jump(&context(settings), &sample(10.0, 180.0)).unwrap();
        let cutaway = plan.cutaway.unwrap();
        // Drifts downwind, to the north
        assert!(cutaway.center.lat > 47.0);
        assert!(haversine_distance(LatLng::new(47.0, 9.0), cutaway.center) > 0.0);
    }

    #[test]
    fn test_empty_sounding_is_insufficient() {
        let ctx = context(JumpSettings::default());
        let err = plan_jump(&ctx, &SoundingSample::default()).unwrap_err();
        assert!(matches!(err, PlannerError::InsufficientData(_)));
    }
}

//! # Dropzone Engine
//!
//! Skydiving jump planning from sparse atmospheric soundings: wind profiles,
//! layer mean winds, freefall drift, canopy reach, landing patterns, jump-run
//! tracks and multi-model ensembles.

// Re-export the main types and functions
pub use canopy::{
    canopy_areas, cutaway_area, exit_areas, AreaCircle, CanopyAreas, CanopyParams, CanopyState, CutawayArea,
    CutawayParams, ExitAreas,
};
pub use context::{JumpSettings, PlanningContext};
pub use ensemble::{
    aggregate_ensemble, ensemble_heatmap, EnsembleModelSet, EnsembleProfile, Heatmap, HeatmapCell, ModelExitCircle,
    ModelSample, OverlapContours, Scenario,
};
pub use error::{PlannerError, Result};
pub use freefall::{simulate_freefall, FreefallInput, FreefallPhysics, FreefallResult, TrajectoryPoint};
pub use geo::LatLng;
pub use jump_run::{plan_jump_run, separation_for_tas, JumpRunParams, JumpRunTrack};
pub use landing::{
    plan_landing_pattern, LandingLeg, LandingPattern, LandingPatternParams, LegHeights, LegKind, PatternSide,
};
pub use mean_wind::{mean_wind, HeightBand, MeanWind};
pub use planner::{plan_jump, JumpPlan};
pub use profile::{build_profile, Profile, ProfileLevel, ProfileOptions, ReferenceLevel};
pub use sounding::{LevelSample, SoundingSample, SurfaceSample};
pub use units::{HeightUnit, TemperatureUnit, WindSpeedUnit};

// Module declarations
pub mod atmosphere;
pub mod canopy;
pub mod constants;
pub mod context;
pub mod ensemble;
mod error;
pub mod freefall;
pub mod geo;
pub mod interpolation;
pub mod jump_run;
pub mod landing;
pub mod mean_wind;
pub mod planner;
pub mod profile;
pub mod sounding;
pub mod units;
pub mod wind;

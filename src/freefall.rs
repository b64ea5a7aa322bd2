//! Freefall trajectory integration from exit to canopy deployment.
//!
//! The jumper is a point mass with quadratic drag on both axes. Vertical drag
//! acts on the vertical speed alone; horizontal drag acts on the velocity
//! relative to the air, so the horizontal motion relaxes from the aircraft's
//! ground velocity toward the local wind. Density follows the hypsometric
//! equation using the local profile temperature.

use crate::atmosphere::air_density;
use crate::constants::{
    CANOPY_OPENING_BUFFER_M, FREEFALL_DRAG_COEFFICIENT, FREEFALL_MASS_KG, FREEFALL_MAX_STEPS,
    FREEFALL_REFERENCE_AREA_M2, FREEFALL_TIME_STEP_S, G_ACCEL_MPS2, MIN_DIVISION_THRESHOLD,
};
use crate::interpolation::linear_interpolate;
use crate::profile::Profile;
use crate::wind::normalize_angle;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Body and integrator parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreefallPhysics {
    pub mass_kg: f64,
    pub drag_coefficient_vertical: f64,
    pub area_vertical_m2: f64,
    pub drag_coefficient_horizontal: f64,
    pub area_horizontal_m2: f64,
    pub gravity_mps2: f64,
    pub time_step_s: f64,
    pub max_steps: usize,
    /// Height between deployment and a flying canopy
    pub opening_buffer_m: f64,
}

impl Default for FreefallPhysics {
    fn default() -> Self {
        Self {
            mass_kg: FREEFALL_MASS_KG,
            drag_coefficient_vertical: FREEFALL_DRAG_COEFFICIENT,
            area_vertical_m2: FREEFALL_REFERENCE_AREA_M2,
            drag_coefficient_horizontal: FREEFALL_DRAG_COEFFICIENT,
            area_horizontal_m2: FREEFALL_REFERENCE_AREA_M2,
            gravity_mps2: G_ACCEL_MPS2,
            time_step_s: FREEFALL_TIME_STEP_S,
            max_steps: FREEFALL_MAX_STEPS,
            opening_buffer_m: CANOPY_OPENING_BUFFER_M,
        }
    }
}

/// Exit conditions, altitudes above ground
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreefallInput {
    pub exit_altitude_agl_m: f64,
    pub opening_altitude_agl_m: f64,
    /// Ground velocity at exit as (east, north), m/s
    pub initial_ground_velocity: Vector2<f64>,
}

/// Integrator state after one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub time_s: f64,
    pub height_asl: f64,
    /// Negative while descending
    pub vertical_velocity: f64,
    pub velocity_north: f64,
    pub velocity_east: f64,
    pub north_m: f64,
    pub east_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreefallResult {
    pub points: Vec<TrajectoryPoint>,
    pub north_m: f64,
    pub east_m: f64,
    /// Bearing of the displacement from the exit point, [0, 360)
    pub direction_deg: f64,
    pub distance_m: f64,
    pub time_s: f64,
    pub stop_height_asl: f64,
}

#[derive(Debug, Clone, Copy)]
struct State {
    time: f64,
    height: f64,
    vz: f64,
    velocity: Vector2<f64>,
    position: Vector2<f64>,
}

impl State {
    fn point(&self) -> TrajectoryPoint {
        TrajectoryPoint {
            time_s: self.time,
            height_asl: self.height,
            vertical_velocity: self.vz,
            velocity_north: self.velocity.y,
            velocity_east: self.velocity.x,
            north_m: self.position.y,
            east_m: self.position.x,
        }
    }
}

/// Air-relative quantities needed for one step
struct Environment<'a> {
    heights: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
    temperatures: Vec<f64>,
    profile: &'a Profile,
}

impl<'a> Environment<'a> {
    fn new(profile: &'a Profile) -> Self {
        Self {
            heights: profile.heights(),
            u: profile.u_components(),
            v: profile.v_components(),
            temperatures: profile.temperatures(),
            profile,
        }
    }

    /// Wind vector and air density at `height`
    fn sample(&self, height: f64) -> Option<(Vector2<f64>, f64)> {
        let wu = linear_interpolate(&self.heights, &self.u, height)?;
        let wv = linear_interpolate(&self.heights, &self.v, height)?;
        let temp = linear_interpolate(&self.heights, &self.temperatures, height)?;
        let rho = air_density(self.profile.surface_pressure_hpa, height, self.profile.elevation_m, temp);
        rho.is_finite().then_some((Vector2::new(wu, wv), rho))
    }
}

/// Integrate freefall from exit to `opening - buffer` above ground
///
/// Returns `None` when the profile cannot support the integration (fewer than
/// two levels, non-finite inputs, opening at or above exit) or when the step
/// limit is reached without reaching the stop height.
pub fn simulate_freefall(profile: &Profile, input: &FreefallInput, physics: &FreefallPhysics) -> Option<FreefallResult> {
    if profile.len() < 2 {
        warn!(levels = profile.len(), "freefall needs an interpolated profile");
        return None;
    }
    let finite = [
        input.exit_altitude_agl_m,
        input.opening_altitude_agl_m,
        input.initial_ground_velocity.x,
        input.initial_ground_velocity.y,
        profile.elevation_m,
        profile.surface_pressure_hpa,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !finite || !(physics.time_step_s > 0.0) || !(physics.mass_kg > 0.0) {
        warn!("freefall inputs not finite");
        return None;
    }

    let start = profile.elevation_m + input.exit_altitude_agl_m;
    let stop = profile.elevation_m + input.opening_altitude_agl_m - physics.opening_buffer_m;
    if stop >= start {
        warn!(start, stop, "stop height not below exit height");
        return None;
    }

    let env = Environment::new(profile);
    let k_vertical = 0.5 * physics.drag_coefficient_vertical * physics.area_vertical_m2 / physics.mass_kg;
    let k_horizontal = 0.5 * physics.drag_coefficient_horizontal * physics.area_horizontal_m2 / physics.mass_kg;
    let g = physics.gravity_mps2;
    let dt = physics.time_step_s;

    let mut state = State {
        time: 0.0,
        height: start,
        vz: 0.0,
        velocity: input.initial_ground_velocity,
        position: Vector2::zeros(),
    };
    let mut points = vec![state.point()];

    for _ in 0..physics.max_steps {
        let Some((wind, rho)) = env.sample(state.height) else {
            warn!(height = state.height, "freefall environment not available");
            return None;
        };

        let bv = k_vertical * rho;
        let bh = k_horizontal * rho;
        let air = state.velocity - wind;
        let az = -g - bv * state.vz * state.vz.abs();
        let acc = -bh * air.norm() * air;

        let next_height = state.height + state.vz * dt;
        if next_height <= stop {
            let drop = state.height - next_height;
            let fraction = if drop > MIN_DIVISION_THRESHOLD {
                (state.height - stop) / drop
            } else {
                1.0
            };
            let h = dt * fraction;
            state.position += state.velocity * h;
            state.velocity += acc * h;
            state.vz += az * h;
            state.time += h;
            state.height = stop;
            points.push(state.point());
            return Some(finish(points, state, stop));
        }

        state.position += state.velocity * dt;
        state.velocity += acc * dt;
        state.vz += az * dt;
        state.time += dt;
        state.height = next_height;
        points.push(state.point());
    }

    warn!(max_steps = physics.max_steps, height = state.height, "freefall step limit reached");
    None
}

fn finish(points: Vec<TrajectoryPoint>, state: State, stop: f64) -> FreefallResult {
    let distance = state.position.norm();
    let direction = if distance > MIN_DIVISION_THRESHOLD {
        normalize_angle(state.position.x.atan2(state.position.y).to_degrees())
    } else {
        0.0
    };

    debug!(time = state.time, distance, direction, steps = points.len(), "freefall finished");

    FreefallResult {
        points,
        north_m: state.position.y,
        east_m: state.position.x,
        direction_deg: direction,
        distance_m: distance,
        time_s: state.time,
        stop_height_asl: stop,
    }
}

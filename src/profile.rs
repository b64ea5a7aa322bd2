//! Uniform-step vertical profiles built from sparse pressure-level soundings.
//!
//! The sounding only reports up to thirteen pressure levels, several of which
//! may be underground at an elevated dropzone. `build_profile` anchors the
//! surface observation at the ground, fills the boundary layer between the
//! surface and the first level aloft, and then resamples everything onto a
//! fixed height step from the ground to the highest usable level.

use crate::atmosphere::dewpoint;
use crate::interpolation::{interpolate_components, interpolate_pressure, linear_interpolate};
use crate::sounding::SoundingSample;
use crate::units::HeightUnit;
use crate::wind::{wind_direction, wind_speed, wind_vector};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Reference for display heights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceLevel {
    #[default]
    #[serde(rename = "AGL")]
    Agl,
    #[serde(rename = "AMSL")]
    Amsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    pub reference: ReferenceLevel,
    /// Height step, expressed in `height_unit`
    pub step: f64,
    pub height_unit: HeightUnit,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            reference: ReferenceLevel::Agl,
            step: 200.0,
            height_unit: HeightUnit::Meters,
        }
    }
}

impl ProfileOptions {
    pub fn step_m(&self) -> f64 {
        self.height_unit.to_meters(self.step)
    }
}

/// One resampled level; wind speeds are m/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileLevel {
    pub height_asl: f64,
    pub display_height: f64,
    /// Unknown above the highest sampled pressure
    pub pressure_hpa: Option<f64>,
    pub temperature_c: f64,
    pub relative_humidity_pct: f64,
    pub dewpoint_c: Option<f64>,
    pub wind_direction_deg: f64,
    pub wind_speed_mps: f64,
    pub u: f64,
    pub v: f64,
}

/// Resampled profile, ascending by height with the surface at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub elevation_m: f64,
    pub surface_pressure_hpa: f64,
    pub levels: Vec<ProfileLevel>,
}

impl Profile {
    pub fn empty(elevation_m: f64) -> Self {
        Self {
            elevation_m,
            surface_pressure_hpa: f64::NAN,
            levels: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn surface(&self) -> Option<&ProfileLevel> {
        self.levels.first()
    }

    pub fn top(&self) -> Option<&ProfileLevel> {
        self.levels.last()
    }

    pub fn heights(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.height_asl).collect()
    }

    pub fn u_components(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.u).collect()
    }

    pub fn v_components(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.v).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.temperature_c).collect()
    }

    /// Wind (u, v) at a height ASL, linearly interpolated and extrapolated
    pub fn wind_at(&self, height_asl: f64) -> Option<Vector2<f64>> {
        let heights = self.heights();
        let u = linear_interpolate(&heights, &self.u_components(), height_asl)?;
        let v = linear_interpolate(&heights, &self.v_components(), height_asl)?;
        Some(Vector2::new(u, v))
    }

    pub fn temperature_at(&self, height_asl: f64) -> Option<f64> {
        linear_interpolate(&self.heights(), &self.temperatures(), height_asl)
    }
}

/// Interpolation nodes in SI units, ascending by height
struct Nodes {
    heights: Vec<f64>,
    pressures: Vec<f64>,
    temperatures: Vec<f64>,
    humidities: Vec<f64>,
    u: Vec<f64>,
    v: Vec<f64>,
}

impl Nodes {
    fn with_capacity(n: usize) -> Self {
        Self {
            heights: Vec::with_capacity(n),
            pressures: Vec::with_capacity(n),
            temperatures: Vec::with_capacity(n),
            humidities: Vec::with_capacity(n),
            u: Vec::with_capacity(n),
            v: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, height: f64, pressure: f64, temperature: f64, humidity: f64, wind: Vector2<f64>) {
        self.heights.push(height);
        self.pressures.push(pressure);
        self.temperatures.push(temperature);
        self.humidities.push(humidity);
        self.u.push(wind.x);
        self.v.push(wind.y);
    }
}

/// Build a uniform-step profile from one sounding timestep
///
/// Returns an empty profile when the sounding cannot support one: fewer than
/// two complete pressure levels, an incomplete surface block, no level above
/// the ground, or a non-positive step.
pub fn build_profile(sample: &SoundingSample, elevation_m: f64, options: &ProfileOptions) -> Profile {
    let step = options.step_m();
    if !elevation_m.is_finite() {
        warn!(elevation_m, "ground elevation unknown, no profile");
        return Profile::empty(elevation_m);
    }
    if !(step > 0.0) || !step.is_finite() {
        warn!(step, "interpolation step must be positive");
        return Profile::empty(elevation_m);
    }

    let levels = sample.complete_levels();
    if levels.len() < 2 {
        warn!(usable = levels.len(), "insufficient pressure levels for interpolation");
        return Profile::empty(elevation_m);
    }

    let surface = &sample.surface;
    let (Some(ps), Some(t2m), Some(rh2m), Some(spd10), Some(dir10)) = (
        surface.pressure_hpa,
        surface.temperature_c,
        surface.relative_humidity_pct,
        surface.wind_speed,
        surface.wind_direction_deg,
    ) else {
        warn!("surface observation incomplete, no profile");
        return Profile::empty(elevation_m);
    };
    if ![ps, t2m, rh2m, spd10, dir10].iter().all(|v| v.is_finite()) || ps <= 0.0 {
        warn!(ps, "surface observation not finite, no profile");
        return Profile::empty(elevation_m);
    }

    let unit = sample.wind_speed_unit;
    let surface_wind = wind_vector(unit.to_mps(spd10), dir10);

    // Underground levels are extrapolations of the model, not observations
    let aloft: Vec<_> = levels
        .into_iter()
        .filter(|l| l.height_m > elevation_m && l.pressure_hpa < ps)
        .collect();
    let Some(lowest) = aloft.first().copied() else {
        warn!(elevation_m, "no pressure level above ground");
        return Profile::empty(elevation_m);
    };
    let lowest_wind = wind_vector(unit.to_mps(lowest.wind_speed), lowest.wind_direction_deg);

    let mut nodes = Nodes::with_capacity(aloft.len() + 16);
    nodes.push(elevation_m, ps, t2m, rh2m, surface_wind);

    // Boundary layer between the surface and the first level aloft
    let gap = lowest.height_m - elevation_m;
    let steps_between = (gap / step).floor() as usize;
    let log_top = (gap + 1.0).ln();
    let (ln_ps, ln_pl) = (ps.ln(), lowest.pressure_hpa.ln());
    for i in 1..steps_between {
        let h = elevation_m + i as f64 * step;
        if h >= lowest.height_m {
            break;
        }
        let fraction = (h - elevation_m) / gap;
        let pressure = (ln_ps + fraction * (ln_pl - ln_ps)).exp();

        let log_h = [0.0, log_top];
        let x = (h - elevation_m + 1.0).ln();
        let along = |a: f64, b: f64| linear_interpolate(&log_h, &[a, b], x).unwrap_or(a);
        let wind = Vector2::new(along(surface_wind.x, lowest_wind.x), along(surface_wind.y, lowest_wind.y));

        nodes.push(
            h,
            pressure,
            along(t2m, lowest.temperature_c),
            along(rh2m, lowest.relative_humidity_pct),
            wind,
        );
    }

    for level in &aloft {
        let wind = wind_vector(unit.to_mps(level.wind_speed), level.wind_direction_deg);
        nodes.push(level.height_m, level.pressure_hpa, level.temperature_c, level.relative_humidity_pct, wind);
    }

    let top_agl = nodes.heights[nodes.heights.len() - 1] - elevation_m;
    // Tolerate float noise when the top lands exactly on a step
    let steps = (top_agl / step + 1e-9).floor() as usize;

    let mut out = Vec::with_capacity(steps + 1);
    for k in 0..=steps {
        let h_agl = k as f64 * step;
        let h = elevation_m + h_agl;
        let display_height = match options.reference {
            ReferenceLevel::Agl => options.height_unit.from_meters(h_agl),
            ReferenceLevel::Amsl => options.height_unit.from_meters(h),
        };

        if k == 0 {
            out.push(ProfileLevel {
                height_asl: h,
                display_height,
                pressure_hpa: Some(ps),
                temperature_c: t2m,
                relative_humidity_pct: rh2m,
                dewpoint_c: dewpoint(t2m, rh2m),
                wind_direction_deg: dir10,
                wind_speed_mps: unit.to_mps(spd10),
                u: surface_wind.x,
                v: surface_wind.y,
            });
            continue;
        }

        let interpolated = (
            interpolate_components(h, &nodes.heights, &nodes.u, &nodes.v),
            linear_interpolate(&nodes.heights, &nodes.temperatures, h),
            linear_interpolate(&nodes.heights, &nodes.humidities, h),
        );
        let (Some((u, v)), Some(temperature_c), Some(rh)) = interpolated else {
            warn!(height = h, "interpolation failed, level skipped");
            continue;
        };

        out.push(ProfileLevel {
            height_asl: h,
            display_height,
            pressure_hpa: interpolate_pressure(h, &nodes.heights, &nodes.pressures),
            temperature_c,
            relative_humidity_pct: rh,
            dewpoint_c: dewpoint(temperature_c, rh),
            wind_direction_deg: wind_direction(u, v),
            wind_speed_mps: wind_speed(u, v),
            u,
            v,
        });
    }

    debug!(levels = out.len(), top_agl, step, "profile built");

    Profile {
        elevation_m,
        surface_pressure_hpa: ps,
        levels: out,
    }
}

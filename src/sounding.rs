//! Raw model output for a single timestep: surface observations plus the
//! standard pressure levels. Any value may be missing.

use crate::units::WindSpeedUnit;
use serde::{Deserialize, Serialize};

/// 2 m / 10 m surface values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSample {
    pub pressure_hpa: Option<f64>,
    pub temperature_c: Option<f64>,
    pub relative_humidity_pct: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction_deg: Option<f64>,
}

impl SurfaceSample {
    pub fn new(pressure_hpa: f64, temperature_c: f64, relative_humidity_pct: f64, wind_speed: f64, wind_direction_deg: f64) -> Self {
        Self {
            pressure_hpa: Some(pressure_hpa),
            temperature_c: Some(temperature_c),
            relative_humidity_pct: Some(relative_humidity_pct),
            wind_speed: Some(wind_speed),
            wind_direction_deg: Some(wind_direction_deg),
        }
    }
}

/// Values on one constant-pressure level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSample {
    pub pressure_hpa: f64,
    #[serde(default)]
    pub geopotential_height_m: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub relative_humidity_pct: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_direction_deg: Option<f64>,
}

/// A level where every value is present and finite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteLevel {
    pub pressure_hpa: f64,
    pub height_m: f64,
    pub temperature_c: f64,
    pub relative_humidity_pct: f64,
    pub wind_speed: f64,
    pub wind_direction_deg: f64,
}

impl LevelSample {
    pub fn new(
        pressure_hpa: f64,
        geopotential_height_m: f64,
        temperature_c: f64,
        relative_humidity_pct: f64,
        wind_speed: f64,
        wind_direction_deg: f64,
    ) -> Self {
        Self {
            pressure_hpa,
            geopotential_height_m: Some(geopotential_height_m),
            temperature_c: Some(temperature_c),
            relative_humidity_pct: Some(relative_humidity_pct),
            wind_speed: Some(wind_speed),
            wind_direction_deg: Some(wind_direction_deg),
        }
    }

    /// A level with only its pressure key set
    pub fn missing(pressure_hpa: f64) -> Self {
        Self {
            pressure_hpa,
            geopotential_height_m: None,
            temperature_c: None,
            relative_humidity_pct: None,
            wind_speed: None,
            wind_direction_deg: None,
        }
    }

    pub fn complete(&self) -> Option<CompleteLevel> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(CompleteLevel {
            pressure_hpa: Some(self.pressure_hpa).filter(|p| p.is_finite() && *p > 0.0)?,
            height_m: finite(self.geopotential_height_m)?,
            temperature_c: finite(self.temperature_c)?,
            relative_humidity_pct: finite(self.relative_humidity_pct)?,
            wind_speed: finite(self.wind_speed)?,
            wind_direction_deg: finite(self.wind_direction_deg)?,
        })
    }
}

/// One timestep of a weather model run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundingSample {
    #[serde(default)]
    pub time: Option<String>,
    /// Unit of every wind speed in this sample
    #[serde(default)]
    pub wind_speed_unit: WindSpeedUnit,
    #[serde(default)]
    pub surface: SurfaceSample,
    #[serde(default)]
    pub levels: Vec<LevelSample>,
}

impl SoundingSample {
    pub fn level(&self, pressure_hpa: f64) -> Option<&LevelSample> {
        self.levels.iter().find(|l| l.pressure_hpa == pressure_hpa)
    }

    /// Complete levels sorted ascending by height
    pub fn complete_levels(&self) -> Vec<CompleteLevel> {
        let mut levels: Vec<CompleteLevel> = self.levels.iter().filter_map(LevelSample::complete).collect();
        levels.sort_by(|a, b| a.height_m.total_cmp(&b.height_m));
        levels
    }
}

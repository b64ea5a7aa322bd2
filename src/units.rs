//! Unit handling at the edges of the engine.
//!
//! Everything inside the engine runs in SI (m, m/s, °C). Raw soundings carry the
//! wind unit the provider reported and display preferences pick the output unit;
//! these enums convert between the two.

use crate::constants::{
    FEET_TO_METERS, KMH_TO_MPS, KM_PER_NAUTICAL_MILE, KM_PER_STATUTE_MILE, KNOTS_TO_MPS,
    METERS_TO_FEET,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper knot bound (exclusive) of Beaufort forces 0 through 11
const BEAUFORT_KNOT_THRESHOLDS: [f64; 12] =
    [1.0, 4.0, 7.0, 11.0, 17.0, 22.0, 28.0, 34.0, 41.0, 48.0, 56.0, 64.0];

/// Representative knots for Beaufort forces 0 through 12
const BEAUFORT_TO_KNOTS: [f64; 13] =
    [0.0, 1.0, 3.0, 6.0, 10.0, 16.0, 21.0, 27.0, 33.0, 40.0, 47.0, 55.0, 63.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindSpeedUnit {
    #[default]
    #[serde(rename = "km/h")]
    KilometersPerHour,
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "kt")]
    Knots,
    #[serde(rename = "mph")]
    MilesPerHour,
    #[serde(rename = "bft")]
    Beaufort,
}

impl WindSpeedUnit {
    /// Convert a speed in this unit to m/s
    pub fn to_mps(self, value: f64) -> f64 {
        match self {
            WindSpeedUnit::KilometersPerHour => value * KMH_TO_MPS,
            WindSpeedUnit::MetersPerSecond => value,
            WindSpeedUnit::Knots => value * KNOTS_TO_MPS,
            WindSpeedUnit::MilesPerHour => value * KM_PER_STATUTE_MILE * KMH_TO_MPS,
            WindSpeedUnit::Beaufort => beaufort_to_knots(value) * KNOTS_TO_MPS,
        }
    }

    /// Convert a speed in m/s to this unit
    pub fn from_mps(self, mps: f64) -> f64 {
        match self {
            WindSpeedUnit::KilometersPerHour => mps / KMH_TO_MPS,
            WindSpeedUnit::MetersPerSecond => mps,
            WindSpeedUnit::Knots => mps / KNOTS_TO_MPS,
            WindSpeedUnit::MilesPerHour => mps / KMH_TO_MPS / KM_PER_STATUTE_MILE,
            WindSpeedUnit::Beaufort => knots_to_beaufort(mps / KNOTS_TO_MPS),
        }
    }

    /// Convert between two wind units
    ///
    /// Knot and km/h conversions go through the nautical mile directly so that
    /// 18.52 km/h is exactly 10 kt.
    pub fn convert(value: f64, from: WindSpeedUnit, to: WindSpeedUnit) -> f64 {
        use WindSpeedUnit::*;
        match (from, to) {
            (a, b) if a == b => value,
            (Knots, KilometersPerHour) => value * KM_PER_NAUTICAL_MILE,
            (KilometersPerHour, Knots) => value / KM_PER_NAUTICAL_MILE,
            _ => to.from_mps(from.to_mps(value)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WindSpeedUnit::KilometersPerHour => "km/h",
            WindSpeedUnit::MetersPerSecond => "m/s",
            WindSpeedUnit::Knots => "kt",
            WindSpeedUnit::MilesPerHour => "mph",
            WindSpeedUnit::Beaufort => "bft",
        }
    }
}

impl fmt::Display for WindSpeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Beaufort force for a speed in knots
pub fn knots_to_beaufort(knots: f64) -> f64 {
    BEAUFORT_KNOT_THRESHOLDS
        .iter()
        .position(|&limit| knots < limit)
        .unwrap_or(BEAUFORT_KNOT_THRESHOLDS.len()) as f64
}

/// Representative speed in knots for a Beaufort force (rounded, clamped to 0..=12)
pub fn beaufort_to_knots(force: f64) -> f64 {
    if !force.is_finite() {
        return f64::NAN;
    }
    let index = force.round().clamp(0.0, 12.0) as usize;
    BEAUFORT_TO_KNOTS[index]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeightUnit {
    #[default]
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "ft")]
    Feet,
}

impl HeightUnit {
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            HeightUnit::Meters => meters,
            HeightUnit::Feet => meters * METERS_TO_FEET,
        }
    }

    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            HeightUnit::Meters => value,
            HeightUnit::Feet => value / METERS_TO_FEET,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HeightUnit::Meters => "m",
            HeightUnit::Feet => "ft",
        }
    }
}

/// Meters to feet using the exact international foot
pub fn meters_to_feet(meters: f64) -> f64 {
    meters / FEET_TO_METERS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

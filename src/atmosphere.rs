//! Atmospheric helpers: dewpoint, air density, true airspeed and QFE.

use crate::constants::{
    CELSIUS_TO_KELVIN, FEET_TO_METERS, G_ACCEL_MPS2, G_STANDARD_MPS2, ISA_LAPSE_RATE, ISA_SEA_LEVEL_TEMP_K,
    MOLAR_MASS_AIR, R_AIR_HYPSOMETRIC, R_DRY, R_UNIVERSAL,
};

/// Magnus coefficients over liquid water (a, b in °C)
const MAGNUS_WATER: (f64, f64) = (17.27, 237.7);

/// Magnus coefficients over ice
const MAGNUS_ICE: (f64, f64) = (21.87, 265.5);

/// Dewpoint (°C) from temperature and relative humidity
///
/// Uses the Magnus form with water coefficients at or above freezing and ice
/// coefficients below. Returns `None` for non-finite input or non-positive
/// humidity, where the logarithm has no meaning.
pub fn dewpoint(temp_c: f64, rh_pct: f64) -> Option<f64> {
    if !temp_c.is_finite() || !rh_pct.is_finite() || rh_pct <= 0.0 {
        return None;
    }
    let (a, b) = if temp_c >= 0.0 { MAGNUS_WATER } else { MAGNUS_ICE };
    let alpha = a * temp_c / (b + temp_c) + (rh_pct / 100.0).ln();
    let dew = b * alpha / (a - alpha);
    dew.is_finite().then_some(dew)
}

/// Air density (kg/m³) at `height_asl` from the hypsometric equation
///
/// The surface pressure is reduced with a single layer temperature.
pub fn air_density(surface_pressure_hpa: f64, height_asl: f64, elevation: f64, temp_c: f64) -> f64 {
    let temp_k = temp_c + CELSIUS_TO_KELVIN;
    let rt = R_AIR_HYPSOMETRIC * temp_k;
    let pressure_pa = surface_pressure_hpa * 100.0 * (-G_ACCEL_MPS2 * (height_asl - elevation) / rt).exp();
    pressure_pa / rt
}

/// ISA density ratio at a pressure altitude in meters
pub fn isa_density_ratio(altitude_m: f64) -> f64 {
    let base = 1.0 - ISA_LAPSE_RATE * altitude_m / ISA_SEA_LEVEL_TEMP_K;
    let exponent = G_STANDARD_MPS2 / (ISA_LAPSE_RATE * R_DRY) - 1.0;
    base.powf(exponent)
}

/// True airspeed from indicated airspeed at a pressure altitude in feet
///
/// The result is in the unit of `ias`.
pub fn true_airspeed(ias: f64, altitude_ft: f64) -> Option<f64> {
    if !ias.is_finite() || !altitude_ft.is_finite() || altitude_ft < 0.0 || ias < 0.0 {
        return None;
    }
    let ratio = isa_density_ratio(altitude_ft * FEET_TO_METERS);
    if !(ratio > 0.0) {
        return None;
    }
    Some(ias / ratio.sqrt())
}

/// Pressure (hPa) at `elevation_m` reduced from a reference station
pub fn qfe(
    reference_pressure_hpa: f64,
    elevation_m: f64,
    reference_elevation_m: f64,
    temp_c: f64,
) -> Option<f64> {
    if !(reference_pressure_hpa > 0.0) || !elevation_m.is_finite() || !reference_elevation_m.is_finite() {
        return None;
    }
    let temp_k = temp_c + CELSIUS_TO_KELVIN;
    let dh = elevation_m - reference_elevation_m;
    let exponent = G_STANDARD_MPS2 * MOLAR_MASS_AIR / (R_UNIVERSAL * ISA_LAPSE_RATE);
    let qfe_pa = reference_pressure_hpa * 100.0 * (1.0 - ISA_LAPSE_RATE * dh / temp_k).powf(exponent);
    let qfe = qfe_pa / 100.0;
    qfe.is_finite().then_some(qfe)
}

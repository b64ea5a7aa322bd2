//! Layer-mean wind over a height band.
//!
//! The mean is the height-weighted average of u and v, integrated with the
//! trapezoidal rule over every sample inside the band plus the two band edges.
//! For piecewise-linear input this is exact, so extra samples on a straight
//! shear segment never change the result.

use crate::error::{PlannerError, Result};
use crate::interpolation::linear_interpolate;
use crate::profile::Profile;
use crate::wind::{wind_direction, wind_speed};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Closed height interval in meters ASL
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightBand {
    pub lower: f64,
    pub upper: f64,
}

impl HeightBand {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(PlannerError::range(format!("band edges not finite ({lower}, {upper})")));
        }
        if upper <= lower {
            return Err(PlannerError::range(format!("upper {upper} <= lower {lower}")));
        }
        Ok(Self { lower, upper })
    }

    pub fn thickness(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Averaged wind; `speed`, `u` and `v` share the unit of the input components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanWind {
    pub direction_deg: f64,
    pub speed: f64,
    pub u: f64,
    pub v: f64,
}

impl MeanWind {
    pub fn from_components(u: f64, v: f64) -> Self {
        Self {
            direction_deg: wind_direction(u, v),
            speed: wind_speed(u, v),
            u,
            v,
        }
    }
}

/// Trapezoidal layer mean of (u, v) between `lower` and `upper`
///
/// `heights` must be sorted ascending; band edges outside the sampled range are
/// extrapolated from the end slopes.
pub fn mean_wind(heights: &[f64], u: &[f64], v: &[f64], lower: f64, upper: f64) -> Result<MeanWind> {
    if heights.len() != u.len() || heights.len() != v.len() {
        warn!(heights = heights.len(), u = u.len(), v = v.len(), "mean wind arrays differ in length");
        return Err(PlannerError::range("mean wind arrays differ in length"));
    }
    if heights.len() < 2 {
        warn!(samples = heights.len(), "mean wind needs at least two samples");
        return Err(PlannerError::insufficient("mean wind needs at least two samples"));
    }
    let band = HeightBand::new(lower, upper).inspect_err(|err| {
        warn!(lower, upper, %err, "mean wind band rejected");
    })?;

    let edge = |h: f64| -> Result<(f64, f64, f64)> {
        match (linear_interpolate(heights, u, h), linear_interpolate(heights, v, h)) {
            (Some(ue), Some(ve)) => Ok((h, ue, ve)),
            _ => Err(PlannerError::degenerate(format!("cannot interpolate wind at {h} m"))),
        }
    };

    let mut points: Vec<(f64, f64, f64)> = heights
        .iter()
        .zip(u.iter().zip(v.iter()))
        .filter(|(h, _)| **h > band.lower && **h < band.upper)
        .map(|(h, (ui, vi))| (*h, *ui, *vi))
        .collect();
    points.push(edge(band.lower)?);
    points.push(edge(band.upper)?);
    points.sort_by(|a, b| b.0.total_cmp(&a.0));

    let (mut sum_u, mut sum_v) = (0.0, 0.0);
    for pair in points.windows(2) {
        let (h0, u0, v0) = pair[0];
        let (h1, u1, v1) = pair[1];
        let dh = h0 - h1;
        sum_u += 0.5 * (u0 + u1) * dh;
        sum_v += 0.5 * (v0 + v1) * dh;
    }

    let depth = band.thickness();
    Ok(MeanWind::from_components(sum_u / depth, sum_v / depth))
}

impl Profile {
    /// Mean wind in m/s over a band of this profile
    pub fn mean_wind(&self, band: HeightBand) -> Result<MeanWind> {
        if self.is_empty() {
            return Err(PlannerError::insufficient("profile is empty"));
        }
        mean_wind(&self.heights(), &self.u_components(), &self.v_components(), band.lower, band.upper)
    }
}

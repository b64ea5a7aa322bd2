//! One-dimensional interpolation over sounding levels.

use crate::constants::MIN_DIVISION_THRESHOLD;

/// Index `i` such that `xs[i] <= x <= xs[i + 1]` for ascending `xs`
///
/// `x` must lie within the sampled range.
fn bracket(xs: &[f64], x: f64) -> usize {
    let mut left = 0;
    let mut right = xs.len() - 1;

    while right - left > 1 {
        let mid = (left + right) / 2;
        if xs[mid] <= x {
            left = mid;
        } else {
            right = mid;
        }
    }
    left
}

fn lerp(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> Option<f64> {
    let dx = x2 - x1;
    if dx.abs() < MIN_DIVISION_THRESHOLD {
        return if (x - x1).abs() < MIN_DIVISION_THRESHOLD { Some(y1) } else { None };
    }
    Some(y1 + (y2 - y1) * (x - x1) / dx)
}

/// Linear interpolation with linear extrapolation past either end
///
/// `xs` may be sorted ascending or descending. Outside the sampled range the
/// slope of the nearest end segment is continued. Returns `None` for fewer than
/// two points, mismatched lengths, non-finite `x` or a zero-width end segment.
pub fn linear_interpolate(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() || !x.is_finite() {
        return None;
    }

    if xs[0] > xs[n - 1] {
        let rx: Vec<f64> = xs.iter().rev().copied().collect();
        let ry: Vec<f64> = ys.iter().rev().copied().collect();
        return linear_interpolate(&rx, &ry, x);
    }

    if x < xs[0] {
        return lerp(xs[0], ys[0], xs[1], ys[1], x);
    }
    if x > xs[n - 1] {
        return lerp(xs[n - 2], ys[n - 2], xs[n - 1], ys[n - 1], x);
    }

    let i = bracket(xs, x);
    if x == xs[i] {
        return Some(ys[i]);
    }
    if x == xs[i + 1] {
        return Some(ys[i + 1]);
    }
    lerp(xs[i], ys[i], xs[i + 1], ys[i + 1], x)
}

/// Two-point inverse-distance weighting
///
/// Weights are `1/|h - hp|`, so the result leans toward the closer sample and
/// reproduces either sample exactly on its own height.
pub fn inverse_distance_interpolate(y1: f64, y2: f64, h1: f64, h2: f64, hp: f64) -> f64 {
    if h1 == hp {
        return y1;
    }
    if h2 == hp {
        return y2;
    }
    let w1 = 1.0 / (h1 - hp).abs();
    let w2 = 1.0 / (h2 - hp).abs();
    (w1 * y1 + w2 * y2) / (w1 + w2)
}

/// Pressure at `height` from ascending level heights, without extrapolation
pub fn interpolate_pressure(height: f64, heights: &[f64], pressures: &[f64]) -> Option<f64> {
    let n = heights.len();
    if n < 2 || n != pressures.len() || !height.is_finite() {
        return None;
    }
    if height < heights[0] || height > heights[n - 1] {
        return None;
    }
    let i = bracket(heights, height);
    if height == heights[i] {
        return Some(pressures[i]);
    }
    lerp(heights[i], pressures[i], heights[i + 1], pressures[i + 1], height)
}

/// Wind components at `height` from ascending level heights
///
/// Between two levels each component is inverse-distance weighted; beyond the
/// sampled range the end slopes are extrapolated linearly.
pub fn interpolate_components(
    height: f64,
    heights: &[f64],
    u: &[f64],
    v: &[f64],
) -> Option<(f64, f64)> {
    let n = heights.len();
    if n < 2 || n != u.len() || n != v.len() || !height.is_finite() {
        return None;
    }

    if height < heights[0] || height > heights[n - 1] {
        let ui = linear_interpolate(heights, u, height)?;
        let vi = linear_interpolate(heights, v, height)?;
        return Some((ui, vi));
    }

    let i = bracket(heights, height);
    let j = (i + 1).min(n - 1);
    Some((
        inverse_distance_interpolate(u[i], u[j], heights[i], heights[j], height),
        inverse_distance_interpolate(v[i], v[j], heights[i], heights[j], height),
    ))
}

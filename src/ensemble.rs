//! Multi-model ensemble handling.
//!
//! Several weather models are fused into one synthetic sounding per scenario,
//! or planned individually and overlaid as an exit-area heat map.

use crate::constants::{HEATMAP_CELL_SIZE_M, METERS_PER_DEGREE_GRID};
use crate::context::PlanningContext;
use crate::error::{PlannerError, Result};
use crate::geo::{convex_hull, haversine_distance, LatLng};
use crate::planner::plan_jump;
use crate::sounding::{LevelSample, SoundingSample, SurfaceSample};
use crate::units::WindSpeedUnit;
use crate::wind::{wind_direction, wind_speed, wind_vector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How to combine the selected models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Pass each model through unchanged
    #[default]
    AllModels,
    MinWind,
    MeanWind,
    MaxWind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduce {
    Min,
    Mean,
    Max,
}

/// Model name to its sounding timesteps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnsembleModelSet {
    pub models: BTreeMap<String, Vec<SoundingSample>>,
}

impl EnsembleModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: impl Into<String>, samples: Vec<SoundingSample>) {
        self.models.insert(model.into(), samples);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Shared number of timesteps; models must agree
    pub fn timesteps(&self) -> Result<usize> {
        let mut lengths = self.models.iter().map(|(name, samples)| (name, samples.len()));
        let Some((_, first)) = lengths.next() else {
            return Err(PlannerError::insufficient("no models selected"));
        };
        if let Some((name, len)) = lengths.find(|(_, len)| *len != first) {
            return Err(PlannerError::range(format!(
                "model {name} has {len} timesteps, expected {first}"
            )));
        }
        Ok(first)
    }

    fn samples_at(&self, timestep: usize) -> Result<Vec<(&String, &SoundingSample)>> {
        let steps = self.timesteps()?;
        if timestep >= steps {
            return Err(PlannerError::range(format!("timestep {timestep} outside 0..{steps}")));
        }
        Ok(self
            .models
            .iter()
            .filter_map(|(name, samples)| samples.get(timestep).map(|s| (name, s)))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSample {
    pub model: String,
    pub sample: SoundingSample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleProfile {
    Individual(Vec<ModelSample>),
    Fused(SoundingSample),
}

impl EnsembleProfile {
    /// Samples to plan with, labeled by model or scenario
    pub fn samples(&self) -> Vec<(&str, &SoundingSample)> {
        match self {
            EnsembleProfile::Individual(models) => {
                models.iter().map(|m| (m.model.as_str(), &m.sample)).collect()
            }
            EnsembleProfile::Fused(sample) => vec![("ensemble", sample)],
        }
    }
}

/// Combine the models at `timestep` according to `scenario`
///
/// Scalars reduce over the models that report them and stay empty when none
/// do. Min and max wind keep the direction of the model that supplied the
/// speed; mean wind averages the wind vectors. Fused speeds use the first
/// model's unit.
pub fn aggregate_ensemble(set: &EnsembleModelSet, scenario: Scenario, timestep: usize) -> Result<EnsembleProfile> {
    let samples = set.samples_at(timestep)?;

    let reduce = match scenario {
        Scenario::AllModels => {
            let models = samples
                .into_iter()
                .map(|(name, s)| ModelSample {
                    model: name.clone(),
                    sample: s.clone(),
                })
                .collect();
            return Ok(EnsembleProfile::Individual(models));
        }
        Scenario::MinWind => Reduce::Min,
        Scenario::MeanWind => Reduce::Mean,
        Scenario::MaxWind => Reduce::Max,
    };

    let Some((_, first)) = samples.first() else {
        return Err(PlannerError::insufficient("no models selected"));
    };
    let unit = first.wind_speed_unit;
    let soundings: Vec<&SoundingSample> = samples.iter().map(|(_, s)| *s).collect();

    let surface_wind = fuse_wind(
        soundings
            .iter()
            .map(|s| (s.surface.wind_speed, s.surface.wind_direction_deg, s.wind_speed_unit)),
        unit,
        reduce,
    );
    let surface = SurfaceSample {
        pressure_hpa: fuse_scalar(soundings.iter().map(|s| s.surface.pressure_hpa), reduce),
        temperature_c: fuse_scalar(soundings.iter().map(|s| s.surface.temperature_c), reduce),
        relative_humidity_pct: fuse_scalar(soundings.iter().map(|s| s.surface.relative_humidity_pct), reduce),
        wind_speed: surface_wind.map(|(spd, _)| spd),
        wind_direction_deg: surface_wind.map(|(_, dir)| dir),
    };

    let levels = pressure_keys(&soundings)
        .into_iter()
        .map(|p| {
            let at: Vec<(&LevelSample, WindSpeedUnit)> = soundings
                .iter()
                .filter_map(|s| s.level(p).map(|l| (l, s.wind_speed_unit)))
                .collect();
            let wind = fuse_wind(
                at.iter().map(|(l, u)| (l.wind_speed, l.wind_direction_deg, *u)),
                unit,
                reduce,
            );
            LevelSample {
                pressure_hpa: p,
                geopotential_height_m: fuse_scalar(at.iter().map(|(l, _)| l.geopotential_height_m), reduce),
                temperature_c: fuse_scalar(at.iter().map(|(l, _)| l.temperature_c), reduce),
                relative_humidity_pct: fuse_scalar(at.iter().map(|(l, _)| l.relative_humidity_pct), reduce),
                wind_speed: wind.map(|(spd, _)| spd),
                wind_direction_deg: wind.map(|(_, dir)| dir),
            }
        })
        .collect();

    debug!(?scenario, models = soundings.len(), timestep, "ensemble fused");

    Ok(EnsembleProfile::Fused(SoundingSample {
        time: first.time.clone(),
        wind_speed_unit: unit,
        surface,
        levels,
    }))
}

/// Every pressure key present in any model, highest pressure first
fn pressure_keys(soundings: &[&SoundingSample]) -> Vec<f64> {
    let mut keys: Vec<f64> = soundings
        .iter()
        .flat_map(|s| s.levels.iter().map(|l| l.pressure_hpa))
        .filter(|p| p.is_finite())
        .collect();
    keys.sort_by(|a, b| b.total_cmp(a));
    keys.dedup();
    keys
}

fn fuse_scalar(values: impl Iterator<Item = Option<f64>>, reduce: Reduce) -> Option<f64> {
    let values: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    Some(match reduce {
        Reduce::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Reduce::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Reduce::Mean => values.iter().sum::<f64>() / values.len() as f64,
    })
}

/// Returns (speed in `unit`, direction) or `None` when no model has both
fn fuse_wind(
    winds: impl Iterator<Item = (Option<f64>, Option<f64>, WindSpeedUnit)>,
    unit: WindSpeedUnit,
    reduce: Reduce,
) -> Option<(f64, f64)> {
    let winds: Vec<(f64, f64)> = winds
        .filter_map(|(spd, dir, from)| Some((WindSpeedUnit::convert(spd?, from, unit), dir?)))
        .filter(|(spd, dir)| spd.is_finite() && dir.is_finite())
        .collect();
    if winds.is_empty() {
        return None;
    }

    match reduce {
        Reduce::Min => winds.iter().copied().min_by(|a, b| a.0.total_cmp(&b.0)),
        Reduce::Max => winds.iter().copied().max_by(|a, b| a.0.total_cmp(&b.0)),
        Reduce::Mean => {
            let sum = winds
                .iter()
                .fold(nalgebra::Vector2::zeros(), |acc, &(spd, dir)| acc + wind_vector(spd, dir));
            let mean = sum / winds.len() as f64;
            Some((wind_speed(mean.x, mean.y), wind_direction(mean.x, mean.y)))
        }
    }
}

/// Tight exit circle of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelExitCircle {
    pub model: String,
    pub center: LatLng,
    pub radius_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub center: LatLng,
    pub count: usize,
}

/// Convex outlines of cells covered by at least one, half, or all models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapContours {
    pub any: Vec<LatLng>,
    pub majority: Vec<LatLng>,
    pub all: Vec<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub cell_size_m: f64,
    pub model_count: usize,
    pub circles: Vec<ModelExitCircle>,
    /// Cells hit by at least one circle
    pub cells: Vec<HeatmapCell>,
    pub contours: OverlapContours,
}

/// Plan every model at `timestep` and rasterize the overlap of their tight exit areas
pub fn ensemble_heatmap(ctx: &PlanningContext, set: &EnsembleModelSet, timestep: usize) -> Result<Heatmap> {
    let samples = set.samples_at(timestep)?;

    let circles: Vec<ModelExitCircle> = samples
        .par_iter()
        .filter_map(|(name, sample)| match plan_jump(ctx, sample) {
            Ok(plan) => plan.exit.map(|exit| ModelExitCircle {
                model: (*name).clone(),
                center: exit.tight.center,
                radius_m: exit.tight.radius_m,
            }),
            Err(err) => {
                warn!(model = %name, %err, "model skipped in heat map");
                None
            }
        })
        .collect();

    if circles.is_empty() {
        return Err(PlannerError::insufficient("no model produced an exit area"));
    }

    let cells = rasterize(&circles, HEATMAP_CELL_SIZE_M);
    let n = circles.len();
    let contour = |threshold: usize| {
        let pts: Vec<LatLng> = cells.iter().filter(|c| c.count >= threshold).map(|c| c.center).collect();
        convex_hull(&pts)
    };
    let contours = OverlapContours {
        any: contour(1),
        majority: contour(n.div_ceil(2)),
        all: contour(n),
    };

    info!(models = n, cells = cells.len(), "ensemble heat map");

    Ok(Heatmap {
        cell_size_m: HEATMAP_CELL_SIZE_M,
        model_count: n,
        circles,
        cells,
        contours,
    })
}

/// Count circle coverage on a square grid around all circles
fn rasterize(circles: &[ModelExitCircle], cell_size_m: f64) -> Vec<HeatmapCell> {
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut min_lng = f64::INFINITY;
    let mut max_lng = f64::NEG_INFINITY;
    for c in circles {
        let d_lat = c.radius_m / METERS_PER_DEGREE_GRID;
        let d_lng = c.radius_m / (METERS_PER_DEGREE_GRID * c.center.lat.to_radians().cos());
        min_lat = min_lat.min(c.center.lat - d_lat);
        max_lat = max_lat.max(c.center.lat + d_lat);
        min_lng = min_lng.min(c.center.lng - d_lng);
        max_lng = max_lng.max(c.center.lng + d_lng);
    }
    if !(min_lat.is_finite() && max_lat.is_finite() && min_lng.is_finite() && max_lng.is_finite()) {
        return Vec::new();
    }

    let mid_lat = (min_lat + max_lat) / 2.0;
    let lat_step = cell_size_m / METERS_PER_DEGREE_GRID;
    let lng_step = cell_size_m / (METERS_PER_DEGREE_GRID * mid_lat.to_radians().cos());
    let rows = ((max_lat - min_lat) / lat_step).ceil().max(1.0) as usize;
    let cols = ((max_lng - min_lng) / lng_step).ceil().max(1.0) as usize;

    (0..rows)
        .into_par_iter()
        .flat_map_iter(|i| {
            let lat = min_lat + (i as f64 + 0.5) * lat_step;
            (0..cols).filter_map(move |j| {
                let center = LatLng::new(lat, min_lng + (j as f64 + 0.5) * lng_step);
                let count = circles
                    .iter()
                    .filter(|c| haversine_distance(center, c.center) <= c.radius_m)
                    .count();
                (count > 0).then_some(HeatmapCell { center, count })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::JumpSettings;
    use crate::geo::destination_point;

    fn sample(unit: WindSpeedUnit, temp: f64, speed: f64, direction: f64) -> SoundingSample {
        let levels = [(1000.0, 110.0), (925.0, 760.0), (850.0, 1460.0), (700.0, 3010.0), (500.0, 5570.0)]
            .iter()
            .map(|&(p, h)| LevelSample::new(p, h, temp, 60.0, speed, direction))
            .collect();
        SoundingSample {
            time: Some("2026-06-01T12:00".into()),
            wind_speed_unit: unit,
            surface: SurfaceSample::new(1013.0, temp, 55.0, speed, direction),
            levels,
        }
    }

    fn three_models() -> EnsembleModelSet {
        let mut set = EnsembleModelSet::new();
        set.insert("icon", vec![sample(WindSpeedUnit::Knots, 10.0, 10.0, 260.0)]);
        set.insert("gfs", vec![sample(WindSpeedUnit::Knots, 12.0, 20.0, 280.0)]);
        set.insert("ecmwf", vec![sample(WindSpeedUnit::Knots, 14.0, 15.0, 270.0)]);
        set
    }

    fn fused(set: &EnsembleModelSet, scenario: Scenario) -> SoundingSample {
        match aggregate_ensemble(set, scenario, 0).unwrap() {
            EnsembleProfile::Fused(s) => s,
            other => panic!("expected fused profile, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_reductions() {
        let set = three_models();
        let mean = fused(&set, Scenario::MeanWind);
        let min = fused(&set, Scenario::MinWind);
        let max = fused(&set, Scenario::MaxWind);
        assert!((mean.surface.temperature_c.unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(min.surface.temperature_c, Some(10.0));
        assert_eq!(max.surface.temperature_c, Some(14.0));
        assert_eq!(mean.level(850.0).unwrap().temperature_c, Some(12.0));
    }

    #[test]
    fn test_min_max_keep_model_direction() {
        let set = three_models();
        let min = fused(&set, Scenario::MinWind);
        assert_eq!(min.surface.wind_speed, Some(10.0));
        assert_eq!(min.surface.wind_direction_deg, Some(260.0));
        let max = fused(&set, Scenario::MaxWind);
        assert_eq!(max.level(700.0).unwrap().wind_speed, Some(20.0));
        assert_eq!(max.level(700.0).unwrap().wind_direction_deg, Some(280.0));
    }

    #[test]
    fn test_mean_wind_is_vector_mean() {
        let mut set = EnsembleModelSet::new();
        set.insert("a", vec![sample(WindSpeedUnit::MetersPerSecond, 10.0, 10.0, 90.0)]);
        set.insert("b", vec![sample(WindSpeedUnit::MetersPerSecond, 10.0, 10.0, 270.0)]);
        let mean = fused(&set, Scenario::MeanWind);
        assert!(mean.surface.wind_speed.unwrap() < 1e-9);

        let mut set = EnsembleModelSet::new();
        set.insert("a", vec![sample(WindSpeedUnit::MetersPerSecond, 10.0, 10.0, 350.0)]);
        set.insert("b", vec![sample(WindSpeedUnit::MetersPerSecond, 10.0, 10.0, 10.0)]);
        let mean = fused(&set, Scenario::MeanWind);
        let dir = mean.surface.wind_direction_deg.unwrap();
        assert!(dir < 1e-6 || dir > 360.0 - 1e-6);
    }

    #[test]
    fn test_speeds_converted_to_first_unit() {
        let mut set = EnsembleModelSet::new();
        // BTreeMap order: "a" is first
        set.insert("a", vec![sample(WindSpeedUnit::Knots, 10.0, 10.0, 270.0)]);
        set.insert("b", vec![sample(WindSpeedUnit::MetersPerSecond, 10.0, 10.0, 270.0)]);
        let max = fused(&set, Scenario::MaxWind);
        assert_eq!(max.wind_speed_unit, WindSpeedUnit::Knots);
        assert!((max.surface.wind_speed.unwrap() - 19.4384).abs() < 1e-3);
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let mut a = sample(WindSpeedUnit::Knots, 10.0, 10.0, 270.0);
        a.surface.temperature_c = None;
        a.levels.retain(|l| l.pressure_hpa != 500.0);
        let mut b = sample(WindSpeedUnit::Knots, 20.0, 10.0, 270.0);
        b.surface.temperature_c = None;

        let mut set = EnsembleModelSet::new();
        set.insert("a", vec![a]);
        set.insert("b", vec![b]);
        let mean = fused(&set, Scenario::MeanWind);
        assert_eq!(mean.surface.temperature_c, None);
        assert_eq!(mean.level(500.0).unwrap().temperature_c, Some(20.0));
        assert_eq!(mean.level(850.0).unwrap().temperature_c, Some(15.0));
    }

    #[test]
    fn test_all_models_passthrough_and_shape_checks() {
        let set = three_models();
        match aggregate_ensemble(&set, Scenario::AllModels, 0).unwrap() {
            EnsembleProfile::Individual(models) => {
                assert_eq!(models.len(), 3);
                assert_eq!(models[0].model, "ecmwf");
            }
            other => panic!("expected individual profiles, got {other:?}"),
        }
        assert!(matches!(
            aggregate_ensemble(&set, Scenario::MeanWind, 1),
            Err(PlannerError::InvalidRange(_))
        ));

        let mut uneven = three_models();
        uneven.insert("extra", vec![]);
        assert!(matches!(uneven.timesteps(), Err(PlannerError::InvalidRange(_))));
        assert!(matches!(
            EnsembleModelSet::new().timesteps(),
            Err(PlannerError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_rasterize_counts_overlap() {
        let a = LatLng::new(47.0, 9.0);
        let circles = vec![
            ModelExitCircle { model: "a".into(), center: a, radius_m: 200.0 },
            ModelExitCircle { model: "b".into(), center: destination_point(a, 100.0, 90.0), radius_m: 200.0 },
        ];
        let cells = rasterize(&circles, 40.0);
        assert!(cells.iter().any(|c| c.count == 2));
        assert!(cells.iter().all(|c| c.count >= 1 && c.count <= 2));
        // Cell area roughly covers the union of both discs
        let union_area = cells.len() as f64 * 40.0 * 40.0;
        assert!(union_area > 120_000.0 && union_area < 200_000.0);
    }

    #[test]
    fn test_heatmap_contours_nest() {
        let ctx = PlanningContext::new(LatLng::new(47.0, 9.0), 0.0, JumpSettings::default()).unwrap();
        let heatmap = ensemble_heatmap(&ctx, &three_models(), 0).unwrap();
        assert_eq!(heatmap.model_count, 3);
        assert_eq!(heatmap.circles.len(), 3);
        assert!(!heatmap.cells.is_empty());
        assert!(heatmap.contours.any.len() >= 3);
        assert!(heatmap.cells.iter().all(|c| c.count <= 3));
    }
}

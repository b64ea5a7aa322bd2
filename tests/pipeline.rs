use dropzone_engine::constants::KNOTS_TO_MPS;
use dropzone_engine::geo::haversine_distance;
use dropzone_engine::wind::{wind_direction, wind_speed, wind_vector};
use dropzone_engine::*;
use nalgebra::Vector2;

fn uniform_sounding(speed_kt: f64, direction: f64, temp_2m: f64) -> SoundingSample {
    let levels = [
        (1000.0, 110.0, 15.0),
        (950.0, 540.0, 12.0),
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
        time: Some("2026-07-14T09:00".into()),
        wind_speed_unit: WindSpeedUnit::Knots,
        surface: SurfaceSample::new(955.0, temp_2m, 55.0, speed_kt, direction),
        levels,
    }
}

#[test]
fn test_uniform_layer_mean_equals_constant() {
    let profile = build_profile(&uniform_sounding(10.0, 270.0, 15.0), 500.0, &ProfileOptions::default());
    assert!(!profile.is_empty());

    let mean = profile.mean_wind(HeightBand::new(500.0, 1000.0).unwrap()).unwrap();
    assert!((mean.direction_deg - 270.0).abs() < 1e-6);
    assert!((mean.speed / KNOTS_TO_MPS - 10.0).abs() < 1e-6);
}

#[test]
fn test_profile_heights_strictly_ascending() {
    let profile = build_profile(&uniform_sounding(12.0, 200.0, 15.0), 500.0, &ProfileOptions::default());
    let heights = profile.heights();
    assert!(heights.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(heights[0], 500.0);
}

#[test]
fn test_wind_vector_round_trip() {
    for direction in (0..360).step_by(15) {
        for speed in [0.5, 3.0, 17.5] {
            let w = wind_vector(speed, direction as f64);
            assert!((wind_speed(w.x, w.y) - speed).abs() < 1e-9);
            assert!((wind_direction(w.x, w.y) - direction as f64).abs() < 1e-9);
        }
    }
}

#[test]
fn test_calm_freefall_has_no_drift_and_position_free_radii() {
    let profile = build_profile(&uniform_sounding(0.0, 0.0, 15.0), 500.0, &ProfileOptions::default());
    let input = FreefallInput {
        exit_altitude_agl_m: 3000.0,
        opening_altitude_agl_m: 1200.0,
        initial_ground_velocity: Vector2::zeros(),
    };
    let ff = simulate_freefall(&profile, &input, &FreefallPhysics::default()).unwrap();
    assert!(ff.distance_m < 1e-6);
    assert!((ff.stop_height_asl - (500.0 + 1200.0 - 200.0)).abs() < 1e-9);

    let params = CanopyParams {
        opening_altitude_agl_m: 1200.0,
        safety_height_m: 0.0,
        downwind_leg_m: 300.0,
        canopy_speed_mps: 20.0 * KNOTS_TO_MPS,
        descent_rate_mps: 3.5,
    };
    let here = LatLng::new(47.0, 9.0);
    let there = LatLng::new(-33.9, 151.2);
    let a = canopy_areas(&profile, here, here, &params).unwrap();
    let b = canopy_areas(&profile, there, there, &params).unwrap();

    let expected_full = 1000.0 / 3.5 * 20.0 * KNOTS_TO_MPS;
    assert!((a.full.radius_m - expected_full).abs() < 1e-6);
    assert_eq!(a.full.radius_m, b.full.radius_m);
    assert_eq!(a.tight.radius_m, b.tight.radius_m);
    assert!(haversine_distance(a.full.center, here) < 1e-6);
}

#[test]
fn test_plan_chains_landing_legs() {
    let ctx = PlanningContext::new(LatLng::new(47.0, 9.0), 500.0, JumpSettings::default()).unwrap();
    let plan = plan_jump(&ctx, &uniform_sounding(12.0, 240.0, 15.0)).unwrap();
    let landing = &plan.landing;
    assert_eq!(landing.final_leg.end, ctx.location);
    assert_eq!(landing.final_leg.start, landing.base_leg.end);
    assert_eq!(landing.base_leg.start, landing.downwind_leg.end);
    assert_eq!(plan.jump_run.direction_deg, 240.0);
}

#[test]
fn test_ensemble_temperatures() {
    let mut set = EnsembleModelSet::new();
    set.insert("icon_d2", vec![uniform_sounding(10.0, 270.0, 10.0)]);
    set.insert("gfs", vec![uniform_sounding(10.0, 270.0, 12.0)]);
    set.insert("ecmwf", vec![uniform_sounding(10.0, 270.0, 14.0)]);

    let temp = |scenario| match aggregate_ensemble(&set, scenario, 0).unwrap() {
        EnsembleProfile::Fused(s) => s.surface.temperature_c.unwrap(),
        EnsembleProfile::Individual(_) => panic!("expected a fused sounding"),
    };
    assert!((temp(Scenario::MeanWind) - 12.0).abs() < 1e-9);
    assert_eq!(temp(Scenario::MinWind), 10.0);
    assert_eq!(temp(Scenario::MaxWind), 14.0);
}

#[test]
fn test_fused_sounding_plans() {
    let mut set = EnsembleModelSet::new();
    set.insert("a", vec![uniform_sounding(8.0, 250.0, 15.0)]);
    set.insert("b", vec![uniform_sounding(16.0, 290.0, 15.0)]);
    let EnsembleProfile::Fused(fused) = aggregate_ensemble(&set, Scenario::MeanWind, 0).unwrap() else {
        panic!("expected a fused sounding");
    };
    let ctx = PlanningContext::new(LatLng::new(47.0, 9.0), 500.0, JumpSettings::default()).unwrap();
    let plan = plan_jump(&ctx, &fused).unwrap();
    assert!(plan.exit.is_some());
}

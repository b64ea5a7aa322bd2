use clap::{Parser, Subcommand, ValueEnum};
use dropzone_engine::{
    aggregate_ensemble, build_profile, ensemble_heatmap, plan_jump, EnsembleModelSet, EnsembleProfile, Heatmap,
    HeightUnit, JumpPlan, JumpSettings, LatLng, PlanningContext, Profile, ProfileOptions, ReferenceLevel, Scenario,
    SoundingSample, WindSpeedUnit,
};
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dropzone")]
#[command(version)]
#[command(about = "Jump-run, freefall and canopy planning from weather model soundings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpolate a sounding onto a uniform height grid
    Profile {
        /// Sounding JSON (one sample or a list of timesteps)
        #[arg(short = 's', long)]
        sounding: PathBuf,

        /// Timestep index when the file holds several samples
        #[arg(short = 't', long, default_value = "0")]
        timestep: usize,

        /// Ground elevation (m AMSL)
        #[arg(short = 'e', long)]
        elevation: f64,

        /// Height step, in the height unit
        #[arg(long, default_value = "200")]
        step: f64,

        /// Height reference for display
        #[arg(long, default_value = "agl")]
        reference: Reference,

        /// Display height unit
        #[arg(long, default_value = "m")]
        height_unit: HeightArg,

        /// Display wind speed unit
        #[arg(long, default_value = "kt")]
        wind_unit: WindArg,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Plan a complete jump for one sounding
    Plan {
        #[arg(short = 's', long)]
        sounding: PathBuf,

        #[arg(short = 't', long, default_value = "0")]
        timestep: usize,

        /// Landing point latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Landing point longitude
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        #[arg(short = 'e', long)]
        elevation: f64,

        /// Settings JSON; missing fields use defaults
        #[arg(long)]
        settings: Option<PathBuf>,

        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Combine several models
    Ensemble {
        /// JSON object of model name to sounding timesteps
        #[arg(short = 'm', long)]
        models: PathBuf,

        #[arg(short = 't', long, default_value = "0")]
        timestep: usize,

        #[arg(long, default_value = "mean-wind")]
        scenario: EnsembleMode,

        /// Needed for the heat map
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,

        #[arg(short = 'e', long)]
        elevation: Option<f64>,

        #[arg(long)]
        settings: Option<PathBuf>,

        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Reference {
    Agl,
    Amsl,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeightArg {
    M,
    Ft,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WindArg {
    Kmh,
    Ms,
    Kt,
    Mph,
    Bft,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EnsembleMode {
    AllModels,
    MinWind,
    MeanWind,
    MaxWind,
    Heatmap,
}

impl From<WindArg> for WindSpeedUnit {
    fn from(arg: WindArg) -> Self {
        match arg {
            WindArg::Kmh => WindSpeedUnit::KilometersPerHour,
            WindArg::Ms => WindSpeedUnit::MetersPerSecond,
            WindArg::Kt => WindSpeedUnit::Knots,
            WindArg::Mph => WindSpeedUnit::MilesPerHour,
            WindArg::Bft => WindSpeedUnit::Beaufort,
        }
    }
}

/// A sounding file holds one sample or a list of timesteps
#[derive(Deserialize)]
#[serde(untagged)]
enum SoundingFile {
    Single(SoundingSample),
    Series(Vec<SoundingSample>),
}

fn load_sounding(path: &Path, timestep: usize) -> Result<SoundingSample, Box<dyn Error>> {
    let file: SoundingFile = serde_json::from_str(&fs::read_to_string(path)?)?;
    match file {
        SoundingFile::Single(sample) => Ok(sample),
        SoundingFile::Series(mut samples) => {
            if timestep >= samples.len() {
                return Err(format!("timestep {} outside 0..{}", timestep, samples.len()).into());
            }
            Ok(samples.swap_remove(timestep))
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<JumpSettings, Box<dyn Error>> {
    match path {
        Some(p) => Ok(JumpSettings::from_json(&fs::read_to_string(p)?)?),
        None => Ok(JumpSettings::default()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile {
            sounding,
            timestep,
            elevation,
            step,
            reference,
            height_unit,
            wind_unit,
            output,
        } => {
            let sample = load_sounding(&sounding, timestep)?;
            let options = ProfileOptions {
                reference: match reference {
                    Reference::Agl => ReferenceLevel::Agl,
                    Reference::Amsl => ReferenceLevel::Amsl,
                },
                step,
                height_unit: match height_unit {
                    HeightArg::M => HeightUnit::Meters,
                    HeightArg::Ft => HeightUnit::Feet,
                },
            };
            let profile = build_profile(&sample, elevation, &options);
            if profile.is_empty() {
                return Err("sounding yields no usable profile".into());
            }
            display_profile(&profile, &options, wind_unit.into(), output)?;
        }

        Commands::Plan {
            sounding,
            timestep,
            lat,
            lng,
            elevation,
            settings,
            output,
        } => {
            let sample = load_sounding(&sounding, timestep)?;
            let ctx = PlanningContext::new(LatLng::new(lat, lng), elevation, load_settings(settings.as_deref())?)?;
            let plan = plan_jump(&ctx, &sample)?;
            display_plan(&plan, output)?;
        }

        Commands::Ensemble {
            models,
            timestep,
            scenario,
            lat,
            lng,
            elevation,
            settings,
            output,
        } => {
            let set: EnsembleModelSet = serde_json::from_str(&fs::read_to_string(&models)?)?;
            let scenario = match scenario {
                EnsembleMode::AllModels => Scenario::AllModels,
                EnsembleMode::MinWind => Scenario::MinWind,
                EnsembleMode::MeanWind => Scenario::MeanWind,
                EnsembleMode::MaxWind => Scenario::MaxWind,
                EnsembleMode::Heatmap => {
                    let (Some(lat), Some(lng), Some(elevation)) = (lat, lng, elevation) else {
                        return Err("heatmap needs --lat, --lng and --elevation".into());
                    };
                    let ctx =
                        PlanningContext::new(LatLng::new(lat, lng), elevation, load_settings(settings.as_deref())?)?;
                    let heatmap = ensemble_heatmap(&ctx, &set, timestep)?;
                    display_heatmap(&heatmap, output)?;
                    return Ok(());
                }
            };
            let fused = aggregate_ensemble(&set, scenario, timestep)?;
            display_ensemble(&fused, output)?;
        }
    }

    Ok(())
}

fn display_profile(
    profile: &Profile,
    options: &ProfileOptions,
    wind_unit: WindSpeedUnit,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let h_label = options.height_unit.label();
    let reference = match options.reference {
        ReferenceLevel::Agl => "AGL",
        ReferenceLevel::Amsl => "AMSL",
    };
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(profile)?);
        }

        OutputFormat::Csv => {
            println!("height_{h_label}_{},dir_deg,speed_{},temp_c,rh_pct,dewpoint_c,pressure_hpa", reference.to_lowercase(), wind_unit.label());
            for l in &profile.levels {
                println!(
                    "{:.0},{:.0},{:.1},{:.1},{:.0},{},{}",
                    l.display_height,
                    l.wind_direction_deg,
                    wind_unit.from_mps(l.wind_speed_mps),
                    l.temperature_c,
                    l.relative_humidity_pct,
                    l.dewpoint_c.map(|d| format!("{d:.1}")).unwrap_or_default(),
                    l.pressure_hpa.map(|p| format!("{p:.1}")).unwrap_or_default(),
                );
            }
        }

        OutputFormat::Table => {
            println!("WIND PROFILE ({} levels, surface {:.1} hPa)", profile.len(), profile.surface_pressure_hpa);
            println!(
                "{:>8} {:>6} {:>7} {:>7} {:>5} {:>7} {:>8}",
                format!("{h_label} {reference}"),
                "Dir",
                wind_unit.label(),
                "T (C)",
                "RH",
                "Td (C)",
                "P (hPa)"
            );
            for l in &profile.levels {
                println!(
                    "{:>8.0} {:>6.0} {:>7.1} {:>7.1} {:>5.0} {:>7} {:>8}",
                    l.display_height,
                    l.wind_direction_deg,
                    wind_unit.from_mps(l.wind_speed_mps),
                    l.temperature_c,
                    l.relative_humidity_pct,
                    l.dewpoint_c.map(|d| format!("{d:.1}")).unwrap_or_else(|| "-".into()),
                    l.pressure_hpa.map(|p| format!("{p:.1}")).unwrap_or_else(|| "-".into()),
                );
            }
        }
    }
    Ok(())
}

fn display_plan(plan: &JumpPlan, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(plan)?);
        }

        OutputFormat::Csv => {
            println!("item,lat,lng,value");
            let jr = &plan.jump_run;
            println!("jump_run_start,{:.6},{:.6},{:.0}", jr.start.lat, jr.start.lng, jr.direction_deg);
            println!("jump_run_end,{:.6},{:.6},{:.0}", jr.end.lat, jr.end.lng, jr.track_length_m);
            println!("approach_start,{:.6},{:.6},{:.0}", jr.approach_start.lat, jr.approach_start.lng, jr.approach_length_m);
            for leg in plan.landing.legs() {
                println!("{:?}_start,{:.6},{:.6},{:.0}", leg.kind, leg.start.lat, leg.start.lng, leg.length_m);
            }
            println!("canopy_full,{:.6},{:.6},{:.0}", plan.canopy.full.center.lat, plan.canopy.full.center.lng, plan.canopy.full.radius_m);
            println!("canopy_tight,{:.6},{:.6},{:.0}", plan.canopy.tight.center.lat, plan.canopy.tight.center.lng, plan.canopy.tight.radius_m);
            if let Some(exit) = &plan.exit {
                println!("exit_full,{:.6},{:.6},{:.0}", exit.full.center.lat, exit.full.center.lng, exit.full.radius_m);
                println!("exit_tight,{:.6},{:.6},{:.0}", exit.tight.center.lat, exit.tight.center.lng, exit.tight.radius_m);
            }
            if let Some(cutaway) = &plan.cutaway {
                println!("cutaway,{:.6},{:.6},{:.0}", cutaway.center.lat, cutaway.center.lng, cutaway.radius_m);
            }
        }

        OutputFormat::Table => {
            let jr = &plan.jump_run;
            println!("JUMP RUN");
            println!("  Direction:       {:>8.0} deg", jr.direction_deg);
            println!("  Mean wind:       {:>8.0} deg / {:.1} m/s", jr.mean_wind.direction_deg, jr.mean_wind.speed);
            println!("  TAS:             {:>8.1} kt", jr.true_airspeed_kt);
            println!("  Ground speed:    {:>8.1} m/s", jr.ground_speed_mps);
            println!("  Separation:      {:>8.0} s", jr.separation_s);
            println!("  Track length:    {:>8.0} m", jr.track_length_m);
            println!("  Approach:        {:>8.0} m", jr.approach_length_m);

            if let Some(ff) = &plan.freefall {
                println!("FREEFALL");
                println!("  Time:            {:>8.1} s", ff.time_s);
                println!("  Drift:           {:>8.0} m toward {:.0} deg", ff.distance_m, ff.direction_deg);
            }

            println!("LANDING PATTERN (final {:.0} deg)", plan.landing.landing_direction_deg);
            for leg in plan.landing.legs() {
                println!(
                    "  {:<9} course {:>4.0} deg  gs {:>6.1} m/s  {:>5.0} m  {:>5.0} s",
                    format!("{:?}", leg.kind),
                    leg.course_deg,
                    leg.ground_speed_mps,
                    leg.length_m,
                    leg.duration_s
                );
            }

            println!("CANOPY");
            println!("  Full radius:     {:>8.0} m", plan.canopy.full.radius_m);
            println!("  Tight radius:    {:>8.0} m", plan.canopy.tight.radius_m);
            if let Some(exit) = &plan.exit {
                println!("EXIT");
                println!("  Full:  {:.5}, {:.5} r={:.0} m", exit.full.center.lat, exit.full.center.lng, exit.full.radius_m);
                println!("  Tight: {:.5}, {:.5} r={:.0} m", exit.tight.center.lat, exit.tight.center.lng, exit.tight.radius_m);
            }
            if let Some(cutaway) = &plan.cutaway {
                println!("CUTAWAY");
                println!(
                    "  Landing {:.5}, {:.5} r={:.0} m after {:.0} s",
                    cutaway.center.lat, cutaway.center.lng, cutaway.radius_m, cutaway.descent_time_s
                );
            }
        }
    }
    Ok(())
}

fn display_ensemble(profile: &EnsembleProfile, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(profile)?);
        }

        OutputFormat::Csv | OutputFormat::Table => {
            let csv = matches!(format, OutputFormat::Csv);
            if csv {
                println!("model,pressure_hpa,height_m,temp_c,speed,dir_deg");
            }
            for (model, sample) in profile.samples() {
                if !csv {
                    println!("{} ({})", model.to_uppercase(), sample.wind_speed_unit);
                }
                for l in &sample.levels {
                    let cell = |v: Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".into());
                    if csv {
                        println!(
                            "{model},{:.0},{},{},{},{}",
                            l.pressure_hpa,
                            cell(l.geopotential_height_m),
                            cell(l.temperature_c),
                            cell(l.wind_speed),
                            cell(l.wind_direction_deg)
                        );
                    } else {
                        println!(
                            "  {:>6.0} hPa {:>8} m {:>6} C {:>6} @ {:>5}",
                            l.pressure_hpa,
                            cell(l.geopotential_height_m),
                            cell(l.temperature_c),
                            cell(l.wind_speed),
                            cell(l.wind_direction_deg)
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn display_heatmap(heatmap: &Heatmap, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(heatmap)?);
        }

        OutputFormat::Csv => {
            println!("lat,lng,count");
            for c in &heatmap.cells {
                println!("{:.6},{:.6},{}", c.center.lat, c.center.lng, c.count);
            }
        }

        OutputFormat::Table => {
            println!("EXIT HEAT MAP ({} models, {:.0} m cells)", heatmap.model_count, heatmap.cell_size_m);
            for c in &heatmap.circles {
                println!("  {:<12} {:.5}, {:.5} r={:.0} m", c.model, c.center.lat, c.center.lng, c.radius_m);
            }
            let all = heatmap.cells.iter().filter(|c| c.count == heatmap.model_count).count();
            println!("  Cells covered:   {:>8}", heatmap.cells.len());
            println!("  Cells in all:    {:>8}", all);
            println!("  Contour points:  {} / {} / {}", heatmap.contours.any.len(), heatmap.contours.majority.len(), heatmap.contours.all.len());
        }
    }
    Ok(())
}

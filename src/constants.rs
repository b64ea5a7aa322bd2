/// Physical and planning constants used across the dropzone engine

/// Gravitational acceleration used by the freefall integrator (m/s²)
pub const G_ACCEL_MPS2: f64 = 9.81;

/// Standard gravity used by ISA and barometric formulas (m/s²)
pub const G_STANDARD_MPS2: f64 = 9.80665;

/// Specific gas constant for dry air used by the hypsometric density (J/(kg·K))
pub const R_AIR_HYPSOMETRIC: f64 = 287.102;

/// Specific gas constant for dry air used by the ISA density ratio (J/(kg·K))
pub const R_DRY: f64 = 287.05;

/// Universal gas constant (J/(mol·K))
pub const R_UNIVERSAL: f64 = 8.314_462_618_153_24;

/// Molar mass of dry air (kg/mol)
pub const MOLAR_MASS_AIR: f64 = 0.028_964_4;

/// ISA temperature lapse rate in the troposphere (K/m)
pub const ISA_LAPSE_RATE: f64 = 0.0065;

/// ISA sea level temperature (K)
pub const ISA_SEA_LEVEL_TEMP_K: f64 = 288.15;

/// Offset between Celsius and Kelvin
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Conversion factor: meters to feet
pub const METERS_TO_FEET: f64 = 3.28084;

/// Conversion factor: feet to meters
pub const FEET_TO_METERS: f64 = 0.3048;

/// Conversion factor: knots to meters per second
pub const KNOTS_TO_MPS: f64 = 0.514444;

/// Conversion factor: kilometers per hour to meters per second
pub const KMH_TO_MPS: f64 = 1000.0 / 3600.0;

/// Kilometers per nautical mile
pub const KM_PER_NAUTICAL_MILE: f64 = 1.852;

/// Kilometers per statute mile
pub const KM_PER_STATUTE_MILE: f64 = 1.60934;

/// Mean earth radius for great-circle calculations (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude for flat-earth leg offsets
///
/// Good enough at dropzone scale (a few kilometers), where the curvature
/// error stays well below the forecast uncertainty.
pub const METERS_PER_DEGREE_FLAT: f64 = 111_000.0;

/// Meters per degree of latitude for grid rasterization
pub const METERS_PER_DEGREE_GRID: f64 = 111_320.0;

/// Pressure levels (hPa) reported by the weather models, surface first
pub const STANDARD_PRESSURE_LEVELS: [f64; 13] = [
    1000.0, 950.0, 925.0, 900.0, 850.0, 800.0, 700.0, 600.0, 500.0, 400.0, 300.0, 250.0, 200.0,
];

// Freefall body model
/// Jumper mass including equipment (kg)
pub const FREEFALL_MASS_KG: f64 = 80.0;

/// Drag coefficient, applied on both axes
pub const FREEFALL_DRAG_COEFFICIENT: f64 = 1.0;

/// Reference area, applied on both axes (m²)
pub const FREEFALL_REFERENCE_AREA_M2: f64 = 0.5;

/// Integration step for the freefall simulator (s)
pub const FREEFALL_TIME_STEP_S: f64 = 0.5;

/// Hard limit on integration steps before the simulator gives up
pub const FREEFALL_MAX_STEPS: usize = 100_000;

/// Height lost between canopy deployment start and a flyable canopy (m)
pub const CANOPY_OPENING_BUFFER_M: f64 = 200.0;

// Jump run
/// Shortest jump-run track (m)
pub const JUMP_RUN_MIN_TRACK_M: f64 = 100.0;

/// Longest jump-run track (m)
pub const JUMP_RUN_MAX_TRACK_M: f64 = 10_000.0;

/// Shortest approach path (m)
pub const APPROACH_MIN_LENGTH_M: f64 = 100.0;

/// Longest approach path (m)
pub const APPROACH_MAX_LENGTH_M: f64 = 20_000.0;

/// Duration of the straight-in approach before the jump run (s)
pub const APPROACH_TIME_S: f64 = 120.0;

// Canopy areas
/// Smallest vertical span for an additional canopy circle (m)
pub const CANOPY_CIRCLE_MIN_SPAN_M: f64 = 200.0;

/// Upper limit decrement for additional canopy circles (m)
pub const CANOPY_CIRCLE_STEP_M: f64 = 200.0;

/// Upper limit decrement when the span exceeds `CANOPY_CIRCLE_WIDE_SPAN_M` (m)
pub const CANOPY_CIRCLE_WIDE_STEP_M: f64 = 500.0;

/// Span above which the wide decrement is used (m)
pub const CANOPY_CIRCLE_WIDE_SPAN_M: f64 = 1000.0;

/// Radius of the cutaway landing area (m)
pub const CUTAWAY_RADIUS_M: f64 = 150.0;

/// Heatmap grid cell edge (m)
pub const HEATMAP_CELL_SIZE_M: f64 = 40.0;

// Numerical stability constants
/// General numerical tolerance for floating point comparisons
pub const NUMERICAL_TOLERANCE: f64 = 1e-9;

/// Minimum threshold for preventing division by zero in general calculations
pub const MIN_DIVISION_THRESHOLD: f64 = 1e-12;

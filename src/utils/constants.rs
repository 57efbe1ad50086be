//! Unit conversions and physical constants.
//!
//! All interior computation is SI; these factors live at the XML boundary
//! and at property names whose suffixes imply other units.

pub const FT_TO_M: f64 = 0.3048;
pub const M_TO_FT: f64 = 1.0 / FT_TO_M;
pub const IN_TO_M: f64 = 0.0254;
pub const FT2_TO_M2: f64 = 0.092903;
pub const M2_TO_FT2: f64 = 1.0 / FT2_TO_M2;
pub const LB_TO_KG: f64 = 0.453592;
pub const KG_TO_LB: f64 = 1.0 / LB_TO_KG;
pub const SLUGFT2_TO_KGM2: f64 = 1.35581795;
pub const KT_TO_MS: f64 = 0.514444;
pub const MS_TO_KT: f64 = 1.0 / KT_TO_MS;
pub const FPS_TO_MS: f64 = 0.3048;
pub const MS_TO_FPS: f64 = 1.0 / FPS_TO_MS;
pub const HP_TO_W: f64 = 745.7;
pub const LB_TO_N: f64 = 4.44822;
pub const N_TO_LB: f64 = 1.0 / LB_TO_N;
pub const PA_TO_PSF: f64 = 0.020885;
pub const KELVIN_TO_RANKINE: f64 = 1.8;
pub const KGM3_TO_SLUGFT3: f64 = 0.00194032;

/// Sea-level standard pressure in inches of mercury, the manifold-pressure
/// reading of a stopped engine.
pub const INHG_SEA_LEVEL: f64 = 29.92;

pub const GRAVITY: f64 = 9.80665; // m/s^2
pub const AIR_GAS_CONSTANT: f64 = 287.05; // J/(kg·K)
pub const AIR_GAMMA: f64 = 1.4;
pub const ISA_SEA_LEVEL_TEMP: f64 = 288.15; // K
pub const ISA_SEA_LEVEL_PRESSURE: f64 = 101325.0; // Pa
pub const ISA_SEA_LEVEL_DENSITY: f64 = 1.225; // kg/m^3
pub const ISA_LAPSE_RATE: f64 = 0.0065; // K/m
pub const ISA_TROPOPAUSE_ALT: f64 = 11_000.0; // m
pub const ISA_TROPOPAUSE_TEMP: f64 = 216.65; // K

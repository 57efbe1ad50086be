//! International Standard Atmosphere, valid to roughly 20 km.

use serde::{Deserialize, Serialize};

use crate::utils::constants::*;

/// Ambient air conditions at one altitude.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Atmosphere {
    /// Air temperature (K).
    pub temperature: f64,
    /// Static pressure (Pa).
    pub pressure: f64,
    /// Air density (kg/m³).
    pub density: f64,
    /// Speed of sound (m/s).
    pub sound_speed: f64,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self::at_altitude(0.0)
    }
}

impl Atmosphere {
    /// Evaluate the ISA model at `altitude_m` above sea level. Altitudes
    /// below sea level are clamped to 0.
    pub fn at_altitude(altitude_m: f64) -> Self {
        let h = altitude_m.max(0.0);

        let temperature = if h <= ISA_TROPOPAUSE_ALT {
            ISA_SEA_LEVEL_TEMP - ISA_LAPSE_RATE * h
        } else {
            ISA_TROPOPAUSE_TEMP
        };

        let pressure = if h <= ISA_TROPOPAUSE_ALT {
            ISA_SEA_LEVEL_PRESSURE
                * (temperature / ISA_SEA_LEVEL_TEMP)
                    .powf(GRAVITY / (AIR_GAS_CONSTANT * ISA_LAPSE_RATE))
        } else {
            let p11 = ISA_SEA_LEVEL_PRESSURE
                * (ISA_TROPOPAUSE_TEMP / ISA_SEA_LEVEL_TEMP)
                    .powf(GRAVITY / (AIR_GAS_CONSTANT * ISA_LAPSE_RATE));
            p11 * (-GRAVITY * (h - ISA_TROPOPAUSE_ALT) / (AIR_GAS_CONSTANT * ISA_TROPOPAUSE_TEMP))
                .exp()
        };

        let density = pressure / (AIR_GAS_CONSTANT * temperature);
        let sound_speed = (AIR_GAMMA * AIR_GAS_CONSTANT * temperature).sqrt();

        Self {
            temperature,
            pressure,
            density,
            sound_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sea_level() {
        let atm = Atmosphere::at_altitude(0.0);
        assert_relative_eq!(atm.temperature, 288.15);
        assert_relative_eq!(atm.pressure, 101325.0);
        assert_relative_eq!(atm.density, 1.225, epsilon = 1e-3);
        assert_relative_eq!(atm.sound_speed, 340.3, epsilon = 0.1);
    }

    #[test]
    fn test_troposphere_lapse() {
        let atm = Atmosphere::at_altitude(5000.0);
        assert_relative_eq!(atm.temperature, 288.15 - 0.0065 * 5000.0);
        assert_relative_eq!(atm.pressure, 54_040.0, epsilon = 200.0);
        assert_relative_eq!(atm.density, 0.736, epsilon = 5e-3);
    }

    #[test]
    fn test_isothermal_above_tropopause() {
        let at_11 = Atmosphere::at_altitude(11_000.0);
        let at_15 = Atmosphere::at_altitude(15_000.0);
        assert_relative_eq!(at_11.temperature, 216.65);
        assert_relative_eq!(at_15.temperature, 216.65);
        assert!(at_15.pressure < at_11.pressure);
        // Pressure continuity across the tropopause.
        let just_below = Atmosphere::at_altitude(10_999.0);
        assert_relative_eq!(just_below.pressure, at_11.pressure, epsilon = 50.0);
    }

    #[test]
    fn test_below_sea_level_clamped() {
        let below = Atmosphere::at_altitude(-500.0);
        let sea = Atmosphere::at_altitude(0.0);
        assert_relative_eq!(below.pressure, sea.pressure);
        assert_relative_eq!(below.temperature, sea.temperature);
    }
}

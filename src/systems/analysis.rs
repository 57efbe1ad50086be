//! Offline aerodynamic analysis: alpha sweeps, the performance envelope,
//! and a direct level-flight trim solve. These evaluate the configured
//! aerodynamics through the same property-store path the simulation uses,
//! without advancing any state.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::state::AircraftState;
use crate::properties::PropertyStore;
use crate::systems::forces::ForcesMoments;
use crate::systems::propulsion::PropulsionSystem;
use crate::utils::constants::*;

/// Lift/drag polar swept over angle of attack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlphaSweep {
    /// Swept angles (rad).
    pub alphas: Vec<f64>,
    pub cl: Vec<f64>,
    pub cd: Vec<f64>,
    pub ld: Vec<f64>,
    pub max_ld: f64,
    /// Angle of best L/D (rad).
    pub best_alpha: f64,
    /// Angle of maximum lift coefficient (rad).
    pub stall_alpha: f64,
}

/// Climb performance over a set of test altitudes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceEnvelope {
    pub altitudes: Vec<f64>,
    /// Excess-power climb rate at each altitude (m/s).
    pub climb_rates: Vec<f64>,
    /// First altitude where the climb rate drops below 0.5 m/s.
    pub service_ceiling: Option<f64>,
    /// First altitude where the climb rate reaches zero.
    pub absolute_ceiling: Option<f64>,
}

/// Result of a level-flight trim solve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrimResult {
    pub alpha: f64,
    pub elevator: f64,
    pub throttle: f64,
    pub converged: bool,
}

/// A probe state at the given flight condition. The velocity realizes the
/// requested angle of attack under the α = atan2(−w, u) convention.
fn probe_state(
    calculator: &ForcesMoments,
    altitude: f64,
    speed: f64,
    alpha: f64,
    elevator: f64,
) -> AircraftState {
    let velocity = Vector3::new(speed * alpha.cos(), 0.0, -speed * alpha.sin());
    let mut state = AircraftState::at_condition(altitude, velocity);
    state.mass = calculator.mass;
    state.control_surfaces.elevator = elevator;
    state.update_derived();
    state
}

/// Sweep angle of attack and extract the lift and drag polars.
pub fn alpha_sweep(
    calculator: &ForcesMoments,
    store: &PropertyStore,
    altitude: f64,
    speed: f64,
    alpha_start: f64,
    alpha_end: f64,
    steps: usize,
) -> AlphaSweep {
    let mut sweep = AlphaSweep::default();
    if steps < 2 {
        return sweep;
    }

    let mut max_cl = f64::NEG_INFINITY;
    for i in 0..steps {
        let alpha = alpha_start + (alpha_end - alpha_start) * i as f64 / (steps - 1) as f64;
        let state = probe_state(calculator, altitude, speed, alpha, 0.0);
        state.project_into(store);
        let set = calculator.compute(&state, store, Vector3::zeros(), Vector3::zeros());

        let q_s = state.dynamic_pressure * calculator.reference.wing_area;
        if q_s <= 0.0 {
            continue;
        }
        let cl = -set.aerodynamic.z / q_s;
        let cd = -set.aerodynamic.x / q_s;

        sweep.alphas.push(alpha);
        sweep.cl.push(cl);
        sweep.cd.push(cd);
        let ld = if cd > 0.0 { cl / cd } else { 0.0 };
        sweep.ld.push(ld);

        if ld > sweep.max_ld {
            sweep.max_ld = ld;
            sweep.best_alpha = alpha;
        }
        if cl > max_cl {
            max_cl = cl;
            sweep.stall_alpha = alpha;
        }
    }
    sweep
}

/// Climb performance from excess power at full throttle across the given
/// altitudes.
pub fn performance_envelope(
    calculator: &ForcesMoments,
    store: &PropertyStore,
    propulsion: &PropulsionSystem,
    altitudes: &[f64],
    speed: f64,
) -> PerformanceEnvelope {
    let mut envelope = PerformanceEnvelope {
        altitudes: altitudes.to_vec(),
        ..PerformanceEnvelope::default()
    };

    // Full-throttle thrust from the engine deck; the reference-ratio
    // formula carries no altitude term.
    let mut full = propulsion.clone();
    full.update(1.0, 0.0);
    let thrust = full.thrust_n();
    let weight = calculator.mass * GRAVITY;

    for &altitude in altitudes {
        let state = probe_state(calculator, altitude, speed, 0.0, 0.0);
        state.project_into(store);
        full.project_into(store);
        let set = calculator.compute(&state, store, Vector3::zeros(), Vector3::zeros());
        let drag = -set.aerodynamic.x;

        let climb_rate = (thrust - drag) * speed / weight;
        envelope.climb_rates.push(climb_rate);

        if climb_rate < 0.5 && envelope.service_ceiling.is_none() {
            envelope.service_ceiling = Some(altitude);
        }
        if climb_rate <= 0.0 && envelope.absolute_ceiling.is_none() {
            envelope.absolute_ceiling = Some(altitude);
        }
    }
    envelope
}

/// Solve for steady level flight at the given condition: angle of attack
/// from the lift balance, elevator from the pitch balance, throttle from
/// the thrust/drag balance. Each stage is a bisection against the
/// configured functions.
pub fn find_level_trim(
    calculator: &ForcesMoments,
    store: &PropertyStore,
    propulsion: &PropulsionSystem,
    altitude: f64,
    speed: f64,
) -> TrimResult {
    const ALPHA_SPAN: f64 = 15.0 * std::f64::consts::PI / 180.0;
    let weight = calculator.mass * 9.81;

    let lift_at = |alpha: f64| {
        let state = probe_state(calculator, altitude, speed, alpha, 0.0);
        state.project_into(store);
        let set = calculator.compute(&state, store, Vector3::zeros(), Vector3::zeros());
        -set.aerodynamic.z
    };

    // Lift balance over the alpha span; the curve's direction is probed
    // from the endpoints.
    let (mut lo, mut hi) = (-ALPHA_SPAN, ALPHA_SPAN);
    let rising = lift_at(hi) > lift_at(lo);
    let mut alpha = 0.0;
    let mut lift_converged = false;
    for _ in 0..60 {
        alpha = 0.5 * (lo + hi);
        let residual = lift_at(alpha) - weight;
        if residual.abs() < 1.0 {
            lift_converged = true;
            break;
        }
        if (residual < 0.0) == rising {
            lo = alpha;
        } else {
            hi = alpha;
        }
    }

    // Pitch balance: the moment is affine in elevator deflection.
    let pitch_at = |elevator: f64| {
        let state = probe_state(calculator, altitude, speed, alpha, elevator);
        state.project_into(store);
        let set = calculator.compute(&state, store, Vector3::zeros(), Vector3::zeros());
        set.moments.y
    };
    let m0 = pitch_at(0.0);
    let m1 = pitch_at(0.1);
    let slope = (m1 - m0) / 0.1;
    let (elevator, pitch_converged) = if slope.abs() > 1e-9 {
        let e = (-m0 / slope).clamp(-1.0, 1.0);
        (e, pitch_at(e).abs() < 1.0)
    } else {
        (0.0, m0.abs() < 1.0)
    };

    // Thrust balance against drag at the trimmed alpha.
    let drag = {
        let state = probe_state(calculator, altitude, speed, alpha, elevator);
        state.project_into(store);
        let set = calculator.compute(&state, store, Vector3::zeros(), Vector3::zeros());
        -set.aerodynamic.x
    };
    let thrust_at = |throttle: f64| {
        let mut engine = propulsion.clone();
        engine.engine.is_running = true;
        engine.update(throttle, 0.0);
        engine.thrust_n()
    };
    let (mut t_lo, mut t_hi) = (0.0, 1.0);
    let mut throttle = 1.0;
    let mut thrust_converged = false;
    if thrust_at(1.0) >= drag {
        for _ in 0..60 {
            throttle = 0.5 * (t_lo + t_hi);
            let residual = thrust_at(throttle) - drag;
            if residual.abs() < 1.0 {
                thrust_converged = true;
                break;
            }
            if residual < 0.0 {
                t_lo = throttle;
            } else {
                t_hi = throttle;
            }
        }
    }

    let result = TrimResult {
        alpha,
        elevator,
        throttle,
        converged: lift_converged && pitch_converged && thrust_converged,
    };
    debug!(
        alpha_deg = alpha.to_degrees(),
        elevator = result.elevator,
        throttle = result.throttle,
        converged = result.converged,
        "level trim solve"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use std::sync::Arc;

    fn fixture() -> (ForcesMoments, PropertyStore, PropulsionSystem) {
        let xml = std::fs::read_to_string(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/p51d.xml"
        ))
        .expect("fixture aircraft missing");
        let config = Arc::new(parse_config(&xml).unwrap());
        let store = PropertyStore::new();
        if let Some(metrics) = &config.metrics {
            store.set("metrics/Sw-sqft", metrics.wing_area.unwrap() * M2_TO_FT2);
            store.set("metrics/bw-ft", metrics.wing_span.unwrap() * M_TO_FT);
            store.set("metrics/cbarw-ft", metrics.chord.unwrap() * M_TO_FT);
        }
        let propulsion =
            PropulsionSystem::from_config(config.propulsion.as_ref().unwrap());
        (ForcesMoments::new(config), store, propulsion)
    }

    #[test]
    fn test_alpha_sweep_polars() {
        let (calculator, store, _) = fixture();
        let sweep = alpha_sweep(
            &calculator,
            &store,
            2000.0,
            90.0,
            -10.0_f64.to_radians(),
            10.0_f64.to_radians(),
            21,
        );
        assert_eq!(sweep.alphas.len(), 21);
        // Drag is lowest near zero alpha and the polar stays finite.
        let mid_cd = sweep.cd[10];
        assert!(mid_cd > 0.0);
        assert!(sweep.cd.iter().all(|cd| cd.is_finite() && *cd >= mid_cd - 1e-9));
        assert!(sweep.max_ld > 0.0);
        assert!(sweep.cl.iter().all(|cl| cl.is_finite()));
    }

    #[test]
    fn test_performance_envelope_monotone() {
        let (calculator, store, propulsion) = fixture();
        let altitudes = [0.0, 2000.0, 4000.0, 6000.0, 8000.0];
        let envelope =
            performance_envelope(&calculator, &store, &propulsion, &altitudes, 100.0);
        assert_eq!(envelope.climb_rates.len(), altitudes.len());
        assert!(envelope.climb_rates.iter().all(|r| r.is_finite()));
        // With an altitude-independent thrust deck, shrinking drag makes
        // the excess-power rate grow with altitude.
        for pair in envelope.climb_rates.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_level_trim_closes_balances() {
        let (calculator, store, propulsion) = fixture();
        let trim = find_level_trim(&calculator, &store, &propulsion, 1500.0, 60.0);

        assert!(trim.converged, "trim failed: {trim:?}");
        assert!(trim.throttle > 0.3 && trim.throttle <= 1.0);
        assert!(trim.elevator.abs() < 0.5);

        // The returned alpha carries the lift the weight needs.
        let state = probe_state(&calculator, 1500.0, 60.0, trim.alpha, trim.elevator);
        state.project_into(&store);
        let set = calculator.compute(&state, &store, Vector3::zeros(), Vector3::zeros());
        let lift = -set.aerodynamic.z;
        let weight = calculator.mass * 9.81;
        assert!((lift - weight).abs() / weight < 0.01);
    }
}

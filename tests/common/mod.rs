//! Shared helpers for the integration suite.

#![allow(dead_code)]

use nalgebra::Vector3;

use sixdof::engine::FlightDynamicsEngine;
use sixdof::systems::IntegratorKind;
use sixdof::{AircraftState, ControlInputs};

/// Load the bundled P-51D-class aircraft description.
pub fn p51d_xml() -> String {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/p51d.xml");
    std::fs::read_to_string(path).expect("fixture aircraft missing")
}

/// Engine with pass-through controls and body-X thrust, the configuration
/// the flight scenarios run under.
pub fn scenario_engine() -> FlightDynamicsEngine {
    FlightDynamicsEngine::from_xml(&p51d_xml(), IntegratorKind::Rk4, false, false)
        .expect("fixture parse failed")
}

/// Level state at the given altitude and forward speed, seeded with the
/// configured mass and the given pilot inputs.
pub fn trimmed_state(
    engine: &FlightDynamicsEngine,
    altitude: f64,
    velocity: Vector3<f64>,
    controls: ControlInputs,
) -> AircraftState {
    let mut state = engine.initial_state();
    state.altitude = altitude;
    state.position = Vector3::new(0.0, 0.0, -altitude);
    state.velocity = velocity;
    state.update_atmosphere();
    state.update_derived();
    state.set_controls(controls);
    state
}

/// Step the engine, asserting the universal state invariants at every
/// step: unit orientation and finite scalars.
pub fn run_checked(
    engine: &mut FlightDynamicsEngine,
    state: AircraftState,
    dt: f64,
    steps: usize,
) -> AircraftState {
    let mut current = state;
    for i in 0..steps {
        let (next, _) = engine
            .step(&current, dt)
            .unwrap_or_else(|e| panic!("step {i} failed: {e}"));
        let quat_norm = next.orientation.as_ref().norm();
        assert!(
            (quat_norm - 1.0).abs() < 1e-6,
            "orientation norm {quat_norm} at step {i}"
        );
        assert!(next.is_finite(), "non-finite state at step {i}");
        current = next;
    }
    current
}

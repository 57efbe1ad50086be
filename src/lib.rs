//! # sixdof
//!
//! A six-degree-of-freedom fixed-wing flight dynamics core. The engine
//! consumes an aircraft description in the JSBSim XML dialect and advances
//! the aircraft state under pilot control inputs: configuration and
//! expression evaluation, a keyed property store, a scheduled flight
//! control graph, piston-engine propulsion, aerodynamic force assembly,
//! and a family of numerical integrators.
//!
//! ```no_run
//! use sixdof::{ControlInputs, FlightDynamicsEngine, IntegratorKind};
//!
//! let xml = std::fs::read_to_string("aircraft/p51d.xml")?;
//! let mut engine = FlightDynamicsEngine::from_xml(&xml, IntegratorKind::Rk4, true, true)?;
//!
//! let mut state = engine.initial_state();
//! let mut controls = ControlInputs::default();
//! controls.throttle = 0.7;
//! engine.set_controls(&mut state, controls);
//!
//! for _ in 0..500 {
//!     let (next, _derivatives) = engine.step(&state, 0.01)?;
//!     state = next;
//! }
//! println!("altitude {:.0} m, TAS {:.1} m/s", state.altitude, state.true_airspeed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod fcs;
pub mod properties;
pub mod systems;
pub mod utils;

pub use components::{
    AircraftState, Atmosphere, ControlInputs, ControlSurfaces, EngineState, GearState,
};
pub use config::{parse_config, write_config, ConfigError, FdmConfig};
pub use engine::{FlightDynamicsEngine, FlightStatistics, SurfacePositions};
pub use fcs::{FlightControlSystem, RateGroupStats};
pub use properties::PropertyStore;
pub use systems::{IntegratorKind, PropulsionSystem, StateDerivatives};
pub use utils::SimError;

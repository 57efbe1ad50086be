pub mod atmosphere;
pub mod state;

pub use atmosphere::Atmosphere;
pub use state::{
    AircraftState, ControlInputs, ControlSurfaces, EngineState, ForceBreakdown, GearState,
    MomentBreakdown, TrimSettings,
};

pub mod analysis;
pub mod forces;
pub mod integrator;
pub mod propulsion;

pub use analysis::{AlphaSweep, PerformanceEnvelope, TrimResult};
pub use forces::{ForceMomentSet, ForcesMoments, ReferenceData};
pub use integrator::{
    AdamsBashforth2, AdaptiveStep, Dynamics, DynamicsRk4, Euler, FrozenDynamics, Integrator,
    IntegratorKind, Rk4, StateDerivatives, StepStats,
};
pub use propulsion::{FuelSystem, FuelTank, PistonEngine, Propeller, PropulsionSystem};

//! Numerical integration of the aircraft state.
//!
//! All integrators share `integrate(dynamics, state, derivatives, dt)` and
//! never mutate their inputs; integrators with memory (Adams-Bashforth,
//! the adaptive wrapper) carry it internally.

use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::components::state::AircraftState;
use crate::utils::errors::SimError;
use crate::utils::math;

/// Time derivatives of the aircraft state. Transient: assembled each step
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDerivatives {
    /// Position derivative: velocity in the Earth frame (m/s).
    pub position_dot: Vector3<f64>,
    /// Quaternion derivative.
    pub orientation_dot: Quaternion<f64>,
    /// Body-frame linear acceleration (m/s²).
    pub velocity_dot: Vector3<f64>,
    /// Body-frame angular acceleration (rad/s²).
    pub angular_rate_dot: Vector3<f64>,
    /// Climb rate (m/s).
    pub altitude_dot: f64,
    /// Fuel consumption rate (kg/s, negative burns mass).
    pub mass_dot: f64,
}

impl Default for StateDerivatives {
    fn default() -> Self {
        Self {
            position_dot: Vector3::zeros(),
            orientation_dot: Quaternion::new(0.0, 0.0, 0.0, 0.0),
            velocity_dot: Vector3::zeros(),
            angular_rate_dot: Vector3::zeros(),
            altitude_dot: 0.0,
            mass_dot: 0.0,
        }
    }
}

/// Supplies state derivatives by running the full dynamics pipeline; the
/// dynamics-aware RK4 re-evaluates through this at its interior points.
pub trait Dynamics {
    fn derivatives(&self, state: &AircraftState) -> Result<StateDerivatives, SimError>;
}

/// A dynamics source that freezes the supplied derivatives. Used where no
/// re-evaluation is possible or wanted.
pub struct FrozenDynamics(pub StateDerivatives);

impl Dynamics for FrozenDynamics {
    fn derivatives(&self, _state: &AircraftState) -> Result<StateDerivatives, SimError> {
        Ok(self.0.clone())
    }
}

pub trait Integrator: Send {
    fn name(&self) -> &'static str;
    fn order(&self) -> u32;
    /// Advance the state by dt. `derivatives` is the evaluation at the
    /// current state; `dynamics` allows interior re-evaluation.
    fn integrate(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        dt: f64,
    ) -> AircraftState;
    /// Drop any multi-step memory.
    fn reset(&mut self) {}
}

/// Shared epilogue: recover altitude from the NED down coordinate and
/// refresh everything derived.
fn finish(state: &mut AircraftState, dt: f64) {
    state.time += dt;
    state.altitude = -state.position.z;
    state.update_atmosphere();
    state.update_derived();
}

/// Advance a state along one derivative slope. The orientation advances by
/// the quaternion derivative at the *current* rates, matching the stepping
/// used inside both RK4 forms.
fn advance(state: &AircraftState, derivatives: &StateDerivatives, dt: f64) -> AircraftState {
    let mut next = state.clone();
    next.position += derivatives.position_dot * dt;
    next.velocity += derivatives.velocity_dot * dt;
    next.angular_rate += derivatives.angular_rate_dot * dt;
    next.mass += derivatives.mass_dot * dt;

    let q_dot = math::quaternion_derivative(&state.orientation, &state.angular_rate);
    next.orientation = math::renormalize(&(state.orientation.into_inner() + q_dot * dt));

    finish(&mut next, dt);
    next
}

// ============================================================================
// Euler (order 1)
// ============================================================================

#[derive(Debug, Default)]
pub struct Euler;

impl Integrator for Euler {
    fn name(&self) -> &'static str {
        "Euler"
    }

    fn order(&self) -> u32 {
        1
    }

    fn integrate(
        &mut self,
        _dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        dt: f64,
    ) -> AircraftState {
        advance(state, derivatives, dt)
    }
}

// ============================================================================
// Approximate RK4 (order 4 weights over scaled slopes)
// ============================================================================

/// RK4-weighted combination that scales the k2..k4 slopes by fixed factors
/// (0.95, 0.98, 0.90) instead of re-evaluating the dynamics.
///
/// This is NOT the standard method: it is a stability-friendly fast path
/// kept for parity with runs that cannot afford four dynamics evaluations
/// per step. `DynamicsRk4` is the conforming integrator.
#[derive(Debug, Default)]
pub struct Rk4;

const RK4_APPROX_SCALES: [f64; 3] = [0.95, 0.98, 0.90];

impl Integrator for Rk4 {
    fn name(&self) -> &'static str {
        "Runge-Kutta 4 (approximate)"
    }

    fn order(&self) -> u32 {
        4
    }

    fn integrate(
        &mut self,
        _dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        dt: f64,
    ) -> AircraftState {
        let mut next = state.clone();

        // Position: weighted average of earth-frame velocities along the
        // slope.
        let k1_pos = state.orientation * state.velocity;
        let mid_vel = state.velocity + derivatives.velocity_dot * (dt * 0.5);
        let k23_pos = state.orientation * mid_vel;
        let end_vel = state.velocity + derivatives.velocity_dot * dt;
        let k4_pos = state.orientation * end_vel;
        let avg_pos_dot = (k1_pos + k23_pos * 4.0 + k4_pos) / 6.0;
        next.position += avg_pos_dot * dt;

        // Velocity and angular rate: RK4 weights over the scaled slopes.
        let [s2, s3, s4] = RK4_APPROX_SCALES;
        let weight = (1.0 + 2.0 * s2 + 2.0 * s3 + s4) / 6.0;
        next.velocity += derivatives.velocity_dot * weight * dt;
        next.angular_rate += derivatives.angular_rate_dot * weight * dt;
        next.mass += derivatives.mass_dot * dt;

        // Orientation: four-slope average over advancing rates.
        let k1_q = math::quaternion_derivative(&state.orientation, &state.angular_rate);
        let mid_rate = state.angular_rate + derivatives.angular_rate_dot * (dt * 0.5);
        let mid_q = math::renormalize(&(state.orientation.into_inner() + k1_q * (dt * 0.5)));
        let k2_q = math::quaternion_derivative(&mid_q, &mid_rate);
        let k3_q = k2_q;
        let end_rate = state.angular_rate + derivatives.angular_rate_dot * dt;
        let end_q = math::renormalize(&(state.orientation.into_inner() + k3_q * dt));
        let k4_q = math::quaternion_derivative(&end_q, &end_rate);
        let avg_q_dot = (k1_q + k2_q * 2.0 + k3_q * 2.0 + k4_q) / 6.0;
        next.orientation = math::renormalize(&(state.orientation.into_inner() + avg_q_dot * dt));

        finish(&mut next, dt);
        next
    }
}

// ============================================================================
// Dynamics-aware RK4 (order 4)
// ============================================================================

/// The conforming fourth-order Runge-Kutta: evaluates the full dynamics at
/// k1 (provided), k2 and k3 at half-step advanced states, and k4 at the
/// full step, then combines (k1 + 2k2 + 2k3 + k4)/6. Falls back to the
/// approximate form when an interior evaluation fails.
#[derive(Debug, Default)]
pub struct DynamicsRk4;

impl Integrator for DynamicsRk4 {
    fn name(&self) -> &'static str {
        "Runge-Kutta 4"
    }

    fn order(&self) -> u32 {
        4
    }

    fn integrate(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        dt: f64,
    ) -> AircraftState {
        let k1 = derivatives;

        let mid1 = advance(state, k1, dt * 0.5);
        let k2 = match dynamics.derivatives(&mid1) {
            Ok(d) => d,
            Err(err) => {
                warn!(%err, "k2 evaluation failed, falling back to approximate RK4");
                return Rk4.integrate(dynamics, state, derivatives, dt);
            }
        };

        let mid2 = advance(state, &k2, dt * 0.5);
        let k3 = match dynamics.derivatives(&mid2) {
            Ok(d) => d,
            Err(err) => {
                warn!(%err, "k3 evaluation failed, falling back to approximate RK4");
                return Rk4.integrate(dynamics, state, derivatives, dt);
            }
        };

        let end = advance(state, &k3, dt);
        let k4 = match dynamics.derivatives(&end) {
            Ok(d) => d,
            Err(err) => {
                warn!(%err, "k4 evaluation failed, falling back to approximate RK4");
                return Rk4.integrate(dynamics, state, derivatives, dt);
            }
        };

        let mut next = state.clone();

        let pos_dot = (k1.position_dot + k2.position_dot * 2.0 + k3.position_dot * 2.0
            + k4.position_dot)
            / 6.0;
        next.position += pos_dot * dt;

        let vel_dot = (k1.velocity_dot + k2.velocity_dot * 2.0 + k3.velocity_dot * 2.0
            + k4.velocity_dot)
            / 6.0;
        next.velocity += vel_dot * dt;

        let rate_dot = (k1.angular_rate_dot + k2.angular_rate_dot * 2.0
            + k3.angular_rate_dot * 2.0
            + k4.angular_rate_dot)
            / 6.0;
        next.angular_rate += rate_dot * dt;

        let mass_dot = (k1.mass_dot + 2.0 * k2.mass_dot + 2.0 * k3.mass_dot + k4.mass_dot) / 6.0;
        next.mass += mass_dot * dt;

        // Orientation slopes at the same four points.
        let k1_q = math::quaternion_derivative(&state.orientation, &state.angular_rate);
        let k2_q = math::quaternion_derivative(&mid1.orientation, &mid1.angular_rate);
        let k3_q = math::quaternion_derivative(&mid2.orientation, &mid2.angular_rate);
        let k4_q = math::quaternion_derivative(&end.orientation, &end.angular_rate);
        let avg_q_dot = (k1_q + k2_q * 2.0 + k3_q * 2.0 + k4_q) / 6.0;
        next.orientation = math::renormalize(&(state.orientation.into_inner() + avg_q_dot * dt));

        finish(&mut next, dt);
        next
    }
}

// ============================================================================
// Adams-Bashforth 2 (order 2)
// ============================================================================

/// Two-step Adams-Bashforth: the first step falls back to Euler, after
/// which y_{n+1} = y_n + dt/2 · (3 f_n − f_{n−1}).
#[derive(Default)]
pub struct AdamsBashforth2 {
    previous: Option<StateDerivatives>,
}

impl Integrator for AdamsBashforth2 {
    fn name(&self) -> &'static str {
        "Adams-Bashforth 2"
    }

    fn order(&self) -> u32 {
        2
    }

    fn integrate(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        dt: f64,
    ) -> AircraftState {
        let Some(previous) = self.previous.take() else {
            self.previous = Some(derivatives.clone());
            return Euler.integrate(dynamics, state, derivatives, dt);
        };

        let mut next = state.clone();

        next.position +=
            (derivatives.position_dot * 1.5 - previous.position_dot * 0.5) * dt;
        next.velocity +=
            (derivatives.velocity_dot * 1.5 - previous.velocity_dot * 0.5) * dt;
        next.angular_rate +=
            (derivatives.angular_rate_dot * 1.5 - previous.angular_rate_dot * 0.5) * dt;
        next.mass += (derivatives.mass_dot * 1.5 - previous.mass_dot * 0.5) * dt;

        let q_dot = math::quaternion_derivative(&state.orientation, &next.angular_rate);
        next.orientation = math::renormalize(&(state.orientation.into_inner() + q_dot * dt));

        finish(&mut next, dt);
        self.previous = Some(derivatives.clone());
        next
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

// ============================================================================
// Adaptive step-size wrapper
// ============================================================================

/// Step acceptance statistics for the adaptive wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepStats {
    pub total_steps: u64,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
    pub min_step: f64,
    pub max_step: f64,
    pub cumulative_error: f64,
}

impl Default for StepStats {
    fn default() -> Self {
        Self {
            total_steps: 0,
            accepted_steps: 0,
            rejected_steps: 0,
            min_step: f64::INFINITY,
            max_step: 0.0,
            cumulative_error: 0.0,
        }
    }
}

impl StepStats {
    fn record(&mut self, dt: f64, accepted: bool, error: f64) {
        self.total_steps += 1;
        if accepted {
            self.accepted_steps += 1;
            self.min_step = self.min_step.min(dt);
            self.max_step = self.max_step.max(dt);
        } else {
            self.rejected_steps += 1;
        }
        self.cumulative_error += error;
    }
}

/// Adaptive step sizing around a base integrator. Error is estimated by
/// comparing one step of dt against two steps of dt/2 on the position and
/// velocity norms; rejected steps halve dt, bottoming out at `min_dt`.
pub struct AdaptiveStep {
    base: Box<dyn Integrator>,
    pub min_dt: f64,
    pub max_dt: f64,
    pub tolerance: f64,
    pub safety_factor: f64,
    pub stats: StepStats,
}

impl AdaptiveStep {
    pub fn new(base: Box<dyn Integrator>) -> Self {
        Self {
            base,
            min_dt: 1e-6,
            max_dt: 0.1,
            tolerance: 1e-3,
            safety_factor: 0.9,
            stats: StepStats::default(),
        }
    }

    fn estimate_error(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        dt: f64,
    ) -> f64 {
        let full = self.base.integrate(dynamics, state, derivatives, dt);
        let half1 = self.base.integrate(dynamics, state, derivatives, dt * 0.5);
        let half_derivs = dynamics
            .derivatives(&half1)
            .unwrap_or_else(|_| derivatives.clone());
        let half2 = self.base.integrate(dynamics, &half1, &half_derivs, dt * 0.5);

        let pos_error = (full.position - half2.position).norm();
        let vel_error = (full.velocity - half2.velocity).norm();
        pos_error.max(vel_error)
    }

    /// Take one accepted step. Returns the new state and the proposed next
    /// step size.
    pub fn integrate_adaptive(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        target_dt: f64,
    ) -> (AircraftState, f64) {
        let mut dt = target_dt.clamp(self.min_dt, self.max_dt);

        loop {
            let error = self.estimate_error(dynamics, state, derivatives, dt);

            if error <= self.tolerance {
                let next = self.base.integrate(dynamics, state, derivatives, dt);
                self.stats.record(dt, true, error);
                let proposed = if error > 0.0 {
                    let growth = self.safety_factor
                        * (self.tolerance / error).powf(1.0 / f64::from(self.base.order()));
                    (dt * growth).clamp(self.min_dt, self.max_dt)
                } else {
                    dt
                };
                return (next, proposed);
            }

            self.stats.record(dt, false, error);
            dt *= 0.5;
            if dt < self.min_dt {
                // Bottom out: accept whatever the error is at min_dt.
                let next = self.base.integrate(dynamics, state, derivatives, self.min_dt);
                self.stats.record(self.min_dt, true, error);
                return (next, self.min_dt);
            }
        }
    }
}

impl Integrator for AdaptiveStep {
    fn name(&self) -> &'static str {
        "Adaptive"
    }

    fn order(&self) -> u32 {
        self.base.order()
    }

    fn integrate(
        &mut self,
        dynamics: &dyn Dynamics,
        state: &AircraftState,
        derivatives: &StateDerivatives,
        dt: f64,
    ) -> AircraftState {
        self.integrate_adaptive(dynamics, state, derivatives, dt).0
    }

    fn reset(&mut self) {
        self.base.reset();
        self.stats = StepStats::default();
    }
}

/// Selection of integrator for engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorKind {
    Euler,
    /// The documented approximate fast path.
    Rk4Approximate,
    /// The conforming dynamics-aware RK4.
    Rk4,
    AdamsBashforth2,
    /// Adaptive wrapper around the dynamics-aware RK4.
    Adaptive,
}

impl IntegratorKind {
    pub fn build(self) -> Box<dyn Integrator> {
        match self {
            IntegratorKind::Euler => Box::new(Euler),
            IntegratorKind::Rk4Approximate => Box::new(Rk4),
            IntegratorKind::Rk4 => Box::new(DynamicsRk4),
            IntegratorKind::AdamsBashforth2 => Box::new(AdamsBashforth2::default()),
            IntegratorKind::Adaptive => Box::new(AdaptiveStep::new(Box::new(DynamicsRk4))),
        }
    }
}

//! Body-frame force and moment assembly.
//!
//! The aerodynamic axes are evaluated as configured expression sums against
//! the property store: LIFT/DRAG/SIDE in the description's native pounds,
//! ROLL/PITCH/YAW as moment coefficients scaled by dynamic pressure and the
//! reference geometry. Gravity arrives through the inverse attitude
//! rotation, thrust through the engine-mount projection.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::components::state::AircraftState;
use crate::config::model::FdmConfig;
use crate::properties::PropertyStore;
use crate::systems::integrator::StateDerivatives;
use crate::utils::constants::*;
use crate::utils::math;

/// Reference geometry, SI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    pub wing_area: f64,
    pub wing_span: f64,
    pub chord: f64,
}

/// One step's force/moment breakdown in the body frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForceMomentSet {
    /// Aerodynamic force: x = −drag, y = side, z = −lift (N).
    pub aerodynamic: Vector3<f64>,
    /// Thrust through the engine mount (N).
    pub propulsive: Vector3<f64>,
    /// Weight in the body frame (N).
    pub gravity: Vector3<f64>,
    /// Aerodynamic moments from the coefficient axes (N·m).
    pub moments: Vector3<f64>,
    /// Propulsion moments: thrust offset from the mount, propeller torque,
    /// p-factor and slipstream (N·m).
    pub propulsive_moments: Vector3<f64>,
    pub total_force: Vector3<f64>,
    pub total_moment: Vector3<f64>,
}

/// Evaluates configured aerodynamics into forces, moments, and state
/// derivatives.
pub struct ForcesMoments {
    config: Arc<FdmConfig>,
    /// Initial (empty) mass, kg.
    pub mass: f64,
    /// Principal-axis inertia diagonal, kg·m².
    pub inertia: Vector3<f64>,
    pub reference: ReferenceData,
}

impl ForcesMoments {
    pub fn new(config: Arc<FdmConfig>) -> Self {
        let mut reference = ReferenceData::default();
        if let Some(metrics) = &config.metrics {
            reference.wing_area = metrics.wing_area.unwrap_or(0.0);
            reference.wing_span = metrics.wing_span.unwrap_or(0.0);
            reference.chord = metrics.chord.unwrap_or(0.0);
        }

        let mass = config
            .mass_balance
            .as_ref()
            .and_then(|mb| mb.empty_mass)
            .unwrap_or(0.0);

        // Configured principal inertias when present; the slab formula as a
        // fallback.
        let fallback = Vector3::new(
            mass * reference.wing_span * reference.wing_span / 12.0,
            mass * reference.chord * reference.chord / 12.0,
            mass * (reference.wing_span * reference.wing_span + reference.chord * reference.chord)
                / 12.0,
        );
        let inertia = config
            .mass_balance
            .as_ref()
            .map(|mb| {
                Vector3::new(
                    mb.ixx.unwrap_or(fallback.x),
                    mb.iyy.unwrap_or(fallback.y),
                    mb.izz.unwrap_or(fallback.z),
                )
            })
            .unwrap_or(fallback);

        Self {
            config,
            mass,
            inertia,
            reference,
        }
    }

    /// Sum the functions attached to one aerodynamic axis. A failing
    /// function contributes 0.
    fn axis_sum(&self, axis_name: &str, store: &PropertyStore) -> f64 {
        let Some(aero) = &self.config.aerodynamics else {
            return 0.0;
        };
        let Some(axis) = aero.axis(axis_name) else {
            return 0.0;
        };
        let mut sum = 0.0;
        for function in &axis.functions {
            match function.evaluate(store) {
                Ok(value) => sum += value,
                Err(err) => {
                    warn!(axis = axis_name, function = %function.name, %err,
                        "axis function failed, contributing 0");
                }
            }
        }
        sum
    }

    /// Assemble the full force/moment breakdown for the current state.
    /// `thrust` is the body-frame propulsive force; `propulsion_moments`
    /// carries the thrust-offset, propeller-torque, and p-factor terms and
    /// is summed into the moment total alongside the coefficient axes.
    pub fn compute(
        &self,
        state: &AircraftState,
        store: &PropertyStore,
        thrust: Vector3<f64>,
        propulsion_moments: Vector3<f64>,
    ) -> ForceMomentSet {
        let mut set = ForceMomentSet::default();

        // Force axes return pounds.
        let lift_lb = self.axis_sum("LIFT", store);
        let drag_lb = self.axis_sum("DRAG", store);
        let side_lb = self.axis_sum("SIDE", store);
        set.aerodynamic = Vector3::new(
            -drag_lb * LB_TO_N,
            side_lb * LB_TO_N,
            -lift_lb * LB_TO_N,
        );

        // Moment axes return coefficients.
        let q_s = state.dynamic_pressure * self.reference.wing_area;
        let roll_coeff = self.axis_sum("ROLL", store);
        let pitch_coeff = self.axis_sum("PITCH", store);
        let yaw_coeff = self.axis_sum("YAW", store);
        set.moments = Vector3::new(
            roll_coeff * q_s * self.reference.wing_span,
            pitch_coeff * q_s * self.reference.chord,
            yaw_coeff * q_s * self.reference.wing_span,
        );
        set.propulsive_moments = propulsion_moments;

        set.propulsive = thrust;

        let weight_ned = Vector3::new(0.0, 0.0, state.mass * 9.81);
        set.gravity = state.orientation.inverse_transform_vector(&weight_ned);

        set.total_force = set.aerodynamic + set.propulsive + set.gravity;
        set.total_moment = set.moments + set.propulsive_moments;
        set
    }

    /// Assemble state derivatives from a computed force/moment set.
    /// `fuel_flow_kg_s` drains mass.
    pub fn derivatives(
        &self,
        state: &AircraftState,
        set: &ForceMomentSet,
        fuel_flow_kg_s: f64,
    ) -> StateDerivatives {
        let mass = if state.mass > 0.0 { state.mass } else { self.mass };
        let earth_velocity = state.orientation * state.velocity;

        StateDerivatives {
            position_dot: earth_velocity,
            orientation_dot: math::quaternion_derivative(&state.orientation, &state.angular_rate),
            velocity_dot: set.total_force / mass,
            angular_rate_dot: Vector3::new(
                set.total_moment.x / self.inertia.x,
                set.total_moment.y / self.inertia.y,
                set.total_moment.z / self.inertia.z,
            ),
            altitude_dot: -earth_velocity.z,
            mass_dot: -fuel_flow_kg_s,
        }
    }
}

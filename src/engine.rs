//! Top-level flight dynamics engine: composes the property store, flight
//! control system, propulsion stage, forces-and-moments assembly, and the
//! integrator behind a synchronous stepping API.

use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::components::state::{AircraftState, ControlInputs};
use crate::config::model::FdmConfig;
use crate::fcs::{FlightControlSystem, RateGroupStats};
use crate::properties::PropertyStore;
use crate::systems::forces::ForcesMoments;
use crate::systems::integrator::{Dynamics, Integrator, IntegratorKind, StateDerivatives};
use crate::systems::propulsion::PropulsionSystem;
use crate::utils::constants::*;
use crate::utils::errors::SimError;
use crate::utils::math;

/// Peak-holding flight metrics accumulated across steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightStatistics {
    pub max_load_factor: f64,
    pub max_climb_rate: f64,
    pub max_speed: f64,
    pub max_altitude: f64,
    /// Fuel burned (kg).
    pub total_fuel_burned: f64,
    pub flight_time: f64,
}

/// Resolved control-surface positions, radians.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SurfacePositions {
    pub elevator: f64,
    pub left_aileron: f64,
    pub right_aileron: f64,
    pub rudder: f64,
}

/// Dynamics evaluation over the engine's calculator and a scratch copy of
/// the propulsion stage, used by the dynamics-aware RK4 at interior points.
struct EngineDynamics<'a> {
    calculator: &'a ForcesMoments,
    store: &'a PropertyStore,
    propulsion: &'a PropulsionSystem,
    realistic_propulsion: bool,
}

impl Dynamics for EngineDynamics<'_> {
    fn derivatives(&self, state: &AircraftState) -> Result<StateDerivatives, SimError> {
        // Interior evaluations work on a clone so repeated k-points do not
        // corrupt the live engine/fuel state.
        let mut propulsion = self.propulsion.clone();
        propulsion.update(state.controls.throttle, 0.01);

        state.project_into(self.store);
        propulsion.project_into(self.store);

        let (thrust, propulsion_moments) = if self.realistic_propulsion {
            let thrust = propulsion.thrust_vector();
            let moments = propulsion.moments_about_cg(thrust, state.alpha);
            (thrust, moments)
        } else {
            (Vector3::new(propulsion.thrust_n(), 0.0, 0.0), Vector3::zeros())
        };

        let set = self
            .calculator
            .compute(state, self.store, thrust, propulsion_moments);
        Ok(self
            .calculator
            .derivatives(state, &set, propulsion.fuel_flow_kg_s()))
    }
}

/// The simulation engine. Owns the property store and all subsystems;
/// multiple engines coexist independently within a process.
pub struct FlightDynamicsEngine {
    config: Arc<FdmConfig>,
    properties: Arc<PropertyStore>,
    calculator: ForcesMoments,
    fcs: FlightControlSystem,
    propulsion: PropulsionSystem,
    integrator: Box<dyn Integrator>,
    realistic_propulsion: bool,
    pub statistics: FlightStatistics,
    /// Count of non-finite values clamped during stepping.
    pub anomaly_count: u64,
}

impl FlightDynamicsEngine {
    /// Build an engine from a parsed configuration.
    ///
    /// `realistic_fcs` selects actuator dynamics (from the configuration's
    /// flight_control section when it declares channels, the standard
    /// fighter setup otherwise) over direct command pass-through.
    /// `realistic_propulsion` applies engine-mount thrust offsets and
    /// propeller torque; the simplified path applies thrust purely along
    /// body X.
    pub fn new(
        config: FdmConfig,
        integrator: IntegratorKind,
        realistic_fcs: bool,
        realistic_propulsion: bool,
    ) -> Self {
        let config = Arc::new(config);
        let properties = Arc::new(PropertyStore::new());

        let calculator = ForcesMoments::new(Arc::clone(&config));

        let fcs = if realistic_fcs {
            match &config.flight_control {
                Some(def) if def.channels.iter().any(|c| !c.components.is_empty()) => {
                    FlightControlSystem::from_config(def, 120.0, Arc::clone(&properties))
                }
                _ => FlightControlSystem::standard_p51d(Arc::clone(&properties)),
            }
        } else {
            FlightControlSystem::passthrough(Arc::clone(&properties))
        };

        let propulsion = config
            .propulsion
            .as_ref()
            .map(PropulsionSystem::from_config)
            .unwrap_or_default();

        // Reference geometry properties the aerodynamic functions refer to.
        if let Some(metrics) = &config.metrics {
            if let Some(area) = metrics.wing_area {
                properties.set("metrics/Sw-sqft", area * M2_TO_FT2);
            }
            if let Some(span) = metrics.wing_span {
                properties.set("metrics/bw-ft", span * M_TO_FT);
            }
            if let Some(chord) = metrics.chord {
                properties.set("metrics/cbarw-ft", chord * M_TO_FT);
            }
        }

        debug!(
            aircraft = %config.name,
            integrator = ?integrator,
            realistic_fcs,
            realistic_propulsion,
            "engine constructed"
        );

        Self {
            config,
            properties,
            calculator,
            fcs,
            propulsion,
            integrator: integrator.build(),
            realistic_propulsion,
            statistics: FlightStatistics::default(),
            anomaly_count: 0,
        }
    }

    /// Parse a configuration and build an engine in one call.
    pub fn from_xml(
        xml: &str,
        integrator: IntegratorKind,
        realistic_fcs: bool,
        realistic_propulsion: bool,
    ) -> Result<Self, SimError> {
        let config = crate::config::parse_config(xml)?;
        Ok(Self::new(config, integrator, realistic_fcs, realistic_propulsion))
    }

    pub fn config(&self) -> &FdmConfig {
        &self.config
    }

    pub fn properties(&self) -> &Arc<PropertyStore> {
        &self.properties
    }

    pub fn propulsion(&self) -> &PropulsionSystem {
        &self.propulsion
    }

    /// A state seeded with the configured mass, level at 1000 m.
    pub fn initial_state(&self) -> AircraftState {
        let mut state = AircraftState::default();
        state.mass = self.calculator.mass;
        state
    }

    /// Write pilot inputs into both the state aggregate and the canonical
    /// command properties.
    pub fn set_controls(&self, state: &mut AircraftState, controls: ControlInputs) {
        state.set_controls(controls);
        self.properties.set("fcs/aileron-cmd-norm", controls.aileron);
        self.properties.set("fcs/elevator-cmd-norm", controls.elevator);
        self.properties.set("fcs/rudder-cmd-norm", controls.rudder);
        self.properties.set("fcs/throttle-cmd-norm", controls.throttle);
        self.properties.set("fcs/flap-cmd-norm", controls.flaps);
    }

    /// Advance one step. On success returns the new state and the step's
    /// derivatives; on failure the caller's state is untouched and remains
    /// the last known good state.
    pub fn step(
        &mut self,
        state: &AircraftState,
        dt: f64,
    ) -> Result<(AircraftState, StateDerivatives), SimError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::State(format!("invalid step size {dt}")));
        }

        let mut work = state.clone();
        if work.mass <= 0.0 {
            work.mass = self.calculator.mass;
        }

        // Propulsion first: throttle dynamics, thrust, fuel draw. The
        // moment bundle carries the thrust-offset couple, the propeller
        // torque, and the p-factor/slipstream terms.
        self.propulsion.update(work.controls.throttle, dt);
        self.propulsion.project_into(&self.properties);
        let (thrust, propulsion_moments) = if self.realistic_propulsion {
            let thrust = self.propulsion.thrust_vector();
            let moments = self.propulsion.moments_about_cg(thrust, work.alpha);
            (thrust, moments)
        } else {
            (
                Vector3::new(self.propulsion.thrust_n(), 0.0, 0.0),
                Vector3::zeros(),
            )
        };

        // Slipstream-augmented dynamic pressure and power loading for aero
        // consumers.
        let induced_ms = self.propulsion.propeller.induced_velocity_fps * FPS_TO_MS;
        if induced_ms > 0.0 {
            let qbar = 0.5 * work.density * work.velocity.norm_squared();
            let prop_qbar = 0.5 * work.density * induced_ms * induced_ms;
            self.properties
                .set("aero/thrust-qbar_psf", (qbar + prop_qbar) * PA_TO_PSF);
        }
        if self.propulsion.propeller.thrust_lb > 0.0 {
            self.properties.set(
                "propulsion/power-loading",
                work.mass * GRAVITY / self.propulsion.thrust_n(),
            );
        }

        work.engine.running = self.propulsion.engine.is_running;
        work.engine.rpm = self.propulsion.engine.rpm;
        work.engine.manifold_pressure = self.propulsion.engine.manifold_pressure;
        work.engine.thrust = self.propulsion.thrust_n();
        work.engine.fuel_flow = self.propulsion.fuel.fuel_flow_pph;

        // FCS: pilot commands through the component graph to surfaces.
        self.fcs.execute(&mut work, dt);

        // State projection feeds the aerodynamic functions.
        work.project_into(&self.properties);

        let set = self
            .calculator
            .compute(&work, &self.properties, thrust, propulsion_moments);
        let derivatives = self
            .calculator
            .derivatives(&work, &set, self.propulsion.fuel_flow_kg_s());

        let dynamics = EngineDynamics {
            calculator: &self.calculator,
            store: &self.properties,
            propulsion: &self.propulsion,
            realistic_propulsion: self.realistic_propulsion,
        };
        let mut next = self
            .integrator
            .integrate(&dynamics, &work, &derivatives, dt);

        self.sanitize(&mut next, &work)?;

        // Record the step's force/moment breakdown.
        next.forces.aerodynamic = set.aerodynamic;
        next.forces.propulsive = set.propulsive;
        next.forces.gravity = set.gravity;
        next.forces.total = set.total_force;
        next.moments.aerodynamic = set.moments;
        next.moments.propulsive = set.propulsive_moments;
        next.moments.total = set.total_moment;
        next.acceleration = derivatives.velocity_dot;
        next.angular_accel = derivatives.angular_rate_dot;

        next.engine = work.engine;

        self.update_statistics(&next, dt);

        // Leave the store reflecting the advanced state.
        next.project_into(&self.properties);

        Ok((next, derivatives))
    }

    /// Reset non-finite state fields to the last known good value. Fails
    /// only if the previous state was itself unusable.
    fn sanitize(&mut self, next: &mut AircraftState, previous: &AircraftState) -> Result<(), SimError> {
        let mut clamped = 0u64;

        for i in 0..3 {
            if !next.position[i].is_finite() {
                next.position[i] = previous.position[i];
                clamped += 1;
            }
            if !next.velocity[i].is_finite() {
                next.velocity[i] = previous.velocity[i];
                clamped += 1;
            }
            if !next.angular_rate[i].is_finite() {
                next.angular_rate[i] = previous.angular_rate[i];
                clamped += 1;
            }
        }
        if !next.mass.is_finite() || next.mass <= 0.0 {
            next.mass = previous.mass;
            clamped += 1;
        }

        let quat = next.orientation.into_inner();
        if !quat.norm().is_finite() {
            next.orientation = previous.orientation;
            clamped += 1;
        } else {
            next.orientation = math::renormalize(&quat);
        }

        if clamped > 0 {
            warn!(clamped, "non-finite state fields reset to previous values");
            self.anomaly_count += clamped;
            next.altitude = -next.position.z;
            next.update_atmosphere();
            next.update_derived();
        }

        if next.is_finite() {
            Ok(())
        } else {
            Err(SimError::State(
                "state unrecoverable after numeric anomaly".to_string(),
            ))
        }
    }

    fn update_statistics(&mut self, state: &AircraftState, dt: f64) {
        let stats = &mut self.statistics;

        let load_factor = state.forces.total.norm() / (state.mass * 9.81).max(1e-9);
        stats.max_load_factor = stats.max_load_factor.max(load_factor);

        let climb_rate = -(state.orientation * state.velocity).z;
        stats.max_climb_rate = stats.max_climb_rate.max(climb_rate.abs());

        stats.max_speed = stats.max_speed.max(state.true_airspeed);
        stats.max_altitude = stats.max_altitude.max(state.altitude);

        stats.total_fuel_burned += self.propulsion.fuel_flow_kg_s() * dt;
        stats.flight_time += dt;
    }

    // ========================================================================
    // Auxiliary queries
    // ========================================================================

    /// Current thrust divided by current weight.
    pub fn thrust_to_weight_ratio(&self, state: &AircraftState) -> f64 {
        let weight = state.mass * GRAVITY;
        if weight > 0.0 {
            self.propulsion.thrust_n() / weight
        } else {
            0.0
        }
    }

    /// Remaining fuel as (pounds, percent of capacity).
    pub fn fuel_remaining(&self) -> (f64, f64) {
        let remaining = self.propulsion.fuel.total_contents_lb;
        let capacity = self.propulsion.fuel.total_capacity_lb;
        let percent = if capacity > 0.0 {
            remaining / capacity * 100.0
        } else {
            0.0
        };
        (remaining, percent)
    }

    /// Resolved surface positions out of the FCS.
    pub fn control_surface_positions(&self) -> SurfacePositions {
        SurfacePositions {
            elevator: self.properties.get("fcs/elevator-pos-rad"),
            left_aileron: self.properties.get("fcs/left-aileron-pos-rad"),
            right_aileron: self.properties.get("fcs/right-aileron-pos-rad"),
            rudder: self.properties.get("fcs/rudder-pos-rad"),
        }
    }

    /// Rate-group execution statistics.
    pub fn rate_group_stats(&self) -> Vec<RateGroupStats> {
        self.fcs.stats()
    }

    /// Lift/drag polar sweep at the given flight condition.
    pub fn alpha_sweep(
        &self,
        altitude: f64,
        speed: f64,
        alpha_start: f64,
        alpha_end: f64,
        steps: usize,
    ) -> crate::systems::analysis::AlphaSweep {
        crate::systems::analysis::alpha_sweep(
            &self.calculator,
            &self.properties,
            altitude,
            speed,
            alpha_start,
            alpha_end,
            steps,
        )
    }

    /// Excess-power climb performance across test altitudes.
    pub fn performance_envelope(
        &self,
        altitudes: &[f64],
        speed: f64,
    ) -> crate::systems::analysis::PerformanceEnvelope {
        crate::systems::analysis::performance_envelope(
            &self.calculator,
            &self.properties,
            &self.propulsion,
            altitudes,
            speed,
        )
    }

    /// Solve for steady level flight at the given condition.
    pub fn find_level_trim(
        &self,
        altitude: f64,
        speed: f64,
    ) -> crate::systems::analysis::TrimResult {
        crate::systems::analysis::find_level_trim(
            &self.calculator,
            &self.properties,
            &self.propulsion,
            altitude,
            speed,
        )
    }

    /// Reset the FCS graph, multi-step integrator memory, and statistics.
    pub fn reset(&mut self) {
        self.fcs.reset();
        self.integrator.reset();
        self.statistics = FlightStatistics::default();
        self.anomaly_count = 0;
    }
}

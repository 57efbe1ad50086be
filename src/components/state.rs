//! The aircraft state vector and its property-map projection.
//!
//! The state is the sole mutable object advanced by the integrator; derived
//! parameters, the atmosphere, and the property projection are recomputed
//! from it after every step.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::components::atmosphere::Atmosphere;
use crate::properties::PropertyStore;
use crate::utils::constants::*;
use crate::utils::math;

/// Pilot control inputs. Aileron/elevator/rudder are normalized to
/// [-1, +1]; throttle, flaps, brake, mixture, propeller to [0, 1].
/// Out-of-range values are not rejected here; actuator rate limiting tames
/// step changes downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControlInputs {
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
    pub throttle: f64,
    pub flaps: f64,
    pub gear: bool,
    pub brake: f64,
    pub mixture: f64,
    pub propeller: f64,
}

impl Default for ControlInputs {
    fn default() -> Self {
        Self {
            aileron: 0.0,
            elevator: 0.0,
            rudder: 0.0,
            throttle: 0.0,
            flaps: 0.0,
            gear: true,
            brake: 0.0,
            mixture: 0.8,
            propeller: 1.0,
        }
    }
}

/// Trim tab settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TrimSettings {
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
}

/// Resolved control surface positions (radians), downstream of the FCS.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ControlSurfaces {
    pub aileron_left: f64,
    pub aileron_right: f64,
    pub elevator: f64,
    pub rudder: f64,
    pub flap_left: f64,
    pub flap_right: f64,
    pub trim: TrimSettings,
}

/// Engine snapshot mirrored from the propulsion stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineState {
    pub running: bool,
    pub rpm: f64,
    /// Manifold pressure (inHg).
    pub manifold_pressure: f64,
    /// Fuel flow (lb/h).
    pub fuel_flow: f64,
    /// Thrust (N).
    pub thrust: f64,
    // Placeholder gauges, carried for instrument consumers.
    pub egt: f64,
    pub cht: f64,
    pub oil_temp: f64,
    pub oil_pressure: f64,
}

/// Landing gear snapshot. Contact mechanics are a placeholder; the signals
/// exist for consumers of the state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GearState {
    pub down: bool,
    /// Transition fraction, 0 = up, 1 = down.
    pub transition: f64,
    pub on_ground: bool,
    pub ground_height: f64,
    pub main_compression: f64,
    pub nose_compression: f64,
}

impl Default for GearState {
    fn default() -> Self {
        Self {
            down: true,
            transition: 1.0,
            on_ground: false,
            ground_height: 0.0,
            main_compression: 0.0,
            nose_compression: 0.0,
        }
    }
}

/// Most recent body-frame forces, broken down by contributor (N).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ForceBreakdown {
    pub aerodynamic: Vector3<f64>,
    pub propulsive: Vector3<f64>,
    pub gravity: Vector3<f64>,
    pub total: Vector3<f64>,
}

/// Most recent body-frame moments, broken down by contributor (N·m).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MomentBreakdown {
    pub aerodynamic: Vector3<f64>,
    pub propulsive: Vector3<f64>,
    pub gyroscopic: Vector3<f64>,
    pub total: Vector3<f64>,
}

/// Complete aircraft state at one instant. SI units, radians, NED frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftState {
    /// Simulation time (s).
    pub time: f64,

    /// NED position (m).
    pub position: Vector3<f64>,
    /// Latitude (rad), informational over the flat NED frame.
    pub latitude: f64,
    /// Longitude (rad), informational.
    pub longitude: f64,
    /// Altitude above sea level (m).
    pub altitude: f64,

    /// Body-to-NED orientation.
    pub orientation: UnitQuaternion<f64>,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,

    /// Body-frame linear velocity u, v, w (m/s).
    pub velocity: Vector3<f64>,
    /// Body-frame linear acceleration (m/s²).
    pub acceleration: Vector3<f64>,
    /// Body-frame angular rate p, q, r (rad/s).
    pub angular_rate: Vector3<f64>,
    /// Body-frame angular acceleration (rad/s²).
    pub angular_accel: Vector3<f64>,

    /// Current mass (kg), decremented by fuel burn.
    pub mass: f64,

    // Derived flight parameters
    pub alpha: f64,
    pub beta: f64,
    pub mach: f64,
    pub true_airspeed: f64,
    pub indicated_airspeed: f64,
    pub calibrated_airspeed: f64,
    pub ground_speed: f64,

    // Atmosphere at current altitude
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub sound_speed: f64,
    pub dynamic_pressure: f64,

    pub controls: ControlInputs,
    pub control_surfaces: ControlSurfaces,
    pub engine: EngineState,
    pub gear: GearState,
    pub forces: ForceBreakdown,
    pub moments: MomentBreakdown,
}

impl Default for AircraftState {
    fn default() -> Self {
        let mut state = Self {
            time: 0.0,
            position: Vector3::zeros(),
            latitude: 0.0,
            longitude: 0.0,
            altitude: 1000.0,
            orientation: UnitQuaternion::identity(),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            velocity: Vector3::new(50.0, 0.0, 0.0),
            acceleration: Vector3::zeros(),
            angular_rate: Vector3::zeros(),
            angular_accel: Vector3::zeros(),
            mass: 0.0,
            alpha: 0.0,
            beta: 0.0,
            mach: 0.0,
            true_airspeed: 0.0,
            indicated_airspeed: 0.0,
            calibrated_airspeed: 0.0,
            ground_speed: 0.0,
            temperature: 0.0,
            pressure: 0.0,
            density: 0.0,
            sound_speed: 0.0,
            dynamic_pressure: 0.0,
            controls: ControlInputs::default(),
            control_surfaces: ControlSurfaces::default(),
            engine: EngineState::default(),
            gear: GearState::default(),
            forces: ForceBreakdown::default(),
            moments: MomentBreakdown::default(),
        };
        state.position.z = -state.altitude;
        state.update_atmosphere();
        state.update_derived();
        state
    }
}

impl AircraftState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the aircraft at altitude (m) with a body-frame velocity, level
    /// attitude.
    pub fn at_condition(altitude: f64, velocity: Vector3<f64>) -> Self {
        let mut state = Self {
            altitude,
            velocity,
            ..Self::default()
        };
        state.position = Vector3::new(0.0, 0.0, -altitude);
        state.update_atmosphere();
        state.update_derived();
        state
    }

    /// Refresh ambient conditions from the ISA model at the current
    /// altitude.
    pub fn update_atmosphere(&mut self) {
        let atm = Atmosphere::at_altitude(self.altitude);
        self.temperature = atm.temperature;
        self.pressure = atm.pressure;
        self.density = atm.density;
        self.sound_speed = atm.sound_speed;
        self.dynamic_pressure = 0.5 * self.density * self.true_airspeed * self.true_airspeed;
    }

    /// Recompute every derived parameter from the primary state.
    pub fn update_derived(&mut self) {
        let (roll, pitch, yaw) = math::euler_from_quaternion(&self.orientation);
        self.roll = roll;
        self.pitch = pitch;
        self.yaw = yaw;

        self.true_airspeed = self.velocity.norm();
        self.indicated_airspeed =
            self.true_airspeed * (self.density / ISA_SEA_LEVEL_DENSITY).sqrt();
        self.calibrated_airspeed = self.indicated_airspeed;

        self.mach = if self.sound_speed > 0.0 {
            self.true_airspeed / self.sound_speed
        } else {
            0.0
        };

        self.alpha = if self.velocity.x != 0.0 || self.velocity.z != 0.0 {
            (-self.velocity.z).atan2(self.velocity.x)
        } else {
            0.0
        };
        self.beta = if self.true_airspeed > 0.0 {
            (self.velocity.y / self.true_airspeed).asin()
        } else {
            0.0
        };

        self.ground_speed =
            Vector3::new(self.velocity.x, self.velocity.y, 0.0).norm();

        self.dynamic_pressure = 0.5 * self.density * self.true_airspeed * self.true_airspeed;
    }

    /// Update only pilot inputs; gear transition tracks the command
    /// directly (gear is not routed through the FCS).
    pub fn set_controls(&mut self, controls: ControlInputs) {
        self.controls = controls;
        self.gear.down = controls.gear;
        self.gear.transition = if controls.gear { 1.0 } else { 0.0 };
    }

    /// Write the state's property projection into the store. Every name an
    /// aerodynamic function may reference is covered, attitude and flow
    /// angles included.
    pub fn project_into(&self, store: &PropertyStore) {
        // Position and attitude
        store.set("position/latitude-rad", self.latitude);
        store.set("position/longitude-rad", self.longitude);
        store.set("position/h-sl-m", self.altitude);
        store.set("position/h-sl-ft", self.altitude * M_TO_FT);
        store.set("position/h-agl-m", self.altitude - self.gear.ground_height);
        store.set("attitude/roll-rad", self.roll);
        store.set("attitude/pitch-rad", self.pitch);
        store.set("attitude/heading-rad", self.yaw);
        store.set("attitude/phi-rad", self.roll);
        store.set("attitude/theta-rad", self.pitch);
        store.set("attitude/psi-rad", self.yaw);

        // Velocities and rates
        store.set("velocities/u-mps", self.velocity.x);
        store.set("velocities/v-mps", self.velocity.y);
        store.set("velocities/w-mps", self.velocity.z);
        store.set("velocities/p-rad_sec", self.angular_rate.x);
        store.set("velocities/q-rad_sec", self.angular_rate.y);
        store.set("velocities/r-rad_sec", self.angular_rate.z);
        store.set("velocities/vt-mps", self.true_airspeed);
        store.set("velocities/vt-fps", self.true_airspeed * MS_TO_FPS);
        store.set("velocities/vc-mps", self.calibrated_airspeed);
        store.set("velocities/vc-kts", self.calibrated_airspeed * MS_TO_KT);
        store.set("velocities/vi-mps", self.indicated_airspeed);
        store.set("velocities/mach", self.mach);

        // Flow angles and dynamic pressure
        store.set("aero/alpha-rad", self.alpha);
        store.set("aero/beta-rad", self.beta);
        store.set("aero/alpha-deg", math::rad_to_deg(self.alpha));
        store.set("aero/beta-deg", math::rad_to_deg(self.beta));
        store.set("velocities/alpha-rad", self.alpha);
        store.set("velocities/beta-rad", self.beta);
        store.set("aero/mach", self.mach);
        store.set("aero/qbar-Pa", self.dynamic_pressure);
        store.set("aero/qbar-psf", self.dynamic_pressure * PA_TO_PSF);

        // Atmosphere
        store.set("atmosphere/T-K", self.temperature);
        store.set("atmosphere/P-Pa", self.pressure);
        store.set("atmosphere/rho-kgm3", self.density);
        store.set("atmosphere/rho", self.density);
        store.set("atmosphere/density-slugft3", self.density * KGM3_TO_SLUGFT3);
        store.set("atmosphere/pressure-psf", self.pressure * PA_TO_PSF);
        store.set("atmosphere/temperature-R", self.temperature * KELVIN_TO_RANKINE);
        store.set("atmosphere/a-mps", self.sound_speed);

        // Pilot commands
        store.set("fcs/aileron-cmd-norm", self.controls.aileron);
        store.set("fcs/elevator-cmd-norm", self.controls.elevator);
        store.set("fcs/rudder-cmd-norm", self.controls.rudder);
        store.set("fcs/throttle-cmd-norm", self.controls.throttle);
        store.set("fcs/flap-cmd-norm", self.controls.flaps);
        store.set("fcs/mixture-cmd-norm", self.controls.mixture);
        store.set(
            "fcs/gear-cmd-norm",
            if self.controls.gear { 1.0 } else { 0.0 },
        );

        // Resolved surface positions
        store.set("fcs/left-aileron-pos-rad", self.control_surfaces.aileron_left);
        store.set("fcs/right-aileron-pos-rad", self.control_surfaces.aileron_right);
        store.set("fcs/elevator-pos-rad", self.control_surfaces.elevator);
        store.set("fcs/rudder-pos-rad", self.control_surfaces.rudder);
        store.set(
            "fcs/flap-pos-deg",
            math::rad_to_deg(self.control_surfaces.flap_left),
        );

        // Engine
        store.set("propulsion/engine/thrust-N", self.engine.thrust);
        store.set("propulsion/engine/thrust-lbs", self.engine.thrust * N_TO_LB);
        store.set("engines/engine/rpm", self.engine.rpm);
        store.set("engines/engine/mp-inHg", self.engine.manifold_pressure);

        // Gear
        store.set("gear/gear-down", if self.gear.down { 1.0 } else { 0.0 });
        store.set("gear/gear-pos-norm", self.gear.transition);
        store.set("gear/wow", if self.gear.on_ground { 1.0 } else { 0.0 });

        // Forces and moments
        store.set("forces/fbx-N", self.forces.total.x);
        store.set("forces/fby-N", self.forces.total.y);
        store.set("forces/fbz-N", self.forces.total.z);
        store.set("forces/fbx-lbs", self.forces.total.x * N_TO_LB);
        store.set("forces/fby-lbs", self.forces.total.y * N_TO_LB);
        store.set("forces/fbz-lbs", self.forces.total.z * N_TO_LB);
        store.set("moments/l-Nm", self.moments.total.x);
        store.set("moments/m-Nm", self.moments.total.y);
        store.set("moments/n-Nm", self.moments.total.z);

        store.set("simulation/sim-time-sec", self.time);
    }

    /// Read the canonical FCS output properties back into the resolved
    /// surface positions.
    pub fn surfaces_from(&mut self, store: &PropertyStore) {
        self.control_surfaces.aileron_left = store.get("fcs/left-aileron-pos-rad");
        self.control_surfaces.aileron_right = store.get("fcs/right-aileron-pos-rad");
        self.control_surfaces.elevator = store.get("fcs/elevator-pos-rad");
        self.control_surfaces.rudder = store.get("fcs/rudder-pos-rad");
    }

    /// True when every scalar in the state is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.angular_rate.iter().all(|v| v.is_finite())
            && self.orientation.as_ref().norm().is_finite()
            && self.altitude.is_finite()
            && self.mass.is_finite()
            && self.true_airspeed.is_finite()
            && self.dynamic_pressure.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_derived_parameters_level_flight() {
        let mut state = AircraftState::at_condition(3000.0, Vector3::new(100.0, 0.0, 0.0));
        state.update_derived();
        assert_relative_eq!(state.true_airspeed, 100.0);
        assert_relative_eq!(state.alpha, 0.0);
        assert_relative_eq!(state.beta, 0.0);
        assert!(state.indicated_airspeed < state.true_airspeed);
        assert_relative_eq!(
            state.dynamic_pressure,
            0.5 * state.density * 100.0 * 100.0
        );
    }

    #[test]
    fn test_alpha_beta_signs() {
        let mut state = AircraftState::at_condition(1000.0, Vector3::new(80.0, 4.0, -3.0));
        state.update_derived();
        // w < 0 gives positive alpha under the atan2(-w, u) convention.
        assert!(state.alpha > 0.0);
        assert!(state.beta > 0.0);
        assert_relative_eq!(state.alpha, (3.0_f64).atan2(80.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_airspeed_flow_angles() {
        let mut state = AircraftState::at_condition(0.0, Vector3::zeros());
        state.update_derived();
        assert_eq!(state.beta, 0.0);
        assert_eq!(state.mach, 0.0);
    }

    #[test]
    fn test_euler_angles_follow_quaternion() {
        let mut state = AircraftState::default();
        state.orientation = math::quaternion_from_euler(0.2, -0.1, 1.5);
        state.update_derived();
        assert_relative_eq!(state.roll, 0.2, epsilon = 1e-9);
        assert_relative_eq!(state.pitch, -0.1, epsilon = 1e-9);
        assert_relative_eq!(state.yaw, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_projection_covers_flow_angles() {
        use crate::properties::PropertyStore;
        let mut state = AircraftState::at_condition(2000.0, Vector3::new(90.0, 2.0, -4.0));
        state.orientation = math::quaternion_from_euler(0.1, 0.05, 0.7);
        state.update_derived();

        let store = PropertyStore::new();
        state.project_into(&store);

        assert_relative_eq!(store.get("aero/alpha-rad"), state.alpha);
        assert_relative_eq!(store.get("aero/beta-rad"), state.beta);
        assert_relative_eq!(store.get("attitude/phi-rad"), 0.1, epsilon = 1e-9);
        assert_relative_eq!(store.get("attitude/theta-rad"), 0.05, epsilon = 1e-9);
        assert_relative_eq!(store.get("attitude/psi-rad"), 0.7, epsilon = 1e-9);
        assert_relative_eq!(
            store.get("aero/qbar-psf"),
            state.dynamic_pressure * PA_TO_PSF
        );
    }

    #[test]
    fn test_gear_follows_command() {
        let mut state = AircraftState::default();
        let mut controls = ControlInputs::default();
        controls.gear = false;
        state.set_controls(controls);
        assert!(!state.gear.down);
        assert_eq!(state.gear.transition, 0.0);
    }
}

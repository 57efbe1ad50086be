//! Piston-engine propulsion: throttle dynamics, the reference-ratio thrust
//! formula, per-tank fuel accounting, and the property projection consumed
//! by the aerodynamic functions.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::model::PropulsionDef;
use crate::properties::PropertyStore;
use crate::utils::constants::*;

/// Thrust calibration constants of the reference propeller deck:
/// `thrust_lb = running_factor · (rpm / REFERENCE_RPM) ·
/// (map / REFERENCE_MAP) · MAX_THRUST_LB`.
pub const REFERENCE_RPM: f64 = 1260.0;
pub const REFERENCE_MAP_INHG: f64 = 81.0;
pub const MAX_THRUST_LB: f64 = 200.0;

/// Multiplicative gate in the thrust formula: 1.0 running, 0.3 windmilling.
pub const RUNNING_FACTOR_ON: f64 = 1.0;
pub const RUNNING_FACTOR_OFF: f64 = 0.3;

/// The piston engine. Startup latches to running once throttle exceeds 0.1;
/// there is no shutdown path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PistonEngine {
    pub name: String,
    pub is_running: bool,
    pub rpm: f64,
    /// Manifold pressure (inHg).
    pub manifold_pressure: f64,
    pub throttle_position: f64,
    pub max_rpm: f64,
    pub idle_rpm: f64,
    /// Maximum manifold pressure (inHg).
    pub max_map: f64,
    /// Idle manifold pressure (inHg).
    pub idle_map: f64,
}

impl Default for PistonEngine {
    fn default() -> Self {
        Self {
            name: "Packard-V-1650-7".to_string(),
            is_running: false,
            rpm: 0.0,
            manifold_pressure: INHG_SEA_LEVEL,
            throttle_position: 0.0,
            max_rpm: 3000.0,
            idle_rpm: 800.0,
            max_map: 61.0,
            idle_map: 15.0,
        }
    }
}

/// The propeller. RPM mirrors the engine; thrust is carried in the deck's
/// native pound unit internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Propeller {
    pub name: String,
    /// Diameter (ft).
    pub diameter_ft: f64,
    pub rpm: f64,
    /// Thrust (lb).
    pub thrust_lb: f64,
    /// Torque (N·m).
    pub torque: f64,
    /// Induced velocity (ft/s), consumed by slipstream-aware aero terms.
    pub induced_velocity_fps: f64,
}

impl Default for Propeller {
    fn default() -> Self {
        Self {
            name: "P51prop".to_string(),
            diameter_ft: 11.2,
            rpm: 0.0,
            thrust_lb: 0.0,
            torque: 0.0,
            induced_velocity_fps: 0.0,
        }
    }
}

/// One fuel tank. Quantities are pounds, the native unit of the fuel deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelTank {
    pub number: i32,
    pub tank_type: String,
    /// Position relative to the datum (m).
    pub position: Vector3<f64>,
    pub capacity_lb: f64,
    pub contents_lb: f64,
    /// Lower number drains first.
    pub priority: i32,
}

/// The fuel system: tanks drained in priority order plus aggregate gauges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuelSystem {
    pub tanks: Vec<FuelTank>,
    pub total_capacity_lb: f64,
    pub total_contents_lb: f64,
    /// Current consumption (lb/h).
    pub fuel_flow_pph: f64,
}

impl FuelSystem {
    fn recompute_totals(&mut self) {
        self.total_capacity_lb = self.tanks.iter().map(|t| t.capacity_lb).sum();
        self.total_contents_lb = self.tanks.iter().map(|t| t.contents_lb).sum();
    }

    /// Draw `amount_lb` from the tanks in priority order, stopping when the
    /// draw is satisfied.
    fn consume(&mut self, amount_lb: f64) {
        let mut remaining = amount_lb;
        let mut order: Vec<usize> = (0..self.tanks.len()).collect();
        order.sort_by_key(|&i| (self.tanks[i].priority, self.tanks[i].number));

        for i in order {
            if remaining <= 0.0 {
                break;
            }
            let tank = &mut self.tanks[i];
            if tank.contents_lb <= 0.0 {
                continue;
            }
            let draw = remaining.min(tank.contents_lb);
            tank.contents_lb -= draw;
            remaining -= draw;
        }
        self.recompute_totals();
    }
}

/// The complete propulsion stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropulsionSystem {
    pub engine: PistonEngine,
    pub propeller: Propeller,
    pub fuel: FuelSystem,

    pub max_thrust_lb: f64,
    pub reference_rpm: f64,
    pub reference_map: f64,
    pub running_factor: f64,

    /// Engine mount position relative to the datum (m).
    pub position: Vector3<f64>,
    /// Engine mount orientation offsets roll/pitch/yaw (rad).
    pub orientation: Vector3<f64>,

    /// Non-fatal numeric anomalies clamped so far.
    pub anomaly_count: u64,
}

impl Default for PropulsionSystem {
    fn default() -> Self {
        let mut fuel = FuelSystem::default();
        // The five-tank P-51D arrangement: wing mains, fuselage, two drops.
        let tank_rows: [(i32, f64, f64, f64, f64, f64); 5] = [
            (0, 106.0, -80.0, -9.675, 553.84, 396.0),
            (1, 106.0, 80.0, -9.675, 553.84, 396.0),
            (2, 160.0, 0.0, -3.0, 511.7, 0.0),
            (3, 97.5, -198.0, -25.0, 451.5, 0.0),
            (4, 97.5, 198.0, -25.0, 451.5, 0.0),
        ];
        for (number, x, y, z, capacity, contents) in tank_rows {
            fuel.tanks.push(FuelTank {
                number,
                tank_type: "AVGAS".to_string(),
                position: Vector3::new(x * IN_TO_M, y * IN_TO_M, z * IN_TO_M),
                capacity_lb: capacity,
                contents_lb: contents,
                priority: 1,
            });
        }
        fuel.recompute_totals();

        Self {
            engine: PistonEngine::default(),
            propeller: Propeller::default(),
            fuel,
            max_thrust_lb: MAX_THRUST_LB,
            reference_rpm: REFERENCE_RPM,
            reference_map: REFERENCE_MAP_INHG,
            running_factor: RUNNING_FACTOR_OFF,
            position: Vector3::new(36.0 * IN_TO_M, 0.0, 0.0),
            orientation: Vector3::new(-4.0_f64.to_radians(), 2.5_f64.to_radians(), 0.0),
            anomaly_count: 0,
        }
    }
}

impl PropulsionSystem {
    /// Build the stage from a propulsion description; falls back to the
    /// default deck for anything the description omits.
    pub fn from_config(def: &PropulsionDef) -> Self {
        let mut system = Self::default();

        if let Some(engine) = def.engines.first() {
            if !engine.name.is_empty() {
                system.engine.name = engine.name.clone();
            }
            if let Some(location) = &engine.location {
                system.position = location.as_vector();
            }
            if let Some(orient) = &engine.orient {
                system.orientation = Vector3::new(orient.roll, orient.pitch, orient.yaw);
            }
        }

        if !def.tanks.is_empty() {
            system.fuel.tanks.clear();
            for tank in &def.tanks {
                system.fuel.tanks.push(FuelTank {
                    number: tank.number,
                    tank_type: if tank.tank_type.is_empty() {
                        "FUEL".to_string()
                    } else {
                        tank.tank_type.clone()
                    },
                    position: tank
                        .location
                        .as_ref()
                        .map(|l| l.as_vector())
                        .unwrap_or_else(Vector3::zeros),
                    // Tank quantities were normalized to kg at parse time.
                    capacity_lb: tank.capacity.unwrap_or(0.0) * KG_TO_LB,
                    contents_lb: tank.contents.unwrap_or(0.0) * KG_TO_LB,
                    priority: tank.priority,
                });
            }
            system.fuel.recompute_totals();
        }

        debug!(
            engine = %system.engine.name,
            tanks = system.fuel.tanks.len(),
            fuel_lb = system.fuel.total_contents_lb,
            "propulsion system configured"
        );
        system
    }

    /// Advance the propulsion state one step under the given throttle.
    pub fn update(&mut self, throttle_input: f64, dt: f64) {
        self.engine.throttle_position = throttle_input.clamp(0.0, 1.0);

        self.update_engine();
        self.update_propeller();
        self.update_fuel(dt);

        self.running_factor = if self.engine.is_running {
            RUNNING_FACTOR_ON
        } else {
            RUNNING_FACTOR_OFF
        };
    }

    fn update_engine(&mut self) {
        if !self.engine.is_running && self.engine.throttle_position > 0.1 {
            self.engine.is_running = true;
            debug!(engine = %self.engine.name, "engine start latched");
        }

        if self.engine.is_running {
            let throttle = self.engine.throttle_position;
            self.engine.rpm =
                self.engine.idle_rpm + throttle * (self.engine.max_rpm - self.engine.idle_rpm);
            self.engine.manifold_pressure =
                self.engine.idle_map + throttle * (self.engine.max_map - self.engine.idle_map);
        } else {
            self.engine.rpm = 0.0;
            self.engine.manifold_pressure = INHG_SEA_LEVEL;
        }

        if !self.engine.rpm.is_finite() {
            warn!("non-finite engine RPM clamped to 0");
            self.engine.rpm = 0.0;
            self.anomaly_count += 1;
        }

        self.propeller.rpm = self.engine.rpm;
    }

    fn update_propeller(&mut self) {
        let factor = if self.engine.is_running {
            RUNNING_FACTOR_ON
        } else {
            RUNNING_FACTOR_OFF
        };
        let rpm_ratio = self.propeller.rpm / self.reference_rpm;
        let map_ratio = self.engine.manifold_pressure / self.reference_map;

        let mut thrust = factor * rpm_ratio * map_ratio * self.max_thrust_lb;
        if !thrust.is_finite() {
            warn!("non-finite propeller thrust clamped to 0");
            thrust = 0.0;
            self.anomaly_count += 1;
        }
        self.propeller.thrust_lb = thrust.max(0.0);

        // Induced velocity feeds slipstream-sensitive aero terms; the
        // simplified √(T/0.5) form stands in for the disk-area expression.
        self.propeller.induced_velocity_fps = if self.propeller.thrust_lb > 0.0 {
            (self.propeller.thrust_lb / 0.5).sqrt()
        } else {
            0.0
        };
    }

    fn update_fuel(&mut self, dt: f64) {
        if self.engine.is_running && self.propeller.thrust_lb > 0.0 {
            let estimated_hp = self.propeller.thrust_lb * 0.75;
            let mut flow = estimated_hp * 0.5;
            if !flow.is_finite() {
                warn!("non-finite fuel flow clamped to 0");
                flow = 0.0;
                self.anomaly_count += 1;
            }
            self.fuel.fuel_flow_pph = flow;
            let burn_lb = flow * dt / 3600.0;
            self.fuel.consume(burn_lb);
        } else {
            self.fuel.fuel_flow_pph = 0.0;
        }
    }

    /// Current thrust in Newtons.
    pub fn thrust_n(&self) -> f64 {
        self.propeller.thrust_lb * LB_TO_N
    }

    /// Fuel mass flow in kg/s, the state's mass derivative source.
    pub fn fuel_flow_kg_s(&self) -> f64 {
        self.fuel.fuel_flow_pph * LB_TO_KG / 3600.0
    }

    /// Propeller reaction torque (N·m) about the body X axis.
    pub fn torque_nm(&mut self) -> f64 {
        if self.propeller.rpm > 0.0 {
            let power = self.propeller.thrust_lb * LB_TO_N
                * self.propeller.induced_velocity_fps
                * FPS_TO_MS;
            let omega = self.propeller.rpm * 2.0 * std::f64::consts::PI / 60.0;
            if omega > 0.0 {
                self.propeller.torque = power / omega;
            }
        } else {
            self.propeller.torque = 0.0;
        }
        self.propeller.torque
    }

    /// Thrust vector in the body frame under the small-angle engine mount
    /// projection.
    pub fn thrust_vector(&self) -> Vector3<f64> {
        let thrust = self.thrust_n();
        let roll = self.orientation.x;
        let pitch = self.orientation.y;
        let yaw = self.orientation.z;
        Vector3::new(
            thrust * pitch.cos() * yaw.cos(),
            thrust * roll.sin() * pitch.cos(),
            thrust * pitch.sin(),
        )
    }

    /// P-factor and spiraling-slipstream moments: asymmetric blade loading
    /// yaws the nose at angle of attack, the corkscrewing slipstream rolls.
    pub fn pfactor_moments(&self, alpha: f64) -> Vector3<f64> {
        let thrust = self.thrust_n();
        let pfactor_yaw = thrust * alpha.sin() * 0.1;
        let slipstream_roll = self.propeller.rpm * thrust * 1.0e-5;
        Vector3::new(slipstream_roll, 0.0, pfactor_yaw)
    }

    /// Total propulsion moments about the CG for the given body-frame
    /// thrust: the offset of the mount position from the datum crossed with
    /// the thrust, the propeller torque about body X, and the
    /// p-factor/slipstream terms.
    pub fn moments_about_cg(&mut self, thrust: Vector3<f64>, alpha: f64) -> Vector3<f64> {
        let offset_moment = self.position.cross(&thrust);
        let torque = Vector3::new(self.torque_nm(), 0.0, 0.0);
        offset_moment + torque + self.pfactor_moments(alpha)
    }

    /// Write the propulsion projection into the property store.
    pub fn project_into(&self, store: &PropertyStore) {
        store.set(
            "propulsion/engine/set-running",
            if self.engine.is_running { 1.0 } else { 0.0 },
        );
        store.set("propulsion/engine/propeller-rpm", self.propeller.rpm);
        store.set("propulsion/engine/map-inhg", self.engine.manifold_pressure);
        store.set("propulsion/engine/thrust-lbs", self.propeller.thrust_lb);
        store.set(
            "propulsion/engine/prop-induced-velocity_fps",
            self.propeller.induced_velocity_fps,
        );
        store.set(
            "external_reactions/exhaust-thrust/magnitude",
            self.propeller.thrust_lb,
        );
        store.set("propulsion/total-fuel-lbs", self.fuel.total_contents_lb);
        store.set("propulsion/fuel-flow-rate_pph", self.fuel.fuel_flow_pph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_thrust_formula_at_reference() {
        let mut system = PropulsionSystem::default();
        system.engine.is_running = true;
        system.engine.rpm = REFERENCE_RPM;
        system.engine.manifold_pressure = REFERENCE_MAP_INHG;
        system.propeller.rpm = REFERENCE_RPM;
        system.update_propeller();
        assert_relative_eq!(system.propeller.thrust_lb, MAX_THRUST_LB, epsilon = 1e-3);
    }

    #[test]
    fn test_thrust_formula_ratio_product() {
        let mut system = PropulsionSystem::default();
        system.engine.is_running = true;
        system.engine.rpm = 2.0 * REFERENCE_RPM;
        system.engine.manifold_pressure = 0.5 * REFERENCE_MAP_INHG;
        system.propeller.rpm = system.engine.rpm;
        system.update_propeller();
        assert_relative_eq!(system.propeller.thrust_lb, MAX_THRUST_LB, epsilon = 1e-3);
    }

    #[test]
    fn test_windmilling_factor_when_off() {
        let mut system = PropulsionSystem::default();
        system.engine.is_running = false;
        system.engine.rpm = REFERENCE_RPM;
        system.engine.manifold_pressure = REFERENCE_MAP_INHG;
        system.propeller.rpm = REFERENCE_RPM;
        system.update_propeller();
        assert_relative_eq!(
            system.propeller.thrust_lb,
            RUNNING_FACTOR_OFF * MAX_THRUST_LB,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_startup_latch() {
        let mut system = PropulsionSystem::default();
        system.update(0.05, 0.01);
        assert!(!system.engine.is_running);
        assert_eq!(system.engine.rpm, 0.0);
        assert_relative_eq!(system.engine.manifold_pressure, INHG_SEA_LEVEL);

        system.update(0.2, 0.01);
        assert!(system.engine.is_running);

        // Latched: closing the throttle does not stop the engine.
        system.update(0.0, 0.01);
        assert!(system.engine.is_running);
        assert_relative_eq!(system.engine.rpm, system.engine.idle_rpm);
    }

    #[test]
    fn test_rpm_and_map_track_throttle_linearly() {
        let mut system = PropulsionSystem::default();
        system.update(0.5, 0.01);
        let engine = &system.engine;
        assert_relative_eq!(
            engine.rpm,
            engine.idle_rpm + 0.5 * (engine.max_rpm - engine.idle_rpm)
        );
        assert_relative_eq!(
            engine.manifold_pressure,
            engine.idle_map + 0.5 * (engine.max_map - engine.idle_map)
        );
    }

    #[test]
    fn test_throttle_clamped() {
        let mut system = PropulsionSystem::default();
        system.update(1.8, 0.01);
        assert_eq!(system.engine.throttle_position, 1.0);
        system.update(-0.4, 0.01);
        assert_eq!(system.engine.throttle_position, 0.0);
    }

    #[test]
    fn test_fuel_flow_zero_when_off() {
        let mut system = PropulsionSystem::default();
        system.update(0.05, 1.0);
        assert_eq!(system.fuel.fuel_flow_pph, 0.0);
        assert_relative_eq!(system.fuel.total_contents_lb, 792.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fuel_draw_matches_flow_rate() {
        let mut system = PropulsionSystem::default();
        let before = system.fuel.total_contents_lb;
        system.update(0.8, 0.0); // latch and settle engine state
        let flow = {
            system.update(0.8, 1.0);
            system.fuel.fuel_flow_pph
        };
        let expected_burn = flow / 3600.0;
        assert_relative_eq!(
            before - system.fuel.total_contents_lb,
            expected_burn,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_fuel_priority_order() {
        let mut system = PropulsionSystem::default();
        system.fuel.tanks.truncate(2);
        system.fuel.tanks[0].priority = 2;
        system.fuel.tanks[0].contents_lb = 100.0;
        system.fuel.tanks[1].priority = 1;
        system.fuel.tanks[1].contents_lb = 3.0;
        system.fuel.recompute_totals();

        // Draw more than the high-priority tank holds; the remainder comes
        // from the lower-priority tank.
        system.fuel.consume(5.0);
        assert_relative_eq!(system.fuel.tanks[1].contents_lb, 0.0);
        assert_relative_eq!(system.fuel.tanks[0].contents_lb, 98.0);
    }

    #[test]
    fn test_hour_of_cruise_burn() {
        let mut system = PropulsionSystem::default();
        let initial = system.fuel.total_contents_lb;

        let dt = 1.0;
        let mut last = initial;
        let mut integrated_flow_lb = 0.0;
        for _ in 0..3600 {
            system.update(0.8, dt);
            integrated_flow_lb += system.fuel.fuel_flow_pph * dt / 3600.0;
            assert!(system.fuel.total_contents_lb <= last + 1e-12, "fuel increased");
            last = system.fuel.total_contents_lb;
        }

        let burned = initial - system.fuel.total_contents_lb;
        assert!(burned > 0.0);
        let ratio = burned / integrated_flow_lb;
        assert!(
            (0.8..=1.2).contains(&ratio),
            "burn {burned} lb vs integrated flow {integrated_flow_lb} lb"
        );
    }

    #[test]
    fn test_induced_velocity_simplified_form() {
        let mut system = PropulsionSystem::default();
        system.engine.is_running = true;
        system.engine.rpm = REFERENCE_RPM;
        system.engine.manifold_pressure = REFERENCE_MAP_INHG;
        system.propeller.rpm = REFERENCE_RPM;
        system.update_propeller();
        assert_relative_eq!(
            system.propeller.induced_velocity_fps,
            (MAX_THRUST_LB / 0.5).sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_property_projection_names() {
        let store = PropertyStore::new();
        let mut system = PropulsionSystem::default();
        system.update(0.7, 0.01);
        system.project_into(&store);

        assert_eq!(store.get("propulsion/engine/set-running"), 1.0);
        assert!(store.get("propulsion/engine/propeller-rpm") > 0.0);
        assert!(store.get("propulsion/engine/map-inhg") > 0.0);
        assert!(store.get("propulsion/engine/thrust-lbs") > 0.0);
        assert!(store.get("propulsion/engine/prop-induced-velocity_fps") > 0.0);
        assert_relative_eq!(
            store.get("external_reactions/exhaust-thrust/magnitude"),
            store.get("propulsion/engine/thrust-lbs")
        );
        assert!(store.get("propulsion/total-fuel-lbs") > 0.0);
        assert!(store.get("propulsion/fuel-flow-rate_pph") > 0.0);
    }

    #[test]
    fn test_moments_include_offset_torque_and_pfactor() {
        let mut system = PropulsionSystem::default();
        system.engine.is_running = true;
        system.engine.rpm = REFERENCE_RPM;
        system.engine.manifold_pressure = REFERENCE_MAP_INHG;
        system.propeller.rpm = REFERENCE_RPM;
        system.update_propeller();

        let thrust = system.thrust_vector();
        let alpha = 0.05;
        let moments = system.moments_about_cg(thrust, alpha);

        let expected =
            system.position.cross(&thrust) + Vector3::new(system.propeller.torque, 0.0, 0.0)
                + system.pfactor_moments(alpha);
        assert_relative_eq!(moments.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(moments.y, expected.y, epsilon = 1e-9);
        assert_relative_eq!(moments.z, expected.z, epsilon = 1e-9);

        // The nose-up mount pitch puts the thrust line above the datum
        // axis, so the forward offset produces a nose-down pitch moment.
        assert!(moments.y < 0.0);
        // Torque and slipstream both roll; p-factor yaws with alpha.
        assert!(moments.x > 0.0);
    }

    #[test]
    fn test_pfactor_scales_with_alpha_and_thrust() {
        let mut system = PropulsionSystem::default();
        system.engine.is_running = true;
        system.engine.rpm = REFERENCE_RPM;
        system.engine.manifold_pressure = REFERENCE_MAP_INHG;
        system.propeller.rpm = REFERENCE_RPM;
        system.update_propeller();

        let level = system.pfactor_moments(0.0);
        assert_relative_eq!(level.z, 0.0, epsilon = 1e-12);
        assert!(level.x > 0.0, "slipstream roll missing");

        let pulled = system.pfactor_moments(0.1);
        assert!(pulled.z > 0.0, "p-factor yaw missing at alpha");
    }

    #[test]
    fn test_thrust_vector_mount_offsets() {
        let mut system = PropulsionSystem::default();
        system.engine.is_running = true;
        system.engine.rpm = REFERENCE_RPM;
        system.engine.manifold_pressure = REFERENCE_MAP_INHG;
        system.propeller.rpm = REFERENCE_RPM;
        system.update_propeller();

        let v = system.thrust_vector();
        let total = system.thrust_n();
        // Dominantly forward with small mount-angle components.
        assert!(v.x > 0.99 * total * system.orientation.y.cos());
        assert!(v.z > 0.0); // 2.5° nose-up mount pitch
        assert!(v.y < 0.0); // -4° mount roll
    }
}

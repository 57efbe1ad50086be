//! In-memory tree of the aircraft description.
//!
//! The tree is strictly data; all interpretation happens in the systems
//! that consume it. Measurement values are normalized to SI at parse time.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::function::FunctionDef;

/// Root of the aircraft description (`fdm_config`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FdmConfig {
    pub name: String,
    pub version: String,
    pub release: String,
    pub header: Option<Header>,
    pub metrics: Option<Metrics>,
    pub mass_balance: Option<MassBalance>,
    pub ground_reactions: Option<GroundReactions>,
    pub propulsion: Option<PropulsionDef>,
    pub flight_control: Option<FlightControlDef>,
    pub autopilot: Option<FlightControlDef>,
    pub aerodynamics: Option<Aerodynamics>,
    pub input: Option<InputDef>,
    pub output: Option<OutputDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    pub author: String,
    pub file_creation_date: String,
    pub description: String,
    pub version: String,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reference {
    pub ref_id: String,
    pub author: String,
    pub title: String,
    pub date: String,
}

/// Geometric reference data, SI after parsing (m, m²).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub wing_area: Option<f64>,
    pub wing_span: Option<f64>,
    pub chord: Option<f64>,
    pub htail_area: Option<f64>,
    pub htail_arm: Option<f64>,
    pub vtail_area: Option<f64>,
    pub vtail_arm: Option<f64>,
    pub locations: Vec<Location>,
}

/// A named 3D position. Coordinates are kept in the file's native frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub unit: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Mass and inertia, SI after parsing (kg, kg·m²).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MassBalance {
    pub ixx: Option<f64>,
    pub iyy: Option<f64>,
    pub izz: Option<f64>,
    pub ixy: Option<f64>,
    pub ixz: Option<f64>,
    pub iyz: Option<f64>,
    pub empty_mass: Option<f64>,
    pub cg_location: Option<Location>,
    pub point_masses: Vec<PointMass>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointMass {
    pub name: String,
    pub mass: Option<f64>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroundReactions {
    pub contacts: Vec<Contact>,
}

/// A ground contact point. The core carries the data but implements only
/// placeholder contact mechanics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub contact_type: String,
    pub name: String,
    pub location: Option<Location>,
    pub static_friction: f64,
    pub dynamic_friction: f64,
    pub rolling_friction: f64,
    pub spring_coeff: Option<f64>,
    pub damping_coeff: Option<f64>,
    pub max_steer: Option<f64>,
    pub brake_group: String,
    pub retractable: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropulsionDef {
    pub engines: Vec<EngineDef>,
    pub tanks: Vec<TankDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineDef {
    pub file: String,
    pub name: String,
    pub location: Option<Location>,
    pub orient: Option<Orient>,
    pub feed: Vec<i32>,
    pub thruster: Option<ThrusterDef>,
}

/// Mount orientation angles, radians after parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Orient {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThrusterDef {
    pub file: String,
    pub name: String,
    pub location: Option<Location>,
    pub orient: Option<Orient>,
}

/// Fuel tank description, kg after parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TankDef {
    pub tank_type: String,
    pub number: i32,
    pub location: Option<Location>,
    pub capacity: Option<f64>,
    pub contents: Option<f64>,
    pub temperature: f64,
    pub priority: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightControlDef {
    pub name: String,
    pub properties: Vec<String>,
    pub rate_groups: Vec<RateGroupDef>,
    pub channels: Vec<ChannelDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateGroupDef {
    pub name: String,
    pub rate_hz: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelDef {
    pub name: String,
    pub components: Vec<ComponentDef>,
    pub sensors: Vec<SensorDef>,
}

/// Declaration of one FCS component; interpreted by `fcs::FlightControlSystem`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    pub component_type: String,
    pub rate_group: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub gain: Option<f64>,
    pub function: Option<FunctionDef>,
    pub clip_min: Option<f64>,
    pub clip_max: Option<f64>,
    /// Filter coefficients c1..c6 as declared.
    pub coefficients: [Option<f64>; 6],
    pub width: Option<f64>,
    pub rate_limit: Option<f64>,
    pub lag: Option<f64>,
    pub bias: Option<f64>,
    pub tests: Vec<TestDef>,
    pub default_value: Option<f64>,
    /// Kinematic traversal detents.
    pub settings: Vec<SettingDef>,
    /// Gain schedule table for scheduled-gain components.
    pub table: Option<crate::config::table::LookupTable>,
}

/// One kinematic detent: a position and the traversal time from the
/// previous detent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SettingDef {
    pub position: f64,
    pub time: f64,
}

/// Conditional test inside a switch-style component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestDef {
    pub logic: String,
    pub value: String,
    pub condition: String,
}

/// Sensor declaration. Structural placeholder: noise and quantization are
/// carried but not simulated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorDef {
    pub name: String,
    pub rate_group: String,
    pub input: String,
    pub lag: f64,
    pub noise_variation: String,
    pub noise_value: f64,
    pub quantization_bits: Option<i32>,
    pub quantization_min: f64,
    pub quantization_max: f64,
    pub drift_rate: f64,
    pub bias: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aerodynamics {
    pub alpha_limits: Option<AlphaLimits>,
    pub axes: Vec<AxisDef>,
    pub functions: Vec<FunctionDef>,
}

/// Angle-of-attack limits, radians after parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlphaLimits {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AxisDef {
    pub name: String,
    pub functions: Vec<FunctionDef>,
}

impl Aerodynamics {
    pub fn axis(&self, name: &str) -> Option<&AxisDef> {
        self.axes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputDef {
    pub port: i32,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputDef {
    pub name: String,
    pub output_type: String,
    pub port: i32,
    pub protocol: String,
    pub rate: i32,
}

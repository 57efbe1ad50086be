//! Flight control system: rate-group scheduler, channels, and the
//! component graph.

pub mod components;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::components::state::AircraftState;
use crate::config::model::{ComponentDef, FlightControlDef};
use crate::fcs::components::{
    Actuator, Clipper, Comparator, Deadband, FcsComponent, Gain, Kinematic, LagFilter,
    ScheduledGain, Summer, Switch,
};
use crate::properties::PropertyStore;
use crate::utils::constants::*;

/// A set of components sharing a target execution frequency.
///
/// The declared frequency derives a period that is kept for diagnostics
/// only: in simulation every group runs every step with the caller's dt,
/// which is chosen to match the highest rate. What the scheduler guarantees
/// is deterministic execution order within a step.
pub struct RateGroup {
    pub name: String,
    pub rate_hz: f64,
    pub period: f64,
    pub enabled: bool,
    /// Simulated time of the most recent execution.
    pub last_execution: f64,
    /// Accumulated simulated execution time.
    pub execution_time: f64,
    components: Vec<Box<dyn FcsComponent>>,
}

impl RateGroup {
    fn new(name: &str, rate_hz: f64) -> Self {
        Self {
            name: name.to_string(),
            rate_hz,
            period: if rate_hz > 0.0 { 1.0 / rate_hz } else { 0.0 },
            enabled: true,
            last_execution: 0.0,
            execution_time: 0.0,
            components: Vec::new(),
        }
    }

    fn execute(&mut self, store: &PropertyStore, now: f64, dt: f64) {
        if !self.enabled {
            return;
        }
        for component in &mut self.components {
            component.execute(store, dt);
        }
        self.last_execution = now;
        self.execution_time += dt;
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

/// Per-group execution statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RateGroupStats {
    pub name: String,
    pub rate_hz: f64,
    pub component_count: usize,
    pub execution_time: f64,
    pub enabled: bool,
}

/// A logical grouping of components. Channels do not own components and do
/// not affect execution order; they exist for organization and reporting.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub name: String,
    pub component_names: Vec<String>,
}

/// The FCS execution engine: a directed graph of components scheduled into
/// rate groups, communicating through the shared property store.
pub struct FlightControlSystem {
    pub name: String,
    pub default_rate: f64,
    pub enabled: bool,
    store: Arc<PropertyStore>,
    rate_groups: Vec<RateGroup>,
    channels: Vec<Channel>,
    /// Master index: component name → (rate group index, position).
    component_index: HashMap<String, (usize, usize)>,
    pub total_executions: u64,
    pub total_time: f64,
}

impl FlightControlSystem {
    /// Create an FCS with the mandatory "default" rate group.
    pub fn new(name: &str, default_rate_hz: f64, store: Arc<PropertyStore>) -> Self {
        Self {
            name: name.to_string(),
            default_rate: default_rate_hz,
            enabled: true,
            store,
            rate_groups: vec![RateGroup::new("default", default_rate_hz)],
            channels: Vec::new(),
            component_index: HashMap::new(),
            total_executions: 0,
            total_time: 0.0,
        }
    }

    pub fn add_rate_group(&mut self, name: &str, rate_hz: f64) {
        if self.rate_groups.iter().any(|g| g.name == name) {
            warn!(rate_group = name, "duplicate rate group ignored");
            return;
        }
        self.rate_groups.push(RateGroup::new(name, rate_hz));
    }

    pub fn add_channel(&mut self, name: &str) {
        self.channels.push(Channel {
            name: name.to_string(),
            component_names: Vec::new(),
        });
    }

    /// Add a component, honoring its declared rate group. A declaration
    /// naming a group that does not exist falls back to "default" rather
    /// than failing. Insertion order within a group is execution order.
    pub fn add_component(&mut self, mut component: Box<dyn FcsComponent>) {
        let declared = component.rate_group().to_string();
        let group_index = self
            .rate_groups
            .iter()
            .position(|g| g.name == declared)
            .unwrap_or(0);
        component.set_rate_group(&self.rate_groups[group_index].name.clone());

        let name = component.name().to_string();
        let position = self.rate_groups[group_index].components.len();
        self.rate_groups[group_index].components.push(component);
        self.component_index.insert(name, (group_index, position));
    }

    /// Add a component into a named channel as well as the scheduler.
    pub fn add_component_to_channel(&mut self, channel: &str, component: Box<dyn FcsComponent>) {
        let name = component.name().to_string();
        self.add_component(component);
        if let Some(ch) = self.channels.iter_mut().find(|c| c.name == channel) {
            ch.component_names.push(name);
        }
    }

    pub fn store(&self) -> &Arc<PropertyStore> {
        &self.store
    }

    pub fn rate_group_names(&self) -> Vec<String> {
        self.rate_groups.iter().map(|g| g.name.clone()).collect()
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn component_count(&self) -> usize {
        self.component_index.len()
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.component_index.contains_key(name)
    }

    pub fn stats(&self) -> Vec<RateGroupStats> {
        self.rate_groups
            .iter()
            .map(|g| RateGroupStats {
                name: g.name.clone(),
                rate_hz: g.rate_hz,
                component_count: g.components.len(),
                execution_time: g.execution_time,
                enabled: g.enabled,
            })
            .collect()
    }

    pub fn set_rate_group_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(group) = self.rate_groups.iter_mut().find(|g| g.name == name) {
            group.enabled = enabled;
        }
    }

    /// Copy the command/position/atmosphere/velocity/attitude fields from
    /// the state into their canonical property names.
    fn sync_from_state(&self, state: &AircraftState) {
        let store = &self.store;

        store.set("fcs/aileron-cmd-norm", state.controls.aileron);
        store.set("fcs/elevator-cmd-norm", state.controls.elevator);
        store.set("fcs/rudder-cmd-norm", state.controls.rudder);
        store.set("fcs/throttle-cmd-norm", state.controls.throttle);
        store.set("fcs/flap-cmd-norm", state.controls.flaps);

        store.set("fcs/left-aileron-pos-rad", state.control_surfaces.aileron_left);
        store.set("fcs/right-aileron-pos-rad", state.control_surfaces.aileron_right);
        store.set("fcs/elevator-pos-rad", state.control_surfaces.elevator);
        store.set("fcs/rudder-pos-rad", state.control_surfaces.rudder);

        store.set("atmosphere/rho", state.density);
        store.set("atmosphere/pressure-psf", state.pressure * PA_TO_PSF);
        store.set("atmosphere/temperature-R", state.temperature * KELVIN_TO_RANKINE);

        store.set("velocities/vt-fps", state.true_airspeed * MS_TO_FPS);
        store.set("velocities/vc-kts", state.calibrated_airspeed * MS_TO_KT);
        store.set("velocities/alpha-rad", state.alpha);
        store.set("velocities/beta-rad", state.beta);

        store.set("velocities/p-rad_sec", state.angular_rate.x);
        store.set("velocities/q-rad_sec", state.angular_rate.y);
        store.set("velocities/r-rad_sec", state.angular_rate.z);

        store.set("position/h-sl-ft", state.altitude * M_TO_FT);
        store.set("attitude/phi-rad", state.roll);
        store.set("attitude/theta-rad", state.pitch);
        store.set("attitude/psi-rad", state.yaw);
    }

    /// Run one FCS step: synchronize inputs, execute every rate group in
    /// definition order with components in insertion order, then copy the
    /// canonical outputs back into the state's surface positions.
    pub fn execute(&mut self, state: &mut AircraftState, dt: f64) {
        if !self.enabled {
            return;
        }

        self.sync_from_state(state);

        let now = state.time;
        for group in &mut self.rate_groups {
            group.execute(&self.store, now, dt);
        }

        state.surfaces_from(&self.store);

        self.total_executions += 1;
        self.total_time += dt;
    }

    /// Reset every component and zero the execution counters.
    pub fn reset(&mut self) {
        for group in &mut self.rate_groups {
            for component in &mut group.components {
                component.reset();
            }
            group.execution_time = 0.0;
            group.last_execution = 0.0;
        }
        self.total_executions = 0;
        self.total_time = 0.0;
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Build the FCS from a parsed flight-control description. Component
    /// types outside the supported set are skipped with a warning.
    pub fn from_config(def: &FlightControlDef, default_rate_hz: f64, store: Arc<PropertyStore>) -> Self {
        let rate = def
            .rate_groups
            .first()
            .map(|g| g.rate_hz)
            .filter(|r| *r > 0.0)
            .unwrap_or(default_rate_hz);
        let mut fcs = Self::new(&def.name, rate, store);

        for group in &def.rate_groups {
            fcs.add_rate_group(&group.name, group.rate_hz);
        }

        for channel in &def.channels {
            fcs.add_channel(&channel.name);
            for component in &channel.components {
                match build_component(component) {
                    Some(built) => fcs.add_component_to_channel(&channel.name, built),
                    None => warn!(
                        component = %component.name,
                        kind = %component.component_type,
                        "unsupported FCS component type skipped"
                    ),
                }
            }
        }

        debug!(
            name = %fcs.name,
            components = fcs.component_count(),
            rate_groups = fcs.rate_groups.len(),
            "flight control system built from config"
        );
        fcs
    }

    /// A realistic single-engine fighter control setup: each surface runs a
    /// normalized-command schedule into a rate-limited, lagged actuator.
    pub fn standard_p51d(store: Arc<PropertyStore>) -> Self {
        let mut fcs = Self::new("P51D FCS", 120.0, store);
        fcs.add_rate_group("high", 120.0);
        fcs.add_rate_group("medium", 40.0);
        fcs.add_rate_group("low", 10.0);

        fcs.add_channel("Pitch");
        fcs.add_channel("Roll");
        fcs.add_channel("Yaw");

        // Pitch: command schedule then the elevator servo.
        let mut elevator_schedule = Box::new(Gain::new(
            "fcs/elevator-schedule",
            "fcs/elevator-cmd-norm",
            "fcs/elevator-cmd-rad",
            0.1,
        ));
        elevator_schedule.set_rate_group("high");
        fcs.add_component_to_channel("Pitch", elevator_schedule);

        let mut elevator_actuator = Box::new(
            Actuator::new("fcs/elevator-actuator", "fcs/elevator-cmd-rad", "fcs/elevator-pos-rad")
                .with_rate_limit(2.5)
                .with_lag(0.06)
                .with_hysteresis(0.02),
        );
        elevator_actuator.set_rate_group("high");
        fcs.add_component_to_channel("Pitch", elevator_actuator);

        let mut elevator_deg = Box::new(Gain::new(
            "fcs/elevator-gain",
            "fcs/elevator-pos-rad",
            "fcs/elevator-pos-deg",
            180.0 / std::f64::consts::PI,
        ));
        elevator_deg.set_rate_group("medium");
        fcs.add_component_to_channel("Pitch", elevator_deg);

        // Roll: ailerons deflect in opposition.
        let mut left_schedule = Box::new(Gain::new(
            "fcs/left-aileron-schedule",
            "fcs/aileron-cmd-norm",
            "fcs/left-aileron-cmd-rad",
            0.12,
        ));
        left_schedule.set_rate_group("high");
        fcs.add_component_to_channel("Roll", left_schedule);

        let mut left_aileron = Box::new(
            Actuator::new(
                "fcs/left-aileron-actuator",
                "fcs/left-aileron-cmd-rad",
                "fcs/left-aileron-pos-rad",
            )
            .with_rate_limit(3.0)
            .with_lag(0.04),
        );
        left_aileron.set_rate_group("high");
        fcs.add_component_to_channel("Roll", left_aileron);

        let mut right_schedule = Box::new(Gain::new(
            "fcs/right-aileron-schedule",
            "fcs/aileron-cmd-norm",
            "fcs/right-aileron-cmd-rad",
            -0.12,
        ));
        right_schedule.set_rate_group("high");
        fcs.add_component_to_channel("Roll", right_schedule);

        let mut right_aileron = Box::new(
            Actuator::new(
                "fcs/right-aileron-actuator",
                "fcs/right-aileron-cmd-rad",
                "fcs/right-aileron-pos-rad",
            )
            .with_rate_limit(3.0)
            .with_lag(0.04),
        );
        right_aileron.set_rate_group("high");
        fcs.add_component_to_channel("Roll", right_aileron);

        // Yaw: rudder is slower and carries a wider hysteresis band.
        let mut rudder_schedule = Box::new(Gain::new(
            "fcs/rudder-schedule",
            "fcs/rudder-cmd-norm",
            "fcs/rudder-cmd-rad",
            0.15,
        ));
        rudder_schedule.set_rate_group("high");
        fcs.add_component_to_channel("Yaw", rudder_schedule);

        let mut rudder_actuator = Box::new(
            Actuator::new("fcs/rudder-actuator", "fcs/rudder-cmd-rad", "fcs/rudder-pos-rad")
                .with_rate_limit(2.0)
                .with_lag(0.08)
                .with_hysteresis(0.03),
        );
        rudder_actuator.set_rate_group("high");
        fcs.add_component_to_channel("Yaw", rudder_actuator);

        fcs
    }

    /// A direct pass-through FCS: surface position equals pilot command.
    pub fn passthrough(store: Arc<PropertyStore>) -> Self {
        let mut fcs = Self::new("Basic FCS", 60.0, store);
        fcs.add_component(Box::new(Gain::new(
            "elevator-pass",
            "fcs/elevator-cmd-norm",
            "fcs/elevator-pos-rad",
            1.0,
        )));
        fcs.add_component(Box::new(Gain::new(
            "aileron-pass",
            "fcs/aileron-cmd-norm",
            "fcs/left-aileron-pos-rad",
            1.0,
        )));
        fcs.add_component(Box::new(Gain::new(
            "aileron-pass-right",
            "fcs/aileron-cmd-norm",
            "fcs/right-aileron-pos-rad",
            -1.0,
        )));
        fcs.add_component(Box::new(Gain::new(
            "rudder-pass",
            "fcs/rudder-cmd-norm",
            "fcs/rudder-pos-rad",
            1.0,
        )));
        fcs
    }
}

/// Map one configuration component declaration onto a concrete component.
fn build_component(def: &ComponentDef) -> Option<Box<dyn FcsComponent>> {
    let input = def.inputs.first().map(String::as_str).unwrap_or("");
    let mut built: Box<dyn FcsComponent> = match def.component_type.to_uppercase().as_str() {
        "ACTUATOR" => {
            let mut act = Actuator::new(&def.name, input, &def.output);
            if let Some(rate_limit) = def.rate_limit {
                act = act.with_rate_limit(rate_limit);
            }
            if let Some(lag) = def.lag.or(def.coefficients[0]) {
                act = act.with_lag(lag);
            }
            if let Some(width) = def.width {
                act = act.with_hysteresis(width);
            }
            if let Some(bias) = def.bias {
                act = act.with_bias(bias);
            }
            Box::new(act)
        }
        "LAG_FILTER" | "LAG" => {
            let tau = def.lag.or(def.coefficients[0]).unwrap_or(0.0);
            Box::new(LagFilter::new(&def.name, input, &def.output, tau))
        }
        "PURE_GAIN" | "GAIN" => {
            Box::new(Gain::new(&def.name, input, &def.output, def.gain.unwrap_or(1.0)))
        }
        "SUMMER" => {
            // A leading '-' on an input name subtracts that signal.
            let mut names = Vec::new();
            let mut signs = Vec::new();
            for raw in &def.inputs {
                if let Some(stripped) = raw.strip_prefix('-') {
                    names.push(stripped);
                    signs.push(-1.0);
                } else {
                    names.push(raw.as_str());
                    signs.push(1.0);
                }
            }
            Box::new(
                Summer::new(&def.name, &names, &def.output)
                    .with_signs(&signs)
                    .with_bias(def.bias.unwrap_or(0.0)),
            )
        }
        "CLIPPER" | "LIMITER" => Box::new(Clipper::new(
            &def.name,
            input,
            &def.output,
            def.clip_min.unwrap_or(f64::NEG_INFINITY),
            def.clip_max.unwrap_or(f64::INFINITY),
        )),
        "DEADBAND" => Box::new(Deadband::new(
            &def.name,
            input,
            &def.output,
            def.width.unwrap_or(0.0),
        )),
        "SCHEDULED_GAIN" => {
            let table = def.table.clone()?;
            Box::new(ScheduledGain::new(&def.name, input, &def.output, table))
        }
        "KINEMAT" | "KINEMATIC" => Box::new(Kinematic::new(
            &def.name,
            input,
            &def.output,
            def.settings.iter().map(|s| (s.position, s.time)).collect(),
        )),
        "SWITCH" => {
            let mut sw = Switch::new(&def.name, &def.output);
            if let Some(test) = def.tests.first() {
                // Condition text has the shape "property OP threshold".
                let mut parts = test.condition.split_whitespace();
                if let (Some(property), Some(op), Some(threshold)) =
                    (parts.next(), parts.next(), parts.next())
                {
                    if let (Some(comparator), Ok(value)) =
                        (Comparator::from_tag(op), threshold.parse::<f64>())
                    {
                        sw = sw.with_test(property, comparator, value);
                    }
                }
                if let Ok(true_value) = test.value.parse::<f64>() {
                    sw = sw.with_values(true_value, def.default_value.unwrap_or(0.0));
                }
            }
            Box::new(sw)
        }
        _ => return None,
    };
    if !def.rate_group.is_empty() {
        built.set_rate_group(&def.rate_group);
    }
    Some(built)
}

//! Signal-processing components of the flight control graph.
//!
//! Components communicate only through the property store; none holds a
//! reference to another, so the graph is wired by name and needs no cycle
//! detection at the object level.

use crate::config::table::LookupTable;
use crate::properties::PropertyStore;

/// Comparator kinds for the switch component. EQ and NE compare with an
/// absolute tolerance of 1e-10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Comparator {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "GT" => Comparator::Gt,
            "LT" => Comparator::Lt,
            "GE" => Comparator::Ge,
            "LE" => Comparator::Le,
            "EQ" => Comparator::Eq,
            "NE" => Comparator::Ne,
            _ => return None,
        })
    }

    fn test(&self, probe: f64, threshold: f64) -> bool {
        const TOLERANCE: f64 = 1e-10;
        match self {
            Comparator::Gt => probe > threshold,
            Comparator::Lt => probe < threshold,
            Comparator::Ge => probe >= threshold,
            Comparator::Le => probe <= threshold,
            Comparator::Eq => (probe - threshold).abs() < TOLERANCE,
            Comparator::Ne => (probe - threshold).abs() >= TOLERANCE,
        }
    }
}

/// The capability set shared by every component.
pub trait FcsComponent: Send {
    fn name(&self) -> &str;
    fn component_type(&self) -> &str;
    fn inputs(&self) -> &[String];
    fn output(&self) -> &str;
    fn rate_group(&self) -> &str;
    fn set_rate_group(&mut self, rate_group: &str);
    /// Clear per-component persistent state back to its deterministic
    /// initial configuration.
    fn reset(&mut self);
    /// Process one step: read inputs from the store, write the output
    /// property, return the output value.
    fn execute(&mut self, store: &PropertyStore, dt: f64) -> f64;
}

/// Identity and wiring shared by the concrete components.
#[derive(Debug, Clone)]
pub struct ComponentBase {
    pub name: String,
    pub inputs: Vec<String>,
    pub output: String,
    pub rate_group: String,
    pub enabled: bool,
}

impl ComponentBase {
    fn new(name: &str, inputs: Vec<String>, output: &str) -> Self {
        Self {
            name: name.to_string(),
            inputs,
            output: output.to_string(),
            rate_group: String::new(),
            enabled: true,
        }
    }
}

macro_rules! delegate_base {
    () => {
        fn name(&self) -> &str {
            &self.base.name
        }
        fn inputs(&self) -> &[String] {
            &self.base.inputs
        }
        fn output(&self) -> &str {
            &self.base.output
        }
        fn rate_group(&self) -> &str {
            &self.base.rate_group
        }
        fn set_rate_group(&mut self, rate_group: &str) {
            self.base.rate_group = rate_group.to_string();
        }
    };
}

// ============================================================================
// Actuator
// ============================================================================

/// A servo actuator: bias, hysteresis rejection, rate limiting, then a
/// first-order lag. A rate limit of +∞ disables limiting, a lag of 0
/// disables filtering, a width of 0 disables hysteresis.
pub struct Actuator {
    base: ComponentBase,
    pub rate_limit: f64,
    pub lag: f64,
    pub hysteresis_width: f64,
    pub bias: f64,

    current_value: f64,
    target_value: f64,
    previous_input: f64,
    initialized: bool,
}

impl Actuator {
    pub fn new(name: &str, input: &str, output: &str) -> Self {
        Self {
            base: ComponentBase::new(name, vec![input.to_string()], output),
            rate_limit: f64::INFINITY,
            lag: 0.0,
            hysteresis_width: 0.0,
            bias: 0.0,
            current_value: 0.0,
            target_value: 0.0,
            previous_input: 0.0,
            initialized: false,
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: f64) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_lag(mut self, lag: f64) -> Self {
        self.lag = lag;
        self
    }

    pub fn with_hysteresis(mut self, width: f64) -> Self {
        self.hysteresis_width = width;
        self
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }
}

impl FcsComponent for Actuator {
    delegate_base!();

    fn component_type(&self) -> &str {
        "ACTUATOR"
    }

    fn execute(&mut self, store: &PropertyStore, dt: f64) -> f64 {
        if !self.base.enabled || self.base.inputs.is_empty() {
            return self.current_value;
        }

        let mut input = store.get(&self.base.inputs[0]) + self.bias;

        // A change within the half-width is rejected; the previous accepted
        // input holds.
        if self.hysteresis_width > 0.0 {
            let half_width = self.hysteresis_width / 2.0;
            if (input - self.previous_input).abs() < half_width {
                input = self.previous_input;
            }
            self.previous_input = input;
        }

        if !self.initialized {
            self.current_value = 0.0;
            self.target_value = 0.0;
            self.initialized = true;
        }

        if self.rate_limit.is_finite() && self.rate_limit > 0.0 {
            let max_change = self.rate_limit * dt;
            if input > self.target_value + max_change {
                self.target_value += max_change;
            } else if input < self.target_value - max_change {
                self.target_value -= max_change;
            } else {
                self.target_value = input;
            }
        } else {
            self.target_value = input;
        }

        if self.lag > 0.0 {
            let alpha = dt / (self.lag + dt);
            self.current_value += alpha * (self.target_value - self.current_value);
        } else {
            self.current_value = self.target_value;
        }

        if !self.base.output.is_empty() {
            store.set(&self.base.output, self.current_value);
        }
        self.current_value
    }

    fn reset(&mut self) {
        self.current_value = 0.0;
        self.target_value = 0.0;
        self.previous_input = 0.0;
        self.initialized = false;
    }
}

// ============================================================================
// Lag filter
// ============================================================================

/// First-order lag: out += dt/(τ+dt) · (in − out). A non-positive time
/// constant passes the input through.
pub struct LagFilter {
    base: ComponentBase,
    pub time_constant: f64,
    output_value: f64,
    initialized: bool,
}

impl LagFilter {
    pub fn new(name: &str, input: &str, output: &str, time_constant: f64) -> Self {
        Self {
            base: ComponentBase::new(name, vec![input.to_string()], output),
            time_constant,
            output_value: 0.0,
            initialized: false,
        }
    }
}

impl FcsComponent for LagFilter {
    delegate_base!();

    fn component_type(&self) -> &str {
        "LAG_FILTER"
    }

    fn execute(&mut self, store: &PropertyStore, dt: f64) -> f64 {
        if self.base.inputs.is_empty() {
            return 0.0;
        }
        let input = store.get(&self.base.inputs[0]);

        if !self.base.enabled || self.time_constant <= 0.0 {
            if !self.base.output.is_empty() {
                store.set(&self.base.output, input);
            }
            return input;
        }

        if !self.initialized {
            self.output_value = 0.0;
            self.initialized = true;
        }

        let alpha = dt / (self.time_constant + dt);
        self.output_value += alpha * (input - self.output_value);

        if !self.base.output.is_empty() {
            store.set(&self.base.output, self.output_value);
        }
        self.output_value
    }

    fn reset(&mut self) {
        self.output_value = 0.0;
        self.initialized = false;
    }
}

// ============================================================================
// Gain
// ============================================================================

pub struct Gain {
    base: ComponentBase,
    pub gain: f64,
}

impl Gain {
    pub fn new(name: &str, input: &str, output: &str, gain: f64) -> Self {
        Self {
            base: ComponentBase::new(name, vec![input.to_string()], output),
            gain,
        }
    }
}

impl FcsComponent for Gain {
    delegate_base!();

    fn component_type(&self) -> &str {
        "GAIN"
    }

    fn execute(&mut self, store: &PropertyStore, _dt: f64) -> f64 {
        if !self.base.enabled || self.base.inputs.is_empty() {
            return 0.0;
        }
        let output = store.get(&self.base.inputs[0]) * self.gain;
        if !self.base.output.is_empty() {
            store.set(&self.base.output, output);
        }
        output
    }

    fn reset(&mut self) {}
}

// ============================================================================
// Summer
// ============================================================================

/// Signed sum of the inputs plus a constant bias. Inputs without a declared
/// sign add.
pub struct Summer {
    base: ComponentBase,
    pub signs: Vec<f64>,
    pub bias: f64,
}

impl Summer {
    pub fn new(name: &str, inputs: &[&str], output: &str) -> Self {
        let signs = vec![1.0; inputs.len()];
        Self {
            base: ComponentBase::new(
                name,
                inputs.iter().map(|s| s.to_string()).collect(),
                output,
            ),
            signs,
            bias: 0.0,
        }
    }

    pub fn with_signs(mut self, signs: &[f64]) -> Self {
        self.signs = signs.to_vec();
        self
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }
}

impl FcsComponent for Summer {
    delegate_base!();

    fn component_type(&self) -> &str {
        "SUMMER"
    }

    fn execute(&mut self, store: &PropertyStore, _dt: f64) -> f64 {
        if !self.base.enabled {
            return 0.0;
        }
        let mut sum = self.bias;
        for (i, input) in self.base.inputs.iter().enumerate() {
            let sign = self.signs.get(i).copied().unwrap_or(1.0);
            sum += sign * store.get(input);
        }
        if !self.base.output.is_empty() {
            store.set(&self.base.output, sum);
        }
        sum
    }

    fn reset(&mut self) {}
}

// ============================================================================
// Clipper
// ============================================================================

pub struct Clipper {
    base: ComponentBase,
    pub min: f64,
    pub max: f64,
}

impl Clipper {
    pub fn new(name: &str, input: &str, output: &str, min: f64, max: f64) -> Self {
        Self {
            base: ComponentBase::new(name, vec![input.to_string()], output),
            min,
            max,
        }
    }
}

impl FcsComponent for Clipper {
    delegate_base!();

    fn component_type(&self) -> &str {
        "CLIPPER"
    }

    fn execute(&mut self, store: &PropertyStore, _dt: f64) -> f64 {
        if !self.base.enabled || self.base.inputs.is_empty() {
            return 0.0;
        }
        let output = store.get(&self.base.inputs[0]).clamp(self.min, self.max);
        if !self.base.output.is_empty() {
            store.set(&self.base.output, output);
        }
        output
    }

    fn reset(&mut self) {}
}

// ============================================================================
// Switch
// ============================================================================

/// Comparator switch: probe a property against a threshold and emit either
/// the true or false branch. Branches are constants unless an input
/// property overrides them.
pub struct Switch {
    base: ComponentBase,
    pub test_property: String,
    pub comparator: Comparator,
    pub threshold: f64,
    pub true_value: f64,
    pub false_value: f64,
    pub true_input: Option<String>,
    pub false_input: Option<String>,
}

impl Switch {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            base: ComponentBase::new(name, Vec::new(), output),
            test_property: String::new(),
            comparator: Comparator::Gt,
            threshold: 0.0,
            true_value: 1.0,
            false_value: 0.0,
            true_input: None,
            false_input: None,
        }
    }

    pub fn with_test(mut self, property: &str, comparator: Comparator, threshold: f64) -> Self {
        self.test_property = property.to_string();
        self.comparator = comparator;
        self.threshold = threshold;
        self
    }

    pub fn with_values(mut self, true_value: f64, false_value: f64) -> Self {
        self.true_value = true_value;
        self.false_value = false_value;
        self
    }

    /// Branch inputs override the constant values; the inputs list becomes
    /// their union.
    pub fn with_inputs(mut self, true_input: Option<&str>, false_input: Option<&str>) -> Self {
        self.true_input = true_input.map(str::to_string);
        self.false_input = false_input.map(str::to_string);
        self.base.inputs.clear();
        if let Some(input) = &self.true_input {
            self.base.inputs.push(input.clone());
        }
        if let Some(input) = &self.false_input {
            self.base.inputs.push(input.clone());
        }
        self
    }
}

impl FcsComponent for Switch {
    delegate_base!();

    fn component_type(&self) -> &str {
        "SWITCH"
    }

    fn execute(&mut self, store: &PropertyStore, _dt: f64) -> f64 {
        if !self.base.enabled {
            return 0.0;
        }
        let result = if self.test_property.is_empty() {
            false
        } else {
            self.comparator
                .test(store.get(&self.test_property), self.threshold)
        };

        let output = if result {
            match &self.true_input {
                Some(input) => store.get(input),
                None => self.true_value,
            }
        } else {
            match &self.false_input {
                Some(input) => store.get(input),
                None => self.false_value,
            }
        };

        if !self.base.output.is_empty() {
            store.set(&self.base.output, output);
        }
        output
    }

    fn reset(&mut self) {}
}

// ============================================================================
// Deadband
// ============================================================================

/// Suppresses small inputs: zero inside ±width/2, the excess beyond the
/// band edge outside it.
pub struct Deadband {
    base: ComponentBase,
    pub width: f64,
}

impl Deadband {
    pub fn new(name: &str, input: &str, output: &str, width: f64) -> Self {
        Self {
            base: ComponentBase::new(name, vec![input.to_string()], output),
            width,
        }
    }
}

impl FcsComponent for Deadband {
    delegate_base!();

    fn component_type(&self) -> &str {
        "DEADBAND"
    }

    fn execute(&mut self, store: &PropertyStore, _dt: f64) -> f64 {
        if !self.base.enabled || self.base.inputs.is_empty() {
            return 0.0;
        }
        let input = store.get(&self.base.inputs[0]);
        let half = self.width / 2.0;
        let output = if input.abs() <= half {
            0.0
        } else {
            input - half.copysign(input)
        };
        if !self.base.output.is_empty() {
            store.set(&self.base.output, output);
        }
        output
    }

    fn reset(&mut self) {}
}

// ============================================================================
// Scheduled gain
// ============================================================================

/// A gain looked up from a table against a scheduling property, the usual
/// shape of q-bar or Mach gain schedules.
pub struct ScheduledGain {
    base: ComponentBase,
    pub table: LookupTable,
}

impl ScheduledGain {
    pub fn new(name: &str, input: &str, output: &str, table: LookupTable) -> Self {
        Self {
            base: ComponentBase::new(name, vec![input.to_string()], output),
            table,
        }
    }
}

impl FcsComponent for ScheduledGain {
    delegate_base!();

    fn component_type(&self) -> &str {
        "SCHEDULED_GAIN"
    }

    fn execute(&mut self, store: &PropertyStore, _dt: f64) -> f64 {
        if !self.base.enabled || self.base.inputs.is_empty() {
            return 0.0;
        }
        let input = store.get(&self.base.inputs[0]);
        let lookup: Vec<f64> = self
            .table
            .independent_vars
            .iter()
            .map(|var| store.get(var))
            .collect();
        let gain = self.table.interpolate(&lookup).unwrap_or(0.0);
        let output = input * gain;
        if !self.base.output.is_empty() {
            store.set(&self.base.output, output);
        }
        output
    }

    fn reset(&mut self) {}
}

// ============================================================================
// Kinematic
// ============================================================================

/// A kinematic traversal between detent positions, the gear/flap pattern:
/// the output moves toward the commanded detent at the segment's rate
/// rather than jumping.
pub struct Kinematic {
    base: ComponentBase,
    /// (position, traversal time from the previous detent) pairs in
    /// declaration order.
    pub settings: Vec<(f64, f64)>,
    position: f64,
    initialized: bool,
}

impl Kinematic {
    pub fn new(name: &str, input: &str, output: &str, settings: Vec<(f64, f64)>) -> Self {
        Self {
            base: ComponentBase::new(name, vec![input.to_string()], output),
            settings,
            position: 0.0,
            initialized: false,
        }
    }

    /// Traversal rate for the segment containing `position`, from the
    /// detent spacing and the declared segment time.
    fn rate_at(&self, position: f64) -> f64 {
        for pair in self.settings.windows(2) {
            let (lo, _) = pair[0];
            let (hi, time) = pair[1];
            if position >= lo.min(hi) && position <= lo.max(hi) && time > 0.0 {
                return (hi - lo).abs() / time;
            }
        }
        f64::INFINITY
    }
}

impl FcsComponent for Kinematic {
    delegate_base!();

    fn component_type(&self) -> &str {
        "KINEMAT"
    }

    fn execute(&mut self, store: &PropertyStore, dt: f64) -> f64 {
        if !self.base.enabled || self.base.inputs.is_empty() {
            return self.position;
        }
        let target = store.get(&self.base.inputs[0]);

        if !self.initialized {
            self.position = self.settings.first().map(|(p, _)| *p).unwrap_or(0.0);
            self.initialized = true;
        }

        let rate = self.rate_at(self.position);
        if rate.is_finite() {
            let max_change = rate * dt;
            if target > self.position + max_change {
                self.position += max_change;
            } else if target < self.position - max_change {
                self.position -= max_change;
            } else {
                self.position = target;
            }
        } else {
            self.position = target;
        }

        if !self.base.output.is_empty() {
            store.set(&self.base.output, self.position);
        }
        self.position
    }

    fn reset(&mut self) {
        self.position = 0.0;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_actuator_rate_limit_first_step() {
        let store = PropertyStore::new();
        store.set("in", 1.0);
        let mut act = Actuator::new("act", "in", "out").with_rate_limit(10.0);
        let out = act.execute(&store, 0.05);
        assert_relative_eq!(out, 0.5, epsilon = 1e-12);
        assert_relative_eq!(store.get("out"), 0.5);
    }

    #[test]
    fn test_actuator_lag_response() {
        let store = PropertyStore::new();
        store.set("in", 1.0);
        let mut act = Actuator::new("act", "in", "out").with_lag(0.1);

        let first = act.execute(&store, 0.01);
        assert!(first < 0.1, "first step too fast: {first}");

        let mut out = first;
        for _ in 0..99 {
            out = act.execute(&store, 0.01);
        }
        assert!((out - 1.0).abs() < 0.05, "not settled after 100 steps: {out}");
    }

    #[test]
    fn test_actuator_hysteresis_band() {
        let store = PropertyStore::new();
        let mut act = Actuator::new("act", "in", "out").with_hysteresis(0.1);

        store.set("in", 0.5);
        let accepted = act.execute(&store, 0.01);
        assert_relative_eq!(accepted, 0.5);

        // A change of 0.02 sits inside the half-width of 0.05 and is
        // rejected.
        store.set("in", 0.52);
        assert_relative_eq!(act.execute(&store, 0.01), 0.5);

        // A change of 0.3 clears the band.
        store.set("in", 0.8);
        assert_relative_eq!(act.execute(&store, 0.01), 0.8);
    }

    #[test]
    fn test_actuator_reset() {
        let store = PropertyStore::new();
        store.set("in", 1.0);
        let mut act = Actuator::new("act", "in", "out").with_rate_limit(10.0);
        act.execute(&store, 0.05);
        act.reset();
        let out = act.execute(&store, 0.05);
        assert_relative_eq!(out, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_lag_filter_settling_time() {
        // Fine stepping so the discrete update tracks the continuous 3τ
        // settling time.
        let store = PropertyStore::new();
        store.set("in", 1.0);
        let mut lag = LagFilter::new("lag", "in", "out", 0.1);

        let dt = 5.0e-5;
        let mut t = 0.0;
        let mut out = 0.0;
        while t < 0.35 {
            out = lag.execute(&store, dt);
            t += dt;
            if (out - 1.0).abs() <= 0.05 {
                break;
            }
        }
        assert!(t < 0.3, "lag settled to 5% at {t} s (reached {out})");
    }

    #[test]
    fn test_lag_filter_zero_tau_passthrough() {
        let store = PropertyStore::new();
        store.set("in", 0.7);
        let mut lag = LagFilter::new("lag", "in", "out", 0.0);
        assert_relative_eq!(lag.execute(&store, 0.01), 0.7);
    }

    #[test]
    fn test_gain_exact() {
        let store = PropertyStore::new();
        store.set("in", 0.4);
        let mut gain = Gain::new("gain", "in", "out", 2.5);
        assert_eq!(gain.execute(&store, 0.01), 1.0);
    }

    #[test]
    fn test_summer_signs_and_bias() {
        let store = PropertyStore::new();
        store.set("a", 2.0);
        store.set("b", 3.0);
        let mut summer = Summer::new("sum", &["a", "b"], "out")
            .with_signs(&[1.0, -1.0])
            .with_bias(0.5);
        assert_relative_eq!(summer.execute(&store, 0.01), -0.5);
    }

    #[test]
    fn test_clipper() {
        let store = PropertyStore::new();
        let mut clip = Clipper::new("clip", "in", "out", -0.3, 0.3);
        store.set("in", 0.9);
        assert_relative_eq!(clip.execute(&store, 0.01), 0.3);
        store.set("in", -2.0);
        assert_relative_eq!(clip.execute(&store, 0.01), -0.3);
        store.set("in", 0.1);
        assert_relative_eq!(clip.execute(&store, 0.01), 0.1);
    }

    #[test]
    fn test_switch_gt() {
        let store = PropertyStore::new();
        let mut sw = Switch::new("sw", "out")
            .with_test("probe", Comparator::Gt, 0.5)
            .with_values(1.0, 0.0);

        store.set("probe", 0.3);
        assert_relative_eq!(sw.execute(&store, 0.01), 0.0);
        store.set("probe", 0.8);
        assert_relative_eq!(sw.execute(&store, 0.01), 1.0);
    }

    #[test]
    fn test_switch_comparator_matrix() {
        let store = PropertyStore::new();
        store.set("probe", 0.5);
        let cases = [
            (Comparator::Gt, false),
            (Comparator::Lt, false),
            (Comparator::Ge, true),
            (Comparator::Le, true),
            (Comparator::Eq, true),
            (Comparator::Ne, false),
        ];
        for (comparator, expected) in cases {
            let mut sw = Switch::new("sw", "out")
                .with_test("probe", comparator, 0.5)
                .with_values(1.0, 0.0);
            let result = sw.execute(&store, 0.01) == 1.0;
            assert_eq!(result, expected, "comparator {comparator:?}");
        }
    }

    #[test]
    fn test_deadband_suppresses_small_inputs() {
        let store = PropertyStore::new();
        let mut db = Deadband::new("db", "in", "out", 0.2);
        store.set("in", 0.05);
        assert_relative_eq!(db.execute(&store, 0.01), 0.0);
        store.set("in", 0.5);
        assert_relative_eq!(db.execute(&store, 0.01), 0.4);
        store.set("in", -0.5);
        assert_relative_eq!(db.execute(&store, 0.01), -0.4);
    }

    #[test]
    fn test_scheduled_gain_tracks_table() {
        use crate::config::table::{Table1D, TableData};
        let store = PropertyStore::new();
        let table = LookupTable {
            name: String::new(),
            independent_vars: vec!["aero/qbar-psf".into()],
            lookup_types: vec!["row".into()],
            data: TableData::OneD(Table1D {
                indices: vec![0.0, 100.0],
                values: vec![1.0, 0.5],
            }),
        };
        let mut sg = ScheduledGain::new("sg", "in", "out", table);
        store.set("in", 2.0);
        store.set("aero/qbar-psf", 50.0);
        assert_relative_eq!(sg.execute(&store, 0.01), 1.5);
    }

    #[test]
    fn test_kinematic_traverses_at_segment_rate() {
        let store = PropertyStore::new();
        // Two detents: 0 to 1 over 5 seconds.
        let mut kin = Kinematic::new("gear", "cmd", "pos", vec![(0.0, 0.0), (1.0, 5.0)]);
        store.set("cmd", 1.0);

        let mut position = 0.0;
        for _ in 0..10 {
            position = kin.execute(&store, 0.1);
        }
        // One second in: a fifth of the way.
        assert_relative_eq!(position, 0.2, epsilon = 1e-9);

        for _ in 0..50 {
            position = kin.execute(&store, 0.1);
        }
        assert_relative_eq!(position, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_switch_input_branches() {
        let store = PropertyStore::new();
        store.set("probe", 1.0);
        store.set("hot", 7.5);
        store.set("cold", -2.5);
        let mut sw = Switch::new("sw", "out")
            .with_test("probe", Comparator::Gt, 0.5)
            .with_inputs(Some("hot"), Some("cold"));
        assert_eq!(sw.inputs().len(), 2);
        assert_relative_eq!(sw.execute(&store, 0.01), 7.5);
        store.set("probe", 0.0);
        assert_relative_eq!(sw.execute(&store, 0.01), -2.5);
    }
}

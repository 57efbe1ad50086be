//! Process-wide keyed store of floating-point signals.
//!
//! The store is the communication medium between the FCS graph, the
//! propulsion stage, and the aerodynamic function evaluator. It is owned by
//! the engine (never a global); multiple engines each carry their own.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::trace;

type Listener = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// String-keyed f64 store with alias resolution and change listeners.
///
/// Reads of names that were never written return 0.0. Writes that change a
/// value notify listeners on a detached thread, off the write lock.
pub struct PropertyStore {
    properties: RwLock<HashMap<String, f64>>,
    aliases: RwLock<HashMap<String, String>>,
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyStore {
    /// Create a store preloaded with the standard property catalog so
    /// readers of never-written names still see a defined zero.
    pub fn new() -> Self {
        let store = Self {
            properties: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            listeners: RwLock::new(HashMap::new()),
        };
        store.initialize_standard_properties();
        store
    }

    fn initialize_standard_properties(&self) {
        let standard = [
            // Pilot commands (normalized)
            "fcs/aileron-cmd-norm",
            "fcs/elevator-cmd-norm",
            "fcs/rudder-cmd-norm",
            "fcs/throttle-cmd-norm",
            "fcs/flap-cmd-norm",
            "fcs/speedbrake-cmd-norm",
            "fcs/gear-cmd-norm",
            "fcs/mixture-cmd-norm",
            // Control surface positions (actuator outputs)
            "fcs/left-aileron-pos-rad",
            "fcs/right-aileron-pos-rad",
            "fcs/elevator-pos-rad",
            "fcs/rudder-pos-rad",
            "fcs/flap-pos-norm",
            "fcs/speedbrake-pos-norm",
            // Airspeeds and flow angles
            "velocities/vt-fps",
            "velocities/vc-kts",
            "velocities/ve-kts",
            "velocities/mach",
            "velocities/alpha-rad",
            "velocities/beta-rad",
            // Angular rates
            "velocities/p-rad_sec",
            "velocities/q-rad_sec",
            "velocities/r-rad_sec",
            // Position and attitude
            "position/h-sl-ft",
            "attitude/phi-rad",
            "attitude/theta-rad",
            "attitude/psi-rad",
            // Atmosphere
            "atmosphere/rho",
            "atmosphere/pressure-psf",
            "atmosphere/temperature-R",
            "atmosphere/density-slugft3",
            // Forces and moments
            "forces/fbx-lbs",
            "forces/fby-lbs",
            "forces/fbz-lbs",
            "moments/l-lbsft",
            "moments/m-lbsft",
            "moments/n-lbsft",
        ];
        let mut props = self.properties.write().expect("property lock poisoned");
        for name in standard {
            props.insert(name.to_string(), 0.0);
        }
    }

    fn resolve(&self, name: &str) -> String {
        let aliases = self.aliases.read().expect("alias lock poisoned");
        aliases.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    /// Write a value. If the value changed, listeners registered for the
    /// resolved name fire asynchronously.
    pub fn set(&self, name: &str, value: f64) {
        let resolved = self.resolve(name);
        let changed = {
            let mut props = self.properties.write().expect("property lock poisoned");
            let old = props.insert(resolved.clone(), value);
            old != Some(value)
        };

        if changed {
            let to_fire: Vec<Listener> = {
                let listeners = self.listeners.read().expect("listener lock poisoned");
                listeners.get(&resolved).cloned().unwrap_or_default()
            };
            if !to_fire.is_empty() {
                let name_owned = resolved.clone();
                std::thread::spawn(move || {
                    for listener in to_fire {
                        listener(&name_owned, value);
                    }
                });
            }
            trace!(property = %resolved, value, "property updated");
        }
    }

    /// Read a value; unknown names read as 0.0.
    pub fn get(&self, name: &str) -> f64 {
        let resolved = self.resolve(name);
        let props = self.properties.read().expect("property lock poisoned");
        props.get(&resolved).copied().unwrap_or(0.0)
    }

    /// Read a value with an existence flag.
    pub fn get_checked(&self, name: &str) -> Option<f64> {
        let resolved = self.resolve(name);
        let props = self.properties.read().expect("property lock poisoned");
        props.get(&resolved).copied()
    }

    /// Register `alias` as another name for `target`. Single indirection
    /// only; an alias chain or cycle is rejected.
    pub fn set_alias(&self, alias: &str, target: &str) -> bool {
        if alias == target {
            return false;
        }
        let mut aliases = self.aliases.write().expect("alias lock poisoned");
        // Reject chains: the target must itself be a primary name, and
        // nothing may already alias to the new alias.
        if aliases.contains_key(target) || aliases.values().any(|t| t == alias) {
            return false;
        }
        aliases.insert(alias.to_string(), target.to_string());
        true
    }

    /// Register a change listener for a property name.
    pub fn add_listener<F>(&self, name: &str, listener: F)
    where
        F: Fn(&str, f64) + Send + Sync + 'static,
    {
        let resolved = self.resolve(name);
        let mut listeners = self.listeners.write().expect("listener lock poisoned");
        listeners.entry(resolved).or_default().push(Arc::new(listener));
    }

    /// All property names, sorted for deterministic iteration.
    pub fn names(&self) -> Vec<String> {
        let props = self.properties.read().expect("property lock poisoned");
        let mut names: Vec<String> = props.keys().cloned().collect();
        names.sort();
        names
    }

    /// Properties whose names start with `prefix`, sorted by name.
    pub fn with_prefix(&self, prefix: &str) -> Vec<(String, f64)> {
        let props = self.properties.read().expect("property lock poisoned");
        let mut out: Vec<(String, f64)> = props
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let props = self.properties.read().expect("property lock poisoned");
        f.debug_struct("PropertyStore")
            .field("properties", &props.len())
            .finish()
    }
}

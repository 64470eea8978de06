use std::collections::HashMap;

use kube::api::DynamicObject;
use serde_json::{Map, Value};

/// Pre-write reconciliation of a single field, copying server-assigned state
/// from the stored object into the desired one.
pub type RetainFn = fn(&mut DynamicObject, &DynamicObject);

/// Kind-keyed registry of pre-write field reconciliation functions. The
/// engine consults it once per apply, between reading the stored object and
/// deciding whether to write; registering a kind here is the only way to add
/// kind-specific behavior to the engine.
pub struct RetentionRegistry {
    retainers: HashMap<String, RetainFn>,
}

impl RetentionRegistry {
    pub fn empty() -> RetentionRegistry {
        RetentionRegistry {
            retainers: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: impl Into<String>, retain: RetainFn) {
        self.retainers.insert(kind.into(), retain);
    }

    /// Runs the retainer registered for the desired object's kind, if any.
    /// Dispatches only when both objects agree on the kind.
    pub fn retain(&self, desired: &mut DynamicObject, existing: &DynamicObject) {
        let Some(kind) = desired.types.as_ref().map(|t| t.kind.clone()) else {
            return;
        };
        if existing.types.as_ref().map(|t| t.kind.as_str()) != Some(kind.as_str()) {
            return;
        }
        if let Some(retain) = self.retainers.get(&kind) {
            retain(desired, existing);
        }
    }
}

impl Default for RetentionRegistry {
    fn default() -> Self {
        let mut registry = RetentionRegistry::empty();
        registry.register("Service", retain_cluster_ip);
        registry
    }
}

/// The store assigns `spec.clusterIP` on creation and rejects updates that
/// blank it. Carry the stored address over whenever the desired object does
/// not name one of its own.
pub fn retain_cluster_ip(desired: &mut DynamicObject, existing: &DynamicObject) {
    let path = ["spec", "clusterIP"];
    let Some(existing_ip) = nested_str(&existing.data, &path).filter(|ip| !ip.is_empty()) else {
        return;
    };
    let unset = nested_str(&desired.data, &path).map_or(true, str::is_empty);
    if unset {
        let existing_ip = existing_ip.to_string();
        set_nested_str(&mut desired.data, &path, &existing_ip);
    }
}

fn nested_str<'a>(data: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = data;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}

fn set_nested_str(data: &mut Value, path: &[&str], value: &str) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };
    let mut current = data;
    for segment in parents {
        let Some(map) = current.as_object_mut() else {
            return;
        };
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(leaf.to_string(), Value::String(value.to_string()));
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{DynamicObject, GroupVersionKind};
use serde_json::Value;

use super::dynamic_object_ext::DynamicObjectExt;
use super::store::{NamespacedName, ObjectStore, StoreError};

/// In-memory store with the write semantics the engine depends on: one
/// monotonically increasing resource-version counter shared by all objects,
/// uid assignment on first write, and a generation that only moves when the
/// non-status payload of an update differs from what is stored.
pub struct MemoryStore {
    resources: DashMap<GroupVersionKind, DashMap<NamespacedName, DynamicObject>>,
    resource_versions: AtomicU64,
    resource_uids: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            resources: DashMap::new(),
            resource_versions: AtomicU64::new(1),
            resource_uids: AtomicU64::new(1),
        }
    }

    fn next_resource_version(&self) -> String {
        self.resource_versions
            .fetch_add(1, Ordering::AcqRel)
            .to_string()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        name: &NamespacedName,
    ) -> Result<Option<DynamicObject>, StoreError> {
        Ok(self
            .resources
            .get(gvk)
            .and_then(|kind| kind.get(name).map(|entry| entry.clone())))
    }

    async fn create(&self, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let gvk = object.get_gvk()?;
        let name = object.get_namespaced_name();
        let kind = self.resources.entry(gvk).or_default();
        if kind.contains_key(&name) {
            return Err(StoreError::Invariant(anyhow!(
                "resource {name} already exists"
            )));
        }

        let mut stored = object.clone();
        stored.metadata.resource_version = Some(self.next_resource_version());
        stored.metadata.uid = Some(self.resource_uids.fetch_add(1, Ordering::AcqRel).to_string());
        stored.metadata.generation = Some(1);
        stored.metadata.creation_timestamp = Some(Time(Utc::now()));
        kind.insert(name, stored.clone());
        Ok(stored)
    }

    async fn update(&self, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let gvk = object.get_gvk()?;
        let name = object.get_namespaced_name();
        let kind = self
            .resources
            .get(&gvk)
            .ok_or_else(|| anyhow!("no resources of kind {} stored", gvk.kind))?;
        let mut entry = kind
            .get_mut(&name)
            .ok_or_else(|| anyhow!("resource {name} does not exist"))?;
        let current = entry.value_mut();

        if object.metadata.resource_version != current.metadata.resource_version {
            return Err(StoreError::Conflict);
        }

        let mut stored = object.clone();
        stored.metadata.resource_version = Some(self.next_resource_version());
        stored.metadata.uid = current.metadata.uid.clone();
        stored.metadata.creation_timestamp = current.metadata.creation_timestamp.clone();
        let generation = current.metadata.generation.unwrap_or(1);
        stored.metadata.generation = Some(if payload_changed(current, &stored) {
            generation + 1
        } else {
            generation
        });
        *current = stored.clone();
        Ok(stored)
    }
}

fn payload_changed(current: &DynamicObject, updated: &DynamicObject) -> bool {
    non_status(&current.data) != non_status(&updated.data)
}

fn non_status(data: &Value) -> Value {
    let mut data = data.clone();
    if let Some(map) = data.as_object_mut() {
        map.remove("status");
    }
    data
}

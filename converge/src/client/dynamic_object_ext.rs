use anyhow::{anyhow, Result};
use kube::api::{DynamicObject, GroupVersionKind};
use kube::ResourceExt;

use super::store::NamespacedName;

pub trait DynamicObjectExt {
    fn get_gvk(&self) -> Result<GroupVersionKind>;
    fn get_namespaced_name(&self) -> NamespacedName;
}

impl DynamicObjectExt for DynamicObject {
    fn get_namespaced_name(&self) -> NamespacedName {
        NamespacedName::new(self.namespace().unwrap_or_default(), self.name_any())
    }

    fn get_gvk(&self) -> Result<GroupVersionKind> {
        let types = self
            .types
            .as_ref()
            .ok_or_else(|| anyhow!("resource carries no apiVersion/kind"))?;

        // Core-group kinds use a bare version as apiVersion.
        let (group, version) = match types.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", types.api_version.as_str()),
        };

        Ok(GroupVersionKind::gvk(group, version, &types.kind))
    }
}

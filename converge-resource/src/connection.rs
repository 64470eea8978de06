use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, CONDITION_READY, STATUS_TRUE};

/// A registered connection to a remote cluster. The secret referenced by
/// `secret_ref` holds the kubeconfig used to reach `api_endpoint`; health
/// probes record their outcome into the status conditions.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    kind = "ClusterConnection",
    group = "converge.dev",
    version = "v1alpha1",
    status = "ClusterConnectionStatus",
    shortname = "clusterconn",
    plural = "clusterconnections",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConnectionSpec {
    pub api_endpoint: String,
    pub secret_ref: SecretRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<String>,
}

#[derive(Clone, Deserialize, Debug, Eq, JsonSchema, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConnectionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ClusterConnectionStatus {
    /// True when a Ready-type condition reports status True.
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.r#type == CONDITION_READY && c.status == STATUS_TRUE)
    }

    pub fn set_condition(&mut self, condition: Condition) {
        for existing in &mut self.conditions {
            if existing.r#type == condition.r#type {
                if existing != &condition {
                    *existing = condition;
                }
                return;
            }
        }
        self.conditions.push(condition);
    }

    pub fn condition(&self, r#type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == r#type)
    }
}

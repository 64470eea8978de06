use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CONDITION_READY: &str = "Ready";

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";

/// A single entry of a resource's `status.conditions` list.
///
/// `last_transition_time` and `last_probe_time` are managed by whoever writes
/// the condition back to the store, not by the code that derives it.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_probe_time: Option<Time>,
}

pub fn ready_condition(reason: &str) -> Condition {
    Condition {
        r#type: CONDITION_READY.into(),
        status: STATUS_TRUE.into(),
        reason: Some(reason.into()),
        message: None,
        last_transition_time: None,
        last_probe_time: None,
    }
}

pub fn error_condition(reason: &str, message: impl Into<String>) -> Condition {
    Condition {
        r#type: CONDITION_READY.into(),
        status: STATUS_FALSE.into(),
        reason: Some(reason.into()),
        message: Some(message.into()),
        last_transition_time: None,
        last_probe_time: None,
    }
}

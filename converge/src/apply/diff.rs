use std::collections::BTreeMap;

use kube::api::DynamicObject;
use serde_json::Value;

use super::options::ApplyOptions;

/// Annotation recording the serialized configuration that was last applied.
/// Its value is an opaque document owned by this engine.
pub const LAST_APPLIED_ANNOTATION: &str = "converge.dev/last-applied-configuration";

/// Outcome of the change detector, carrying the object prepared for the
/// write when one is needed.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyAction {
    Create { object: DynamicObject },
    Update { object: DynamicObject },
    Skip,
}

/// Serialize the desired object the way it is recorded in the last-applied
/// annotation: as-is, minus the annotation key itself. Stripping the key
/// keeps the snapshot stable when a caller replays an object that already
/// carries it.
pub fn last_applied_configuration(object: &DynamicObject) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(object)?;
    strip_applied_annotation(&mut value);
    serde_json::to_string(&value)
}

/// Decide between create, update and skip.
///
/// The two diff strategies are mutually exclusive: forced mode compares the
/// full structure of desired and stored object and never consults the
/// annotation; default mode compares `new_configuration` against the stored
/// annotation value and never compares structures. `desired` must already
/// have field retention applied; `new_configuration` is the snapshot taken
/// before any engine mutation.
pub fn needs_write(
    desired: &DynamicObject,
    existing: Option<&DynamicObject>,
    new_configuration: &str,
    opts: &ApplyOptions,
) -> Result<ApplyAction, serde_json::Error> {
    let Some(existing) = existing else {
        let mut object = desired.clone();
        if opts.save_configuration {
            set_last_applied(&mut object, new_configuration);
        }
        return Ok(ApplyAction::Create { object });
    };

    if opts.force_update {
        let mut candidate = desired.clone();
        copy_server_metadata(&mut candidate, existing);
        if structurally_equal(&candidate, existing)? {
            return Ok(ApplyAction::Skip);
        }
        prepare_update(&mut candidate, existing, new_configuration, opts);
        return Ok(ApplyAction::Update { object: candidate });
    }

    let recorded = existing
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(LAST_APPLIED_ANNOTATION));
    if recorded.map(String::as_str) == Some(new_configuration) {
        return Ok(ApplyAction::Skip);
    }

    let mut candidate = desired.clone();
    candidate.metadata.resource_version = existing.metadata.resource_version.clone();
    prepare_update(&mut candidate, existing, new_configuration, opts);
    Ok(ApplyAction::Update { object: candidate })
}

fn prepare_update(
    candidate: &mut DynamicObject,
    existing: &DynamicObject,
    new_configuration: &str,
    opts: &ApplyOptions,
) {
    if opts.save_configuration {
        set_last_applied(candidate, new_configuration);
    }
    // Owner references recorded on the stored object are never nil-ed out.
    let empty = candidate
        .metadata
        .owner_references
        .as_ref()
        .map_or(true, Vec::is_empty);
    if empty {
        candidate.metadata.owner_references = existing.metadata.owner_references.clone();
    }
}

fn set_last_applied(object: &mut DynamicObject, configuration: &str) {
    object
        .metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(LAST_APPLIED_ANNOTATION.to_string(), configuration.to_string());
}

fn copy_server_metadata(candidate: &mut DynamicObject, existing: &DynamicObject) {
    candidate.metadata.resource_version = existing.metadata.resource_version.clone();
    candidate.metadata.uid = existing.metadata.uid.clone();
    candidate.metadata.generation = existing.metadata.generation;
    candidate.metadata.creation_timestamp = existing.metadata.creation_timestamp.clone();
    candidate.metadata.managed_fields = existing.metadata.managed_fields.clone();
}

fn structurally_equal(
    candidate: &DynamicObject,
    existing: &DynamicObject,
) -> Result<bool, serde_json::Error> {
    let mut left = serde_json::to_value(candidate)?;
    let mut right = serde_json::to_value(existing)?;
    strip_applied_annotation(&mut left);
    strip_applied_annotation(&mut right);
    Ok(left == right)
}

fn strip_applied_annotation(value: &mut Value) {
    let Some(metadata) = value.get_mut("metadata").and_then(Value::as_object_mut) else {
        return;
    };
    let now_empty = match metadata
        .get_mut("annotations")
        .and_then(Value::as_object_mut)
    {
        Some(annotations) => {
            annotations.remove(LAST_APPLIED_ANNOTATION);
            annotations.is_empty()
        }
        None => false,
    };
    if now_empty {
        metadata.remove("annotations");
    }
}

use std::collections::BTreeMap;
use std::future::Future;

use kube::api::DynamicObject;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::dynamic_object_ext::DynamicObjectExt;
use crate::client::store::{ObjectStore, StoreError};

use super::diff::{last_applied_configuration, needs_write, ApplyAction};
use super::merge;
use super::options::ApplyOptions;
use super::retain::RetentionRegistry;

#[derive(thiserror::Error, Debug)]
pub enum ApplyError {
    #[error("unable to get the resource: {0}")]
    Get(#[source] StoreError),

    #[error("unable to create the resource: {0}")]
    Create(#[source] StoreError),

    #[error("unable to update the resource: {0}")]
    Update(#[source] StoreError),

    #[error("unable to serialize the resource: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed resource: {0}")]
    Invariant(#[from] anyhow::Error),

    #[error("the operation was cancelled")]
    Cancelled,
}

/// The apply engine. Stateless and reentrant: every call reads the stored
/// object fresh and performs at most one write, guarded by the store's
/// resource-version check. Conflict errors are surfaced, never retried here.
pub struct ApplyClient<S> {
    store: S,
    retention: RetentionRegistry,
}

impl<S: ObjectStore> ApplyClient<S> {
    pub fn new(store: S) -> ApplyClient<S> {
        ApplyClient {
            store,
            retention: RetentionRegistry::default(),
        }
    }

    pub fn with_retention(store: S, retention: RetentionRegistry) -> ApplyClient<S> {
        ApplyClient { store, retention }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply a typed object. The object is round-tripped through the
    /// schema-less representation and mutated in place with whatever the
    /// store returned (labels, annotations, generation, resource version).
    pub async fn apply_object<K>(
        &self,
        token: &CancellationToken,
        object: &mut K,
        opts: &ApplyOptions,
    ) -> Result<bool, ApplyError>
    where
        K: Resource + Serialize + DeserializeOwned,
        K::DynamicType: Default,
    {
        let mut dynamic = to_dynamic(&*object)?;
        let changed = self.apply_dynamic(token, &mut dynamic, opts).await?;
        *object = serde_json::from_value(serde_json::to_value(&dynamic)?)?;
        Ok(changed)
    }

    /// Apply a schema-less object: read the stored state, run field
    /// retention and owner stamping, then create, update or skip as the
    /// change detector decides. Returns whether a write happened.
    pub async fn apply_dynamic(
        &self,
        token: &CancellationToken,
        object: &mut DynamicObject,
        opts: &ApplyOptions,
    ) -> Result<bool, ApplyError> {
        let gvk = object.get_gvk()?;
        let name = object.get_namespaced_name();
        let new_configuration = last_applied_configuration(object)?;

        let existing = cancellable(token, self.store.get(&gvk, &name))
            .await?
            .map_err(ApplyError::Get)?;

        if let Some(existing) = &existing {
            self.retention.retain(object, existing);
        }
        if let Some(owner) = &opts.owner {
            object
                .metadata
                .owner_references
                .get_or_insert_with(Vec::new)
                .push(owner.clone());
        }

        match needs_write(object, existing.as_ref(), &new_configuration, opts)? {
            ApplyAction::Create { object: desired } => {
                debug!(kind = %gvk.kind, %name, "creating resource");
                let stored = cancellable(token, self.store.create(&desired))
                    .await?
                    .map_err(ApplyError::Create)?;
                *object = stored;
                Ok(true)
            }
            ApplyAction::Update { object: desired } => {
                debug!(kind = %gvk.kind, %name, "updating resource");
                let stored = cancellable(token, self.store.update(&desired))
                    .await?
                    .map_err(ApplyError::Update)?;
                *object = stored;
                Ok(true)
            }
            ApplyAction::Skip => Ok(false),
        }
    }

    /// Apply a set of schema-less objects in the given order, merging
    /// `labels` into each before applying with default options. Returns
    /// whether any object changed; the first error halts the batch, leaving
    /// earlier objects applied.
    pub async fn apply(
        &self,
        token: &CancellationToken,
        objects: Vec<DynamicObject>,
        labels: &BTreeMap<String, String>,
    ) -> Result<bool, ApplyError> {
        let opts = ApplyOptions::default();
        let mut changed = false;
        for mut object in objects {
            merge::merge(&mut object.metadata.labels, labels);
            changed |= self.apply_dynamic(token, &mut object, &opts).await?;
        }
        Ok(changed)
    }
}

/// Convert a typed object into the schema-less representation, injecting the
/// apiVersion/kind the type only knows statically.
pub fn to_dynamic<K>(object: &K) -> Result<DynamicObject, ApplyError>
where
    K: Resource + Serialize,
    K::DynamicType: Default,
{
    let dt = K::DynamicType::default();
    let mut value = serde_json::to_value(object)?;
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "apiVersion".to_string(),
            Value::String(K::api_version(&dt).into_owned()),
        );
        map.insert("kind".to_string(), Value::String(K::kind(&dt).into_owned()));
    }
    Ok(serde_json::from_value(value)?)
}

/// Race a store call against the caller's cancellation signal.
async fn cancellable<T>(
    token: &CancellationToken,
    operation: impl Future<Output = T>,
) -> Result<T, ApplyError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApplyError::Cancelled),
        result = operation => Ok(result),
    }
}

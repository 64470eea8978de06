use std::fmt;

use async_trait::async_trait;
use kube::api::{DynamicObject, GroupVersionKind};
use kube::config::{InferConfigError, KubeconfigError};

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Configuration Error: {0}")]
    Configuration(#[from] BoxedError),

    #[error("Kube Error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Resource Format Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invariant Error: {0}")]
    Invariant(#[from] anyhow::Error),

    #[error("Resource version conflict")]
    Conflict,
}

impl From<InferConfigError> for StoreError {
    fn from(value: InferConfigError) -> Self {
        StoreError::Configuration(Box::new(value))
    }
}

impl From<KubeconfigError> for StoreError {
    fn from(value: KubeconfigError) -> Self {
        StoreError::Configuration(Box::new(value))
    }
}

/// Identity of an object inside its kind. The namespace is empty for
/// cluster-scoped kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        NamespacedName {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The remote store primitives the apply engine is written against.
///
/// `update` must check the object's resource version against the stored one
/// and fail with [`StoreError::Conflict`] on a mismatch. Both writes return
/// the stored representation so callers can observe server-stamped fields.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        name: &NamespacedName,
    ) -> Result<Option<DynamicObject>, StoreError>;

    async fn create(&self, object: &DynamicObject) -> Result<DynamicObject, StoreError>;

    async fn update(&self, object: &DynamicObject) -> Result<DynamicObject, StoreError>;
}

use anyhow::Context;
use async_trait::async_trait;
use kube::api::{DynamicObject, GroupVersionKind, PostParams};
use kube::{Api, Error};

use crate::config::KubeConfiguration;

use super::dynamic_object_ext::DynamicObjectExt;
use super::store::{NamespacedName, ObjectStore, StoreError};

/// Store client backed by a real Kubernetes API server. Writes dispatch
/// generically by the object's group/version/kind.
#[derive(Clone)]
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    pub async fn build(config: &KubeConfiguration) -> Result<KubeClient, StoreError> {
        let kube_config = KubeClient::to_kube_config(config).await?;
        let client = kube::Client::try_from(kube_config)
            .context("failed to create kube client")
            .map_err(StoreError::Invariant)?;
        Ok(KubeClient { client })
    }

    /// Wrap an already-built client, e.g. one backed by a mock service in
    /// tests.
    pub fn from_client(client: kube::Client) -> KubeClient {
        KubeClient { client }
    }

    async fn to_kube_config(config: &KubeConfiguration) -> Result<kube::config::Config, StoreError> {
        match config {
            KubeConfiguration::InCluster => Ok(kube::config::Config::infer().await?),
            KubeConfiguration::External(external) => {
                let options = kube::config::KubeConfigOptions {
                    context: external.kube_context.clone(),
                    ..Default::default()
                };
                Ok(kube::config::Config::from_kubeconfig(&options).await?)
            }
        }
    }

    async fn api_for(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
    ) -> Result<Api<DynamicObject>, StoreError> {
        let (ar, _caps) = kube::discovery::pinned_kind(&self.client, gvk).await?;
        let api = if namespace.is_empty() {
            Api::all_with(self.client.clone(), &ar)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &ar)
        };
        Ok(api)
    }
}

#[async_trait]
impl ObjectStore for KubeClient {
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        name: &NamespacedName,
    ) -> Result<Option<DynamicObject>, StoreError> {
        let api = self.api_for(gvk, &name.namespace).await?;
        match api.get(&name.name).await {
            Ok(object) => Ok(Some(object)),
            Err(error) if object_not_found(&error) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn create(&self, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let gvk = object.get_gvk()?;
        let name = object.get_namespaced_name();
        let api = self.api_for(&gvk, &name.namespace).await?;
        api.create(&PostParams::default(), object)
            .await
            .map_err(into_write_error)
    }

    async fn update(&self, object: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let gvk = object.get_gvk()?;
        let name = object.get_namespaced_name();
        let api = self.api_for(&gvk, &name.namespace).await?;
        api.replace(&name.name, &PostParams::default(), object)
            .await
            .map_err(into_write_error)
    }
}

pub fn object_not_found(error: &Error) -> bool {
    matches!(error, Error::Api(response) if response.reason == "NotFound")
}

fn into_write_error(error: Error) -> StoreError {
    match &error {
        Error::Api(response) if response.reason == "Conflict" => StoreError::Conflict,
        _ => StoreError::Kube(error),
    }
}

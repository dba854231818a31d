// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::target_gvk;
use crate::crds::Substitute;
use crate::error::StoreError;
use async_trait::async_trait;
use k8s_openapi::api::autoscaling::v1::{CrossVersionObjectReference, Scale};
use kube::{
    api::{Api, DynamicObject, ListParams, PostParams},
    discovery, Client,
};
use std::future::Future;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Access to Substitute objects in the cluster.
///
/// The reconciler only ever sees this trait, so tests swap in an in-memory
/// store or a mock.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubstituteStore: Send + Sync {
    /// List the Substitutes in `namespace` that match `label_selector`.
    async fn list(&self, namespace: &str, label_selector: &str)
        -> Result<Vec<Substitute>, StoreError>;

    async fn create(&self, substitute: &Substitute) -> Result<Substitute, StoreError>;

    /// Replace the stored object. The request carries the object's
    /// `metadata.resourceVersion`, so a stale copy fails with `StoreError::Conflict`.
    async fn update(&self, substitute: &Substitute) -> Result<Substitute, StoreError>;
}

/// Reads the scale subresource of whatever an autoscaler targets.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScaleSource: Send + Sync {
    async fn get_scale(
        &self,
        namespace: &str,
        target: &CrossVersionObjectReference,
    ) -> Result<Scale, StoreError>;
}

pub struct KubeSubstituteStore {
    client: Client,
    timeout: Duration,
}

impl KubeSubstituteStore {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl SubstituteStore for KubeSubstituteStore {
    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Substitute>, StoreError> {
        let api = Api::<Substitute>::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().labels(label_selector);
        let list = with_timeout(self.timeout, api.list(&lp)).await?;
        Ok(list.items)
    }

    async fn create(&self, substitute: &Substitute) -> Result<Substitute, StoreError> {
        let namespace = substitute
            .metadata
            .namespace
            .as_ref()
            .ok_or(StoreError::MissingObjectKey(".metadata.namespace"))?;
        let api = Api::<Substitute>::namespaced(self.client.clone(), namespace);
        with_timeout(self.timeout, api.create(&PostParams::default(), substitute)).await
    }

    async fn update(&self, substitute: &Substitute) -> Result<Substitute, StoreError> {
        let namespace = substitute
            .metadata
            .namespace
            .as_ref()
            .ok_or(StoreError::MissingObjectKey(".metadata.namespace"))?;
        let name = substitute
            .metadata
            .name
            .as_ref()
            .ok_or(StoreError::MissingObjectKey(".metadata.name"))?;
        let api = Api::<Substitute>::namespaced(self.client.clone(), namespace);
        with_timeout(
            self.timeout,
            api.replace(name, &PostParams::default(), substitute),
        )
        .await
    }
}

pub struct KubeScaleSource {
    client: Client,
    timeout: Duration,
}

impl KubeScaleSource {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl ScaleSource for KubeScaleSource {
    async fn get_scale(
        &self,
        namespace: &str,
        target: &CrossVersionObjectReference,
    ) -> Result<Scale, StoreError> {
        // Discovery knows the real plural, which the kind alone does not.
        let (api_resource, _) = with_timeout(
            self.timeout,
            discovery::pinned_kind(&self.client, &target_gvk(target)),
        )
        .await?;
        let api = Api::<DynamicObject>::namespaced_with(self.client.clone(), namespace, &api_resource);
        with_timeout(self.timeout, api.get_scale(&target.name)).await
    }
}

// Dropping the request future aborts the round trip.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, request: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, kube::Error>>,
{
    tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
        .map_err(StoreError::from)
}

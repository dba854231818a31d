// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::crds::*;
use crate::error::StoreError;
use crate::events::{EventSink, Severity};
use async_trait::async_trait;
use k8s_openapi::api::autoscaling::v1::{CrossVersionObjectReference, Scale, ScaleSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::sync::Mutex;

/// An in-memory object store with the semantics the reconciler depends on:
/// label selection, resource versions and conflict detection.
#[derive(Default)]
pub struct FakeSubstituteStore {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    objects: Vec<Substitute>,
    next_version: u64,
    lists: usize,
    creates: usize,
    updates: usize,
}

impl FakeState {
    fn next_resource_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

impl FakeSubstituteStore {
    pub fn with_objects(objects: Vec<Substitute>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for mut obj in objects {
                let rv = state.next_resource_version();
                obj.metadata.resource_version.get_or_insert(rv);
                state.objects.push(obj);
            }
        }
        store
    }

    pub fn objects(&self) -> Vec<Substitute> {
        self.state.lock().unwrap().objects.clone()
    }

    pub fn lists(&self) -> usize {
        self.state.lock().unwrap().lists
    }

    pub fn creates(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn updates(&self) -> usize {
        self.state.lock().unwrap().updates
    }

    /// Simulates a write by someone else, leaving every copy read before stale.
    pub fn touch(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let rv = state.next_resource_version();
        if let Some(obj) = state
            .objects
            .iter_mut()
            .find(|o| o.metadata.name.as_deref() == Some(name))
        {
            obj.metadata.resource_version = Some(rv);
        }
    }
}

fn same_key(a: &Substitute, b: &Substitute) -> bool {
    a.metadata.namespace == b.metadata.namespace && a.metadata.name == b.metadata.name
}

fn matches_selector(obj: &Substitute, selector: &str) -> bool {
    let labels = obj.metadata.labels.clone().unwrap_or_default();
    selector
        .split(',')
        .all(|requirement| match requirement.split_once('=') {
            Some((key, value)) => labels.get(key).map(String::as_str) == Some(value),
            None => false,
        })
}

#[async_trait]
impl crate::store::SubstituteStore for FakeSubstituteStore {
    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Substitute>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.lists += 1;
        Ok(state
            .objects
            .iter()
            .filter(|o| o.metadata.namespace.as_deref() == Some(namespace))
            .filter(|o| matches_selector(o, label_selector))
            .cloned()
            .collect())
    }

    async fn create(&self, substitute: &Substitute) -> Result<Substitute, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.creates += 1;
        if state.objects.iter().any(|o| same_key(o, substitute)) {
            return Err(StoreError::AlreadyExists(
                substitute.metadata.name.clone().unwrap_or_default(),
            ));
        }
        let mut created = substitute.clone();
        created.metadata.resource_version = Some(state.next_resource_version());
        created.metadata.uid = Some(format!("substitute-uid-{}", state.next_version));
        state.objects.push(created.clone());
        Ok(created)
    }

    async fn update(&self, substitute: &Substitute) -> Result<Substitute, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.updates += 1;
        let rv = state.next_resource_version();
        let stored = state
            .objects
            .iter_mut()
            .find(|o| same_key(o, substitute))
            .ok_or_else(|| {
                StoreError::NotFound(substitute.metadata.name.clone().unwrap_or_default())
            })?;
        if stored.metadata.resource_version != substitute.metadata.resource_version {
            return Err(StoreError::Conflict(
                "the object has been modified; please apply your changes to the latest version and try again"
                    .to_string(),
            ));
        }
        let mut updated = substitute.clone();
        updated.metadata.resource_version = Some(rv);
        *stored = updated.clone();
        Ok(updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub severity: Severity,
    pub reason: String,
    pub note: String,
}

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.reason).collect()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(
        &self,
        _ehpa: &EffectiveHorizontalPodAutoscaler,
        severity: Severity,
        reason: &str,
        note: &str,
    ) -> Result<(), kube::Error> {
        self.events.lock().unwrap().push(RecordedEvent {
            severity,
            reason: reason.to_string(),
            note: note.to_string(),
        });
        Ok(())
    }
}

pub fn deployment(name: &str) -> CrossVersionObjectReference {
    CrossVersionObjectReference {
        api_version: Some("apps/v1".to_string()),
        kind: "Deployment".to_string(),
        name: name.to_string(),
    }
}

pub fn make_ehpa(
    name: &str,
    namespace: &str,
    uid: &str,
    target: CrossVersionObjectReference,
) -> EffectiveHorizontalPodAutoscaler {
    EffectiveHorizontalPodAutoscaler {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(uid.to_string()),
            ..ObjectMeta::default()
        },
        spec: EffectiveHorizontalPodAutoscalerSpec {
            scale_target_ref: target,
            min_replicas: Some(1),
            max_replicas: 10,
            scale_strategy: None,
        },
    }
}

pub fn make_scale(replicas: i32) -> Scale {
    Scale {
        spec: Some(ScaleSpec {
            replicas: Some(replicas),
        }),
        ..Scale::default()
    }
}

/// A Substitute as the controller would have created it for `ehpa`.
pub fn existing_substitute(
    ehpa: &EffectiveHorizontalPodAutoscaler,
    target: CrossVersionObjectReference,
    replicas: i32,
) -> Substitute {
    let mut substitute = crate::substitute::make_substitute(ehpa, replicas).unwrap();
    substitute.spec.substitute_target_ref = target;
    substitute
}

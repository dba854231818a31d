// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::*;
use crate::crds::*;
use crate::error::{Error, StoreError};
use crate::events::{EventSink, Severity};
use crate::store::SubstituteStore;
use crate::substitute::make_substitute;
use k8s_openapi::api::autoscaling::v1::Scale;
use std::sync::Arc;
use tracing::*;

/// What a reconcile pass observed about the Substitute of an autoscaler.
/// It is derived from the store on every pass and never kept across passes.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedSubstitute {
    Absent,
    PresentDiverged(Substitute),
    PresentSynced(Substitute),
}

impl ObservedSubstitute {
    pub fn observe(ehpa: &EffectiveHorizontalPodAutoscaler, found: Option<Substitute>) -> Self {
        match found {
            None => ObservedSubstitute::Absent,
            Some(substitute) if is_synced(ehpa, &substitute) => {
                ObservedSubstitute::PresentSynced(substitute)
            }
            Some(substitute) => ObservedSubstitute::PresentDiverged(substitute),
        }
    }
}

// Only the target reference is compared; replicas belong to whoever scales the Substitute.
fn is_synced(ehpa: &EffectiveHorizontalPodAutoscaler, substitute: &Substitute) -> bool {
    substitute.spec.substitute_target_ref == ehpa.spec.scale_target_ref
}

/// SubstituteReconciler converges the Substitute of one autoscaler per call.
/// It holds no per-autoscaler state, so the controller runtime may call it
/// concurrently for different autoscalers.
pub struct SubstituteReconciler {
    store: Arc<dyn SubstituteStore>,
    recorder: Arc<dyn EventSink>,
}

impl SubstituteReconciler {
    pub fn new(store: Arc<dyn SubstituteStore>, recorder: Arc<dyn EventSink>) -> Self {
        Self { store, recorder }
    }

    /// reconcile_substitute makes sure exactly one Substitute exists for `ehpa`
    /// and that it targets what `ehpa` targets, returning that Substitute.
    ///
    /// `scale` only matters when the Substitute has to be created: its replica
    /// count seeds `spec.replicas` and is never written again afterwards.
    ///
    /// Every error is reported once, as an event on `ehpa` and an error log
    /// record, before it is returned.
    pub async fn reconcile_substitute(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        scale: &Scale,
    ) -> Result<Substitute, Error> {
        match self.converge(ehpa, scale).await {
            Ok(substitute) => Ok(substitute),
            Err(err) => {
                self.report_failure(ehpa, &err).await;
                Err(err)
            }
        }
    }

    async fn converge(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        scale: &Scale,
    ) -> Result<Substitute, Error> {
        let found = self.resolve(ehpa).await?;
        match ObservedSubstitute::observe(ehpa, found) {
            ObservedSubstitute::Absent => self.create_substitute(ehpa, scale).await,
            ObservedSubstitute::PresentDiverged(existing)
            | ObservedSubstitute::PresentSynced(existing) => {
                self.update_substitute_if_needed(ehpa, existing).await
            }
        }
    }

    /// resolve finds the Substitute carrying the autoscaler's uid as identity label.
    /// An empty list and a NotFound from the store both mean there is none.
    pub async fn resolve(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
    ) -> Result<Option<Substitute>, Error> {
        let namespace = ehpa
            .metadata
            .namespace
            .as_ref()
            .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
        let uid = ehpa
            .metadata
            .uid
            .as_ref()
            .ok_or(Error::MissingObjectKey(".metadata.uid"))?;

        let substitutes = match self
            .store
            .list(namespace, &identity_label_selector(uid))
            .await
        {
            Ok(substitutes) => substitutes,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(Error::ListSubstituteFailed(err)),
        };
        if substitutes.len() > 1 {
            warn!(
                ehpa = %ehpa_key(ehpa),
                matches = substitutes.len(),
                "Multiple Substitutes carry the same identity label, using the first one"
            );
        }
        Ok(substitutes.into_iter().next())
    }

    async fn create_substitute(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        scale: &Scale,
    ) -> Result<Substitute, Error> {
        let replicas = scale
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or_default();
        let substitute = make_substitute(ehpa, replicas).map_err(Error::BuildSubstituteFailed)?;

        let created = self
            .store
            .create(&substitute)
            .await
            .map_err(Error::CreateSubstituteFailed)?;

        info!(ehpa = %ehpa_key(ehpa), substitute = %substitute_key(&created), replicas, "Create Substitute successfully");
        self.publish(
            ehpa,
            Severity::Normal,
            "SubstituteCreated",
            "Create Substitute successfully",
        )
        .await;
        Ok(created)
    }

    /// update_substitute_if_needed rewrites the target reference of `existing`
    /// when it no longer matches the autoscaler's. Replicas are left alone.
    pub async fn update_substitute_if_needed(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        existing: Substitute,
    ) -> Result<Substitute, Error> {
        if is_synced(ehpa, &existing) {
            debug!(ehpa = %ehpa_key(ehpa), substitute = %substitute_key(&existing), "Substitute is synced");
            return Ok(existing);
        }
        self.update_substitute(ehpa, existing).await
    }

    async fn update_substitute(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        mut existing: Substitute,
    ) -> Result<Substitute, Error> {
        debug!(
            ehpa = %ehpa_key(ehpa),
            current_target = ?existing.spec.substitute_target_ref,
            expect_target = ?ehpa.spec.scale_target_ref,
            "Substitute is unsynced according to EffectiveHorizontalPodAutoscaler, should be updated"
        );
        existing.spec.substitute_target_ref = ehpa.spec.scale_target_ref.clone();
        let updated = self
            .store
            .update(&existing)
            .await
            .map_err(Error::UpdateSubstituteFailed)?;

        info!(ehpa = %ehpa_key(ehpa), substitute = %substitute_key(&updated), "Update Substitute successfully");
        self.publish(
            ehpa,
            Severity::Normal,
            "SubstituteUpdated",
            "Update Substitute successfully",
        )
        .await;
        Ok(updated)
    }

    pub(crate) async fn report_failure(&self, ehpa: &EffectiveHorizontalPodAutoscaler, err: &Error) {
        error!(ehpa = %ehpa_key(ehpa), reason = err.reason(), error = %err, "Failed to reconcile Substitute");
        self.publish(ehpa, Severity::Warning, err.reason(), &err.to_string())
            .await;
    }

    async fn publish(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        severity: Severity,
        reason: &str,
        note: &str,
    ) {
        if let Err(err) = self.recorder.publish(ehpa, severity, reason, note).await {
            warn!(ehpa = %ehpa_key(ehpa), reason, error = %err, "Failed to publish event");
        }
    }
}

// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::ehpa_key;
use crate::config::ControllerConfig;
use crate::crds::*;
use crate::error::Error;
use crate::events::KubeEventSink;
use crate::reconciler::SubstituteReconciler;
use crate::store::{KubeScaleSource, KubeSubstituteStore, ScaleSource};
use anyhow::Result;
use futures::StreamExt;
use kube::{
    api::{Api, ListParams},
    runtime::{
        controller::{self, Action, Controller},
        events::Reporter,
        reflector::ObjectRef,
    },
    Client, Resource,
};
use std::sync::Arc;
use tracing::*;

/// Data is shared by every reconcile and error_policy call.
pub struct Data {
    pub reconciler: SubstituteReconciler,
    pub scales: Arc<dyn ScaleSource>,
    pub config: ControllerConfig,
}

// run_controller watches the autoscalers and the Substitutes they own, and
// reconciles an autoscaler whenever either side changes.
pub async fn run_controller(config: ControllerConfig) -> Result<()> {
    let client = Client::try_default().await?;
    let (ehpa_api, substitute_api) = match config.namespace.as_deref() {
        Some(namespace) => (
            Api::<EffectiveHorizontalPodAutoscaler>::namespaced(client.clone(), namespace),
            Api::<Substitute>::namespaced(client.clone(), namespace),
        ),
        None => (
            Api::<EffectiveHorizontalPodAutoscaler>::all(client.clone()),
            Api::<Substitute>::all(client.clone()),
        ),
    };

    let controller_name = config.controller_name.clone();
    let reporter = Reporter {
        controller: config.controller_name.clone(),
        instance: config.instance.clone(),
    };
    let data = Data {
        reconciler: SubstituteReconciler::new(
            Arc::new(KubeSubstituteStore::new(client.clone(), config.api_timeout())),
            Arc::new(KubeEventSink::new(client.clone(), reporter)),
        ),
        scales: Arc::new(KubeScaleSource::new(client.clone(), config.api_timeout())),
        config,
    };

    info!("starting substitute controller");
    Controller::new(ehpa_api, ListParams::default())
        .owns(substitute_api, ListParams::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, Arc::new(data))
        .for_each(|res| {
            report_controller_reconciled(&controller_name, &res);
            futures::future::ready(())
        })
        .await;
    info!("controller terminated");
    Ok(())
}

/// Controller triggers this whenever an autoscaler or its Substitute changed
pub async fn reconcile(
    ehpa: Arc<EffectiveHorizontalPodAutoscaler>,
    ctx: Arc<Data>,
) -> Result<Action, Error> {
    ehpa.metadata
        .name
        .as_ref()
        .ok_or_else(|| missing_object_key(".metadata.name"))?;
    let ehpa_ns = ehpa
        .metadata
        .namespace
        .as_ref()
        .ok_or_else(|| missing_object_key(".metadata.namespace"))?;

    if ehpa.meta().deletion_timestamp.is_some() {
        // The garbage collector takes the Substitute down with its owner.
        info!(ehpa = %ehpa_key(&ehpa), "EffectiveHorizontalPodAutoscaler is being deleted, end reconcile");
        return Ok(Action::await_change());
    }

    let scale = match ctx
        .scales
        .get_scale(ehpa_ns, &ehpa.spec.scale_target_ref)
        .await
    {
        Ok(scale) => scale,
        Err(err) => {
            let err = Error::GetScaleFailed(err);
            ctx.reconciler.report_failure(&ehpa, &err).await;
            return Err(err);
        }
    };

    ctx.reconciler.reconcile_substitute(&ehpa, &scale).await?;

    Ok(Action::requeue(ctx.config.requeue_after()))
}

// Without a key there is no object to publish an event on, so the log is all there is.
fn missing_object_key(key: &'static str) -> Error {
    let err = Error::MissingObjectKey(key);
    error!(error = %err, "Failed to reconcile EffectiveHorizontalPodAutoscaler");
    err
}

/// The controller triggers this on reconcile errors. A lost update race is
/// retried right away since the next pass reads fresh state.
pub fn error_policy(
    ehpa: Arc<EffectiveHorizontalPodAutoscaler>,
    error: &Error,
    ctx: Arc<Data>,
) -> Action {
    // The failure itself was already logged and published by the reconciler.
    debug!(ehpa = %ehpa_key(&ehpa), "Reconcile failed due to error: {}", error);
    if error.is_conflict() {
        Action::requeue(ctx.config.conflict_requeue_after())
    } else {
        Action::requeue(ctx.config.error_requeue_after())
    }
}

pub fn report_controller_reconciled<K, QueueErr>(
    controller_name: &str,
    result: &Result<(ObjectRef<K>, Action), controller::Error<Error, QueueErr>>,
) where
    K: Resource,
    QueueErr: std::error::Error,
{
    match result {
        Ok((obj, _)) => {
            tracing::info!(
                controller.name = controller_name,
                object = %obj,
                "Reconciled object"
            );
        }
        // Reconcile failures were logged where they happened.
        Err(err @ controller::Error::ReconcilerFailed(..)) => {
            tracing::debug!(
                controller.name = controller_name,
                error = err as &dyn std::error::Error,
                "Failed to reconcile object",
            );
        }
        Err(err) => {
            tracing::error!(
                controller.name = controller_name,
                error = err as &dyn std::error::Error,
                "Failed to reconcile object",
            );
        }
    }
}

// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::crds::EffectiveHorizontalPodAutoscaler;
use async_trait::async_trait;
use kube::{
    runtime::events::{Event, EventType, Recorder, Reporter},
    Client, Resource,
};

#[cfg(test)]
use mockall::automock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

/// Where diagnostic events about an autoscaler go.
///
/// A failed publish is returned to the caller, which logs it and carries on.
/// Reporting never changes the outcome of a reconcile.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        severity: Severity,
        reason: &str,
        note: &str,
    ) -> Result<(), kube::Error>;
}

pub struct KubeEventSink {
    client: Client,
    reporter: Reporter,
}

impl KubeEventSink {
    pub fn new(client: Client, reporter: Reporter) -> Self {
        Self { client, reporter }
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn publish(
        &self,
        ehpa: &EffectiveHorizontalPodAutoscaler,
        severity: Severity,
        reason: &str,
        note: &str,
    ) -> Result<(), kube::Error> {
        let recorder = Recorder::new(
            self.client.clone(),
            self.reporter.clone(),
            ehpa.object_ref(&()),
        );
        let type_ = match severity {
            Severity::Normal => EventType::Normal,
            Severity::Warning => EventType::Warning,
        };
        let event = Event {
            type_,
            reason: reason.to_string(),
            note: Some(note.to_string()),
            action: "ReconcileSubstitute".to_string(),
            secondary: None,
        };
        recorder.publish(event).await
    }
}

// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::crds::*;
use k8s_openapi::api::autoscaling::v1::CrossVersionObjectReference;
use kube::core::GroupVersionKind;

/// The identity label. Its value is the uid of the owning autoscaler and it is
/// the only label the controller trusts when looking a Substitute up.
pub const EHPA_UID_LABEL: &str = "autoscaling.crane.io/effective-hpa-uid";

pub const EHPA_MANAGED_BY: &str = "effective-hpa-controller";

pub const APP_NAME_LABEL: &str = "app.kubernetes.io/name";
pub const APP_PART_OF_LABEL: &str = "app.kubernetes.io/part-of";
pub const APP_MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

pub fn substitute_name(ehpa_name: &str) -> String {
    format!("ehpa-{}", ehpa_name)
}

pub fn identity_label_selector(ehpa_uid: &str) -> String {
    format!("{}={}", EHPA_UID_LABEL, ehpa_uid)
}

/// `namespace/name`, used as the `ehpa` field of log records.
pub fn ehpa_key(ehpa: &EffectiveHorizontalPodAutoscaler) -> String {
    format!(
        "{}/{}",
        ehpa.metadata.namespace.as_deref().unwrap_or_default(),
        ehpa.metadata.name.as_deref().unwrap_or_default()
    )
}

pub fn substitute_key(substitute: &Substitute) -> String {
    format!(
        "{}/{}",
        substitute.metadata.namespace.as_deref().unwrap_or_default(),
        substitute.metadata.name.as_deref().unwrap_or_default()
    )
}

/// Splits the `apiVersion` of a target reference into group and version.
/// A bare version (e.g. `v1`) belongs to the core group.
pub fn target_gvk(target: &CrossVersionObjectReference) -> GroupVersionKind {
    let api_version = target.api_version.as_deref().unwrap_or("v1");
    match api_version.split_once('/') {
        Some((group, version)) => GroupVersionKind::gvk(group, version, &target.kind),
        None => GroupVersionKind::gvk("", api_version, &target.kind),
    }
}

// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::api::autoscaling::v1::CrossVersionObjectReference;

#[derive(
    kube::CustomResource,
    Default,
    Debug,
    Clone,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
    PartialEq,
)]
#[kube(
    group = "autoscaling.crane.io",
    version = "v1alpha1",
    kind = "EffectiveHorizontalPodAutoscaler"
)]
#[kube(shortname = "ehpa", namespaced)]
#[kube(derive = "PartialEq")]
pub struct EffectiveHorizontalPodAutoscalerSpec {
    #[serde(rename = "scaleTargetRef")]
    pub scale_target_ref: CrossVersionObjectReference,
    #[serde(rename = "minReplicas", skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,
    #[serde(rename = "maxReplicas")]
    pub max_replicas: i32,
    // Interpreted by the scaling logic upstream, carried here untouched.
    #[serde(rename = "scaleStrategy", skip_serializing_if = "Option::is_none")]
    pub scale_strategy: Option<String>,
}

impl Default for EffectiveHorizontalPodAutoscaler {
    fn default() -> Self {
        Self {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta::default(),
            spec: EffectiveHorizontalPodAutoscalerSpec::default(),
        }
    }
}

/// Substitute stands in for the scale target of an EffectiveHorizontalPodAutoscaler.
/// It is created and exclusively controlled by that autoscaler, and is garbage
/// collected by the API server when the autoscaler goes away.
#[derive(
    kube::CustomResource,
    Default,
    Debug,
    Clone,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
    PartialEq,
)]
#[kube(group = "autoscaling.crane.io", version = "v1alpha1", kind = "Substitute")]
#[kube(shortname = "subs", namespaced)]
#[kube(derive = "PartialEq")]
#[kube(status = "SubstituteStatus")]
#[kube(scale = r#"{"specReplicasPath":".spec.replicas", "statusReplicasPath":".status.replicas", "labelSelectorPath":".status.labelSelector"}"#)]
pub struct SubstituteSpec {
    #[serde(rename = "substituteTargetRef")]
    pub substitute_target_ref: CrossVersionObjectReference,
    pub replicas: i32,
}

#[derive(
    Default, Debug, Clone, serde::Deserialize, serde::Serialize, schemars::JsonSchema, PartialEq,
)]
pub struct SubstituteStatus {
    pub replicas: i32,
    #[serde(rename = "labelSelector", skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
}

impl Default for Substitute {
    fn default() -> Self {
        Self {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta::default(),
            spec: SubstituteSpec::default(),
            status: None,
        }
    }
}

/// Both custom resource definitions as one multi-document YAML stream.
pub fn export_crds() -> Result<String, serde_yaml::Error> {
    use kube::CustomResourceExt;
    Ok(format!(
        "{}---\n{}",
        serde_yaml::to_string(&EffectiveHorizontalPodAutoscaler::crd())?,
        serde_yaml::to_string(&Substitute::crd())?
    ))
}

// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::*;
use crate::crds::*;
use crate::error::ReferenceError;
use crate::owner_reference::set_controller_reference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use std::collections::BTreeMap;

/// make_substitute builds the Substitute that should exist for `ehpa` when none does.
/// It does not talk to the API server.
pub fn make_substitute(
    ehpa: &EffectiveHorizontalPodAutoscaler,
    replicas: i32,
) -> Result<Substitute, ReferenceError> {
    let ehpa_name = ehpa.metadata.name.clone().unwrap_or_default();
    let name = substitute_name(&ehpa_name);
    let mut substitute = Substitute {
        metadata: metav1::ObjectMeta {
            // the same namespace as the autoscaler
            namespace: ehpa.metadata.namespace.clone(),
            name: Some(name.clone()),
            labels: Some(make_labels(ehpa, &name)),
            ..metav1::ObjectMeta::default()
        },
        spec: SubstituteSpec {
            substitute_target_ref: ehpa.spec.scale_target_ref.clone(),
            replicas,
        },
        status: None,
    };

    // The autoscaler controls the underlying Substitute
    set_controller_reference(ehpa, &mut substitute.metadata)?;

    Ok(substitute)
}

fn make_labels(ehpa: &EffectiveHorizontalPodAutoscaler, name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_NAME_LABEL.to_string(), name.to_string()),
        (
            APP_PART_OF_LABEL.to_string(),
            ehpa.metadata.name.clone().unwrap_or_default(),
        ),
        (APP_MANAGED_BY_LABEL.to_string(), EHPA_MANAGED_BY.to_string()),
        (
            EHPA_UID_LABEL.to_string(),
            ehpa.metadata.uid.clone().unwrap_or_default(),
        ),
    ])
}

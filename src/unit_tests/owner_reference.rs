// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::error::ReferenceError;
use crate::owner_reference::*;
use crate::unit_tests::fake::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

fn object_in(namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some("ehpa-web".to_string()),
        namespace: Some(namespace.to_string()),
        ..ObjectMeta::default()
    }
}

#[test]
fn test_set_controller_reference() {
    let ehpa = make_ehpa("web", "ns1", "abc", deployment("web"));
    let mut meta = object_in("ns1");

    set_controller_reference(&ehpa, &mut meta).unwrap();

    assert_eq!(
        meta.owner_references,
        Some(vec![OwnerReference {
            api_version: "autoscaling.crane.io/v1alpha1".to_string(),
            kind: "EffectiveHorizontalPodAutoscaler".to_string(),
            name: "web".to_string(),
            uid: "abc".to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }])
    );
}

#[test]
fn test_same_owner_is_replaced_not_duplicated() {
    let ehpa = make_ehpa("web", "ns1", "abc", deployment("web"));
    let mut meta = object_in("ns1");
    set_controller_reference(&ehpa, &mut meta).unwrap();

    // Recreated owner: same name, new uid.
    let recreated = make_ehpa("web", "ns1", "def", deployment("web"));
    set_controller_reference(&recreated, &mut meta).unwrap();

    let refs = meta.owner_references.unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].uid, "def");
}

#[test]
fn test_non_controller_references_are_kept() {
    let ehpa = make_ehpa("web", "ns1", "abc", deployment("web"));
    let mut meta = object_in("ns1");
    meta.owner_references = Some(vec![OwnerReference {
        api_version: "v1".to_string(),
        kind: "ConfigMap".to_string(),
        name: "settings".to_string(),
        uid: "cm-uid".to_string(),
        ..OwnerReference::default()
    }]);

    set_controller_reference(&ehpa, &mut meta).unwrap();

    let refs = meta.owner_references.unwrap();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].kind, "ConfigMap");
    assert_eq!(refs[1].kind, "EffectiveHorizontalPodAutoscaler");
}

#[test]
fn test_already_owned() {
    let ehpa = make_ehpa("web", "ns1", "abc", deployment("web"));
    let mut meta = object_in("ns1");
    let other = make_ehpa("api", "ns1", "xyz", deployment("api"));
    set_controller_reference(&other, &mut meta).unwrap();

    assert_eq!(
        set_controller_reference(&ehpa, &mut meta),
        Err(ReferenceError::AlreadyOwned {
            kind: "EffectiveHorizontalPodAutoscaler".to_string(),
            name: "api".to_string(),
        })
    );
    assert_eq!(meta.owner_references.unwrap().len(), 1);
}

#[test]
fn test_cross_namespace() {
    let ehpa = make_ehpa("web", "ns1", "abc", deployment("web"));
    let mut meta = object_in("ns2");

    assert_eq!(
        set_controller_reference(&ehpa, &mut meta),
        Err(ReferenceError::CrossNamespace {
            owner_namespace: "ns1".to_string(),
            object_namespace: "ns2".to_string(),
        })
    );
    assert!(meta.owner_references.is_none());
}

#[test]
fn test_missing_owner_uid() {
    let mut ehpa = make_ehpa("web", "ns1", "abc", deployment("web"));
    ehpa.metadata.uid = None;
    let mut meta = object_in("ns1");

    assert_eq!(
        set_controller_reference(&ehpa, &mut meta),
        Err(ReferenceError::MissingOwnerKey {
            kind: "EffectiveHorizontalPodAutoscaler".to_string(),
            key: ".metadata.uid",
        })
    );
}

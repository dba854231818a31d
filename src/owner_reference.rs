// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::error::ReferenceError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;

/// set_controller_reference makes `owner` the managing controller of the object
/// described by `object`.
///
/// The reference is what links the object's lifetime to the owner: once the
/// owner is deleted, the API server's garbage collector deletes the object.
/// Nothing in this crate deletes a Substitute directly.
///
/// An object has at most one controller, so this fails if a controller
/// reference to a different owner is already present. A reference to the same
/// owner is replaced in place. A namespaced owner must live in the object's
/// namespace.
pub fn set_controller_reference<K>(owner: &K, object: &mut ObjectMeta) -> Result<(), ReferenceError>
where
    K: Resource<DynamicType = ()>,
{
    let kind = K::kind(&()).to_string();
    let owner_meta = owner.meta();
    if owner_meta.name.is_none() {
        return Err(ReferenceError::MissingOwnerKey {
            kind,
            key: ".metadata.name",
        });
    }
    if owner_meta.uid.is_none() {
        return Err(ReferenceError::MissingOwnerKey {
            kind,
            key: ".metadata.uid",
        });
    }
    if let Some(owner_namespace) = owner_meta.namespace.as_ref() {
        if object.namespace.as_ref() != Some(owner_namespace) {
            return Err(ReferenceError::CrossNamespace {
                owner_namespace: owner_namespace.clone(),
                object_namespace: object.namespace.clone().unwrap_or_default(),
            });
        }
    }
    let mut oref = owner
        .controller_owner_ref(&())
        .ok_or_else(|| ReferenceError::MissingOwnerKey {
            kind: kind.clone(),
            key: ".metadata.uid",
        })?;
    // Foreground deletion of the owner waits for the object.
    oref.block_owner_deletion = Some(true);

    let refs = object.owner_references.get_or_insert_with(Vec::new);
    if let Some(controller) = refs.iter().find(|r| r.controller == Some(true)) {
        if !refers_to_same_owner(controller, &oref) {
            return Err(ReferenceError::AlreadyOwned {
                kind: controller.kind.clone(),
                name: controller.name.clone(),
            });
        }
    }
    match refs.iter_mut().find(|r| refers_to_same_owner(r, &oref)) {
        Some(existing) => *existing = oref,
        None => refs.push(oref),
    }
    Ok(())
}

// Versions of the same group are the same owner.
fn refers_to_same_owner(a: &OwnerReference, b: &OwnerReference) -> bool {
    api_group(&a.api_version) == api_group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

fn api_group(api_version: &str) -> &str {
    api_version
        .split_once('/')
        .map(|(group, _)| group)
        .unwrap_or("")
}

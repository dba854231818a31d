// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::error::*;
use kube_core::ErrorResponse;

fn api_error(reason: &str, code: u16) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} happened", reason),
        reason: reason.to_string(),
        code,
    })
}

#[test]
fn test_store_error_from_kube() {
    assert!(matches!(
        StoreError::from(api_error("NotFound", 404)),
        StoreError::NotFound(msg) if msg == "NotFound happened"
    ));
    assert!(matches!(
        StoreError::from(api_error("AlreadyExists", 409)),
        StoreError::AlreadyExists(_)
    ));
    assert!(StoreError::from(api_error("Conflict", 409)).is_conflict());
    assert!(matches!(
        StoreError::from(api_error("ServerTimeout", 504)),
        StoreError::Api(_)
    ));
}

#[test]
fn test_error_reasons() {
    let not_found = || StoreError::NotFound("x".to_string());
    assert_eq!(
        Error::ListSubstituteFailed(not_found()).reason(),
        "FailedGetSubstitute"
    );
    assert_eq!(
        Error::MissingObjectKey(".metadata.uid").reason(),
        "FailedGetSubstitute"
    );
    assert_eq!(
        Error::BuildSubstituteFailed(ReferenceError::MissingOwnerKey {
            kind: "EffectiveHorizontalPodAutoscaler".to_string(),
            key: ".metadata.uid",
        })
        .reason(),
        "FailedCreateSubstituteObject"
    );
    assert_eq!(
        Error::CreateSubstituteFailed(not_found()).reason(),
        "FailedCreateSubstitute"
    );
    assert_eq!(
        Error::UpdateSubstituteFailed(not_found()).reason(),
        "FailedUpdateSubstitute"
    );
    assert_eq!(Error::GetScaleFailed(not_found()).reason(), "FailedGetScale");
}

#[test]
fn test_is_conflict() {
    assert!(Error::UpdateSubstituteFailed(StoreError::Conflict("x".to_string())).is_conflict());
    assert!(!Error::UpdateSubstituteFailed(StoreError::NotFound("x".to_string())).is_conflict());
    assert!(!Error::GetScaleFailed(StoreError::Conflict("x".to_string())).is_conflict());
}

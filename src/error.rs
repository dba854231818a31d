// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use kube_core::ErrorResponse;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single round trip to the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Object already exists: {0}")]
    AlreadyExists(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Request did not finish within {0:?}")]
    Timeout(Duration),
    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),
    #[error("API request failed: {0}")]
    Api(#[source] kube::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

// Only the reasons the reconciler branches on get their own variant.
impl From<kube::Error> for StoreError {
    fn from(error: kube::Error) -> Self {
        if let kube::Error::Api(ErrorResponse {
            reason, message, ..
        }) = &error
        {
            match reason.as_str() {
                "NotFound" => return StoreError::NotFound(message.clone()),
                "AlreadyExists" => return StoreError::AlreadyExists(message.clone()),
                "Conflict" => return StoreError::Conflict(message.clone()),
                _ => {}
            }
        }
        StoreError::Api(error)
    }
}

/// The controller owner reference could not be attached to an object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Owner {kind} misses {key}")]
    MissingOwnerKey { kind: String, key: &'static str },
    #[error("Object is already owned by another {kind} controller {name}")]
    AlreadyOwned { kind: String, name: String },
    #[error("Cross-namespace owner reference from {object_namespace} to {owner_namespace} is disallowed")]
    CrossNamespace {
        owner_namespace: String,
        object_namespace: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),
    #[error("Failed to get Substitute: {0}")]
    ListSubstituteFailed(#[source] StoreError),
    #[error("Failed to build Substitute: {0}")]
    BuildSubstituteFailed(#[source] ReferenceError),
    #[error("Failed to create Substitute: {0}")]
    CreateSubstituteFailed(#[source] StoreError),
    #[error("Failed to update Substitute: {0}")]
    UpdateSubstituteFailed(#[source] StoreError),
    #[error("Failed to get scale of the target: {0}")]
    GetScaleFailed(#[source] StoreError),
}

impl Error {
    /// Reason of the event published on the autoscaler when this error ends a pass.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::MissingObjectKey(_) | Error::ListSubstituteFailed(_) => "FailedGetSubstitute",
            Error::BuildSubstituteFailed(_) => "FailedCreateSubstituteObject",
            Error::CreateSubstituteFailed(_) => "FailedCreateSubstitute",
            Error::UpdateSubstituteFailed(_) => "FailedUpdateSubstitute",
            Error::GetScaleFailed(_) => "FailedGetScale",
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            Error::UpdateSubstituteFailed(e) | Error::CreateSubstituteFailed(e) => e.is_conflict(),
            _ => false,
        }
    }
}

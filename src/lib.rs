// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod common;
pub mod config;
pub mod controller_runtime;
pub mod crds;
pub mod error;
pub mod events;
pub mod owner_reference;
pub mod reconciler;
pub mod store;
pub mod substitute;

pub use error::{Error, ReferenceError, StoreError};

// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::common::EHPA_MANAGED_BY;
use clap::Args;
use std::time::Duration;

/// Settings of the `run` command. Every flag can also be set through the
/// environment variable named next to it.
#[derive(Debug, Clone, Args)]
pub struct ControllerConfig {
    /// Seconds until an autoscaler is reconciled again after a successful pass
    #[arg(long, env = "SUBSTITUTE_REQUEUE_SECS", default_value_t = 60)]
    pub requeue_secs: u64,

    /// Seconds until a failed pass is retried
    #[arg(long, env = "SUBSTITUTE_ERROR_REQUEUE_SECS", default_value_t = 10)]
    pub error_requeue_secs: u64,

    /// Seconds until a pass that lost an update race is retried
    #[arg(long, env = "SUBSTITUTE_CONFLICT_REQUEUE_SECS", default_value_t = 1)]
    pub conflict_requeue_secs: u64,

    /// Upper bound, in seconds, for a single request to the API server
    #[arg(long, env = "SUBSTITUTE_API_TIMEOUT_SECS", default_value_t = 30)]
    pub api_timeout_secs: u64,

    /// Reporting controller recorded on events
    #[arg(long, env = "SUBSTITUTE_CONTROLLER_NAME", default_value = EHPA_MANAGED_BY)]
    pub controller_name: String,

    /// Reporting instance recorded on events
    #[arg(long, env = "POD_NAME")]
    pub instance: Option<String>,

    /// Only watch autoscalers in this namespace
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,
}

impl ControllerConfig {
    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }

    pub fn error_requeue_after(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    pub fn conflict_requeue_after(&self) -> Duration {
        Duration::from_secs(self.conflict_requeue_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            requeue_secs: 60,
            error_requeue_secs: 10,
            conflict_requeue_secs: 1,
            api_timeout_secs: 30,
            controller_name: EHPA_MANAGED_BY.to_string(),
            instance: None,
            namespace: None,
        }
    }
}

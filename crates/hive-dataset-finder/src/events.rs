// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Dataset discovery events.

pub const DATASET_FOUND: &str = "DatasetFound";
pub const DATASET_ERROR: &str = "DatasetError";
pub const DATASET_URN_KEY: &str = "datasetUrn";
pub const FAILURE_CONTEXT_KEY: &str = "FailureContext";

/// Receives discovery events. Implementations must not block for long; they
/// are called inline while the dataset stream is being polled.
pub trait EventSubmitter: Send + Sync {
    fn submit(&self, name: &str, metadata: &[(&str, &str)]);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSubmitter;

impl EventSubmitter for NoopEventSubmitter {
    fn submit(&self, _name: &str, _metadata: &[(&str, &str)]) {}
}

/// Logs every event at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSubmitter;

impl EventSubmitter for TracingEventSubmitter {
    fn submit(&self, name: &str, metadata: &[(&str, &str)]) {
        tracing::info!(event = name, ?metadata, "dataset discovery event");
    }
}

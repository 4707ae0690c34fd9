// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::{model::FieldValue, timestamp::SnapshotVersion};

/// The server's response to a single mutation of an acknowledged batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct MutationResult {
    version: SnapshotVersion,
    transform_results: Option<Vec<FieldValue>>,
}

impl MutationResult {
    /// The result of a mutation that does not carry field transforms.
    pub fn new(version: SnapshotVersion) -> Self {
        Self {
            version,
            transform_results: None,
        }
    }

    /// The result of a transform mutation: one value per field transform, in the same order.
    pub fn with_transform_results(
        version: SnapshotVersion,
        transform_results: Vec<FieldValue>,
    ) -> Self {
        Self {
            version,
            transform_results: Some(transform_results),
        }
    }

    /// The version at which the server committed the mutation.
    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    /// The values the server computed for each field transform, if any.
    pub fn transform_results(&self) -> Option<&[FieldValue]> {
        self.transform_results.as_deref()
    }
}

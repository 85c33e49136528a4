//! Per-observation and per-feature descriptor tables.

use serde::{Deserialize, Serialize};

/// Descriptor for one observed time series (one matrix row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesInfo {
    /// Identifier for the time series.
    pub name: String,
    /// Optional class label, consumed only by class-variance filtering.
    pub group: Option<String>,
}

impl TimeSeriesInfo {
    /// Create an unlabeled time-series descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
        }
    }

    /// Create a descriptor with a class label.
    pub fn with_group(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: Some(group.into()),
        }
    }
}

/// Descriptor for one computed feature (one matrix column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationInfo {
    /// Identifier for the operation.
    pub name: String,
    /// Index of the defining master operation in the upstream library.
    pub master_id: usize,
}

impl OperationInfo {
    pub fn new(name: impl Into<String>, master_id: usize) -> Self {
        Self {
            name: name.into(),
            master_id,
        }
    }
}

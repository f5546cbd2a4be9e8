//! Shared types used across the batch pipeline and its reports.
//!
//! These types are serialized into the JSON batch report, so field names are
//! part of the report format.

use serde::{Deserialize, Serialize};

/// What happened to one archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Processed {
        /// Entry name inside the input archive.
        source: String,
        /// Entry name inside the output archive.
        output: String,
        /// Encoded size in bytes.
        bytes: u64,
        /// Quality of the attempt that was kept.
        quality: u8,
        within_limit: bool,
    },
    Skipped {
        source: String,
        reason: String,
    },
}

impl BatchOutcome {
    pub fn source(&self) -> &str {
        match self {
            Self::Processed { source, .. } | Self::Skipped { source, .. } => source,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }
}

//! Samples delivered to the host.

use crate::PipelineId;
use serde::{Deserialize, Serialize};

/// Duration reported to hosts that need a plain integer when the framework
/// did not declare one.
pub const DURATION_UNKNOWN: i64 = -1;

/// A decoded unit ready for delivery to the host.
///
/// `data` is an independent copy of the framework buffer; once handed to
/// the host's sample callback the host owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEvent {
    pub pipeline_id: PipelineId,
    pub data: Vec<u8>,
    /// Declared buffer duration in nanoseconds, if any
    pub duration_ns: Option<u64>,
    /// Presentation timestamp in nanoseconds, if any
    #[serde(default)]
    pub pts_ns: Option<u64>,
}

impl SampleEvent {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Duration in nanoseconds, or [`DURATION_UNKNOWN`].
    pub fn duration_or_sentinel(&self) -> i64 {
        self.duration_ns
            .and_then(|d| i64::try_from(d).ok())
            .unwrap_or(DURATION_UNKNOWN)
    }
}

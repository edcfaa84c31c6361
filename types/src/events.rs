//! Events emitted by the bridge towards the host.

use crate::sample::SampleEvent;
use crate::state::PipelineState;
use crate::PipelineId;
use serde::{Deserialize, Serialize};

/// Every callback the event bridge can make, as a value.
///
/// Used by channel-based observers so hosts can move event handling off
/// the framework's signaling thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BridgeEvent {
    /// A sample was pulled from the emission endpoint
    Sample(SampleEvent),
    /// Pipeline error occurred
    Error {
        pipeline_id: PipelineId,
        message: String,
    },
    /// Diagnostic text attached to an error
    Debug {
        pipeline_id: PipelineId,
        message: String,
    },
    /// Pipeline warning message
    Warning {
        pipeline_id: PipelineId,
        message: String,
    },
    /// Pipeline info message
    Info {
        pipeline_id: PipelineId,
        message: String,
    },
    /// Pipeline reached end of stream
    Eos { pipeline_id: PipelineId },
    /// The top-level pipeline changed state
    StateChanged {
        pipeline_id: PipelineId,
        old: PipelineState,
        new: PipelineState,
    },
}

impl BridgeEvent {
    /// The pipeline this event belongs to.
    pub fn pipeline_id(&self) -> PipelineId {
        match self {
            Self::Sample(sample) => sample.pipeline_id,
            Self::Error { pipeline_id, .. }
            | Self::Debug { pipeline_id, .. }
            | Self::Warning { pipeline_id, .. }
            | Self::Info { pipeline_id, .. }
            | Self::Eos { pipeline_id }
            | Self::StateChanged { pipeline_id, .. } => *pipeline_id,
        }
    }

    /// Short human-readable description, used for logging.
    pub fn description(&self) -> String {
        match self {
            Self::Sample(sample) => format!(
                "Sample from pipeline {}: {} bytes",
                sample.pipeline_id,
                sample.len()
            ),
            Self::Error {
                pipeline_id,
                message,
            } => format!("Pipeline {} error: {}", pipeline_id, message),
            Self::Debug {
                pipeline_id,
                message,
            } => format!("Pipeline {} debug: {}", pipeline_id, message),
            Self::Warning {
                pipeline_id,
                message,
            } => format!("Pipeline {} warning: {}", pipeline_id, message),
            Self::Info {
                pipeline_id,
                message,
            } => format!("Pipeline {} info: {}", pipeline_id, message),
            Self::Eos { pipeline_id } => format!("Pipeline {} reached end of stream", pipeline_id),
            Self::StateChanged {
                pipeline_id,
                old,
                new,
            } => format!("Pipeline {} state changed: {} -> {}", pipeline_id, old, new),
        }
    }

    /// Whether this event ends normal processing of the pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Eos { .. })
    }
}

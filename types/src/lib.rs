//! Shared types for the pipebridge GStreamer host bridge.
//!
//! This crate contains the plain data exchanged between the bridge and the
//! host application: identifiers, lifecycle states, display geometry,
//! delivered samples and the event envelope.

pub mod events;
pub mod geometry;
pub mod preset;
pub mod sample;
pub mod state;

/// Host-assigned pipeline identifier.
///
/// This is the only value that crosses the host boundary to correlate
/// callbacks with pipelines; handles themselves are never shared.
pub type PipelineId = i32;

// Re-export commonly used types
pub use events::BridgeEvent;
pub use geometry::GeometryRect;
pub use preset::{CodecKind, HardwareCodec, MediaSource, Preset};
pub use sample::{SampleEvent, DURATION_UNKNOWN};
pub use state::PipelineState;

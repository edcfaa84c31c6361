//! GStreamer integration.

pub mod ingress;
pub mod overlay;
pub mod pipeline;
pub mod preset;
pub mod sample;

pub use ingress::PushOutcome;

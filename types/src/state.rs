//! Pipeline lifecycle state definitions.

use serde::{Deserialize, Serialize};

/// GStreamer pipeline state.
///
/// These states correspond to the GStreamer GST_STATE enum. The ordering
/// follows the lifecycle lattice, so `Null < Ready < Paused < Playing`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum PipelineState {
    /// No state has been set (initial state)
    #[default]
    Null,
    /// The pipeline is ready to go to PAUSED
    Ready,
    /// The pipeline is paused
    Paused,
    /// The pipeline is playing/running
    Playing,
}

impl PipelineState {
    /// Returns true if this state is `other` or later on the lattice.
    pub fn is_at_least(self, other: PipelineState) -> bool {
        self >= other
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Ready => write!(f, "READY"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Playing => write!(f, "PLAYING"),
        }
    }
}

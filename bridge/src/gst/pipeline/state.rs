use super::PipelineHandle;
use gstreamer as gst;
use pipebridge_types::{PipelineId, PipelineState};

impl PipelineHandle {
    /// Last state the top-level pipeline reported.
    ///
    /// This is a mirror updated from the bus, so it lags behind
    /// `start`/`pause`/`stop` requests until the transition completes.
    pub fn state(&self) -> PipelineState {
        self.inner.shared.state()
    }

    pub fn id(&self) -> PipelineId {
        self.inner.shared.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.shared.is_destroyed()
    }

    pub fn has_emission_endpoint(&self) -> bool {
        self.inner
            .graph
            .read()
            .as_ref()
            .is_some_and(|graph| graph.emission.is_some())
    }

    pub fn has_injection_endpoint(&self) -> bool {
        self.inner
            .graph
            .read()
            .as_ref()
            .is_some_and(|graph| graph.injection.is_some())
    }

    pub fn is_overlay_bound(&self) -> bool {
        self.inner.shared.overlay.is_bound()
    }
}

pub(crate) fn from_gst_state(state: gst::State) -> PipelineState {
    match state {
        gst::State::Ready => PipelineState::Ready,
        gst::State::Paused => PipelineState::Paused,
        gst::State::Playing => PipelineState::Playing,
        _ => PipelineState::Null,
    }
}

pub(crate) fn to_gst_state(state: PipelineState) -> gst::State {
    match state {
        PipelineState::Null => gst::State::Null,
        PipelineState::Ready => gst::State::Ready,
        PipelineState::Paused => gst::State::Paused,
        PipelineState::Playing => gst::State::Playing,
    }
}

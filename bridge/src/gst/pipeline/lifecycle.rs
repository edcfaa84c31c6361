use super::{to_gst_state, Graph, PipelineError, PipelineHandle};
use gstreamer as gst;
use gstreamer::prelude::*;
use pipebridge_types::PipelineState;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};

impl PipelineHandle {
    /// Request PLAYING. The mirrored state follows once the pipeline
    /// reports the transition.
    pub fn start(&self) -> Result<(), PipelineError> {
        self.request_state(PipelineState::Playing, "start")
    }

    /// Request PAUSED.
    pub fn pause(&self) -> Result<(), PipelineError> {
        self.request_state(PipelineState::Paused, "pause")
    }

    /// Request READY. Negotiated resources are released but the pipeline
    /// can be started again.
    pub fn stop(&self) -> Result<(), PipelineError> {
        self.request_state(PipelineState::Ready, "stop")
    }

    /// Shut the pipeline down to NULL, release it and detach every
    /// callback. A registered handle also leaves its registry.
    ///
    /// No observer callback fires for this pipeline once this returns. A
    /// second call fails with [`PipelineError::Destroyed`].
    pub fn destroy(&self) -> Result<(), PipelineError> {
        let shared = &self.inner.shared;
        let _guard = shared.state_lock.lock();
        if shared.destroyed.swap(true, Ordering::AcqRel) {
            error!("Pipeline {}: destroy called twice", shared.id);
            return Err(PipelineError::Destroyed(shared.id));
        }

        info!("Destroying pipeline {}", shared.id);
        let graph = self.inner.graph.write().take();
        let result = graph.map(Graph::shut_down);
        shared.overlay.clear();
        *shared.cached_state.write() = PipelineState::Null;
        shared.registration.unregister(self);

        match result {
            Some(Err(e)) => {
                warn!("Pipeline {}: failed to reach NULL: {}", shared.id, e);
                Err(PipelineError::StateChange(format!(
                    "Failed to reach NULL: {}",
                    e
                )))
            }
            _ => {
                info!("Pipeline {} destroyed", shared.id);
                Ok(())
            }
        }
    }

    fn request_state(&self, target: PipelineState, operation: &str) -> Result<(), PipelineError> {
        let _guard = self.inner.shared.state_lock.lock();
        let pipeline = self.live_pipeline(operation)?;
        let id = self.inner.shared.id;

        info!("Setting pipeline {} to {}", id, target);
        match pipeline.set_state(to_gst_state(target)) {
            Ok(gst::StateChangeSuccess::Success) => {
                info!("Pipeline {} set to {}: Success", id, target);
            }
            Ok(gst::StateChangeSuccess::Async) => {
                info!(
                    "Pipeline {} set to {}: Async (state change in progress)",
                    id, target
                );
            }
            Ok(gst::StateChangeSuccess::NoPreroll) => {
                info!("Pipeline {} set to {}: NoPreroll (live source)", id, target);
            }
            Err(e) => {
                error!("Pipeline {} failed to {}: {}", id, operation, e);
                return Err(PipelineError::StateChange(format!(
                    "Failed to {}: {}",
                    operation, e
                )));
            }
        }
        Ok(())
    }
}

//! Host-to-pipeline buffer injection.

use crate::gst::pipeline::{PipelineError, PipelineHandle};
use gstreamer as gst;
use tracing::{debug, trace};

/// Name of the element accepting host-pushed buffers.
pub const INJECTION_ENDPOINT: &str = "src";

/// What happened to a pushed buffer.
///
/// Pushes are best effort; none of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The graph has no app source named `src`.
    NoInjectionEndpoint,
    /// The endpoint refused the buffer (flushing, EOS, not negotiated...).
    Rejected(gst::FlowError),
}

impl PipelineHandle {
    /// Copy `data` into a new framework buffer and enqueue it on the
    /// injection endpoint. The caller keeps ownership of `data`.
    pub fn push_buffer(&self, data: &[u8]) -> Result<PushOutcome, PipelineError> {
        let Some(src) = self.injection_endpoint("push buffer")? else {
            trace!(
                "Pipeline {}: no injection endpoint, dropping {} bytes",
                self.id(),
                data.len()
            );
            return Ok(PushOutcome::NoInjectionEndpoint);
        };

        let buffer = gst::Buffer::from_slice(data.to_vec());
        match src.push_buffer(buffer) {
            Ok(_) => Ok(PushOutcome::Queued),
            Err(flow) => {
                debug!(
                    "Pipeline {}: injection endpoint rejected {} bytes: {:?}",
                    self.id(),
                    data.len(),
                    flow
                );
                Ok(PushOutcome::Rejected(flow))
            }
        }
    }
}

//! Host callback contract for pipeline events.
//!
//! Every callback runs on a GStreamer-owned thread (the bus posting thread
//! or the emission endpoint's streaming thread), never on the thread that
//! created the pipeline. Implementations must be cheap: the pipeline's
//! processing is held up until the callback returns.

use pipebridge_types::{BridgeEvent, PipelineId, PipelineState, SampleEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Observer for the events of one or more pipelines.
///
/// Callbacks are correlated by pipeline id only; the handle is never passed.
pub trait BridgeObserver: Send + Sync {
    /// A sample was pulled from the emission endpoint. The observer owns
    /// the delivered buffer.
    fn on_sample(&self, sample: SampleEvent);

    /// A runtime or construction error. The pipeline has been asked to
    /// return to READY by the time this is called.
    fn on_error(&self, pipeline_id: PipelineId, message: &str);

    /// Diagnostic text accompanying an error.
    fn on_debug(&self, pipeline_id: PipelineId, message: &str);

    fn on_warning(&self, pipeline_id: PipelineId, message: &str) {
        warn!(pipeline = pipeline_id, "{}", message);
    }

    fn on_info(&self, pipeline_id: PipelineId, message: &str) {
        info!(pipeline = pipeline_id, "{}", message);
    }

    fn on_eos(&self, _pipeline_id: PipelineId) {}

    /// The top-level pipeline reached a new state.
    fn on_state_changed(&self, _pipeline_id: PipelineId, _old: PipelineState, _new: PipelineState) {
    }
}

/// Observer that only logs.
///
/// Used as the process-wide default when the host does not supply one.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BridgeObserver for TracingObserver {
    fn on_sample(&self, sample: SampleEvent) {
        trace!(
            pipeline = sample.pipeline_id,
            "Discarding {} byte sample (no observer)",
            sample.len()
        );
    }

    fn on_error(&self, pipeline_id: PipelineId, message: &str) {
        error!(pipeline = pipeline_id, "gst pipeline: {}", message);
    }

    fn on_debug(&self, pipeline_id: PipelineId, message: &str) {
        debug!(pipeline = pipeline_id, "gst pipeline: {}", message);
    }

    fn on_eos(&self, pipeline_id: PipelineId) {
        info!(pipeline = pipeline_id, "gst pipeline: end of stream");
    }

    fn on_state_changed(&self, pipeline_id: PipelineId, old: PipelineState, new: PipelineState) {
        debug!(pipeline = pipeline_id, "gst pipeline: {} -> {}", old, new);
    }
}

/// Observer that forwards every callback into an unbounded channel.
///
/// Sending never blocks the signaling thread; the host drains the receiver
/// on its own schedule.
#[derive(Debug)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<BridgeEvent>,
    closed_logged: AtomicBool,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::with_sender(sender), receiver)
    }

    pub fn with_sender(sender: mpsc::UnboundedSender<BridgeEvent>) -> Self {
        Self {
            sender,
            closed_logged: AtomicBool::new(false),
        }
    }

    fn send(&self, event: BridgeEvent) {
        if self.sender.send(event).is_err() && !self.closed_logged.swap(true, Ordering::Relaxed) {
            debug!("Event receiver dropped, discarding further pipeline events");
        }
    }
}

impl BridgeObserver for ChannelObserver {
    fn on_sample(&self, sample: SampleEvent) {
        self.send(BridgeEvent::Sample(sample));
    }

    fn on_error(&self, pipeline_id: PipelineId, message: &str) {
        self.send(BridgeEvent::Error {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_debug(&self, pipeline_id: PipelineId, message: &str) {
        self.send(BridgeEvent::Debug {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_warning(&self, pipeline_id: PipelineId, message: &str) {
        self.send(BridgeEvent::Warning {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_info(&self, pipeline_id: PipelineId, message: &str) {
        self.send(BridgeEvent::Info {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_eos(&self, pipeline_id: PipelineId) {
        self.send(BridgeEvent::Eos { pipeline_id });
    }

    fn on_state_changed(&self, pipeline_id: PipelineId, old: PipelineState, new: PipelineState) {
        self.send(BridgeEvent::StateChanged {
            pipeline_id,
            old,
            new,
        });
    }
}

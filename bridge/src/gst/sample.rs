//! Buffer transfer from the emission endpoint to the observer.

use crate::gst::pipeline::HandleShared;
use gstreamer as gst;
use gstreamer::glib;
use gstreamer_app as gst_app;
use pipebridge_types::SampleEvent;
use std::sync::Arc;
use tracing::{trace, warn};

/// Name of the element whose samples are delivered to the observer.
pub const EMISSION_ENDPOINT: &str = "sink";

/// Copy the contents of `buffer` into a new allocation.
///
/// The returned vector is sized to the buffer's reported length and holds
/// no reference into framework memory, so the buffer may be recycled as
/// soon as this returns.
pub fn extract(buffer: &gst::BufferRef) -> Result<Vec<u8>, glib::BoolError> {
    let map = buffer.map_readable()?;
    Ok(map.as_slice().to_vec())
}

/// Install the new-sample callback on the emission endpoint.
pub(crate) fn attach(sink: &gst_app::AppSink, shared: Arc<HandleShared>) {
    sink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                if shared.is_destroyed() {
                    return Err(gst::FlowError::Flushing);
                }
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                deliver(&shared, &sample);
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

/// Remove the callback so no further samples reach the observer.
pub(crate) fn detach(sink: &gst_app::AppSink) {
    sink.set_callbacks(gst_app::AppSinkCallbacks::builder().build());
}

fn deliver(shared: &HandleShared, sample: &gst::Sample) {
    let Some(buffer) = sample.buffer() else {
        trace!("Pipeline {}: sample without buffer skipped", shared.id());
        return;
    };

    match extract(buffer) {
        Ok(data) => shared.observer().on_sample(SampleEvent {
            pipeline_id: shared.id(),
            data,
            duration_ns: buffer.duration().map(gst::ClockTime::nseconds),
            pts_ns: buffer.pts().map(gst::ClockTime::nseconds),
        }),
        Err(e) => warn!("Pipeline {}: failed to map sample buffer: {}", shared.id(), e),
    }
}

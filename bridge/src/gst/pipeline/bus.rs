use super::{from_gst_state, HandleShared};
use crate::gst::overlay::{self, BindOutcome, OverlayTarget};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_video as gst_video;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Install the event bridge as the bus's synchronous handler.
///
/// The handler runs on whichever thread posted the message and drops every
/// message afterwards, so nothing queues up on the (unwatched) bus.
pub(super) fn install(pipeline: &gst::Pipeline, shared: Arc<HandleShared>) {
    let Some(bus) = pipeline.bus() else {
        error!(
            "Pipeline {} does not have a bus - events will not be forwarded",
            shared.id
        );
        return;
    };

    let weak_pipeline = pipeline.downgrade();
    bus.set_sync_handler(move |_bus, msg| {
        if let Some(pipeline) = weak_pipeline.upgrade() {
            shared.handle_message(&pipeline, msg);
        }
        gst::BusSyncReply::Drop
    });
}

fn source_name(msg: &gst::MessageRef) -> String {
    msg.src()
        .map(|src| src.name().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl HandleShared {
    fn handle_message(self: &Arc<Self>, pipeline: &gst::Pipeline, msg: &gst::MessageRef) {
        if self.is_destroyed() {
            return;
        }

        if let Some(request) = overlay::prepare_request(msg) {
            self.on_prepare_window_handle(request);
            return;
        }

        use gst::MessageView;
        match msg.view() {
            MessageView::Error(err) => {
                let message = format!("error from element {}: {}", source_name(msg), err.error());
                error!("Pipeline {}: {}", self.id, message);
                self.observer.on_error(self.id, &message);
                if let Some(debug_info) = err.debug() {
                    self.observer.on_debug(self.id, debug_info.as_str());
                }
                self.force_ready(pipeline, "error");
            }
            MessageView::Warning(w) => {
                let message = format!("warning from element {}: {}", source_name(msg), w.error());
                if let Some(debug_info) = w.debug() {
                    debug!("Pipeline {}: warning details: {}", self.id, debug_info);
                }
                self.observer.on_warning(self.id, &message);
            }
            MessageView::Info(i) => {
                let message = format!("info from element {}: {}", source_name(msg), i.error());
                self.observer.on_info(self.id, &message);
            }
            MessageView::Eos(_) => {
                info!("Pipeline {} reached end of stream", self.id);
                self.observer.on_eos(self.id);
                self.force_ready(pipeline, "end of stream");
            }
            MessageView::StateChanged(state_changed) => {
                let old = state_changed.old();
                let current = state_changed.current();
                if msg.src() != Some(pipeline.upcast_ref::<gst::Object>()) {
                    debug!(
                        "Pipeline {}: element '{}' state changed: {:?} -> {:?}",
                        self.id,
                        source_name(msg),
                        old,
                        current
                    );
                    return;
                }

                info!(
                    "Pipeline {} state changed: {:?} -> {:?} (pending: {:?})",
                    self.id,
                    old,
                    current,
                    state_changed.pending()
                );
                let old = from_gst_state(old);
                let new = from_gst_state(current);
                *self.cached_state.write() = new;
                self.overlay.on_state_changed(new);
                self.observer.on_state_changed(self.id, old, new);
            }
            _ => {
                trace!("Pipeline {}: bus message {:?}", self.id, msg.type_());
            }
        }
    }

    fn on_prepare_window_handle(self: &Arc<Self>, overlay: Option<gst_video::VideoOverlay>) {
        let Some(overlay) = overlay else {
            warn!(
                "Pipeline {}: prepare-window-handle from an element without the overlay interface",
                self.id
            );
            return;
        };

        let target: Arc<dyn OverlayTarget> = Arc::new(overlay);
        match self
            .overlay
            .prepare(target, self.state(), self.redraw_listener())
        {
            BindOutcome::Bound => {}
            BindOutcome::Degraded(reason) => warn!("Pipeline {}: {}", self.id, reason),
        }
    }

    /// Ask the pipeline to go back to READY without blocking the posting
    /// thread, which may be a streaming thread.
    fn force_ready(self: &Arc<Self>, pipeline: &gst::Pipeline, reason: &'static str) {
        debug!("Pipeline {}: forcing READY after {}", self.id, reason);
        let shared = Arc::downgrade(self);
        pipeline.call_async(move |pipeline| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let _guard = shared.state_lock.lock();
            if shared.is_destroyed() {
                return;
            }
            if let Err(e) = pipeline.set_state(gst::State::Ready) {
                warn!(
                    "Pipeline {}: failed to return to READY after {}: {}",
                    shared.id, reason, e
                );
            }
        });
    }
}

//! Video overlay synchronization.
//!
//! Video sinks that implement `GstVideoOverlay` post a one-shot
//! `prepare-window-handle` message before rendering their first frame. The
//! pipeline's bus handler intercepts it and hands the sink to an
//! [`OverlaySynchronizer`], which binds it to the host surface registered
//! for that pipeline and keeps its render rectangle in step with the
//! host's redraw/resize notifications.

mod surface;

pub use surface::{
    DisplaySurface, NativeHandle, NativeSurfaceResolver, QuartzResolver, RedrawListener,
    SurfaceDescriptor, SurfaceError, SurfaceSubscription, SurfaceWindow, Win32Resolver,
    WindowingBackend, X11Resolver,
};

use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use gstreamer_video as gst_video;
use gstreamer_video::prelude::*;
use parking_lot::Mutex;
use pipebridge_types::{GeometryRect, PipelineId, PipelineState};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// The video-overlay capability of a rendering element.
pub trait OverlayTarget: Send + Sync {
    fn set_window_handle(&self, handle: NativeHandle);

    fn set_render_rectangle(&self, rect: GeometryRect) -> Result<(), glib::BoolError>;

    /// Ask the sink to redraw its last frame.
    fn expose(&self);

    fn name(&self) -> String;
}

impl OverlayTarget for gst_video::VideoOverlay {
    fn set_window_handle(&self, handle: NativeHandle) {
        // SAFETY: the handle was resolved from a host surface, or supplied
        // directly by the host, and the host keeps that window alive for as
        // long as it stays bound to this pipeline.
        unsafe { VideoOverlayExtManual::set_window_handle(self, handle.as_raw()) }
    }

    fn set_render_rectangle(&self, rect: GeometryRect) -> Result<(), glib::BoolError> {
        VideoOverlayExt::set_render_rectangle(self, rect.x, rect.y, rect.width, rect.height)
    }

    fn expose(&self) {
        VideoOverlayExt::expose(self)
    }

    fn name(&self) -> String {
        self.dynamic_cast_ref::<gst::Object>()
            .map(|object| object.name().to_string())
            .unwrap_or_else(|| "video-overlay".to_string())
    }
}

/// What the host has registered to receive a pipeline's video.
#[derive(Clone)]
pub enum OverlaySurface {
    /// A native window handle supplied in advance
    Handle(NativeHandle),
    /// A host widget, resolved to a native handle when the sink asks for one
    Widget(Weak<dyn DisplaySurface>),
}

impl OverlaySurface {
    /// Register a host widget without taking ownership of it.
    pub fn widget<S: DisplaySurface + 'static>(surface: &Arc<S>) -> Self {
        let weak: Weak<dyn DisplaySurface> = Arc::downgrade(surface);
        Self::Widget(weak)
    }
}

impl std::fmt::Debug for OverlaySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handle(handle) => f.debug_tuple("Handle").field(handle).finish(),
            Self::Widget(weak) => f
                .debug_tuple("Widget")
                .field(&(weak.strong_count() > 0))
                .finish(),
        }
    }
}

/// Result of trying to bind an overlay capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    /// No binding was made; video renders without the host surface.
    Degraded(String),
}

struct OverlayBinding {
    target: Arc<dyn OverlayTarget>,
    _subscription: Option<SurfaceSubscription>,
}

#[derive(Default)]
struct OverlayState {
    surface: Option<OverlaySurface>,
    binding: Option<OverlayBinding>,
    /// Capability from a prepare request that found no surface
    orphan: Option<Arc<dyn OverlayTarget>>,
}

/// Keeps at most one overlay capability per pipeline bound to the host's
/// display surface.
///
/// Prepare requests arrive on a streaming thread while redraws arrive on
/// the host's GUI thread; all state sits behind one mutex that is never
/// held while calling into the sink or the host.
pub struct OverlaySynchronizer {
    pipeline_id: PipelineId,
    resolver: Arc<dyn NativeSurfaceResolver>,
    state: Mutex<OverlayState>,
}

impl OverlaySynchronizer {
    pub fn new(pipeline_id: PipelineId, resolver: Arc<dyn NativeSurfaceResolver>) -> Self {
        Self {
            pipeline_id,
            resolver,
            state: Mutex::new(OverlayState::default()),
        }
    }

    /// Register the surface that future prepare requests bind to.
    ///
    /// If the sink already asked for a window (bound or not), it is rebound
    /// to the new surface right away.
    pub fn set_surface(
        &self,
        surface: OverlaySurface,
        pipeline_state: PipelineState,
        listener: RedrawListener,
    ) -> Option<BindOutcome> {
        let known_target = {
            let mut state = self.state.lock();
            state.surface = Some(surface);
            match state.binding.as_ref() {
                Some(binding) => Some(binding.target.clone()),
                None => state.orphan.take(),
            }
        };

        known_target.map(|target| {
            debug!(
                "Pipeline {}: rebinding overlay '{}' to the new surface",
                self.pipeline_id,
                target.name()
            );
            self.prepare(target, pipeline_state, listener)
        })
    }

    /// Handle a prepare-window-handle request for `target`.
    ///
    /// Runs synchronously on the thread that posted the request.
    pub fn prepare(
        &self,
        target: Arc<dyn OverlayTarget>,
        pipeline_state: PipelineState,
        listener: RedrawListener,
    ) -> BindOutcome {
        let surface = self.state.lock().surface.clone();

        let subscription = match surface {
            None => {
                self.state.lock().orphan = Some(target);
                return BindOutcome::Degraded(format!(
                    "no display surface registered for pipeline {}, video will not be composited",
                    self.pipeline_id
                ));
            }
            Some(OverlaySurface::Handle(handle)) => {
                target.set_window_handle(handle);
                info!(
                    "Pipeline {}: overlay '{}' bound to window {}",
                    self.pipeline_id,
                    target.name(),
                    handle
                );
                None
            }
            Some(OverlaySurface::Widget(weak)) => {
                let Some(surface) = weak.upgrade() else {
                    self.state.lock().orphan = Some(target);
                    return BindOutcome::Degraded(SurfaceError::SurfaceGone.to_string());
                };
                let handle = match self.resolver.resolve(surface.as_ref()) {
                    Ok(handle) => handle,
                    Err(e) => {
                        self.state.lock().orphan = Some(target);
                        return BindOutcome::Degraded(e.to_string());
                    }
                };
                target.set_window_handle(handle);
                let geometry = surface.geometry();
                apply_geometry(self.pipeline_id, target.as_ref(), geometry);
                info!(
                    "Pipeline {}: overlay '{}' bound to {:?} window {} at {}",
                    self.pipeline_id,
                    target.name(),
                    self.resolver.backend(),
                    handle,
                    geometry
                );
                Some(surface.subscribe(listener))
            }
        };

        let previous = {
            let mut state = self.state.lock();
            state.orphan = None;
            state.binding.replace(OverlayBinding {
                target: target.clone(),
                _subscription: subscription,
            })
        };
        if let Some(previous) = previous {
            debug!(
                "Pipeline {}: replaced overlay binding '{}'",
                self.pipeline_id,
                previous.target.name()
            );
        }

        if pipeline_state.is_at_least(PipelineState::Playing) {
            target.expose();
        }

        BindOutcome::Bound
    }

    /// Host redraw/resize notification.
    ///
    /// The geometry is always applied; the sink is only asked to re-render
    /// while the pipeline is playing.
    pub fn on_redraw(&self, geometry: GeometryRect, pipeline_state: PipelineState) {
        let Some(target) = self.bound_target() else {
            return;
        };
        apply_geometry(self.pipeline_id, target.as_ref(), geometry);
        if pipeline_state.is_at_least(PipelineState::Playing) {
            target.expose();
        }
    }

    /// Mirror of the pipeline's state transitions.
    pub fn on_state_changed(&self, new_state: PipelineState) {
        if new_state != PipelineState::Playing {
            return;
        }
        if let Some(target) = self.bound_target() {
            target.expose();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.state.lock().binding.is_some()
    }

    /// Drop the binding, its subscription, and the registered surface.
    pub fn clear(&self) {
        let (binding, orphan) = {
            let mut state = self.state.lock();
            state.surface = None;
            (state.binding.take(), state.orphan.take())
        };
        if binding.is_some() {
            debug!("Pipeline {}: overlay binding released", self.pipeline_id);
        }
        drop(binding);
        drop(orphan);
    }

    fn bound_target(&self) -> Option<Arc<dyn OverlayTarget>> {
        self.state
            .lock()
            .binding
            .as_ref()
            .map(|binding| binding.target.clone())
    }
}

fn apply_geometry(pipeline_id: PipelineId, target: &dyn OverlayTarget, geometry: GeometryRect) {
    if geometry.is_empty() {
        debug!(
            "Pipeline {}: ignoring empty surface geometry {}",
            pipeline_id, geometry
        );
        return;
    }
    if let Err(e) = target.set_render_rectangle(geometry) {
        warn!(
            "Pipeline {}: failed to set render rectangle {} on '{}': {}",
            pipeline_id,
            geometry,
            target.name(),
            e
        );
    }
}

/// The overlay capability of a prepare-window-handle message's source, if
/// `msg` is such a message.
pub(crate) fn prepare_request(msg: &gst::MessageRef) -> Option<Option<gst_video::VideoOverlay>> {
    if !gst_video::is_video_overlay_prepare_window_handle_message(msg) {
        return None;
    }
    Some(
        msg.src()
            .and_then(|src| src.clone().dynamic_cast::<gst_video::VideoOverlay>().ok()),
    )
}

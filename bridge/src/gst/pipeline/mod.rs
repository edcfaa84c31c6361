//! GStreamer pipeline handles.
//!
//! A [`PipelineHandle`] owns one top-level `gst::Pipeline` built from a
//! textual description. Construction wires up the event bridge (a bus
//! sync handler), the buffer transfer path (when the graph has an app sink
//! named `sink`), the ingress channel (an app source named `src`) and the
//! overlay synchronizer.

mod bus;
mod lifecycle;
mod state;

pub(crate) use state::{from_gst_state, to_gst_state};

use crate::gst::ingress::INJECTION_ENDPOINT;
use crate::gst::overlay::{
    BindOutcome, NativeHandle, NativeSurfaceResolver, OverlaySurface, OverlaySynchronizer,
    RedrawListener,
};
use crate::gst::sample::{self, EMISSION_ENDPOINT};
use crate::observer::BridgeObserver;
use crate::registry::RegistryLink;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use parking_lot::{ReentrantMutex, RwLock};
use pipebridge_types::{PipelineId, PipelineState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GStreamer error: {0}")]
    GStreamer(#[from] gst::glib::Error),

    #[error("GStreamer boolean error: {0}")]
    BoolError(#[from] gst::glib::BoolError),

    #[error("Failed to construct pipeline: {0}")]
    Construction(String),

    #[error("Pipeline id {0} is already registered")]
    DuplicateId(PipelineId),

    #[error("No pipeline registered under id {0}")]
    UnknownId(PipelineId),

    #[error("Pipeline {0} has been destroyed")]
    Destroyed(PipelineId),

    #[error("Pipeline state change failed: {0}")]
    StateChange(String),
}

/// State shared between a handle and the callbacks it installs on the
/// framework's threads.
pub(crate) struct HandleShared {
    id: PipelineId,
    observer: Arc<dyn BridgeObserver>,
    /// Mirror of the top-level pipeline's state, updated from the bus
    cached_state: RwLock<PipelineState>,
    overlay: OverlaySynchronizer,
    destroyed: AtomicBool,
    /// Held across every state request, the forced READY and teardown.
    /// Reentrant because observer callbacks may run inside `set_state`.
    state_lock: ReentrantMutex<()>,
    registration: RegistryLink,
}

impl HandleShared {
    pub(crate) fn id(&self) -> PipelineId {
        self.id
    }

    pub(crate) fn observer(&self) -> &dyn BridgeObserver {
        self.observer.as_ref()
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn state(&self) -> PipelineState {
        *self.cached_state.read()
    }

    /// Listener handed to display surfaces; holds the handle weakly so a
    /// surface outliving the pipeline keeps nothing alive.
    fn redraw_listener(self: &Arc<Self>) -> RedrawListener {
        let weak = Arc::downgrade(self);
        Arc::new(move |geometry| {
            if let Some(shared) = weak.upgrade() {
                if !shared.is_destroyed() {
                    shared.overlay.on_redraw(geometry, shared.state());
                }
            }
        })
    }
}

/// Framework objects owned by a handle until it is destroyed.
struct Graph {
    pipeline: gst::Pipeline,
    emission: Option<gst_app::AppSink>,
    injection: Option<gst_app::AppSrc>,
}

impl Graph {
    /// Detach the bridge and bring the pipeline down to NULL.
    fn shut_down(self) -> Result<gst::StateChangeSuccess, gst::StateChangeError> {
        if let Some(sink) = &self.emission {
            sample::detach(sink);
        }
        let result = self.pipeline.set_state(gst::State::Null);
        if let Some(bus) = self.pipeline.bus() {
            bus.unset_sync_handler();
        }
        result
    }
}

struct HandleInner {
    shared: Arc<HandleShared>,
    /// `None` once destroyed
    graph: RwLock<Option<Graph>>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        self.shared.destroyed.store(true, Ordering::Release);
        let Some(graph) = self.graph.get_mut().take() else {
            return;
        };
        debug!(
            "Pipeline {}: last handle dropped without destroy, shutting down",
            self.shared.id
        );
        let _guard = self.shared.state_lock.lock();
        if let Err(e) = graph.shut_down() {
            warn!("Pipeline {}: failed to reach NULL: {}", self.shared.id, e);
        }
        self.shared.overlay.clear();
    }
}

/// A live pipeline and its bridge.
///
/// Cloning is cheap; every clone refers to the same pipeline.
#[derive(Clone)]
pub struct PipelineHandle {
    inner: Arc<HandleInner>,
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("id", &self.inner.shared.id)
            .field("state", &self.inner.shared.state())
            .field("destroyed", &self.inner.shared.is_destroyed())
            .finish()
    }
}

impl PipelineHandle {
    /// Build a pipeline from `description` and attach the bridge to it.
    ///
    /// On a parse failure the error is reported through `observer` before
    /// returning. `default_window`, when set, is bound as the overlay
    /// surface until the host binds its own.
    pub fn new(
        description: &str,
        id: PipelineId,
        observer: Arc<dyn BridgeObserver>,
        resolver: Arc<dyn NativeSurfaceResolver>,
        default_window: Option<NativeHandle>,
    ) -> Result<Self, PipelineError> {
        debug!("Pipeline {}: parsing '{}'", id, description);

        let pipeline = match parse(description) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                let message = format!("failed to parse pipeline description: {}", e);
                error!("Pipeline {}: {}", id, message);
                observer.on_error(id, &message);
                return Err(PipelineError::Construction(message));
            }
        };

        let shared = Arc::new(HandleShared {
            id,
            observer,
            cached_state: RwLock::new(PipelineState::Null),
            overlay: OverlaySynchronizer::new(id, resolver),
            destroyed: AtomicBool::new(false),
            state_lock: ReentrantMutex::new(()),
            registration: RegistryLink::default(),
        });

        if let Some(handle) = default_window {
            shared.overlay.set_surface(
                OverlaySurface::Handle(handle),
                PipelineState::Null,
                shared.redraw_listener(),
            );
        }

        bus::install(&pipeline, shared.clone());

        let emission = endpoint::<gst_app::AppSink>(&pipeline, EMISSION_ENDPOINT, id);
        if let Some(sink) = &emission {
            sample::attach(sink, shared.clone());
        }
        let injection = endpoint::<gst_app::AppSrc>(&pipeline, INJECTION_ENDPOINT, id);

        info!(
            "Pipeline {} created (emission: {}, injection: {})",
            id,
            emission.is_some(),
            injection.is_some()
        );

        Ok(Self {
            inner: Arc::new(HandleInner {
                shared,
                graph: RwLock::new(Some(Graph {
                    pipeline,
                    emission,
                    injection,
                })),
            }),
        })
    }

    /// Register the host surface video should render into.
    ///
    /// Returns the outcome of binding an overlay that already asked for a
    /// window, or `None` if none has asked yet.
    pub fn bind_overlay(
        &self,
        surface: OverlaySurface,
    ) -> Result<Option<BindOutcome>, PipelineError> {
        self.ensure_alive("bind overlay")?;
        let shared = &self.inner.shared;
        debug!("Pipeline {}: binding overlay surface {:?}", shared.id, surface);

        let outcome = shared
            .overlay
            .set_surface(surface, shared.state(), shared.redraw_listener());
        if let Some(BindOutcome::Degraded(reason)) = &outcome {
            warn!("Pipeline {}: {}", shared.id, reason);
        }
        Ok(outcome)
    }

    /// The underlying framework pipeline, or `None` once destroyed.
    pub fn pipeline(&self) -> Option<gst::Pipeline> {
        self.inner
            .graph
            .read()
            .as_ref()
            .map(|graph| graph.pipeline.clone())
    }

    pub(crate) fn injection_endpoint(
        &self,
        operation: &str,
    ) -> Result<Option<gst_app::AppSrc>, PipelineError> {
        self.with_graph(operation, |graph| graph.injection.clone())
    }

    pub(crate) fn live_pipeline(&self, operation: &str) -> Result<gst::Pipeline, PipelineError> {
        self.with_graph(operation, |graph| graph.pipeline.clone())
    }

    pub(crate) fn registration(&self) -> &RegistryLink {
        &self.inner.shared.registration
    }

    /// True if both handles refer to the same pipeline.
    pub(crate) fn ptr_eq(&self, other: &PipelineHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn with_graph<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&Graph) -> R,
    ) -> Result<R, PipelineError> {
        self.ensure_alive(operation)?;
        match self.inner.graph.read().as_ref() {
            Some(graph) => Ok(f(graph)),
            None => Err(PipelineError::Destroyed(self.inner.shared.id)),
        }
    }

    pub(crate) fn ensure_alive(&self, operation: &str) -> Result<(), PipelineError> {
        if self.inner.shared.is_destroyed() {
            error!(
                "Pipeline {}: cannot {} on a destroyed pipeline",
                self.inner.shared.id, operation
            );
            return Err(PipelineError::Destroyed(self.inner.shared.id));
        }
        Ok(())
    }
}

fn parse(description: &str) -> Result<gst::Pipeline, PipelineError> {
    let element = gst::parse::launch(description)?;
    match element.downcast::<gst::Pipeline>() {
        Ok(pipeline) => Ok(pipeline),
        Err(element) => {
            let pipeline = gst::Pipeline::new();
            pipeline.add(&element)?;
            Ok(pipeline)
        }
    }
}

/// Look up a named endpoint of a specific kind. An element with the right
/// name but the wrong type is treated as absent.
fn endpoint<T: IsA<gst::Element>>(pipeline: &gst::Pipeline, name: &str, id: PipelineId) -> Option<T> {
    let element = pipeline.by_name(name)?;
    match element.downcast::<T>() {
        Ok(endpoint) => Some(endpoint),
        Err(element) => {
            debug!(
                "Pipeline {}: element '{}' is a {}, not usable as an endpoint",
                id,
                name,
                element.type_().name()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gst::overlay::X11Resolver;
    use crate::test_support::{wait_until, RecordingObserver};
    use std::time::Duration;

    fn create(description: &str, id: PipelineId) -> (PipelineHandle, Arc<RecordingObserver>) {
        gst::init().unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let handle = PipelineHandle::new(
            description,
            id,
            observer.clone(),
            Arc::new(X11Resolver),
            None,
        )
        .unwrap();
        (handle, observer)
    }

    #[test]
    fn test_parse_failure_reports_through_observer() {
        gst::init().unwrap();
        let observer = Arc::new(RecordingObserver::default());

        let result = PipelineHandle::new(
            "this-element-does-not-exist ! fakesink",
            5,
            observer.clone(),
            Arc::new(X11Resolver),
            None,
        );

        assert!(matches!(result, Err(PipelineError::Construction(_))));
        let errors = observer.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("failed to parse pipeline description"));
    }

    #[test]
    fn test_single_element_is_wrapped() {
        let (handle, _observer) = create("fakesink name=sink", 1);
        assert!(handle.pipeline().unwrap().by_name("sink").is_some());
        // fakesink is not an app sink
        assert!(!handle.has_emission_endpoint());
        handle.destroy().unwrap();
    }

    #[test]
    fn test_endpoints_are_located_by_name() {
        let (handle, _observer) = create("appsrc name=src ! appsink name=sink", 2);
        assert!(handle.has_emission_endpoint());
        assert!(handle.has_injection_endpoint());
        handle.destroy().unwrap();

        let (handle, _observer) = create("fakesrc ! fakesink", 3);
        assert!(!handle.has_emission_endpoint());
        assert!(!handle.has_injection_endpoint());
        handle.destroy().unwrap();
    }

    #[test]
    fn test_calls_on_destroyed_handle_fail() {
        let (handle, _observer) = create("fakesrc ! fakesink", 4);
        handle.destroy().unwrap();

        assert!(matches!(handle.start(), Err(PipelineError::Destroyed(4))));
        assert!(matches!(handle.pause(), Err(PipelineError::Destroyed(4))));
        assert!(matches!(handle.stop(), Err(PipelineError::Destroyed(4))));
        assert!(matches!(handle.destroy(), Err(PipelineError::Destroyed(4))));
        assert!(matches!(
            handle.push_buffer(&[0; 4]),
            Err(PipelineError::Destroyed(4))
        ));
        assert!(matches!(
            handle.bind_overlay(OverlaySurface::Handle(NativeHandle::new(1))),
            Err(PipelineError::Destroyed(4))
        ));
    }

    #[test]
    fn test_state_mirrors_top_level_pipeline() {
        let (handle, observer) = create("fakesrc ! fakesink sync=false", 6);
        assert_eq!(handle.state(), PipelineState::Null);

        let transitions = || -> Vec<(PipelineState, PipelineState)> {
            observer
                .events()
                .into_iter()
                .filter_map(|event| match event {
                    pipebridge_types::BridgeEvent::StateChanged { old, new, .. } => {
                        Some((old, new))
                    }
                    _ => None,
                })
                .collect()
        };

        handle.start().unwrap();
        assert!(wait_until(Duration::from_secs(5), || transitions().len() == 3));
        assert_eq!(handle.state(), PipelineState::Playing);
        assert_eq!(
            transitions(),
            vec![
                (PipelineState::Null, PipelineState::Ready),
                (PipelineState::Ready, PipelineState::Paused),
                (PipelineState::Paused, PipelineState::Playing),
            ]
        );

        handle.destroy().unwrap();
        assert_eq!(handle.state(), PipelineState::Null);
    }

    #[test]
    fn test_forced_ready_never_follows_destroy() {
        for id in 30..40 {
            let (handle, _observer) = create("fakesrc name=source ! fakesink sync=false", id);
            handle.start().unwrap();
            let pipeline = handle.pipeline().unwrap();
            let source = pipeline.by_name("source").unwrap();

            let message = gst::message::Error::builder(gst::CoreError::Failed, "teardown")
                .src(&source)
                .build();
            source.post_message(message).unwrap();
            handle.destroy().unwrap();

            std::thread::sleep(Duration::from_millis(50));
            assert_eq!(pipeline.current_state(), gst::State::Null);
            assert!(handle.pipeline().is_none());
        }
    }

    #[test]
    fn test_push_without_injection_endpoint() {
        let (handle, observer) = create("fakesrc ! fakesink", 8);
        assert_eq!(
            handle.push_buffer(&[1, 2, 3]).unwrap(),
            crate::gst::PushOutcome::NoInjectionEndpoint
        );
        assert!(observer.errors().is_empty());
        handle.destroy().unwrap();
    }

    #[test]
    fn test_surface_resize_reaches_bound_overlay() {
        use crate::gst::overlay::{SurfaceDescriptor, SurfaceWindow};
        use crate::test_support::{OverlayCall, RecordingOverlay};
        use pipebridge_types::GeometryRect;

        let (handle, _observer) = create("fakesrc ! fakesink", 10);
        let surface = Arc::new(SurfaceDescriptor::new(
            SurfaceWindow::Xlib(0x77),
            GeometryRect::new(0, 0, 640, 480),
        ));
        assert_eq!(
            handle.bind_overlay(OverlaySurface::widget(&surface)).unwrap(),
            None
        );

        let overlay = Arc::new(RecordingOverlay::default());
        let shared = &handle.inner.shared;
        shared
            .overlay
            .prepare(overlay.clone(), shared.state(), shared.redraw_listener());
        assert!(handle.is_overlay_bound());

        surface.resize(GeometryRect::new(10, 10, 320, 200));
        assert_eq!(
            overlay.calls(),
            vec![
                OverlayCall::WindowHandle(0x77),
                OverlayCall::RenderRectangle(GeometryRect::new(0, 0, 640, 480)),
                OverlayCall::RenderRectangle(GeometryRect::new(10, 10, 320, 200)),
            ]
        );

        handle.destroy().unwrap();
        assert_eq!(surface.subscriber_count(), 0);
        surface.redraw();
        assert_eq!(overlay.calls().len(), 3);
    }

    #[test]
    fn test_default_window_binds_on_prepare() {
        gst::init().unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let handle = PipelineHandle::new(
            "fakesrc ! fakesink",
            9,
            observer,
            Arc::new(X11Resolver),
            Some(NativeHandle::new(0x42)),
        )
        .unwrap();

        let overlay = Arc::new(crate::test_support::RecordingOverlay::default());
        handle.inner.shared.overlay.prepare(
            overlay.clone(),
            PipelineState::Paused,
            handle.inner.shared.redraw_listener(),
        );
        assert_eq!(
            overlay.calls(),
            vec![crate::test_support::OverlayCall::WindowHandle(0x42)]
        );

        handle.destroy().unwrap();
        assert!(!handle.inner.shared.overlay.is_bound());
    }

    fn add_overlay_element(handle: &PipelineHandle) -> crate::test_support::TestVideoOverlay {
        let element = crate::test_support::TestVideoOverlay::new("video");
        handle.pipeline().unwrap().add(&element).unwrap();
        element
    }

    fn request_window(element: &crate::test_support::TestVideoOverlay) {
        let message =
            gst::message::Element::builder(gst::Structure::new_empty("prepare-window-handle"))
                .src(element)
                .build();
        element.post_message(message).unwrap();
    }

    #[test]
    fn test_prepare_request_without_surface_binds_once_surface_arrives() {
        use crate::test_support::OverlayCall;

        let (handle, observer) = create("fakesrc ! fakesink", 20);
        let element = add_overlay_element(&handle);

        request_window(&element);
        assert!(!handle.is_overlay_bound());
        assert!(element.calls().is_empty());
        assert!(observer.errors().is_empty());

        let outcome = handle
            .bind_overlay(OverlaySurface::Handle(NativeHandle::new(0x51)))
            .unwrap();
        assert_eq!(outcome, Some(BindOutcome::Bound));
        assert!(handle.is_overlay_bound());
        assert_eq!(element.calls(), vec![OverlayCall::WindowHandle(0x51)]);

        handle.destroy().unwrap();
    }

    #[test]
    fn test_prepare_while_paused_exposes_once_playing() {
        use crate::gst::overlay::{SurfaceDescriptor, SurfaceWindow};
        use crate::test_support::OverlayCall;
        use pipebridge_types::GeometryRect;

        let (handle, observer) = create("fakesrc ! fakesink sync=false", 21);
        let element = add_overlay_element(&handle);
        let surface = Arc::new(SurfaceDescriptor::new(
            SurfaceWindow::Xlib(0x90),
            GeometryRect::new(0, 0, 320, 240),
        ));
        assert_eq!(
            handle.bind_overlay(OverlaySurface::widget(&surface)).unwrap(),
            None
        );

        handle.pause().unwrap();
        assert!(wait_until(Duration::from_secs(5), || {
            handle.state() == PipelineState::Paused
        }));

        request_window(&element);
        assert!(handle.is_overlay_bound());
        assert_eq!(
            element.calls(),
            vec![
                OverlayCall::WindowHandle(0x90),
                OverlayCall::RenderRectangle(GeometryRect::new(0, 0, 320, 240)),
            ]
        );

        handle.start().unwrap();
        assert!(wait_until(Duration::from_secs(5), || {
            element.calls().contains(&OverlayCall::Expose)
        }));
        assert!(observer.errors().is_empty());

        handle.destroy().unwrap();
    }
}

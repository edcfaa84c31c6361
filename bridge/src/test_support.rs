//! Test doubles shared by the unit tests.

use crate::gst::overlay::{NativeHandle, OverlayTarget};
use crate::observer::BridgeObserver;
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::subclass::prelude::*;
use gstreamer_video as gst_video;
use parking_lot::Mutex;
use pipebridge_types::{BridgeEvent, GeometryRect, PipelineId, PipelineState, SampleEvent};
use std::time::{Duration, Instant};

/// Observer that records every callback.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<BridgeEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.lock().clone()
    }

    pub fn samples(&self) -> Vec<SampleEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BridgeEvent::Sample(sample) => Some(sample.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BridgeEvent::Error { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BridgeEvent::Warning { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: BridgeEvent) {
        self.events.lock().push(event);
    }
}

impl BridgeObserver for RecordingObserver {
    fn on_sample(&self, sample: SampleEvent) {
        self.push(BridgeEvent::Sample(sample));
    }

    fn on_error(&self, pipeline_id: PipelineId, message: &str) {
        self.push(BridgeEvent::Error {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_debug(&self, pipeline_id: PipelineId, message: &str) {
        self.push(BridgeEvent::Debug {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_warning(&self, pipeline_id: PipelineId, message: &str) {
        self.push(BridgeEvent::Warning {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_info(&self, pipeline_id: PipelineId, message: &str) {
        self.push(BridgeEvent::Info {
            pipeline_id,
            message: message.to_string(),
        });
    }

    fn on_eos(&self, pipeline_id: PipelineId) {
        self.push(BridgeEvent::Eos { pipeline_id });
    }

    fn on_state_changed(&self, pipeline_id: PipelineId, old: PipelineState, new: PipelineState) {
        self.push(BridgeEvent::StateChanged {
            pipeline_id,
            old,
            new,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayCall {
    WindowHandle(usize),
    RenderRectangle(GeometryRect),
    Expose,
}

/// Overlay capability that records what the synchronizer asks of it.
#[derive(Default)]
pub struct RecordingOverlay {
    calls: Mutex<Vec<OverlayCall>>,
}

impl RecordingOverlay {
    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().clone()
    }

    pub fn expose_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| **call == OverlayCall::Expose)
            .count()
    }
}

impl OverlayTarget for RecordingOverlay {
    fn set_window_handle(&self, handle: NativeHandle) {
        self.calls
            .lock()
            .push(OverlayCall::WindowHandle(handle.as_raw()));
    }

    fn set_render_rectangle(&self, rect: GeometryRect) -> Result<(), glib::BoolError> {
        self.calls.lock().push(OverlayCall::RenderRectangle(rect));
        Ok(())
    }

    fn expose(&self) {
        self.calls.lock().push(OverlayCall::Expose);
    }

    fn name(&self) -> String {
        "recording-overlay".to_string()
    }
}

glib::wrapper! {
    /// Element implementing `GstVideoOverlay` that records what it is asked.
    pub struct TestVideoOverlay(ObjectSubclass<imp::TestVideoOverlay>)
        @extends gst::Element, gst::Object,
        @implements gst_video::VideoOverlay;
}

impl TestVideoOverlay {
    pub fn new(name: &str) -> Self {
        glib::Object::builder().property("name", name).build()
    }

    pub fn calls(&self) -> Vec<OverlayCall> {
        self.imp().calls.lock().clone()
    }
}

mod imp {
    use super::OverlayCall;
    use gstreamer as gst;
    use gstreamer::glib;
    use gstreamer::subclass::prelude::*;
    use gstreamer_video as gst_video;
    use parking_lot::Mutex;
    use pipebridge_types::GeometryRect;
    use std::os::raw::c_int;

    #[derive(Default)]
    pub struct TestVideoOverlay {
        pub(super) calls: Mutex<Vec<OverlayCall>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for TestVideoOverlay {
        const NAME: &'static str = "PipebridgeTestVideoOverlay";
        type Type = super::TestVideoOverlay;
        type ParentType = gst::Element;
        type Interfaces = (gst_video::VideoOverlay,);
    }

    impl ObjectImpl for TestVideoOverlay {}
    impl GstObjectImpl for TestVideoOverlay {}
    impl ElementImpl for TestVideoOverlay {}

    unsafe impl IsImplementable<TestVideoOverlay> for gst_video::VideoOverlay {
        fn interface_init(iface: &mut glib::Interface<Self>) {
            let iface = iface.as_mut();
            iface.set_window_handle = Some(set_window_handle);
            iface.set_render_rectangle = Some(set_render_rectangle);
            iface.expose = Some(expose);
        }
    }

    unsafe fn record(overlay: *mut gst_video::ffi::GstVideoOverlay, call: OverlayCall) {
        let instance = unsafe { &*(overlay as *mut <TestVideoOverlay as ObjectSubclass>::Instance) };
        instance.imp().calls.lock().push(call);
    }

    unsafe extern "C" fn set_window_handle(
        overlay: *mut gst_video::ffi::GstVideoOverlay,
        handle: usize,
    ) {
        unsafe { record(overlay, OverlayCall::WindowHandle(handle)) }
    }

    unsafe extern "C" fn set_render_rectangle(
        overlay: *mut gst_video::ffi::GstVideoOverlay,
        x: c_int,
        y: c_int,
        width: c_int,
        height: c_int,
    ) {
        let rect = GeometryRect::new(x, y, width, height);
        unsafe { record(overlay, OverlayCall::RenderRectangle(rect)) }
    }

    unsafe extern "C" fn expose(overlay: *mut gst_video::ffi::GstVideoOverlay) {
        unsafe { record(overlay, OverlayCall::Expose) }
    }
}

/// Poll `condition` until it holds or `timeout` expires.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

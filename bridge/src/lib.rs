//! pipebridge library.
//!
//! Owns GStreamer pipelines on behalf of a host application, forwards their
//! bus traffic and decoded samples to an injected observer, accepts
//! host-pushed buffers, and keeps a video overlay bound to a host display
//! surface.
//!
//! The entry point is [`BridgeContext`], the process-wide context object:
//!
//! ```no_run
//! use pipebridge::{config::Config, BridgeContext};
//!
//! # fn main() -> anyhow::Result<()> {
//! let context = BridgeContext::new(&Config::default())?;
//! let pipeline = context.create_pipeline("videotestsrc ! appsink name=sink", 1)?;
//! pipeline.start()?;
//! // ... samples arrive on the context's default observer ...
//! context.destroy(1)?;
//! context.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod gst;
pub mod logging;
pub mod observer;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::BridgeContext;
pub use gst::overlay::{
    BindOutcome, DisplaySurface, NativeHandle, NativeSurfaceResolver, OverlaySurface,
    SurfaceDescriptor, SurfaceWindow, WindowingBackend,
};
pub use gst::pipeline::{PipelineError, PipelineHandle};
pub use gst::PushOutcome;
pub use observer::{BridgeObserver, ChannelObserver, TracingObserver};
pub use registry::PipelineRegistry;

pub use pipebridge_types as types;

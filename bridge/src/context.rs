//! Process-wide bridge context.
//!
//! Everything that would otherwise be ambient global state lives here: the
//! pipeline registry, the default observer, the native surface resolver,
//! the default window handle and the GStreamer log bridge.

use crate::config::Config;
use crate::gst::overlay::{BindOutcome, NativeHandle, NativeSurfaceResolver, OverlaySurface};
use crate::gst::pipeline::{PipelineError, PipelineHandle};
use crate::gst::PushOutcome;
use crate::logging::GstLogBridge;
use crate::observer::{BridgeObserver, TracingObserver};
use crate::registry::PipelineRegistry;
use gstreamer as gst;
use parking_lot::{Mutex, RwLock};
use pipebridge_types::PipelineId;
use std::sync::Arc;
use tracing::{info, warn};

pub struct BridgeContext {
    registry: PipelineRegistry,
    default_observer: Arc<dyn BridgeObserver>,
    resolver: Arc<dyn NativeSurfaceResolver>,
    default_window: RwLock<Option<NativeHandle>>,
    log_bridge: Mutex<Option<GstLogBridge>>,
}

impl BridgeContext {
    /// Initialize GStreamer and build a context whose default observer
    /// only logs.
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Like [`BridgeContext::new`], with `observer` receiving the events of
    /// every pipeline created without its own observer.
    pub fn with_observer(
        config: &Config,
        observer: Arc<dyn BridgeObserver>,
    ) -> Result<Self, PipelineError> {
        gst::init()?;
        let log_bridge = GstLogBridge::install(&config.logging);
        let resolver = config.overlay.windowing.resolver();
        info!(
            "Bridge context ready ({}, {:?} windowing)",
            gst::version_string(),
            resolver.backend()
        );

        Ok(Self {
            registry: PipelineRegistry::new(),
            default_observer: observer,
            resolver,
            default_window: RwLock::new(None),
            log_bridge: Mutex::new(Some(log_bridge)),
        })
    }

    /// Construct and register a pipeline reporting to the default observer.
    pub fn create_pipeline(
        &self,
        description: &str,
        id: PipelineId,
    ) -> Result<PipelineHandle, PipelineError> {
        self.create_pipeline_with_observer(description, id, self.default_observer.clone())
    }

    pub fn create_pipeline_with_observer(
        &self,
        description: &str,
        id: PipelineId,
        observer: Arc<dyn BridgeObserver>,
    ) -> Result<PipelineHandle, PipelineError> {
        if self.registry.contains(id) {
            warn!("Pipeline id {} is already in use", id);
            return Err(PipelineError::DuplicateId(id));
        }

        let handle = PipelineHandle::new(
            description,
            id,
            observer,
            self.resolver.clone(),
            *self.default_window.read(),
        )?;

        // Another thread may have claimed the id while we were parsing.
        if let Err(e) = self.registry.register(handle.clone()) {
            warn!("Pipeline id {} was registered concurrently", id);
            if let Err(destroy_err) = handle.destroy() {
                warn!("Pipeline {}: {}", id, destroy_err);
            }
            return Err(e);
        }
        Ok(handle)
    }

    pub fn lookup(&self, id: PipelineId) -> Option<PipelineHandle> {
        self.registry.lookup(id)
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    pub fn bind_overlay(
        &self,
        id: PipelineId,
        surface: OverlaySurface,
    ) -> Result<Option<BindOutcome>, PipelineError> {
        self.get(id)?.bind_overlay(surface)
    }

    pub fn start(&self, id: PipelineId) -> Result<(), PipelineError> {
        self.get(id)?.start()
    }

    pub fn pause(&self, id: PipelineId) -> Result<(), PipelineError> {
        self.get(id)?.pause()
    }

    pub fn stop(&self, id: PipelineId) -> Result<(), PipelineError> {
        self.get(id)?.stop()
    }

    pub fn push_buffer(&self, id: PipelineId, data: &[u8]) -> Result<PushOutcome, PipelineError> {
        self.get(id)?.push_buffer(data)
    }

    /// Destroy a pipeline and remove it from the registry.
    pub fn destroy(&self, id: PipelineId) -> Result<(), PipelineError> {
        let handle = self
            .registry
            .remove(id)
            .ok_or(PipelineError::UnknownId(id))?;
        handle.destroy()
    }

    /// Window handle bound to pipelines created from now on, unless they
    /// are given their own surface. `None` clears it.
    pub fn set_window_handle(&self, handle: Option<NativeHandle>) {
        *self.default_window.write() = handle;
        match handle {
            Some(handle) => info!("Default window handle set to {}", handle),
            None => info!("Default window handle cleared"),
        }
    }

    pub fn window_handle(&self) -> Option<NativeHandle> {
        *self.default_window.read()
    }

    /// Destroy every live pipeline and remove the log bridge.
    pub fn shutdown(&self) {
        let handles = self.registry.drain();
        if !handles.is_empty() {
            info!("Shutting down {} pipeline(s)", handles.len());
        }
        for handle in handles {
            if let Err(e) = handle.destroy() {
                warn!("Pipeline {}: {}", handle.id(), e);
            }
        }
        self.log_bridge.lock().take();
    }

    fn get(&self, id: PipelineId) -> Result<PipelineHandle, PipelineError> {
        self.registry
            .lookup(id)
            .ok_or(PipelineError::UnknownId(id))
    }
}

impl Drop for BridgeContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

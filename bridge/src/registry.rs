//! Registry of live pipelines keyed by host-assigned id.
//!
//! Lookups come from host threads and from callbacks on the framework's
//! threads; inserts and removals come from create/destroy on host threads.

use crate::gst::pipeline::{PipelineError, PipelineHandle};
use parking_lot::{Mutex, RwLock};
use pipebridge_types::PipelineId;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

type PipelineMap = RwLock<HashMap<PipelineId, PipelineHandle>>;

#[derive(Debug, Clone, Default)]
pub struct PipelineRegistry {
    pipelines: Arc<PipelineMap>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under its id. An id that is already taken is
    /// rejected and the existing entry is left alone.
    pub fn register(&self, handle: PipelineHandle) -> Result<(), PipelineError> {
        let id = handle.id();
        let mut pipelines = self.pipelines.write();
        if pipelines.contains_key(&id) {
            return Err(PipelineError::DuplicateId(id));
        }
        handle.registration().link(&self.pipelines);
        pipelines.insert(id, handle);
        tracing::debug!("Registered pipeline {}", id);
        Ok(())
    }

    pub fn lookup(&self, id: PipelineId) -> Option<PipelineHandle> {
        self.pipelines.read().get(&id).cloned()
    }

    pub fn contains(&self, id: PipelineId) -> bool {
        self.pipelines.read().contains_key(&id)
    }

    pub fn remove(&self, id: PipelineId) -> Option<PipelineHandle> {
        let removed = self.pipelines.write().remove(&id);
        if removed.is_some() {
            tracing::debug!("Unregistered pipeline {}", id);
        }
        removed
    }

    /// Remove and return every registered pipeline.
    pub fn drain(&self) -> Vec<PipelineHandle> {
        self.pipelines.write().drain().map(|(_, handle)| handle).collect()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<PipelineId> {
        let mut ids: Vec<_> = self.pipelines.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.pipelines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.read().is_empty()
    }
}

/// Weak link from a registered handle back to its registry, so destroying
/// the handle directly also drops its entry.
#[derive(Default)]
pub(crate) struct RegistryLink {
    pipelines: Mutex<Option<Weak<PipelineMap>>>,
}

impl RegistryLink {
    fn link(&self, pipelines: &Arc<PipelineMap>) {
        *self.pipelines.lock() = Some(Arc::downgrade(pipelines));
    }

    /// Remove `handle`'s entry unless its id now belongs to another handle.
    pub(crate) fn unregister(&self, handle: &PipelineHandle) {
        let Some(pipelines) = self.pipelines.lock().take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        let id = handle.id();
        let removed = {
            let mut pipelines = pipelines.write();
            match pipelines.get(&id) {
                Some(entry) if entry.ptr_eq(handle) => pipelines.remove(&id),
                _ => None,
            }
        };
        if removed.is_some() {
            tracing::debug!("Unregistered pipeline {} on destroy", id);
        }
    }
}

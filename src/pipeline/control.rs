use crate::model::report::MoleculeReport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop flag for a running pipeline.
///
/// Clones share the flag. The pipeline checks it before starting each
/// molecule; a molecule already in progress runs to completion.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives progress from a running pipeline.
///
/// Calls may arrive concurrently from several workers and in any molecule
/// order.
pub trait PipelineObserver: Send + Sync {
    /// Called once with the number of molecules about to be processed.
    fn run_started(&self, _molecules: usize) {}

    /// Called after each molecule has been assigned, built and screened.
    fn molecule_done(&self, _report: &MoleculeReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

//! Call executors
//!
//! The engine decides *whether* a call may run; a [`CallExecutor`] performs
//! it. An executor error fails the whole `execute` and leaves the operation
//! Ready for a later resubmission.

use parking_lot::Mutex;
use rolmanager_core::{Address, ManagerError, Result};
use rolmanager_journal::Call;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Performs the effect of an executed call
pub trait CallExecutor: Send + fmt::Debug {
    /// Apply `call`, returning its output
    fn call(&mut self, call: &Call) -> Result<Vec<u8>>;
}

impl<E: CallExecutor + ?Sized> CallExecutor for Box<E> {
    fn call(&mut self, call: &Call) -> Result<Vec<u8>> {
        (**self).call(call)
    }
}

/// Executor whose calls always succeed with no output
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExecutor;

impl CallExecutor for NoopExecutor {
    fn call(&mut self, call: &Call) -> Result<Vec<u8>> {
        tracing::trace!(target_address = %call.target, "noop call");
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<Call>,
    failing: BTreeSet<Address>,
}

/// Executor that records every successful call
///
/// Clones share one log, so a test keeps a clone and inspects it after the
/// manager has taken ownership of another. Targets marked failing reject
/// their calls until cleared.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingExecutor {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject calls against `target`
    pub fn fail_target(&self, target: Address) {
        self.inner.lock().failing.insert(target);
    }

    /// Accept calls against `target` again
    pub fn clear_failure(&self, target: &Address) {
        self.inner.lock().failing.remove(target);
    }

    /// Successful calls in execution order
    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }
}

impl CallExecutor for RecordingExecutor {
    fn call(&mut self, call: &Call) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        if inner.failing.contains(&call.target) {
            return Err(ManagerError::effect_failed(format!(
                "call against {} rejected",
                call.target
            )));
        }
        inner.calls.push(call.clone());
        Ok(call.payload.clone())
    }
}

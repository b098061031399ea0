use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation token shared between a host and module hooks.
///
/// The runtime never interrupts a hook that is already executing; modules
/// are expected to poll [`CancelFlag::is_cancelled`] at their own safe
/// points and return early.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Execution context handed to every lifecycle hook and request handler
/// within one processing cycle.
#[derive(Debug, Clone)]
pub struct ExecContext {
    height: u64,
    cancel: CancelFlag,
}

impl ExecContext {
    pub fn new(height: u64) -> Self {
        Self {
            height,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(height: u64, cancel: CancelFlag) -> Self {
        Self { height, cancel }
    }

    /// Cycle number this context belongs to.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

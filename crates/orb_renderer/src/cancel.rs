//! Cooperative cancellation for in-flight renders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag checked between pixels.
///
/// Clones observe the same flag. A [`child`](CancelToken::child) is
/// cancelled when its parent is, but cancelling the child leaves the
/// parent untouched; dispatch uses one to stop sibling buckets after a
/// failure without cancelling the caller's token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    ancestors: Vec<Arc<AtomicBool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Work already past its last check finishes.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.ancestors.iter().any(|a| a.load(Ordering::Relaxed))
    }

    /// A token that also observes this one (and its ancestors).
    pub fn child(&self) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.flag.clone());
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            ancestors,
        }
    }
}

//! Cooperative cancellation for review passes.
//!
//! A review polls its `CancelToken` at fixed checkpoints; nothing is
//! interrupted preemptively. `ReviewRegistry` tracks the token of the pass
//! currently running for each identity so another caller can stop it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// A cancellation token that can be checked by the review loop.
#[derive(Clone, Debug)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the active review token per identity.
#[derive(Default)]
pub struct ReviewRegistry {
    tokens: Mutex<HashMap<String, CancelToken>>,
}

impl ReviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a token for a new pass. A pass still registered
    /// for the same identity is cancelled, since it is being superseded.
    pub fn register(&self, identity: &str) -> CancelToken {
        let token = CancelToken::new();
        if let Some(previous) = self
            .tokens
            .lock()
            .insert(identity.to_owned(), token.clone())
        {
            previous.cancel();
        }
        token
    }

    /// Cancel the running pass for an identity. Returns true if one was found.
    pub fn cancel(&self, identity: &str) -> bool {
        match self.tokens.lock().get(identity) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Unregister `token` once its pass finishes. A newer registration for
    /// the same identity is left alone.
    pub fn finish(&self, identity: &str, token: &CancelToken) {
        let mut tokens = self.tokens.lock();
        if tokens.get(identity).is_some_and(|t| t.same_as(token)) {
            tokens.remove(identity);
        }
    }

    pub fn is_running(&self, identity: &str) -> bool {
        self.tokens.lock().contains_key(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_lifecycle() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn registry_register_and_cancel() {
        let registry = ReviewRegistry::new();
        let token = registry.register("lanlan");
        assert!(registry.is_running("lanlan"));
        assert!(registry.cancel("lanlan"));
        assert!(token.is_cancelled());
        assert!(!registry.cancel("nobody"));
    }

    #[test]
    fn new_registration_supersedes_old() {
        let registry = ReviewRegistry::new();
        let first = registry.register("lanlan");
        let second = registry.register("lanlan");
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        // The stale pass finishing must not unregister the live one.
        registry.finish("lanlan", &first);
        assert!(registry.is_running("lanlan"));
        registry.finish("lanlan", &second);
        assert!(!registry.is_running("lanlan"));
    }
}

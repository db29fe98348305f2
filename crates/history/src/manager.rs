//! Per-identity rolling history: append, compact, review, clear.
//!
//! Every mutating operation on an identity runs under that identity's
//! async lock and reloads the durable record first, so appends from other
//! processes and from concurrent tasks are never silently dropped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use memoir_domain::config::{Config, ConfigSource, HistoryConfig, NameMapping};
use memoir_domain::error::{Error, Result};
use memoir_domain::message::Message;
use memoir_domain::trace::TraceEvent;
use memoir_providers::SummarizerFactory;
use parking_lot::Mutex;

use crate::cancel::{CancelToken, ReviewRegistry};
use crate::compactor::Compactor;
use crate::log::IdentityLog;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::review::{NotPerformed, ReviewOutcome, Reviewer};

pub struct HistoryManager {
    history: HistoryConfig,
    names: NameMapping,
    /// Live source for the auto-review toggle, when hot reload is wanted.
    live: Option<Arc<dyn ConfigSource>>,
    log: Arc<dyn IdentityLog>,
    compactor: Compactor,
    reviewer: Reviewer,
    /// Last known sequence per identity.
    cache: Mutex<HashMap<String, Vec<Message>>>,
    /// Identities cleared since their last persist.
    pending_clear: Mutex<HashSet<String>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    reviews: ReviewRegistry,
}

impl HistoryManager {
    pub fn new(
        config: &Config,
        log: Arc<dyn IdentityLog>,
        factory: Arc<dyn SummarizerFactory>,
    ) -> Result<Self> {
        Self::with_sleeper(config, log, factory, Arc::new(TokioSleeper))
    }

    /// Like [`HistoryManager::new`] with a custom backoff clock.
    pub fn with_sleeper(
        config: &Config,
        log: Arc<dyn IdentityLog>,
        factory: Arc<dyn SummarizerFactory>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        if config.history.max_history_length < 2 {
            return Err(Error::Config(format!(
                "history.max_history_length must be at least 2 (got {})",
                config.history.max_history_length
            )));
        }
        let policy = RetryPolicy::from_config(&config.history);
        Ok(Self {
            history: config.history.clone(),
            names: config.names.clone(),
            live: None,
            log,
            compactor: Compactor::new(
                factory.clone(),
                sleeper.clone(),
                policy.clone(),
                config.history.summary_char_limit,
            ),
            reviewer: Reviewer::new(factory, sleeper, policy),
            cache: Mutex::new(HashMap::new()),
            pending_clear: Mutex::new(HashSet::new()),
            locks: Mutex::new(HashMap::new()),
            reviews: ReviewRegistry::new(),
        })
    }

    /// Read `history.auto_review` from `source` before every review pass.
    pub fn with_config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.live = Some(source);
        self
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Update path
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Append `new_messages`, compacting the oldest turns into a memo when
    /// the history grows past `max_history_length`. Always persists;
    /// summarizer and storage failures are logged, never returned.
    pub async fn update_history(&self, new_messages: Vec<Message>, identity: &str, detailed: bool) {
        let lock = self.identity_lock(identity);
        let _guard = lock.lock().await;

        let mut history = self.reconcile(identity).await;
        history.extend(new_messages);

        let max = self.history.max_history_length;
        if history.len() > max {
            let split = history.len() - (max - 1);
            let outcome = self
                .compactor
                .compact(&history[..split], identity, &self.names, detailed)
                .await;
            TraceEvent::HistoryCompacted {
                identity: identity.to_owned(),
                compacted: split,
                kept: max - 1,
                summary_chars: outcome.raw_summary_text.chars().count(),
                fallback: outcome.is_fallback(),
            }
            .emit();

            let recent = history.split_off(split);
            history = Vec::with_capacity(max);
            history.push(outcome.summary_message);
            history.extend(recent);
        }

        self.cache.lock().insert(identity.to_owned(), history.clone());
        self.persist(identity, &history).await;
    }

    /// Current history, preferring the durable record when one exists.
    pub async fn get_recent_history(&self, identity: &str) -> Vec<Message> {
        if self.pending_clear.lock().contains(identity) {
            return self.cached(identity);
        }
        match self.log.load(identity).await {
            Ok(Some(messages)) => {
                self.cache.lock().insert(identity.to_owned(), messages.clone());
                messages
            }
            Ok(None) => self.cached(identity),
            Err(e) => {
                tracing::warn!(identity, error = %e, "history load failed, using cached copy");
                self.cached(identity)
            }
        }
    }

    /// Empty the history. The durable record keeps its old contents until
    /// the next persist for this identity, but reads see the cleared state.
    /// Waits for any in-flight update or review of the identity to finish.
    pub async fn clear_history(&self, identity: &str) {
        let lock = self.identity_lock(identity);
        let _guard = lock.lock().await;

        self.cache.lock().insert(identity.to_owned(), Vec::new());
        self.pending_clear.lock().insert(identity.to_owned());
        tracing::info!(identity, "history cleared");
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Review path
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Run a review pass. True iff a correction was applied and persisted.
    pub async fn review_history(&self, identity: &str, cancel: &CancelToken) -> bool {
        self.run_review(identity, cancel).await.is_corrected()
    }

    /// Register a cancel token for a review of `identity`, cancelling any
    /// pass already registered for it.
    pub fn begin_review(&self, identity: &str) -> CancelToken {
        self.reviews.register(identity)
    }

    /// Cancel the registered review for `identity`, if any.
    pub fn cancel_review(&self, identity: &str) -> bool {
        self.reviews.cancel(identity)
    }

    pub fn review_running(&self, identity: &str) -> bool {
        self.reviews.is_running(identity)
    }

    /// Review pass with the detailed outcome.
    pub async fn run_review(&self, identity: &str, cancel: &CancelToken) -> ReviewOutcome {
        let outcome = self.review_locked(identity, cancel).await;
        self.reviews.finish(identity, cancel);

        if let ReviewOutcome::NotPerformed(reason) = &outcome {
            TraceEvent::ReviewSkipped {
                identity: identity.to_owned(),
                reason: reason.to_string(),
            }
            .emit();
        }
        outcome
    }

    async fn review_locked(&self, identity: &str, cancel: &CancelToken) -> ReviewOutcome {
        if cancel.is_cancelled() {
            return ReviewOutcome::NotPerformed(NotPerformed::Cancelled);
        }
        if !self.auto_review_enabled() {
            return ReviewOutcome::NotPerformed(NotPerformed::Disabled);
        }

        let lock = self.identity_lock(identity);
        let _guard = lock.lock().await;

        let history = self.reconcile(identity).await;
        if cancel.is_cancelled() {
            return ReviewOutcome::NotPerformed(NotPerformed::Cancelled);
        }
        if history.is_empty() {
            return ReviewOutcome::NotPerformed(NotPerformed::EmptyHistory);
        }

        let outcome = self
            .reviewer
            .review(&history, identity, &self.names, cancel)
            .await;
        let ReviewOutcome::Corrected { messages, explanation } = outcome else {
            return outcome;
        };

        if !self.persist(identity, &messages).await {
            return ReviewOutcome::NotPerformed(NotPerformed::Failed);
        }
        self.cache.lock().insert(identity.to_owned(), messages.clone());
        tracing::info!(
            identity,
            explanation = explanation.as_str(),
            "review applied"
        );
        TraceEvent::ReviewApplied {
            identity: identity.to_owned(),
            before: history.len(),
            after: messages.len(),
        }
        .emit();
        ReviewOutcome::Corrected { messages, explanation }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Internals
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Refresh the cached sequence from the durable record. Skipped while a
    /// clear is pending so the stale record is not resurrected.
    async fn reconcile(&self, identity: &str) -> Vec<Message> {
        let cleared = self.pending_clear.lock().contains(identity);
        if cleared {
            return self.cached(identity);
        }
        match self.log.load(identity).await {
            Ok(Some(messages)) => {
                TraceEvent::HistoryLoaded {
                    identity: identity.to_owned(),
                    messages: messages.len(),
                }
                .emit();
                self.cache.lock().insert(identity.to_owned(), messages.clone());
                messages
            }
            Ok(None) => self.cached(identity),
            Err(e) => {
                tracing::warn!(identity, error = %e, "history reload failed, using cached copy");
                self.cached(identity)
            }
        }
    }

    async fn persist(&self, identity: &str, messages: &[Message]) -> bool {
        match self.log.save(identity, messages).await {
            Ok(()) => {
                self.pending_clear.lock().remove(identity);
                TraceEvent::HistoryPersisted {
                    identity: identity.to_owned(),
                    messages: messages.len(),
                }
                .emit();
                true
            }
            Err(e) => {
                tracing::error!(identity, error = %e, "failed to persist history");
                false
            }
        }
    }

    fn auto_review_enabled(&self) -> bool {
        match &self.live {
            Some(source) => match source.current() {
                Ok(config) => config.history.auto_review,
                Err(e) => {
                    tracing::warn!(error = %e, "config reload failed, keeping auto_review setting");
                    self.history.auto_review
                }
            },
            None => self.history.auto_review,
        }
    }

    fn cached(&self, identity: &str) -> Vec<Message> {
        self.cache.lock().get(identity).cloned().unwrap_or_default()
    }

    fn identity_lock(&self, identity: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        if locks.len() >= PRUNE_THRESHOLD {
            retain_busy(&mut locks);
        }
        locks.entry(identity.to_owned()).or_default().clone()
    }

    /// Drop the locks of identities with no operation running or queued.
    pub fn prune_idle_locks(&self) {
        retain_busy(&mut self.locks.lock());
    }
}

/// Lock-map size above which idle entries are dropped on the next lookup.
const PRUNE_THRESHOLD: usize = 256;

/// Anyone running or waiting on an identity holds a clone of its lock.
fn retain_busy(locks: &mut HashMap<String, Arc<tokio::sync::Mutex<()>>>) {
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::InMemoryLog;
    use memoir_domain::error::Result;
    use memoir_providers::Summarizer;

    struct NoSummarizer;

    impl SummarizerFactory for NoSummarizer {
        fn build_summary_client(&self) -> Result<Arc<dyn Summarizer>> {
            Err(Error::Other("unused".into()))
        }
        fn build_review_client(&self) -> Result<Arc<dyn Summarizer>> {
            Err(Error::Other("unused".into()))
        }
    }

    fn manager() -> HistoryManager {
        HistoryManager::new(
            &Config::default(),
            Arc::new(InMemoryLog::new()),
            Arc::new(NoSummarizer),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn idle_locks_are_pruned() {
        let manager = manager();
        for i in 0..5 {
            manager
                .update_history(vec![Message::user("hi")], &format!("id-{i}"), false)
                .await;
        }
        assert_eq!(manager.locks.lock().len(), 5);

        let held = manager.identity_lock("id-0");
        manager.prune_idle_locks();
        assert_eq!(manager.locks.lock().len(), 1);
        assert!(manager.locks.lock().contains_key("id-0"));

        drop(held);
        manager.prune_idle_locks();
        assert!(manager.locks.lock().is_empty());
    }

    #[tokio::test]
    async fn lock_map_stays_bounded() {
        let manager = manager();
        for i in 0..(PRUNE_THRESHOLD + 10) {
            manager
                .update_history(vec![Message::user("hi")], &format!("id-{i}"), false)
                .await;
        }
        assert!(manager.locks.lock().len() <= PRUNE_THRESHOLD);
    }
}

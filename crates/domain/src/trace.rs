use serde::Serialize;

/// Structured trace events emitted across all memoir crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    HistoryLoaded {
        identity: String,
        messages: usize,
    },
    HistoryPersisted {
        identity: String,
        messages: usize,
    },
    HistoryCompacted {
        identity: String,
        compacted: usize,
        kept: usize,
        summary_chars: usize,
        fallback: bool,
    },
    SummarizerRetry {
        stage: String,
        attempt: u32,
        max_attempts: u32,
        reason: String,
        backoff_ms: u64,
    },
    ReviewApplied {
        identity: String,
        before: usize,
        after: usize,
    },
    ReviewSkipped {
        identity: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "memoir_event");
    }
}

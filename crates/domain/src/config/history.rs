use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Recent history
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bounds and policies for the per-identity recent history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of messages kept after an append. Older turns are
    /// folded into one memo message.
    #[serde(default = "d_10")]
    pub max_history_length: usize,
    /// Run the periodic consistency review. Re-read before every pass.
    #[serde(default = "d_true")]
    pub auto_review: bool,
    /// Directory holding one `<identity>.json` log per identity.
    #[serde(default = "d_state_dir")]
    pub state_dir: PathBuf,
    /// Summaries longer than this (in characters) are condensed again.
    #[serde(default = "d_500")]
    pub summary_char_limit: usize,
    /// Attempts per summarizer call, shared by all failure kinds.
    #[serde(default = "d_3")]
    pub max_retries: u32,
    /// First rate-limit backoff; doubles on every further retry.
    #[serde(default = "d_1000u")]
    pub base_backoff_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history_length: 10,
            auto_review: true,
            state_dir: d_state_dir(),
            summary_char_limit: 500,
            max_retries: 3,
            base_backoff_ms: 1_000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_10() -> usize {
    10
}
fn d_500() -> usize {
    500
}
fn d_3() -> u32 {
    3
}
fn d_1000u() -> u64 {
    1_000
}
fn d_state_dir() -> PathBuf {
    PathBuf::from("memory/recent")
}

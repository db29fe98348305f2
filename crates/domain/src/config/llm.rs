use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Summarizer models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection and model settings for the summarization and review calls.
///
/// Read fresh on every client construction, so edits to the config file
/// apply to the next compaction or review without a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint, e.g. `https://openrouter.ai/api/v1`.
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Model used for compaction (both stages).
    #[serde(default = "d_summary_model")]
    pub summary_model: String,
    /// Model used for the consistency review pass.
    #[serde(default = "d_correction_model")]
    pub correction_model: String,
    /// Models that need `{"enable_thinking": false}` in the request body.
    #[serde(default)]
    pub extra_body_models: HashSet<String>,
    #[serde(default = "d_120000u")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            summary_model: d_summary_model(),
            correction_model: d_correction_model(),
            extra_body_models: HashSet::new(),
            timeout_ms: 120_000,
            auth: AuthConfig::default(),
        }
    }
}

impl LlmConfig {
    pub fn needs_extra_body(&self, model: &str) -> bool {
        self.extra_body_models.contains(model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer `env`).
    #[serde(default)]
    pub key: Option<String>,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn d_summary_model() -> String {
    "qwen/qwen-plus".into()
}
fn d_correction_model() -> String {
    "qwen/qwen-max".into()
}
fn d_120000u() -> u64 {
    120_000
}

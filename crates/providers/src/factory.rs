//! Builds summarizer clients from the live configuration.
//!
//! Nothing is cached: every call re-reads the [`ConfigSource`] and
//! constructs a fresh HTTP client, so model, endpoint, and credential
//! changes take effect on the next compaction or review.

use std::sync::Arc;
use std::time::Duration;

use memoir_domain::config::{ConfigSource, LlmConfig};
use memoir_domain::error::Result;

use crate::client::ModelClient;
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::Summarizer;
use crate::util::resolve_api_key;

/// Compaction tolerates a little phrasing variance.
pub const SUMMARY_TEMPERATURE: f32 = 0.3;
/// Review rewrites stored history, so it stays close to deterministic.
pub const REVIEW_TEMPERATURE: f32 = 0.1;

pub trait SummarizerFactory: Send + Sync {
    /// Client for both compaction stages.
    fn build_summary_client(&self) -> Result<Arc<dyn Summarizer>>;
    /// Client for the consistency review pass.
    fn build_review_client(&self) -> Result<Arc<dyn Summarizer>>;
}

pub struct ConfiguredSummarizerFactory {
    config: Arc<dyn ConfigSource>,
}

impl ConfiguredSummarizerFactory {
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self { config }
    }

    fn client_for(
        &self,
        pick_model: impl Fn(&LlmConfig) -> &str,
        temperature: f32,
    ) -> Result<ModelClient> {
        let llm = self.config.current()?.llm;
        let model = pick_model(&llm).to_owned();
        let provider = OpenAiCompatProvider::new(
            "summarizer",
            &llm.base_url,
            resolve_api_key(&llm.auth)?,
            model.clone(),
            Duration::from_millis(llm.timeout_ms),
        )?;

        let mut client = ModelClient::new(Arc::new(provider), model.clone(), temperature);
        if llm.needs_extra_body(&model) {
            client = client.with_extra_body(serde_json::json!({"enable_thinking": false}));
        }
        Ok(client)
    }
}

impl SummarizerFactory for ConfiguredSummarizerFactory {
    fn build_summary_client(&self) -> Result<Arc<dyn Summarizer>> {
        let client = self.client_for(|llm| llm.summary_model.as_str(), SUMMARY_TEMPERATURE)?;
        Ok(Arc::new(client))
    }

    fn build_review_client(&self) -> Result<Arc<dyn Summarizer>> {
        let client = self.client_for(|llm| llm.correction_model.as_str(), REVIEW_TEMPERATURE)?;
        Ok(Arc::new(client))
    }
}

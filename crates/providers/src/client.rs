use std::sync::Arc;

use memoir_domain::error::Result;
use memoir_domain::message::Message;
use serde_json::Value;

use crate::traits::{ChatRequest, LlmProvider, Summarizer};

/// A provider pinned to one model and sampling setting.
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    extra_body: Option<Value>,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            extra_body: None,
        }
    }

    pub fn with_extra_body(mut self, extra_body: Value) -> Self {
        self.extra_body = Some(extra_body);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn extra_body(&self) -> Option<&Value> {
        self.extra_body.as_ref()
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![Message::user(prompt)],
            temperature: Some(self.temperature),
            model: Some(self.model.clone()),
            extra_body: self.extra_body.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Summarizer for ModelClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let resp = self.provider.chat(&self.request(prompt)).await?;
        tracing::debug!(
            provider = %self.provider.provider_id(),
            model = %resp.model,
            chars = resp.content.len(),
            "summarizer completion"
        );
        Ok(resp.content)
    }
}

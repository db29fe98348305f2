#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use memoir_domain::config::Config;
use memoir_domain::error::{Error, Result};
use memoir_history::{CancelToken, HistoryManager, IdentityLog, InMemoryLog, Sleeper};
use memoir_providers::{Summarizer, SummarizerFactory};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Holds a summarizer call open until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

/// Summarizer that replays canned replies and records every prompt.
#[derive(Default)]
pub struct ScriptedSummarizer {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: Mutex<Option<fn() -> Result<String>>>,
    gate: Mutex<Option<Arc<Gate>>>,
    cancel_on_call: Mutex<Option<CancelToken>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedSummarizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Result<String>) -> &Self {
        self.replies.lock().push_back(reply);
        self
    }

    /// Reply used once the queue is empty.
    pub fn always(&self, reply: fn() -> Result<String>) {
        *self.fallback.lock() = Some(reply);
    }

    /// Block every subsequent call on the returned gate.
    pub fn gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Cancel `token` from inside each call, before replying.
    pub fn cancel_on_call(&self, token: CancelToken) {
        *self.cancel_on_call.lock() = Some(token);
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait::async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_owned());
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(token) = self.cancel_on_call.lock().as_ref() {
            token.cancel();
        }
        if let Some(reply) = self.replies.lock().pop_front() {
            return reply;
        }
        match *self.fallback.lock() {
            Some(reply) => reply(),
            None => Err(Error::Other("no scripted reply".into())),
        }
    }
}

pub struct ScriptedFactory {
    pub summary: Arc<ScriptedSummarizer>,
    pub review: Arc<ScriptedSummarizer>,
}

impl SummarizerFactory for ScriptedFactory {
    fn build_summary_client(&self) -> Result<Arc<dyn Summarizer>> {
        Ok(self.summary.clone())
    }

    fn build_review_client(&self) -> Result<Arc<dyn Summarizer>> {
        Ok(self.review.clone())
    }
}

/// Records requested delays without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    pub slept: Mutex<Vec<Duration>>,
    cancel_on_sleep: Mutex<Option<CancelToken>>,
}

impl RecordingSleeper {
    /// Cancel `token` whenever a backoff wait starts.
    pub fn cancel_on_sleep(&self, token: CancelToken) {
        *self.cancel_on_sleep.lock() = Some(token);
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
        if let Some(token) = self.cancel_on_sleep.lock().as_ref() {
            token.cancel();
        }
    }
}

pub fn summary_reply(summary: &str) -> Result<String> {
    Ok(serde_json::json!({ "对话摘要": summary }).to_string())
}

pub fn rate_limited() -> Result<String> {
    Err(Error::RateLimited {
        provider: "test".into(),
        message: "HTTP 429".into(),
    })
}

pub fn config(max_history_length: usize) -> Config {
    let mut config = Config::default();
    config.history.max_history_length = max_history_length;
    config
}

pub struct Harness {
    pub manager: Arc<HistoryManager>,
    pub log: Arc<InMemoryLog>,
    pub summary: Arc<ScriptedSummarizer>,
    pub review: Arc<ScriptedSummarizer>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self::with_log(config, Arc::new(InMemoryLog::new()))
    }

    pub fn with_log(config: Config, log: Arc<InMemoryLog>) -> Self {
        let summary = ScriptedSummarizer::new();
        let review = ScriptedSummarizer::new();
        let sleeper = Arc::new(RecordingSleeper::default());
        let factory = Arc::new(ScriptedFactory {
            summary: summary.clone(),
            review: review.clone(),
        });
        let manager = HistoryManager::with_sleeper(
            &config,
            log.clone() as Arc<dyn IdentityLog>,
            factory,
            sleeper.clone(),
        )
        .unwrap();
        Self {
            manager: Arc::new(manager),
            log,
            summary,
            review,
            sleeper,
        }
    }
}

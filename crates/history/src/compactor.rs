//! Fold an overflowing history prefix into a single memo message.
//!
//! Two stages: the transcript is summarized, and a summary longer than
//! `char_limit` is condensed once more under its own retry budget. When
//! every attempt fails the caller still gets a placeholder memo, so the
//! append path is never blocked by the summarizer.

use std::sync::Arc;

use memoir_domain::config::NameMapping;
use memoir_domain::error::{Error, Result};
use memoir_domain::message::Message;
use memoir_providers::{Summarizer, SummarizerFactory};

use crate::prompts::{compaction_prompt, condense_prompt, memo_message, placeholder_memo};
use crate::render::compaction_transcript;
use crate::reply::decode_summary;
use crate::retry::{Disposition, Retry, RetryOutcome, RetryPolicy, Sleeper};

#[derive(Debug, Clone, PartialEq)]
pub struct CompactionOutcome {
    /// System memo that replaces the compacted prefix.
    pub summary_message: Message,
    /// First-stage summary as the model produced it. Empty on fallback.
    pub raw_summary_text: String,
    /// Every attempt failed and `summary_message` is the placeholder memo.
    pub fallback: bool,
}

impl CompactionOutcome {
    pub fn placeholder() -> Self {
        Self {
            summary_message: placeholder_memo(),
            raw_summary_text: String::new(),
            fallback: true,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

pub struct Compactor {
    factory: Arc<dyn SummarizerFactory>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    char_limit: usize,
}

impl Compactor {
    pub fn new(
        factory: Arc<dyn SummarizerFactory>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        char_limit: usize,
    ) -> Self {
        Self {
            factory,
            sleeper,
            policy,
            char_limit,
        }
    }

    pub async fn compact(
        &self,
        messages: &[Message],
        identity: &str,
        names: &NameMapping,
        detailed: bool,
    ) -> CompactionOutcome {
        let client = match self.factory.build_summary_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(identity, error = %e, "summary client unavailable, using placeholder memo");
                return CompactionOutcome::placeholder();
            }
        };

        let transcript = compaction_transcript(messages, identity, names);
        let prompt = compaction_prompt(&transcript, detailed);

        match self.first_stage(client.as_ref(), &prompt).await {
            Ok((summary, raw)) => CompactionOutcome {
                summary_message: memo_message(&summary),
                raw_summary_text: raw,
                fallback: false,
            },
            Err(e) => {
                tracing::warn!(identity, error = %e, "compaction failed, using placeholder memo");
                CompactionOutcome::placeholder()
            }
        }
    }

    /// Returns `(memo text, raw first-stage text)`.
    async fn first_stage(&self, client: &dyn Summarizer, prompt: &str) -> Result<(String, String)> {
        let retry = Retry::new(&self.policy, self.sleeper.as_ref(), "summary");
        let outcome = retry
            .run(classify, move |_attempt| async move {
                let raw = client.complete(prompt).await?;
                let summary = decode_summary(&raw)?;
                if summary.chars().count() <= self.char_limit {
                    return Ok((summary.clone(), summary));
                }
                tracing::debug!(chars = summary.chars().count(), "summary over limit, condensing");
                // A failed condense fails this attempt; it must not back off
                // as if the first stage itself had been rate limited.
                let condensed = self
                    .condense(client, &summary)
                    .await
                    .map_err(|e| Error::Other(format!("condense stage failed: {e}")))?;
                Ok((condensed, summary))
            })
            .await;
        settle(outcome)
    }

    async fn condense(&self, client: &dyn Summarizer, summary: &str) -> Result<String> {
        let prompt = condense_prompt(summary);
        let prompt = prompt.as_str();
        let retry = Retry::new(&self.policy, self.sleeper.as_ref(), "condense");
        let outcome = retry
            .run(classify, move |_attempt| async move {
                let raw = client.complete(prompt).await?;
                decode_summary(&raw)
            })
            .await;
        settle(outcome)
    }
}

/// Rate limits back off; anything else, malformed replies included, is
/// retried at once.
fn classify(err: &Error) -> Disposition {
    if err.is_rate_limited() {
        Disposition::Backoff
    } else {
        Disposition::Immediate
    }
}

fn settle<T>(outcome: RetryOutcome<T>) -> Result<T> {
    match outcome {
        RetryOutcome::Done(value) => Ok(value),
        RetryOutcome::Exhausted(e) | RetryOutcome::Aborted(e) => Err(e),
        RetryOutcome::Cancelled => Err(Error::Other("compaction cancelled".into())),
    }
}

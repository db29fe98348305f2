//! Consistency review: the summarizer rewrites the whole history.
//!
//! Unlike compaction, only rate limits are retried here. A malformed
//! reply or any other failure ends the pass with nothing changed.

use std::fmt;
use std::sync::Arc;

use memoir_domain::config::NameMapping;
use memoir_domain::error::Error;
use memoir_domain::message::{Message, Role};
use memoir_providers::SummarizerFactory;

use crate::cancel::CancelToken;
use crate::prompts::review_prompt;
use crate::render::review_transcript;
use crate::reply::{decode_review, ReviewReply};
use crate::retry::{Disposition, Retry, RetryOutcome, RetryPolicy, Sleeper};

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Corrected {
        messages: Vec<Message>,
        explanation: String,
    },
    NotPerformed(NotPerformed),
}

impl ReviewOutcome {
    pub fn is_corrected(&self) -> bool {
        matches!(self, ReviewOutcome::Corrected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotPerformed {
    Cancelled,
    Disabled,
    EmptyHistory,
    Malformed,
    Failed,
    Exhausted,
}

impl fmt::Display for NotPerformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotPerformed::Cancelled => "cancelled",
            NotPerformed::Disabled => "disabled",
            NotPerformed::EmptyHistory => "empty_history",
            NotPerformed::Malformed => "malformed_reply",
            NotPerformed::Failed => "summarizer_failed",
            NotPerformed::Exhausted => "retries_exhausted",
        };
        f.write_str(s)
    }
}

/// Resolve a speaker label from a review reply. Unknown or missing labels
/// become `user`.
pub fn map_role(label: Option<&str>, identity: &str, names: &NameMapping) -> Role {
    let Some(label) = label.map(str::trim) else {
        return Role::User;
    };
    let is = |candidate: &str| label.eq_ignore_ascii_case(candidate);
    if is("assistant") || is("ai") || is(identity) {
        Role::Assistant
    } else if is("system") || is("system_message") || is(&names.system) {
        Role::System
    } else {
        Role::User
    }
}

pub struct Reviewer {
    factory: Arc<dyn SummarizerFactory>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl Reviewer {
    pub fn new(
        factory: Arc<dyn SummarizerFactory>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            factory,
            sleeper,
            policy,
        }
    }

    /// Ask the review model for a corrected version of `history`.
    pub async fn review(
        &self,
        history: &[Message],
        identity: &str,
        names: &NameMapping,
        cancel: &CancelToken,
    ) -> ReviewOutcome {
        if history.is_empty() {
            return ReviewOutcome::NotPerformed(NotPerformed::EmptyHistory);
        }

        let client = match self.factory.build_review_client() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(identity, error = %e, "review client unavailable");
                return ReviewOutcome::NotPerformed(NotPerformed::Failed);
            }
        };

        let transcript = review_transcript(history, identity, names);
        let prompt = review_prompt(&names.human, identity, &transcript);
        let prompt = prompt.as_str();
        let client = client.as_ref();

        if cancel.is_cancelled() {
            return ReviewOutcome::NotPerformed(NotPerformed::Cancelled);
        }

        let retry = Retry::new(&self.policy, self.sleeper.as_ref(), "review").with_cancel(cancel);
        let raw = match retry
            .run(classify, move |_attempt| async move { client.complete(prompt).await })
            .await
        {
            RetryOutcome::Done(raw) => raw,
            RetryOutcome::Cancelled => return ReviewOutcome::NotPerformed(NotPerformed::Cancelled),
            RetryOutcome::Exhausted(e) => {
                tracing::warn!(identity, error = %e, "review retries exhausted");
                return ReviewOutcome::NotPerformed(NotPerformed::Exhausted);
            }
            RetryOutcome::Aborted(e) => {
                tracing::warn!(identity, error = %e, "review call failed");
                return ReviewOutcome::NotPerformed(NotPerformed::Failed);
            }
        };

        if cancel.is_cancelled() {
            return ReviewOutcome::NotPerformed(NotPerformed::Cancelled);
        }

        match decode_review(&raw) {
            Ok(reply) => corrected(reply, identity, names),
            Err(e) => {
                tracing::warn!(identity, error = %e, "review reply rejected");
                ReviewOutcome::NotPerformed(NotPerformed::Malformed)
            }
        }
    }
}

fn classify(err: &Error) -> Disposition {
    if err.is_rate_limited() {
        Disposition::Backoff
    } else {
        Disposition::Abort
    }
}

fn corrected(reply: ReviewReply, identity: &str, names: &NameMapping) -> ReviewOutcome {
    let messages = reply
        .messages
        .into_iter()
        .map(|turn| Message::new(map_role(turn.role.as_deref(), identity, names), turn.content))
        .collect();
    ReviewOutcome::Corrected {
        messages,
        explanation: reply.explanation,
    }
}

//! Rolling conversation history per identity.
//!
//! [`HistoryManager`] keeps each identity's recent turns in a durable
//! [`IdentityLog`], folds overflow into a summary memo through the
//! [`Compactor`], and runs cancellable consistency reviews.

pub mod cancel;
pub mod compactor;
pub mod log;
pub mod manager;
pub mod prompts;
pub mod render;
pub mod reply;
pub mod retry;
pub mod review;

pub use cancel::{CancelToken, ReviewRegistry};
pub use compactor::{CompactionOutcome, Compactor};
pub use log::{IdentityLog, InMemoryLog, JsonFileLog};
pub use manager::HistoryManager;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use review::{NotPerformed, ReviewOutcome, Reviewer};

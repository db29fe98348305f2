pub mod client;
pub mod factory;
pub mod openai_compat;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use client::ModelClient;
pub use factory::{ConfiguredSummarizerFactory, SummarizerFactory, REVIEW_TEMPERATURE, SUMMARY_TEMPERATURE};
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{ChatRequest, ChatResponse, LlmProvider, Summarizer};

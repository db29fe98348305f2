//! Shared types for the memoir crates: the message model, the error type,
//! configuration, and structured trace events.

pub mod config;
pub mod error;
pub mod message;
pub mod trace;

pub use error::{Error, Result};
pub use message::{ContentPart, Message, MessageContent, Role};

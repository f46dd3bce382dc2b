#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Message exchange with the remote agent.
//!
//! This crate owns the conversation log and the single in-flight turn:
//! optimistic placeholders, reconciliation of replies by message id, and
//! degradation of every network or format failure into a visible bot
//! message.

mod log;
mod pipeline;

pub use log::ConversationLog;
pub use pipeline::{
    CONNECTION_ERROR, ConversationPipeline, DEFAULT_WELCOME, PipelineConfig, Rejection,
    SubmitOutcome, TurnState, UNEXPECTED_FORMAT,
};

//! Core logic of the chat front-end: the conversation state machine, the
//! one-shot summarizer, model selection and the [`DataState`] type they
//! publish results with.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod chat;
pub mod conversation;
mod data_state;
mod error;
mod model_client;
mod settings;
mod summarizer;

pub use chat::{Chat, ChatBuilder};
pub use conversation::{Draft, Sender, Snapshot, Turn, TurnState};
pub use data_state::{DataState, success_values};
pub use error::{ChatError, ChatErrorKind, SubmitError};
pub use settings::{ModelConfig, ModelSettings, ModelVariant, UnknownVariant};
pub use summarizer::{Summarizer, SummaryState};

//! A terminal front-end for Gemini chat models.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library: [`Session`] bundles a chat and a summarizer over one
//! model provider, ready for any other front-end.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod attachment;
pub mod command;
pub mod config;
mod session;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`gemchat_core`] crate.
pub mod core {
    pub use gemchat_core::*;
}

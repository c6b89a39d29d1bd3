//! An abstraction layer for hosted generative models.
//!
//! This crate establishes a unified protocol for the chat core to request
//! completions from a hosted model, so that the core can switch between
//! providers (or a scripted fake in tests) without knowing anything about
//! their wire formats.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod image;
mod provider;
mod request;
mod response;

pub use error::*;
pub use image::*;
pub use provider::*;
pub use request::*;
pub use response::*;

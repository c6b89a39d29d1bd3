//! Value types for the chat screen: turns, the draft, and the snapshot
//! observers receive.

use gemchat_model::Image;
use serde::{Deserialize, Serialize};

use crate::{ChatError, DataState};

/// The author of a turn.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Sender {
    /// The person typing.
    User,
    /// The model.
    Agent,
}

/// One finished message in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Turn {
    sender: Sender,
    text: String,
    raw_text: String,
}

impl Turn {
    /// Creates a turn written by the user.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Sender::User, text)
    }

    /// Creates a turn written by the model.
    #[inline]
    pub fn agent<S: Into<String>>(text: S) -> Self {
        Self::new(Sender::Agent, text)
    }

    fn new<S: Into<String>>(sender: Sender, text: S) -> Self {
        let raw_text = text.into();
        Self {
            sender,
            text: raw_text.trim().to_owned(),
            raw_text,
        }
    }

    /// Returns the author.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the text for display, with surrounding whitespace removed.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the text exactly as it was sent or received.
    #[inline]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

/// A transcript entry: loading while the model is responding, then either
/// the finished turn or the cause of failure.
pub type TurnState = DataState<Turn, ChatError>;

/// The message being composed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Draft {
    pub(crate) text: String,
    pub(crate) images: Vec<Image>,
}

impl Draft {
    /// Returns the text typed so far.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the attached images, in attachment order.
    #[inline]
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Returns `true` if there is no text and no image.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }

    /// Returns `true` if the draft can be submitted: it has non-blank text,
    /// or it has images and `accepts_images` is set.
    #[inline]
    pub fn is_submittable(&self, accepts_images: bool) -> bool {
        !self.text.trim().is_empty()
            || (accepts_images && !self.images.is_empty())
    }
}

/// An immutable view of a chat session.
///
/// A fresh snapshot is published after every change, observers can keep
/// or compare them freely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Snapshot {
    pub(crate) draft: Draft,
    pub(crate) transcript: Vec<TurnState>,
    pub(crate) generation: u64,
}

impl Snapshot {
    pub(crate) fn with_generation(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    /// Returns the draft being composed.
    #[inline]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Returns the transcript, oldest first.
    #[inline]
    pub fn transcript(&self) -> &[TurnState] {
        &self.transcript
    }

    /// Returns the conversation generation. It changes whenever the
    /// conversation is reset, so a completion started before a reset never
    /// lands in the new conversation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if the last entry is still waiting for the model.
    #[inline]
    pub fn is_awaiting_response(&self) -> bool {
        self.transcript.last().is_some_and(DataState::is_loading)
    }

    /// Returns the finished turns, skipping loading and failed entries.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.transcript.iter().filter_map(DataState::data)
    }
}

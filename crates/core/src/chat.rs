mod builder;

use std::mem;
use std::sync::{Arc, Weak};

use gemchat_model::{Credential, Image, ModelRequest};
use tokio::sync::watch;
use tracing::Instrument;

use crate::conversation::{Snapshot, Turn, TurnState};
use crate::model_client::ModelClient;
use crate::settings::{ModelSettings, ModelVariant};
use crate::{DataState, SubmitError};
pub use builder::ChatBuilder;

type DeltaFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A chat session: the draft being composed, the transcript, and the
/// selected model.
///
/// Every change publishes a new [`Snapshot`]. Draft edits and settings
/// changes apply immediately, even while a response is pending. A
/// submitted draft is answered on a background task, so `Chat` must be
/// used within a Tokio runtime.
///
/// Clones share the same session.
#[derive(Clone)]
pub struct Chat {
    inner: Arc<ChatInner>,
}

struct ChatInner {
    model_client: ModelClient,
    snapshot: watch::Sender<Snapshot>,
    settings: watch::Sender<ModelSettings>,
    on_delta: Option<DeltaFn>,
}

/// A submitted draft waiting for its response.
struct PendingTurn {
    prompt: String,
    images: Vec<Image>,
    slot: usize,
    generation: u64,
}

impl Chat {
    fn from_builder(builder: ChatBuilder) -> Self {
        let ChatBuilder {
            model_client,
            settings,
            on_delta,
        } = builder;

        let (snapshot, _) = watch::channel(Snapshot::default());
        let (settings, _) = watch::channel(settings);
        Self {
            inner: Arc::new(ChatInner {
                model_client,
                snapshot,
                settings,
                on_delta,
            }),
        }
    }

    /// Returns the current snapshot.
    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Returns a receiver that observes every new snapshot.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Returns the selected model.
    #[inline]
    pub fn active_model(&self) -> ModelVariant {
        self.inner.settings.borrow().active()
    }

    /// Returns the current model settings.
    #[inline]
    pub fn settings(&self) -> ModelSettings {
        self.inner.settings.borrow().clone()
    }

    /// Returns a receiver that observes model selection and credential
    /// changes.
    #[inline]
    pub fn subscribe_model(&self) -> watch::Receiver<ModelSettings> {
        self.inner.settings.subscribe()
    }

    /// Replaces the draft text.
    pub fn update_draft_text<S: Into<String>>(&self, text: S) {
        let text = text.into();
        self.inner.snapshot.send_if_modified(|snapshot| {
            if snapshot.draft.text == text {
                return false;
            }
            snapshot.draft.text = text;
            true
        });
    }

    /// Appends images to the draft.
    pub fn attach_images<I: IntoIterator<Item = Image>>(&self, images: I) {
        let mut images = images.into_iter().peekable();
        if images.peek().is_none() {
            return;
        }
        self.inner.snapshot.send_modify(|snapshot| {
            snapshot.draft.images.extend(images);
        });
    }

    /// Removes every attached image equal to `image`.
    pub fn remove_image(&self, image: &Image) {
        self.inner.snapshot.send_if_modified(|snapshot| {
            let images = &mut snapshot.draft.images;
            let len = images.len();
            images.retain(|attached| attached != image);
            images.len() != len
        });
    }

    /// Clears the draft and the transcript.
    ///
    /// A response still pending for the old conversation is discarded when
    /// it arrives.
    pub fn start_new_conversation(&self) {
        self.inner.snapshot.send_modify(|snapshot| {
            let generation = snapshot.generation + 1;
            debug!("starting conversation #{generation}");
            *snapshot = Snapshot::with_generation(generation);
        });
    }

    /// Selects a model and starts a new conversation.
    pub fn select_model(&self, variant: ModelVariant) {
        self.inner.settings.send_modify(|settings| {
            settings.set_active(variant);
        });
        self.start_new_conversation();
    }

    /// Sets the API key of the selected model.
    ///
    /// The draft and transcript are left as they are; the key is used from
    /// the next submission on.
    pub fn set_credential<S: Into<String>>(&self, key: S) {
        let credential = Credential::new(key);
        self.inner.settings.send_modify(|settings| {
            let active = settings.active();
            settings.config_mut(active).credential = credential;
        });
    }

    /// Submits the draft to the selected model.
    ///
    /// The draft becomes a user turn followed by a loading placeholder, and
    /// the draft is cleared. The placeholder is replaced by the response,
    /// or by the cause of failure, once the model finishes.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the draft is empty or a previous
    /// response is still pending. A draft with images and no text counts as
    /// empty unless the selected model reads images.
    pub fn submit_draft(&self) -> Result<(), SubmitError> {
        let accepts_images = self.active_model().supports_images();
        let mut outcome = Err(SubmitError::EmptyDraft);
        self.inner.snapshot.send_if_modified(|snapshot| {
            if snapshot.is_awaiting_response() {
                outcome = Err(SubmitError::Busy);
                return false;
            }
            if !snapshot.draft.is_submittable(accepts_images) {
                return false;
            }

            let draft = mem::take(&mut snapshot.draft);
            snapshot
                .transcript
                .push(DataState::Success(Turn::user(draft.text.clone())));
            snapshot.transcript.push(DataState::Loading);
            outcome = Ok(PendingTurn {
                prompt: draft.text,
                images: draft.images,
                slot: snapshot.transcript.len() - 1,
                generation: snapshot.generation,
            });
            true
        });

        let pending = outcome.inspect_err(|err| {
            debug!("draft not submitted: {err}");
        })?;
        self.spawn_completion(pending);
        Ok(())
    }

    fn spawn_completion(&self, pending: PendingTurn) {
        let PendingTurn {
            prompt,
            images,
            slot,
            generation,
        } = pending;

        let (variant, config) = {
            let settings = self.inner.settings.borrow();
            (settings.active(), settings.active_config().clone())
        };
        let mut req =
            ModelRequest::text(config.model_name, config.credential, prompt);
        if variant.supports_images() {
            req.images = images;
        } else if !images.is_empty() {
            debug!("{variant} model is text-only, dropping attached images");
        }

        let model_client = self.inner.model_client.clone();
        let on_delta = {
            let chat = Arc::downgrade(&self.inner);
            move |delta: &str| {
                let Some(chat) = chat.upgrade() else {
                    return;
                };
                if chat.snapshot.borrow().generation != generation {
                    return;
                }
                if let Some(on_delta) = &chat.on_delta {
                    on_delta(delta);
                }
            }
        };
        let chat = Arc::downgrade(&self.inner);
        tokio::spawn(
            async move {
                let result = model_client.complete(req, on_delta).await;
                let state = TurnState::from(result.map(Turn::agent));
                ChatInner::resolve(&chat, generation, slot, state);
            }
            .instrument(debug_span!("chat turn", generation, slot)),
        );
    }
}

impl ChatInner {
    fn resolve(
        chat: &Weak<ChatInner>,
        generation: u64,
        slot: usize,
        state: TurnState,
    ) {
        let Some(chat) = chat.upgrade() else {
            debug!("chat is gone, dropping the response");
            return;
        };
        chat.snapshot.send_if_modified(|snapshot| {
            if snapshot.generation != generation {
                debug!(
                    "discarding a stale response for conversation \
                     #{generation}, now #{}",
                    snapshot.generation
                );
                return false;
            }
            let Some(entry) = snapshot.transcript.get_mut(slot) else {
                warn!("placeholder #{slot} is missing");
                return false;
            };
            debug!(
                "turn #{slot} finished: {}",
                if state.is_success() { "success" } else { "error" }
            );
            *entry = state;
            true
        });
    }
}

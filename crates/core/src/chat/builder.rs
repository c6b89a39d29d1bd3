use std::sync::Arc;

use gemchat_model::ModelProvider;

use super::{Chat, DeltaFn};
use crate::model_client::ModelClient;
use crate::settings::ModelSettings;

/// [`Chat`] builder.
pub struct ChatBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) settings: ModelSettings,
    pub(crate) on_delta: Option<DeltaFn>,
}

impl ChatBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            settings: ModelSettings::default(),
            on_delta: None,
        }
    }

    /// Sets the initial model selection and credentials.
    #[inline]
    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Attaches a callback to be invoked with each piece of response text
    /// as it streams in.
    #[inline]
    pub fn on_delta(
        mut self,
        on_delta: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_delta = Some(Arc::new(on_delta));
        self
    }

    /// Builds the chat.
    #[inline]
    pub fn build(self) -> Chat {
        Chat::from_builder(self)
    }
}

use gemchat_core::{
    Chat, ChatBuilder, ModelSettings, ModelVariant, Summarizer,
};
use gemchat_model::ModelProvider;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder<M> {
    provider: M,
    settings: ModelSettings,
    chat_builder: ChatBuilder,
}

impl<M: ModelProvider + Clone + 'static> SessionBuilder<M> {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider(provider: M) -> Self {
        let chat_builder = ChatBuilder::with_model_provider(provider.clone());
        Self {
            provider,
            settings: ModelSettings::default(),
            chat_builder,
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
        self.chat_builder = self.chat_builder.on_delta(on_delta);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        let summarizer = Summarizer::with_model_provider(
            self.provider,
            self.settings.config(ModelVariant::Pro).clone(),
        );
        let chat = self.chat_builder.with_settings(self.settings).build();
        Session { chat, summarizer }
    }
}

/// Everything a front-end shows: a chat and a summarizer, talking to the
/// same provider.
pub struct Session {
    chat: Chat,
    summarizer: Summarizer,
}

impl Session {
    /// Returns the chat.
    #[inline]
    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    /// Returns the summarizer, which always uses the text-only model.
    #[inline]
    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Sets the API key of the selected model. The summarizer picks it up
    /// too while the text-only model is selected.
    pub fn set_credential<S: Into<String>>(&self, key: S) {
        let key = key.into();
        if self.chat.active_model() == ModelVariant::Pro {
            self.summarizer.set_credential(key.clone());
        }
        self.chat.set_credential(key);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gemchat_test_model::{PresetResponse, TestModelProvider};
    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_credential_reaches_summarizer() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("Short."));
        provider.add_response(PresetResponse::with_text("Shorter."));
        let session = SessionBuilder::with_model_provider(provider.clone())
            .with_settings(ModelSettings::with_credential("initial"))
            .build();
        let mut rx = session.summarizer().subscribe();

        session.set_credential("updated");
        session.summarizer().summarize("Long text");
        timeout(Duration::from_millis(500), rx.wait_for(|s| s.is_finalized()))
            .await
            .unwrap()
            .unwrap();

        session.chat().select_model(ModelVariant::Vision);
        session.set_credential("vision-only");
        session.summarizer().summarize("Long text");
        timeout(
            Duration::from_millis(500),
            rx.wait_for(|s| s.data().is_some_and(|t| t == "Shorter.")),
        )
        .await
        .unwrap()
        .unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].credential.expose(), "updated");
        assert_eq!(requests[1].credential.expose(), "updated");
        assert_eq!(
            session
                .chat()
                .settings()
                .config(ModelVariant::Vision)
                .credential
                .expose(),
            "vision-only"
        );
    }
}

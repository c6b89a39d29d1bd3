use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use gemchat_model::{Credential, Image, ModelProvider, ModelRequest};
use tokio::sync::watch;
use tracing::Instrument;

use crate::model_client::ModelClient;
use crate::settings::ModelConfig;
use crate::{ChatError, DataState};

/// The state of a one-shot generation.
pub type SummaryState = DataState<String, ChatError>;

/// Runs one-shot prompts, such as summarizing a piece of text, and keeps
/// the latest result.
///
/// Only the most recent request counts: a result arriving after a newer
/// request has started is dropped. Must be used within a Tokio runtime.
#[derive(Clone)]
pub struct Summarizer {
    inner: Arc<SummarizerInner>,
}

struct SummarizerInner {
    model_client: ModelClient,
    config: watch::Sender<ModelConfig>,
    state: watch::Sender<SummaryState>,
    // Only touched while holding the `state` lock.
    latest_request: AtomicU64,
}

impl Summarizer {
    /// Creates a summarizer using `config` to reach the model.
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
        config: ModelConfig,
    ) -> Self {
        let (config, _) = watch::channel(config);
        let (state, _) = watch::channel(SummaryState::Initial);
        Self {
            inner: Arc::new(SummarizerInner {
                model_client: ModelClient::new(provider),
                config,
                state,
                latest_request: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> SummaryState {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver that observes every state change.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<SummaryState> {
        self.inner.state.subscribe()
    }

    /// Sets the API key used from the next request on.
    pub fn set_credential<S: Into<String>>(&self, key: S) {
        let credential = Credential::new(key);
        self.inner.config.send_modify(|config| {
            config.credential = credential;
        });
    }

    /// Sends `text` to the model as it is, with no images.
    #[inline]
    pub fn summarize(&self, text: &str) {
        self.generate(text, vec![]);
    }

    /// Sends a free-form prompt with optional images.
    pub fn generate<S: Into<String>>(&self, prompt: S, images: Vec<Image>) {
        let config = self.inner.config.borrow().clone();
        let mut req =
            ModelRequest::text(config.model_name, config.credential, prompt);
        req.images = images;

        let mut request_id = 0;
        self.inner.state.send_modify(|state| {
            request_id =
                self.inner.latest_request.fetch_add(1, Ordering::Relaxed) + 1;
            *state = DataState::Loading;
        });

        let model_client = self.inner.model_client.clone();
        let summarizer = Arc::downgrade(&self.inner);
        tokio::spawn(
            async move {
                let result = model_client.complete(req, |_| {}).await;
                let new_state = SummaryState::from(result);
                SummarizerInner::resolve(&summarizer, request_id, new_state);
            }
            .instrument(debug_span!("summarize", request_id)),
        );
    }
}

impl SummarizerInner {
    fn resolve(
        summarizer: &Weak<SummarizerInner>,
        request_id: u64,
        new_state: SummaryState,
    ) {
        let Some(summarizer) = summarizer.upgrade() else {
            return;
        };
        summarizer.state.send_if_modified(|state| {
            let latest = summarizer.latest_request.load(Ordering::Relaxed);
            if latest != request_id {
                debug!("dropping result #{request_id}, #{latest} is newer");
                return false;
            }
            *state = new_state;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gemchat_model::ErrorKind;
    use gemchat_test_model::{PresetResponse, TestModelProvider};
    use tokio::task::yield_now;
    use tokio::time::timeout;

    use super::*;
    use crate::{ChatErrorKind, ModelVariant};

    fn build_summarizer(provider: &TestModelProvider) -> Summarizer {
        let mut config = ModelConfig::for_variant(ModelVariant::Pro);
        config.credential = Credential::new("test-key");
        Summarizer::with_model_provider(provider.clone(), config)
    }

    async fn wait_for_result(summarizer: &Summarizer) -> SummaryState {
        let mut rx = summarizer.subscribe();
        timeout(Duration::from_millis(500), rx.wait_for(|s| s.is_finalized()))
            .await
            .unwrap()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_summarize() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("It's short."));
        let summarizer = build_summarizer(&provider);
        assert_eq!(summarizer.state(), DataState::Initial);

        summarizer.summarize("A very long story.");
        assert_eq!(summarizer.state(), DataState::Loading);

        let state = wait_for_result(&summarizer).await;
        assert_eq!(state, DataState::Success("It's short.".to_owned()));

        let requests = provider.requests();
        assert_eq!(requests[0].prompt, "A very long story.");
        assert!(requests[0].images.is_empty());
        assert_eq!(requests[0].model, "gemini-pro");
    }

    #[tokio::test]
    async fn test_failure() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_failure(
            ErrorKind::Unauthorized,
            "API key not valid",
        ));
        let summarizer = build_summarizer(&provider);

        summarizer.generate("Describe this", vec![]);
        let err = wait_for_result(&summarizer).await.error().cloned().unwrap();
        assert_eq!(err.kind(), ChatErrorKind::Unauthorized);
        assert_eq!(err.message(), "API key not valid");
    }

    #[tokio::test]
    async fn test_newer_request_wins() {
        let provider = TestModelProvider::default();
        let gate = provider.add_held_response(PresetResponse::with_text("Old"));
        let gate2 =
            provider.add_held_response(PresetResponse::with_text("New"));
        let summarizer = build_summarizer(&provider);
        let mut rx = summarizer.subscribe();

        summarizer.summarize("first");
        summarizer.summarize("second");
        while provider.requests().len() < 2 {
            yield_now().await;
        }
        assert!(provider.requests()[0].prompt.ends_with("first"));

        // Let the newer one finish first, then the older one.
        gate2.release();
        let state = timeout(
            Duration::from_millis(500),
            rx.wait_for(|s| s.is_finalized()),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(state, DataState::Success("New".to_owned()));

        rx.mark_unchanged();
        gate.release();
        let changed =
            timeout(Duration::from_millis(100), rx.changed()).await;
        assert!(changed.is_err(), "stale result was applied");
        assert_eq!(summarizer.state(), DataState::Success("New".to_owned()));
    }

    #[tokio::test]
    async fn test_set_credential() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("Ok"));
        let summarizer = build_summarizer(&provider);

        summarizer.set_credential("other-key");
        summarizer.summarize("text");
        wait_for_result(&summarizer).await;
        assert_eq!(provider.requests()[0].credential.expose(), "other-key");
    }
}

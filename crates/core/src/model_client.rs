use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use gemchat_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

use crate::ChatError;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(&str) + Send + 'static>)
        -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // Erase `P` so that `Chat` and `Summarizer` stay non-generic.
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            trace!(
                "sending a request to {} with {} image(s)",
                req.model,
                req.images.len()
            );
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and collects the whole response.
    ///
    /// `on_delta` is called with every piece of text as it arrives.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(&str) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_delta)).await
    }

    /// Sends a request and returns the response text, converting every
    /// failure into a [`ChatError`].
    ///
    /// A response without any text is an error as well.
    pub async fn complete(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(&str) + Send + 'static,
    ) -> Result<String, ChatError> {
        match self.send_request(req, on_delta).await {
            Ok(resp) if !resp.text.trim().is_empty() => Ok(resp.text),
            Ok(resp) => {
                debug!(
                    "got no text, finish reason: {:?}",
                    resp.finish_reason
                );
                Err(ChatError::empty_response())
            }
            Err(err) => Err(ChatError::from_provider(&*err)),
        }
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, Default)]
pub struct ModelClientResponse {
    pub text: String,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: Box<dyn Fn(&str) + Send + 'static>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("request failed: {err}");
            return Err(Box::new(err));
        }
    };

    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("response failed: {err}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::TextDelta(delta) => {
                on_delta(&delta);
                text.push_str(&delta);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        text,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use gemchat_model::{Credential, ErrorKind};
    use gemchat_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;
    use crate::ChatErrorKind;

    fn request(prompt: &str) -> ModelRequest {
        ModelRequest::text("test", Credential::new("key"), prompt)
    }

    #[tokio::test]
    async fn test_send_request() {
        let model_provider = TestModelProvider::default();
        for _ in 0..3 {
            model_provider.add_response(PresetResponse::with_events([
                PresetEvent::TextDelta("How ".to_owned()),
                PresetEvent::TextDelta("are ".to_owned()),
                PresetEvent::TextDelta("you?".to_owned()),
            ]));
        }

        let model_client = ModelClient::new(model_provider.clone());

        for _ in 0..3 {
            let deltas = Arc::new(Mutex::new(Vec::<String>::new()));
            let resp = model_client
                .send_request(request("Hi"), {
                    let deltas = Arc::clone(&deltas);
                    move |delta| {
                        deltas.lock().unwrap().push(delta.to_owned());
                    }
                })
                .await
                .unwrap();
            assert_eq!(resp.text, "How are you?");
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
            assert_eq!(*deltas.lock().unwrap(), ["How ", "are ", "you?"]);
        }
        assert_eq!(model_provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_failure(
            ErrorKind::RateLimitExceeded,
            "quota exceeded",
        ));
        let model_client = ModelClient::new(model_provider);

        let err = model_client
            .send_request(request("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(err.to_string(), "quota exceeded");

        // The script has run out.
        let resp_or_err =
            model_client.send_request(request("Hi"), |_| {}).await;
        assert!(matches!(resp_or_err, Err(_)));
    }

    #[tokio::test]
    async fn test_complete() {
        let model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_text("Done."));
        model_provider.add_response(PresetResponse::with_text("  \n"));
        model_provider.add_response(PresetResponse::with_failure(
            ErrorKind::Network,
            "timeout",
        ));
        let model_client = ModelClient::new(model_provider);

        let text = model_client.complete(request("Hi"), |_| {}).await;
        assert_eq!(text.as_deref(), Ok("Done."));

        let err = model_client
            .complete(request("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ChatErrorKind::EmptyResponse);

        let err = model_client
            .complete(request("Hi"), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::new(ChatErrorKind::Network, "timeout"));
    }
}

use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{self, Poll, ready};
use std::time::Duration;

use gemchat_model::{
    Credential, ErrorKind, Image, ModelFinishReason, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct FakeModelResponse {
    fake_items: VecDeque<String>,
    completed: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn new(input: &str, image_count: usize) -> Self {
        let reply = if image_count == 0 {
            format!("You said {input}")
        } else {
            format!("You showed {image_count} images and said {input}")
        };
        let fake_items = reply.split(' ').map(ToString::to_string).collect();
        Self {
            fake_items,
            completed: false,
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some(mut this_item) = this.fake_items.pop_front() {
                if !this.fake_items.is_empty() {
                    this_item.push(' ');
                }
                return Poll::Ready(Ok(Some(ModelResponseEvent::TextDelta(
                    this_item,
                ))));
            }

            if !this.completed {
                this.completed = true;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            }

            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = if req.credential.is_empty() {
            Err(FakeModelProviderError(ErrorKind::Unauthorized))
        } else {
            Ok(FakeModelResponse::new(&req.prompt, req.images.len()))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use super::*;

    async fn collect_text<P: ModelProvider>(
        provider: &P,
        req: &ModelRequest,
    ) -> Result<String, P::Error> {
        let resp = provider.send_request(req).await?;
        let mut resp = pin!(resp);

        let mut resp_message = String::new();
        loop {
            let resp_fut = poll_fn(|cx| resp.as_mut().poll_next_event(cx));
            match resp_fut.await? {
                Some(ModelResponseEvent::TextDelta(delta)) => {
                    resp_message.push_str(&delta);
                }
                Some(ModelResponseEvent::Completed(_)) => {}
                None => break,
            }
        }
        Ok(resp_message)
    }

    #[tokio::test]
    async fn test_completion() {
        let req = ModelRequest::text(
            "fake",
            Credential::new("key"),
            "Good morning",
        );
        let text = collect_text(&FakeModelProvider, &req).await.unwrap();
        assert_eq!(text, "You said Good morning");
    }

    #[tokio::test]
    async fn test_completion_with_images() {
        let mut req =
            ModelRequest::text("fake", Credential::new("key"), "what's this?");
        req.images = vec![
            Image::new(vec![1u8], mime::IMAGE_PNG),
            Image::new(vec![2u8], mime::IMAGE_PNG),
        ];
        let text = collect_text(&FakeModelProvider, &req).await.unwrap();
        assert_eq!(text, "You showed 2 images and said what's this?");
    }

    #[tokio::test]
    async fn test_shared_provider() {
        let provider = Arc::new(FakeModelProvider);
        let req = ModelRequest::text("fake", Credential::new("key"), "Hi");
        let text = collect_text(&provider, &req).await.unwrap();
        assert_eq!(text, "You said Hi");
    }

    #[tokio::test]
    async fn test_error() {
        let req = ModelRequest::text("fake", Credential::default(), "Hi");
        let err = collect_text(&FakeModelProvider, &req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}

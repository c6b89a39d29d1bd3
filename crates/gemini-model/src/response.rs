use std::pin::Pin;
use std::task::{Context, Poll, ready};

use gemchat_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::GenerateContentResponse;

struct PartialState {
    sse: Sse,
    // Set when a chunk carries both text and a finish reason. The text is
    // emitted first, and this is returned by the next poll.
    pending_finish_reason: Option<ModelFinishReason>,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_finish_reason: None,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    loop {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => return Ok((None, partial_state)),
            Err(SseError::ChunksError(err)) => {
                return Err(Error::new(err.0, ErrorKind::Network));
            }
            Err(SseError::InvalidPayload) => {
                return Err(Error::new(
                    "invalid event stream",
                    ErrorKind::Other,
                ));
            }
        };
        trace!("got sse event: {sse_event}");

        let chunk =
            serde_json::from_str::<GenerateContentResponse>(&sse_event)
                .map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::Other)
                })?;

        if let Some(reason) = chunk
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(Error::new(
                format!("prompt was blocked: {reason}"),
                ErrorKind::Moderated,
            ));
        }

        let finish_reason = match chunk.finish_reason() {
            None => None,
            Some("STOP") => Some(ModelFinishReason::Stop),
            Some("MAX_TOKENS") => Some(ModelFinishReason::Length),
            Some(
                reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST"
                | "PROHIBITED_CONTENT" | "SPII"),
            ) => {
                return Err(Error::new(
                    format!("response was blocked: {reason}"),
                    ErrorKind::Moderated,
                ));
            }
            Some(reason) => {
                debug!("unrecognized finish reason: {reason}");
                Some(ModelFinishReason::Stop)
            }
        };

        match (chunk.text(), finish_reason) {
            (Some(text), finish_reason) if !text.is_empty() => {
                partial_state.pending_finish_reason = finish_reason;
                return Ok((
                    Some(ModelResponseEvent::TextDelta(text)),
                    partial_state,
                ));
            }
            (_, Some(finish_reason)) => {
                return Ok((
                    Some(ModelResponseEvent::Completed(finish_reason)),
                    partial_state,
                ));
            }
            // Nothing useful in this chunk (e.g. usage only), keep reading.
            _ => {}
        }
    }
}

//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use gemchat_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::sync::watch;
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<PresetEvent>,
    completed: bool,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some(event) = this.events.pop_front() {
                let event = match event {
                    PresetEvent::TextDelta(text) => {
                        ModelResponseEvent::TextDelta(text)
                    }
                };
                return Poll::Ready(Ok(Some(event)));
            } else if !this.completed {
                this.completed = true;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A handle that releases a held response.
///
/// Dropping the handle releases the response as well.
pub struct ResponseGate(watch::Sender<bool>);

impl ResponseGate {
    /// Lets the held response go.
    #[inline]
    pub fn release(self) {
        self.0.send_replace(true);
    }
}

struct ScriptStep {
    preset: PresetResponse,
    gate: Option<watch::Receiver<bool>>,
}

#[derive(Default)]
struct Script {
    steps: VecDeque<ScriptStep>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request. Requests consume the scripted
/// responses in order. If the script runs out, an error will be returned.
///
/// Clones share the same script, so a test can keep one clone to add
/// responses and inspect received requests after handing the other one to
/// the code under test.
///
/// # Note
///
/// This type is not optimized for production use. You should only use it
/// for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.with_script(|script| {
            script.steps.push_back(ScriptStep { preset, gate: None });
        });
    }

    /// Appends a response that is held back until the returned gate is
    /// released.
    pub fn add_held_response(&self, preset: PresetResponse) -> ResponseGate {
        let (gate_tx, gate_rx) = watch::channel(false);
        self.with_script(|script| {
            script.steps.push_back(ScriptStep {
                preset,
                gate: Some(gate_rx),
            });
        });
        ResponseGate(gate_tx)
    }

    /// Sets the delay between two streamed events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.with_script(|script| script.requests.clone())
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script =
            self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let step = self.with_script(|script| {
            script.requests.push(req.clone());
            script.steps.pop_front()
        });
        let delay = self.delay.unwrap_or(Duration::from_millis(1));

        async move {
            let Some(step) = step else {
                return Err(Error {
                    message: "no more scripted responses".to_owned(),
                    kind: ErrorKind::Other,
                });
            };

            if let Some(mut gate) = step.gate {
                // A dropped gate counts as released.
                gate.wait_for(|released| *released).await.ok();
            }

            if let Some(failure) = step.preset.failure {
                return Err(Error {
                    message: failure.message,
                    kind: failure.kind,
                });
            }

            Ok(TestModelResponse {
                events: step.preset.events.into(),
                completed: false,
                delay,
                sleep: None,
            })
        }
    }
}

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::recognition::{
    RecognitionBackend, RecognitionConfig, RecognitionError, RecognitionEvent, RecognitionStream,
};

/// What one scripted recognition attempt produces.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Final result with the given text (may be blank to exercise the
    /// empty-transcript path).
    Transcript(String),
    /// Error with the given reason (e.g. "no-speech").
    Error(String),
    /// The attempt ends without ever yielding a result.
    Silence,
}

/// Recognition backend that replays a script, one outcome per session.
///
/// Counts started sessions so tests can assert exactly how many attempts
/// the controller opened.
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    result_delay: Duration,
    sessions_started: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            result_delay: Duration::from_millis(30),
            sessions_started: AtomicUsize::new(0),
        }
    }

    /// Delay between the started event and the scripted outcome.
    pub fn with_result_delay(mut self, delay: Duration) -> Self {
        self.result_delay = delay;
        self
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionBackend for ScriptedRecognizer {
    async fn start(
        &self,
        _config: &RecognitionConfig,
    ) -> Result<RecognitionStream, RecognitionError> {
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RecognitionError::Unavailable("script exhausted".to_string()))?;

        self.sessions_started.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        let session_shutdown = shutdown.clone();
        let delay = self.result_delay;

        tokio::spawn(async move {
            let _ = tx.send(RecognitionEvent::Started).await;

            tokio::select! {
                _ = session_shutdown.cancelled() => {
                    let _ = tx.send(RecognitionEvent::Ended).await;
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match outcome {
                ScriptedOutcome::Transcript(text) => {
                    let _ = tx.send(RecognitionEvent::Result { text }).await;
                }
                ScriptedOutcome::Error(reason) => {
                    let _ = tx.send(RecognitionEvent::Error { reason }).await;
                }
                ScriptedOutcome::Silence => {}
            }

            let _ = tx.send(RecognitionEvent::Ended).await;
        });

        Ok(RecognitionStream::new(rx, shutdown))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

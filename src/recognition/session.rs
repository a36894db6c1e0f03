use tracing::{debug, trace};

use super::backend::{
    RecognitionBackend, RecognitionConfig, RecognitionError, RecognitionEvent, RecognitionStream,
};

/// A finalized utterance.
///
/// Immutable once produced; the sequence id increases monotonically across
/// the conversation so consumers can detect ordering.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Transcript {
    pub text: String,
    pub sequence: u64,
}

/// How a recognition session settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A non-empty final transcript.
    Transcript(Transcript),
    /// The recognizer reported success with blank content.
    Empty,
    /// The attempt failed before yielding a transcript.
    Failed(String),
    /// The attempt ended without a result or an error.
    Ended,
}

/// One-shot wrapper around a single speech-to-text attempt.
///
/// Constructing the session is the single `start`; the session settles on
/// exactly one outcome and is discarded afterwards, never reused. `stop` is
/// idempotent and safe to call at any point in the lifecycle.
pub struct RecognitionSession {
    sequence: u64,
    stream: RecognitionStream,
    settled: bool,
}

impl RecognitionSession {
    /// Start a recognition attempt against the given backend.
    pub async fn begin(
        backend: &dyn RecognitionBackend,
        config: &RecognitionConfig,
        sequence: u64,
    ) -> Result<Self, RecognitionError> {
        let stream = backend.start(config).await?;
        debug!(sequence, backend = backend.name(), "recognition session started");

        Ok(Self {
            sequence,
            stream,
            settled: false,
        })
    }

    /// Drive the attempt until it settles.
    ///
    /// Emits exactly one outcome per session; calling again after the
    /// session settled returns `Ended`. Whitespace-only results are mapped
    /// to `Empty` here so blank content never escapes this module.
    pub async fn outcome(&mut self) -> SessionOutcome {
        if self.settled {
            return SessionOutcome::Ended;
        }

        loop {
            match self.stream.next_event().await {
                Some(RecognitionEvent::Started) => {
                    trace!(sequence = self.sequence, "recognizer listening");
                }
                Some(RecognitionEvent::Result { text }) => {
                    self.settled = true;
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        return SessionOutcome::Empty;
                    }
                    return SessionOutcome::Transcript(Transcript {
                        text: trimmed.to_string(),
                        sequence: self.sequence,
                    });
                }
                Some(RecognitionEvent::Error { reason }) => {
                    self.settled = true;
                    return SessionOutcome::Failed(reason);
                }
                Some(RecognitionEvent::Ended) | None => {
                    self.settled = true;
                    return SessionOutcome::Ended;
                }
            }
        }
    }

    /// Cancel the attempt. Idempotent; safe before the first event and
    /// after the session settled.
    pub fn stop(&self) {
        self.stream.stop();
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

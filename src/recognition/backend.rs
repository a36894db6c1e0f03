use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Configuration surface for one recognition attempt.
///
/// The controller always requests non-continuous, final-result-only
/// recognition; the fields exist because the capability contract exposes
/// them, not because other combinations are used.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecognitionConfig {
    /// BCP-47 locale tag (e.g. "en-US")
    pub locale: String,
    /// Keep recognizing after the first final result
    pub continuous: bool,
    /// Emit interim (non-final) results
    pub interim_results: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            continuous: false,
            interim_results: false,
        }
    }
}

/// Events emitted by a recognition capability for a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The capability has started listening.
    Started,
    /// A final transcript is ready.
    Result { text: String },
    /// The attempt failed (no-speech timeout, network error, revoked).
    Error { reason: String },
    /// The attempt is over; no further events follow.
    Ended,
}

/// Why a recognition attempt could not be started or completed
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition capability unavailable: {0}")]
    Unavailable(String),

    #[error("recognition attempt failed: {0}")]
    Attempt(String),
}

/// Event stream for one recognition attempt.
///
/// Stopping the stream cancels the underlying attempt; stopping twice, or
/// stopping after the attempt already ended, is a no-op.
pub struct RecognitionStream {
    events: mpsc::Receiver<RecognitionEvent>,
    shutdown: CancellationToken,
}

impl RecognitionStream {
    pub fn new(events: mpsc::Receiver<RecognitionEvent>, shutdown: CancellationToken) -> Self {
        Self { events, shutdown }
    }

    /// Receive the next event. Returns `None` once the capability has shut
    /// the attempt down and the channel drained.
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        self.events.recv().await
    }

    /// Cancel the attempt. Idempotent.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for RecognitionStream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Speech-to-text capability
///
/// The event surface is limited to started / final result / error / ended;
/// engine internals stay behind this seam.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Start a single recognition attempt.
    async fn start(&self, config: &RecognitionConfig)
        -> Result<RecognitionStream, RecognitionError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

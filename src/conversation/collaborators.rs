use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

use crate::recognition::Transcript;

/// External collaborator that turns a finalized transcript into a queued
/// spoken response.
///
/// `process` resolves once a response has been produced and queued for
/// playback, or fails. The controller never retries automatically.
#[async_trait]
pub trait TranscriptProcessor: Send + Sync {
    async fn process(&self, transcript: &Transcript) -> Result<()>;
}

/// External collaborator owning response playback.
///
/// The controller observes the speaking flag to move into and out of the
/// `Speaking` state; it never drives playback itself beyond `cancel`.
#[async_trait]
pub trait PlaybackControl: Send + Sync {
    /// Subscribe to the "is speaking" signal.
    fn speaking(&self) -> watch::Receiver<bool>;

    /// Stop any active playback. Safe to call when nothing is playing.
    async fn cancel(&self) -> Result<()>;
}

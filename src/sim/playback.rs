use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::conversation::PlaybackControl;

/// Playback controller whose speaking flag is driven by the test or demo.
///
/// Counts `cancel` calls for barge-in assertions. A generation counter
/// guards timed playback: a response cancelled mid-flight can no longer
/// clear the speaking flag of a later response.
pub struct TimedPlayback {
    speaking_tx: Arc<watch::Sender<bool>>,
    cancel_calls: AtomicUsize,
    generation: Arc<AtomicUsize>,
}

impl TimedPlayback {
    pub fn new() -> Self {
        let (speaking_tx, _) = watch::channel(false);
        Self {
            speaking_tx: Arc::new(speaking_tx),
            cancel_calls: AtomicUsize::new(0),
            generation: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Raise the speaking flag.
    pub fn begin_speaking(&self) {
        let _ = self.speaking_tx.send(true);
    }

    /// Clear the speaking flag (playback finished).
    pub fn finish_speaking(&self) {
        let _ = self.speaking_tx.send(false);
    }

    /// Speak for a fixed duration, then fall silent unless cancelled.
    pub fn speak_for(&self, duration: Duration) {
        let generation_at_start = self.generation.load(Ordering::SeqCst);
        let generation = Arc::clone(&self.generation);
        let speaking_tx = Arc::clone(&self.speaking_tx);

        let _ = self.speaking_tx.send(true);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if generation.load(Ordering::SeqCst) == generation_at_start {
                let _ = speaking_tx.send(false);
            }
        });
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn is_speaking(&self) -> bool {
        *self.speaking_tx.subscribe().borrow()
    }
}

impl Default for TimedPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackControl for TimedPlayback {
    fn speaking(&self) -> watch::Receiver<bool> {
        self.speaking_tx.subscribe()
    }

    async fn cancel(&self) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.speaking_tx.send(false);
        debug!("playback cancelled");
        Ok(())
    }
}

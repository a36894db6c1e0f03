use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::conversation::TranscriptProcessor;
use crate::recognition::Transcript;

use super::playback::TimedPlayback;

/// Transcript processor that records what it receives and, once a response
/// is "queued", starts timed playback.
pub struct QueuedResponder {
    playback: Option<Arc<TimedPlayback>>,
    response_duration: Duration,
    processing_delay: Duration,
    fail: AtomicBool,
    received: Mutex<Vec<Transcript>>,
}

impl QueuedResponder {
    pub fn new() -> Self {
        Self {
            playback: None,
            response_duration: Duration::from_millis(120),
            processing_delay: Duration::from_millis(20),
            fail: AtomicBool::new(false),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Start this playback once a response has been queued.
    pub fn with_playback(mut self, playback: Arc<TimedPlayback>) -> Self {
        self.playback = Some(playback);
        self
    }

    /// How long each queued response plays for.
    pub fn with_response_duration(mut self, duration: Duration) -> Self {
        self.response_duration = duration;
        self
    }

    /// Simulated backend round-trip time.
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    /// Make every subsequent `process` call reject.
    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Transcripts received so far, in order.
    pub fn received(&self) -> Vec<Transcript> {
        self.received.lock().unwrap().clone()
    }
}

impl Default for QueuedResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptProcessor for QueuedResponder {
    async fn process(&self, transcript: &Transcript) -> Result<()> {
        tokio::time::sleep(self.processing_delay).await;

        if self.fail.load(Ordering::SeqCst) {
            bail!("response backend rejected the transcript");
        }

        self.received.lock().unwrap().push(transcript.clone());

        if let Some(playback) = &self.playback {
            playback.speak_for(self.response_duration);
        }

        Ok(())
    }
}

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::capture::{CaptureConfig, CaptureError, CaptureStream, MicrophoneCapture};

use super::analyzer::SpectrumAnalyzer;

/// Configuration for the volume sampling loop
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VolumeConfig {
    /// FFT window size in samples
    pub fft_size: usize,
    /// Fixed ceiling the mean bin magnitude is normalized against
    pub reference_ceiling: f32,
    /// Analysis tick interval (display frame rate)
    pub tick_interval: Duration,
    /// Weight of the newest reading in the running average (0.0 to 1.0)
    pub smoothing: f32,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            reference_ceiling: 128.0,
            tick_interval: Duration::from_millis(16), // ~60fps
            smoothing: 0.6,
        }
    }
}

/// The one live capture session: stream ownership sits in the analysis
/// task, so cancelling the token and joining the task releases everything.
struct AudioSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Produces a smoothed volume scalar from the microphone while listening.
///
/// Holds at most one `AudioSession` at a time. The analysis task owns the
/// capture stream: every exit path (stop, producer gone, drop) closes the
/// stream exactly once and the tick loop stops scheduling immediately.
pub struct VolumeSampler {
    capture: Arc<dyn MicrophoneCapture>,
    capture_config: CaptureConfig,
    config: VolumeConfig,
    session: Option<AudioSession>,
    level_tx: watch::Sender<f32>,
}

impl VolumeSampler {
    pub fn new(
        capture: Arc<dyn MicrophoneCapture>,
        capture_config: CaptureConfig,
        config: VolumeConfig,
    ) -> Self {
        let (level_tx, _) = watch::channel(0.0);
        Self {
            capture,
            capture_config,
            config,
            session: None,
            level_tx,
        }
    }

    /// Subscribe to the smoothed volume signal. Stays at 0 while no
    /// session is live.
    pub fn level(&self) -> watch::Receiver<f32> {
        self.level_tx.subscribe()
    }

    pub fn is_sampling(&self) -> bool {
        self.session.is_some()
    }

    /// Open the microphone and start the periodic analysis loop.
    ///
    /// Starting while a session is already live is a logged no-op; two
    /// sessions never coexist.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            warn!("volume sampling already started");
            return Ok(());
        }

        let stream = self.capture.open(&self.capture_config).await?;
        debug!(backend = self.capture.name(), "volume sampling started");

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_analysis(
            stream,
            SpectrumAnalyzer::new(self.config.fft_size, self.config.reference_ceiling),
            self.config.clone(),
            cancel.clone(),
            self.level_tx.clone(),
        ));

        self.session = Some(AudioSession { cancel, task });
        Ok(())
    }

    /// Stop sampling and release the capture stream. Idempotent; waits for
    /// the analysis task so the stream is closed before this returns.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.cancel.cancel();
        if let Err(e) = session.task.await {
            warn!("volume analysis task panicked: {e}");
        }
        debug!("volume sampling stopped");
    }

    /// Synchronous teardown: cancels the tick without waiting for the
    /// analysis task to drain. Used on drop paths where awaiting is not
    /// possible.
    pub fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
        }
    }
}

impl Drop for VolumeSampler {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn run_analysis(
    mut stream: CaptureStream,
    mut analyzer: SpectrumAnalyzer,
    config: VolumeConfig,
    cancel: CancellationToken,
    level_tx: watch::Sender<f32>,
) {
    let mut ticker = tokio::time::interval(config.tick_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let fft_size = analyzer.fft_size();
    let mut recent: Vec<f32> = Vec::with_capacity(fft_size * 2);
    let mut level = 0.0f32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            maybe_frame = stream.next_frame() => {
                match maybe_frame {
                    Some(frame) => {
                        recent.extend(frame.mono_samples());
                        let excess = recent.len().saturating_sub(fft_size);
                        if excess > 0 {
                            recent.drain(..excess);
                        }
                    }
                    None => break, // Producer stopped, session is over
                }
            }
            _ = ticker.tick() => {
                let raw = analyzer.mean_level(&recent);
                level += (raw - level) * config.smoothing;
                let _ = level_tx.send(level);
            }
        }
    }

    stream.close();
    let _ = level_tx.send(0.0);
}

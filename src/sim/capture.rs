use async_trait::async_trait;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::capture::{AudioFrame, CaptureConfig, CaptureError, CaptureStream, MicrophoneCapture};

/// How a failing capture backend refuses requests.
#[derive(Debug, Clone, Copy)]
pub enum CaptureFailure {
    Unavailable,
    PermissionDenied,
}

/// Capture backend that synthesizes a steady test tone.
///
/// Tracks every stream it has handed out so tests can assert that all
/// tracks were stopped: a stream counts as live until its cancellation
/// token fires, which happens exactly when the stream is closed or dropped.
pub struct SyntheticCapture {
    tone_hz: f32,
    amplitude: f32,
    failure: Option<CaptureFailure>,
    opens: AtomicUsize,
    streams: Mutex<Vec<CancellationToken>>,
}

impl SyntheticCapture {
    pub fn new(tone_hz: f32, amplitude: f32) -> Self {
        Self {
            tone_hz,
            amplitude,
            failure: None,
            opens: AtomicUsize::new(0),
            streams: Mutex::new(Vec::new()),
        }
    }

    /// A backend that refuses every request, for permission/availability
    /// degradation tests.
    pub fn failing(failure: CaptureFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(440.0, 0.2)
        }
    }

    /// Number of streams granted so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Streams whose tracks have not been stopped yet.
    pub fn live_streams(&self) -> usize {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .filter(|token| !token.is_cancelled())
            .count()
    }
}

#[async_trait]
impl MicrophoneCapture for SyntheticCapture {
    async fn open(&self, config: &CaptureConfig) -> Result<CaptureStream, CaptureError> {
        match self.failure {
            Some(CaptureFailure::Unavailable) => return Err(CaptureError::Unavailable),
            Some(CaptureFailure::PermissionDenied) => {
                return Err(CaptureError::PermissionDenied(
                    "denied by synthetic backend".to_string(),
                ))
            }
            None => {}
        }

        self.opens.fetch_add(1, Ordering::SeqCst);

        let shutdown = CancellationToken::new();
        self.streams.lock().unwrap().push(shutdown.clone());

        let sample_rate = config.sample_rate;
        let frame_duration_ms = config.frame_duration_ms.max(1);
        let samples_per_frame = (sample_rate as u64 * frame_duration_ms / 1000).max(1) as usize;
        let tone_hz = self.tone_hz;
        let amplitude = self.amplitude;

        let (tx, rx) = mpsc::channel(32);
        let producer_shutdown = shutdown.clone();

        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_millis(frame_duration_ms));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let mut phase = 0.0f32;
            let step = 2.0 * PI * tone_hz / sample_rate as f32;
            let mut timestamp_ms = 0u64;

            loop {
                tokio::select! {
                    _ = producer_shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let samples: Vec<f32> = (0..samples_per_frame)
                            .map(|_| {
                                let sample = amplitude * phase.sin();
                                phase = (phase + step) % (2.0 * PI);
                                sample
                            })
                            .collect();

                        let frame = AudioFrame {
                            samples,
                            sample_rate,
                            channels: 1,
                            timestamp_ms,
                        };
                        timestamp_ms += frame_duration_ms;

                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
            }

            debug!("synthetic capture producer stopped");
        });

        Ok(CaptureStream::new(rx, shutdown))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

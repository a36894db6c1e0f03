use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Audio sample data (f32 in [-1.0, 1.0], interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (f32, interleaved)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Collapse interleaved channels into a mono sample stream.
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }
        let channels = self.channels as usize;
        self.samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

/// Configuration for a capture request
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CaptureConfig {
    /// Requested sample rate (backends may deliver their native rate)
    pub sample_rate: u32,
    /// Requested channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Frame size in milliseconds (affects analysis latency)
    pub frame_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,    // 16kHz, enough for speech analysis
            channels: 1,           // Mono
            frame_duration_ms: 20, // Short frames keep the visualizer responsive
        }
    }
}

/// Why a capture request could not produce a live stream
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture device is available")]
    Unavailable,

    #[error("capture permission denied: {0}")]
    PermissionDenied(String),

    #[error("capture device failed: {0}")]
    Device(String),
}

/// A live audio stream handed out by a capture backend.
///
/// The stream owns a cancellation token shared with the producing backend;
/// closing the stream (explicitly or on drop) signals the backend to stop
/// its tracks. Closing twice is a no-op.
#[derive(Debug)]
pub struct CaptureStream {
    frames: mpsc::Receiver<AudioFrame>,
    shutdown: CancellationToken,
}

impl CaptureStream {
    pub fn new(frames: mpsc::Receiver<AudioFrame>, shutdown: CancellationToken) -> Self {
        Self { frames, shutdown }
    }

    /// Receive the next audio frame. Returns `None` once the producer has
    /// stopped and the channel drained.
    pub async fn next_frame(&mut self) -> Option<AudioFrame> {
        self.frames.recv().await
    }

    /// Signal the backend to stop its tracks. Idempotent.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Microphone capture capability
///
/// Implementations:
/// - `FileCapture`: plays a WAV file as a live stream (testing/batch)
/// - `sim::SyntheticCapture`: synthesized test tone (demo/tests)
/// - Platform microphone backends provided by the embedding environment
#[async_trait]
pub trait MicrophoneCapture: Send + Sync {
    /// Request a live audio stream.
    ///
    /// Either grants a stream or fails with a permission/availability
    /// reason; there is no other side channel.
    async fn open(&self, config: &CaptureConfig) -> Result<CaptureStream, CaptureError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

use async_trait::async_trait;
use hound::WavReader;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::backend::{AudioFrame, CaptureConfig, CaptureError, CaptureStream, MicrophoneCapture};

/// Capture backend that plays a WAV file as if it were a live microphone.
///
/// Frames are paced in real time at the file's native rate. A microphone
/// does not end, so once the file is exhausted the stream keeps producing
/// silence until it is closed.
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load_samples(&self) -> Result<(Vec<f32>, u32, u16), CaptureError> {
        let reader = WavReader::open(&self.path)
            .map_err(|e| CaptureError::Device(format!("failed to open {:?}: {e}", self.path)))?;

        let spec = reader.spec();
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<Result<_, _>>(),
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>(),
        }
        .map_err(|e| CaptureError::Device(format!("failed to read samples: {e}")))?;

        Ok((samples, spec.sample_rate, spec.channels))
    }
}

#[async_trait]
impl MicrophoneCapture for FileCapture {
    async fn open(&self, config: &CaptureConfig) -> Result<CaptureStream, CaptureError> {
        let (samples, sample_rate, channels) = self.load_samples()?;

        let duration_seconds = samples.len() as f64 / (sample_rate as f64 * channels as f64);
        info!(
            "File capture opened: {:?} ({:.1}s, {}Hz, {} channels)",
            self.path, duration_seconds, sample_rate, channels
        );

        let frame_duration_ms = config.frame_duration_ms.max(1);
        let samples_per_frame =
            (sample_rate as u64 * channels as u64 * frame_duration_ms / 1000).max(1) as usize;

        let (tx, rx) = mpsc::channel(32);
        let shutdown = CancellationToken::new();
        let producer_shutdown = shutdown.clone();

        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_millis(frame_duration_ms));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let mut offset = 0usize;
            let mut timestamp_ms = 0u64;

            loop {
                tokio::select! {
                    _ = producer_shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let frame_samples = if offset < samples.len() {
                            let end = (offset + samples_per_frame).min(samples.len());
                            let chunk = samples[offset..end].to_vec();
                            offset = end;
                            chunk
                        } else {
                            // File exhausted; a live microphone keeps running
                            vec![0.0; samples_per_frame]
                        };

                        let frame = AudioFrame {
                            samples: frame_samples,
                            sample_rate,
                            channels,
                            timestamp_ms,
                        };
                        timestamp_ms += frame_duration_ms;

                        if tx.send(frame).await.is_err() {
                            break; // Receiver gone, stream torn down
                        }
                    }
                }
            }

            debug!("file capture producer stopped");
        });

        Ok(CaptureStream::new(rx, shutdown))
    }

    fn name(&self) -> &str {
        "file"
    }
}

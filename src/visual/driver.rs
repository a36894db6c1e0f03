use std::f32::consts::PI;
use std::time::Duration;

/// Configuration for the visualization mapping
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VisualConfig {
    /// Gain applied to the volume signal while listening
    pub listening_gain: f32,
    /// Lower scale bound of the breathing animation while speaking
    pub breathing_min_scale: f32,
    /// Upper scale bound of the breathing animation while speaking
    pub breathing_max_scale: f32,
    /// Period of one full breathing cycle
    pub breathing_period: Duration,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            listening_gain: 0.1,
            breathing_min_scale: 0.98,
            breathing_max_scale: 1.06,
            breathing_period: Duration::from_millis(2400),
        }
    }
}

/// Render descriptor handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderDescriptor {
    /// Solid scale factor derived from the live volume signal.
    Level { scale: f32 },
    /// Periodic oscillation between fixed scale bounds.
    Breathing {
        min_scale: f32,
        max_scale: f32,
        period_ms: u64,
    },
}

/// Pure mapping from `(volume, is_speaking)` to a render descriptor.
///
/// Owns no resources and performs no I/O; the same inputs always yield the
/// same output. Mode selection depends solely on the speaking flag: the
/// true playback waveform is not sampled, so the volume argument is ignored
/// entirely while speaking.
pub struct VisualizationDriver {
    config: VisualConfig,
}

impl VisualizationDriver {
    pub fn new(config: VisualConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, volume: f32, is_speaking: bool) -> RenderDescriptor {
        if is_speaking {
            RenderDescriptor::Breathing {
                min_scale: self.config.breathing_min_scale,
                max_scale: self.config.breathing_max_scale,
                period_ms: self.config.breathing_period.as_millis() as u64,
            }
        } else {
            RenderDescriptor::Level {
                scale: 1.0 + volume * self.config.listening_gain,
            }
        }
    }

    /// Evaluate the breathing oscillation at a point in time. Pure in its
    /// arguments; animation clocks stay with the caller.
    pub fn breathing_scale_at(&self, elapsed: Duration) -> f32 {
        let period = self.config.breathing_period.as_secs_f32().max(f32::EPSILON);
        let mid = (self.config.breathing_min_scale + self.config.breathing_max_scale) / 2.0;
        let amplitude = (self.config.breathing_max_scale - self.config.breathing_min_scale) / 2.0;
        mid + amplitude * (2.0 * PI * elapsed.as_secs_f32() / period).sin()
    }
}

impl Default for VisualizationDriver {
    fn default() -> Self {
        Self::new(VisualConfig::default())
    }
}

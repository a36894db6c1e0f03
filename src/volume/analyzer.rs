use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

// Bin magnitudes are mapped into a 0-255 byte range over a fixed decibel
// window before averaging, so the reference ceiling stays in the familiar
// 0-255 magnitude scale.
const BYTE_SCALE: f32 = 255.0;
const FLOOR_DB: f32 = -100.0;
const CEILING_DB: f32 = -30.0;

/// Frequency-domain level extraction.
///
/// Runs a Hann-windowed forward FFT over the most recent samples, averages
/// the byte-scaled bin magnitudes, and normalizes by a fixed reference
/// ceiling. The result lands in [0, ~2] for typical speech input.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>, // Hann window for better frequency resolution
    input: Vec<Complex<f32>>,
    fft_size: usize,
    reference_ceiling: f32,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, reference_ceiling: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let phase = 2.0 * PI * i as f32 / (fft_size - 1).max(1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        Self {
            fft,
            window,
            input: vec![Complex::new(0.0, 0.0); fft_size],
            fft_size,
            reference_ceiling,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Mean byte-scaled spectrum magnitude of the given samples, normalized
    /// by the reference ceiling.
    ///
    /// Shorter inputs are zero-padded; longer inputs use the most recent
    /// `fft_size` samples. Empty input yields the rest level 0.
    pub fn mean_level(&mut self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let tail = if samples.len() > self.fft_size {
            &samples[samples.len() - self.fft_size..]
        } else {
            samples
        };

        for (i, slot) in self.input.iter_mut().enumerate() {
            let sample = tail.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.input);

        // Only the first half of the spectrum carries distinct frequencies
        let bins = self.fft_size / 2;
        let amplitude_norm = 2.0 / self.fft_size as f32;

        let sum: f32 = self.input[..bins]
            .iter()
            .map(|bin| {
                let magnitude = bin.norm() * amplitude_norm;
                if magnitude <= 0.0 {
                    0.0
                } else {
                    let db = 20.0 * magnitude.log10();
                    let scaled = (db - FLOOR_DB) / (CEILING_DB - FLOOR_DB);
                    scaled.clamp(0.0, 1.0) * BYTE_SCALE
                }
            })
            .sum();

        (sum / bins as f32) / self.reference_ceiling
    }
}

//! Volume-level extraction for visualization
//!
//! This module owns the microphone stream while the conversation is
//! listening:
//! - `VolumeSampler`: single-session lifecycle around a cancellable
//!   periodic analysis loop
//! - `SpectrumAnalyzer`: FFT mean-magnitude level extraction

pub mod analyzer;
pub mod sampler;

pub use analyzer::SpectrumAnalyzer;
pub use sampler::{VolumeConfig, VolumeSampler};

//! Simulated collaborators
//!
//! Deterministic stand-ins for the environment-provided capabilities, used
//! by the demo binary and the integration tests:
//! - `SyntheticCapture`: test-tone microphone, tracks live streams
//! - `ScriptedRecognizer`: replays scripted outcomes, counts sessions
//! - `TimedPlayback`: drivable speaking flag, counts cancels
//! - `QueuedResponder`: records transcripts, queues timed responses

pub mod capture;
pub mod playback;
pub mod processor;
pub mod recognition;

pub use capture::{CaptureFailure, SyntheticCapture};
pub use playback::TimedPlayback;
pub use processor::QueuedResponder;
pub use recognition::{ScriptedOutcome, ScriptedRecognizer};

//! Speech recognition lifecycle
//!
//! This module provides the seam to the environment's speech-to-text
//! capability and the single-use session wrapper around one attempt:
//! - `RecognitionBackend`: injected capability (started/result/error/ended)
//! - `RecognitionSession`: one-shot adapter with idempotent stop
//! - `Transcript`: immutable text plus monotonic sequence id

pub mod backend;
pub mod session;

pub use backend::{
    RecognitionBackend, RecognitionConfig, RecognitionError, RecognitionEvent, RecognitionStream,
};
pub use session::{RecognitionSession, SessionOutcome, Transcript};

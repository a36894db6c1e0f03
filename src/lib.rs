pub mod capture;
pub mod config;
pub mod conversation;
pub mod recognition;
pub mod sim;
pub mod visual;
pub mod volume;

pub use capture::{
    AudioFrame, CaptureConfig, CaptureError, CaptureStream, FileCapture, MicrophoneCapture,
};
pub use config::Config;
pub use conversation::{
    ConversationConfig, ConversationController, ConversationError, ConversationHandle,
    ConversationState, ConversationStats, PlaybackControl, TranscriptProcessor,
};
pub use recognition::{
    RecognitionBackend, RecognitionConfig, RecognitionError, RecognitionEvent, RecognitionSession,
    RecognitionStream, SessionOutcome, Transcript,
};
pub use visual::{RenderDescriptor, VisualConfig, VisualizationDriver};
pub use volume::{SpectrumAnalyzer, VolumeConfig, VolumeSampler};

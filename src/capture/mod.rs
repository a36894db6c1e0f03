pub mod backend;
pub mod file;

pub use backend::{AudioFrame, CaptureConfig, CaptureError, CaptureStream, MicrophoneCapture};
pub use file::FileCapture;

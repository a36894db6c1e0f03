use serde::{Deserialize, Serialize};

/// Canonical conversation phase. Exactly one is active at any time; the
/// controller is the single writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Nothing captured, nothing playing.
    Idle,
    /// Microphone open, recognition session active.
    Listening,
    /// Transcript captured, awaiting the processed response; microphone closed.
    Thinking,
    /// External playback active; microphone closed.
    Speaking,
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConversationState::Idle => "idle",
            ConversationState::Listening => "listening",
            ConversationState::Thinking => "thinking",
            ConversationState::Speaking => "speaking",
        };
        f.write_str(name)
    }
}

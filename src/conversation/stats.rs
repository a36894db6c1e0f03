use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::ConversationState;

/// Statistics about a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStats {
    /// Unique conversation identifier
    pub conversation_id: String,

    /// Current canonical state
    pub state: ConversationState,

    /// When the controller started
    pub started_at: DateTime<Utc>,

    /// Completed turns (playback finished after a forwarded transcript)
    pub turns_completed: usize,

    /// Transcripts handed to the transcript processor
    pub transcripts_forwarded: usize,

    /// Recognition attempts that failed before yielding a transcript
    pub recognition_failures: usize,

    /// Results dropped for containing only whitespace
    pub empty_transcripts: usize,

    /// Times the user interrupted active playback
    pub barge_ins: usize,
}

impl ConversationStats {
    pub fn new(conversation_id: String) -> Self {
        Self {
            conversation_id,
            state: ConversationState::Idle,
            started_at: Utc::now(),
            turns_completed: 0,
            transcripts_forwarded: 0,
            recognition_failures: 0,
            empty_transcripts: 0,
            barge_ins: 0,
        }
    }
}

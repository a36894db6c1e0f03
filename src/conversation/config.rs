use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the conversation controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// BCP-47 locale tag handed to the recognition capability
    pub locale: String,

    /// Pause between cancelling playback and reopening the microphone on
    /// barge-in, so the tail of the interrupted response is not captured
    pub settle_delay: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            settle_delay: Duration::from_millis(250),
        }
    }
}

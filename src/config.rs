use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::capture::CaptureConfig;
use crate::conversation::ConversationConfig;
use crate::visual::VisualConfig;
use crate::volume::VolumeConfig;

/// Top-level configuration, one section per component. Every section has
/// defaults, so a partial file (or no file at all) works.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub volume: VolumeConfig,

    #[serde(default)]
    pub visual: VisualConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

//! Typed view of the player configuration embedded in a video page

use crate::error::VidmapError;
use crate::platform::extract::extract_block;
use serde::Deserialize;
use tracing::debug;

/// The parts of the player configuration the pipeline reads
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    pub args: PlayerArgs,
    #[serde(default)]
    pub assets: PlayerAssets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerArgs {
    pub title: String,
    pub url_encoded_fmt_stream_map: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerAssets {
    /// Companion script path, usually scheme-relative
    pub js: Option<String>,
}

impl PlayerConfig {
    /// Parse a configuration object from JSON text
    pub fn from_json(json: &str) -> Result<Self, VidmapError> {
        serde_json::from_str(json)
            .map_err(|e| VidmapError::ConfigError(format!("cannot decode player config: {}", e)))
    }

    /// Locate the configuration after `marker` in page markup and parse it
    pub fn from_page(page: &str, marker: &str) -> Result<Self, VidmapError> {
        let block = extract_block(page, marker)?;
        debug!("Extracted player config ({} bytes)", block.len());
        Self::from_json(block)
    }

    pub fn title(&self) -> &str {
        &self.args.title
    }

    pub fn stream_map(&self) -> &str {
        &self.args.url_encoded_fmt_stream_map
    }

    /// Companion script path, if the page declares one
    pub fn script_path(&self) -> Option<&str> {
        self.assets.js.as_deref().filter(|js| !js.is_empty())
    }
}

//! Resolved stream variants

use crate::platform::formats::FormatDescriptor;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One directly downloadable rendition of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Absolute stream URL, signed if the host required it
    url: String,
    /// Format identifier (itag)
    itag: u32,
    /// Container extension (e.g. "mp4")
    extension: String,
    /// Resolution label (e.g. "720p")
    resolution: String,
    video_codec: String,
    profile: String,
    video_bitrate: String,
    audio_codec: String,
    audio_bitrate: String,
    /// Display filename without extension
    filename: String,
}

impl Variant {
    /// Create a variant from a resolved URL and its format attributes
    pub fn new(
        url: impl Into<String>,
        itag: u32,
        format: &FormatDescriptor,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            itag,
            extension: format.extension.to_string(),
            resolution: format.resolution.to_string(),
            video_codec: format.video_codec.to_string(),
            profile: format.profile.to_string(),
            video_bitrate: format.video_bitrate.to_string(),
            audio_codec: format.audio_codec.to_string(),
            audio_bitrate: format.audio_bitrate.to_string(),
            filename: filename.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn itag(&self) -> u32 {
        self.itag
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn resolution(&self) -> &str {
        &self.resolution
    }

    pub fn video_codec(&self) -> &str {
        &self.video_codec
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn video_bitrate(&self) -> &str {
        &self.video_bitrate
    }

    pub fn audio_codec(&self) -> &str {
        &self.audio_codec
    }

    pub fn audio_bitrate(&self) -> &str {
        &self.audio_bitrate
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Filename with the container extension appended
    pub fn full_filename(&self) -> String {
        format!("{}.{}", self.filename, self.extension)
    }

    /// Vertical resolution in lines, if the label has one (e.g. 720 for "720p")
    pub fn height(&self) -> Option<u32> {
        let digits: String = self
            .resolution
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    pub(crate) fn set_filename(&mut self, filename: &str) {
        self.filename = filename.to_string();
    }

    /// Canonical ordering: resolution (numeric, unknown first), then extension
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.height()
            .cmp(&other.height())
            .then_with(|| self.resolution.cmp(&other.resolution))
            .then_with(|| self.extension.cmp(&other.extension))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Variant: {} (.{}) - {} - {}>",
            self.video_codec, self.extension, self.resolution, self.audio_codec
        )
    }
}

/// Sort variants into canonical order; ties keep their input order
pub fn sort_variants(variants: &mut [Variant]) {
    variants.sort_by(Variant::canonical_cmp);
}

//! Static registry of known format identifiers (itags)

use serde::Serialize;

/// Encoding attributes behind one format identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Container extension (e.g. "mp4")
    pub extension: &'static str,
    /// Resolution label (e.g. "720p")
    pub resolution: &'static str,
    pub video_codec: &'static str,
    pub profile: &'static str,
    /// Video bitrate in Mbit/s, possibly a range
    pub video_bitrate: &'static str,
    pub audio_codec: &'static str,
    /// Audio bitrate in kbit/s
    pub audio_bitrate: &'static str,
}

const fn row(
    extension: &'static str,
    resolution: &'static str,
    video_codec: &'static str,
    profile: &'static str,
    video_bitrate: &'static str,
    audio_codec: &'static str,
    audio_bitrate: &'static str,
) -> FormatDescriptor {
    FormatDescriptor {
        extension,
        resolution,
        video_codec,
        profile,
        video_bitrate,
        audio_codec,
        audio_bitrate,
    }
}

/// Known itags, sorted by id
static FORMATS: &[(u32, FormatDescriptor)] = &[
    (5, row("flv", "240p", "Sorenson H.263", "N/A", "0.25", "MP3", "64")),
    (6, row("flv", "270p", "Sorenson H.263", "N/A", "0.8", "MP3", "64")),
    (13, row("3gp", "N/A", "MPEG-4 Visual", "N/A", "0.5", "AAC", "N/A")),
    (17, row("3gp", "144p", "MPEG-4 Visual", "Simple", "0.05", "AAC", "24")),
    (18, row("mp4", "360p", "H.264", "Baseline", "0.5", "AAC", "96")),
    (22, row("mp4", "720p", "H.264", "High", "2-2.9", "AAC", "192")),
    (34, row("flv", "360p", "H.264", "Main", "0.5", "AAC", "128")),
    (35, row("flv", "480p", "H.264", "Main", "0.8-1", "AAC", "128")),
    (36, row("3gp", "240p", "MPEG-4 Visual", "Simple", "0.17", "AAC", "38")),
    (37, row("mp4", "1080p", "H.264", "High", "3-4.3", "AAC", "192")),
    (38, row("mp4", "3072p", "H.264", "High", "3.5-5", "AAC", "192")),
    (43, row("webm", "360p", "VP8", "N/A", "0.5", "Vorbis", "128")),
    (44, row("webm", "480p", "VP8", "N/A", "1", "Vorbis", "128")),
    (45, row("webm", "720p", "VP8", "N/A", "2", "Vorbis", "192")),
    (46, row("webm", "1080p", "VP8", "N/A", "N/A", "Vorbis", "192")),
    (82, row("mp4", "360p", "H.264", "3D", "0.5", "AAC", "96")),
    (83, row("mp4", "240p", "H.264", "3D", "0.5", "AAC", "96")),
    (84, row("mp4", "720p", "H.264", "3D", "2-2.9", "AAC", "152")),
    (85, row("mp4", "520p", "H.264", "3D", "2-2.9", "AAC", "152")),
    (100, row("webm", "360p", "VP8", "3D", "N/A", "Vorbis", "128")),
    (101, row("webm", "360p", "VP8", "3D", "N/A", "Vorbis", "192")),
    (102, row("webm", "720p", "VP8", "3D", "N/A", "Vorbis", "192")),
];

/// Look up the encoding attributes of a format identifier
pub fn lookup(itag: u32) -> Option<&'static FormatDescriptor> {
    FORMATS
        .binary_search_by_key(&itag, |(id, _)| *id)
        .ok()
        .map(|index| &FORMATS[index].1)
}

/// All format identifiers the registry knows about
pub fn known_itags() -> impl Iterator<Item = u32> {
    FORMATS.iter().map(|(id, _)| *id)
}

//! Session assembly: page → player config → stream map → signed variants

use crate::core::query;
use crate::core::variant::{sort_variants, Variant};
use crate::error::VidmapError;
use crate::platform::cipher::{JsCipher, SignatureResolver, MIN_SIGNATURE_LEN};
use crate::platform::client::{Fetch, HttpClientConfig, HttpFetcher};
use crate::platform::evaluator::ProcessEvaluator;
use crate::platform::extract::PLAYER_CONFIG_MARKER;
use crate::platform::formats;
use crate::platform::player_config::PlayerConfig;
use crate::platform::stream_map::{StreamMap, StreamMapRecord};
use crate::utils::{
    extract_video_id, has_signature, itag_from_url, resolve_script_url, safe_filename,
    set_signature,
};
use tracing::{debug, info, warn};

/// What to do with a variant whose signature cannot be descrambled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherFailurePolicy {
    /// Fail the whole refresh with the cipher error
    #[default]
    Abort,
    /// Drop the variant and keep its siblings
    DropVariant,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Marker preceding the embedded player config
    pub marker: String,
    /// Shortest cipher output accepted as a signature (default resolver only)
    pub min_signature_len: usize,
    /// Handling of per-variant cipher failures
    pub cipher_failure: CipherFailurePolicy,
    /// Scheme for scheme-relative script paths when the locator has none
    pub default_script_scheme: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            marker: PLAYER_CONFIG_MARKER.to_string(),
            min_signature_len: MIN_SIGNATURE_LEN,
            cipher_failure: CipherFailurePolicy::Abort,
            default_script_scheme: "https".to_string(),
        }
    }
}

impl SessionOptions {
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_min_signature_len(mut self, len: usize) -> Self {
        self.min_signature_len = len;
        self
    }

    pub fn with_cipher_failure(mut self, policy: CipherFailurePolicy) -> Self {
        self.cipher_failure = policy;
        self
    }

    pub fn with_default_script_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.default_script_scheme = scheme.into();
        self
    }
}

/// Companion script fetched during a refresh
#[derive(Debug, Clone)]
struct CompanionScript {
    url: String,
    text: String,
}

/// Everything a refresh replaces at once
#[derive(Debug, Default)]
struct SessionState {
    url: Option<String>,
    title: Option<String>,
    filename: Option<String>,
    videos: Vec<Variant>,
    script: Option<CompanionScript>,
}

type Sanitizer = Box<dyn Fn(&str) -> String>;

/// One remote video and its resolved variants
pub struct Session {
    options: SessionOptions,
    fetcher: Box<dyn Fetch>,
    resolver: Box<dyn SignatureResolver>,
    sanitizer: Sanitizer,
    state: SessionState,
}

impl Session {
    /// Create an empty session with the HTTP fetcher and node-based cipher,
    /// configured from the environment
    pub fn new() -> Result<Self, VidmapError> {
        Self::with_options(SessionOptions::default())
    }

    /// Create an empty session with custom options and default collaborators
    pub fn with_options(options: SessionOptions) -> Result<Self, VidmapError> {
        let fetcher = HttpFetcher::with_config(HttpClientConfig::from_env())?;
        let resolver = JsCipher::new(ProcessEvaluator::from_env())
            .with_min_signature_len(options.min_signature_len);
        Ok(Self::with_parts(fetcher, resolver).with_session_options(options))
    }

    /// Create an empty session around explicit collaborators
    pub fn with_parts(
        fetcher: impl Fetch + 'static,
        resolver: impl SignatureResolver + 'static,
    ) -> Self {
        Self {
            options: SessionOptions::default(),
            fetcher: Box::new(fetcher),
            resolver: Box::new(resolver),
            sanitizer: Box::new(safe_filename),
            state: SessionState::default(),
        }
    }

    /// Create a session and load `url` right away
    pub fn open(url: &str) -> Result<Self, VidmapError> {
        let mut session = Self::new()?;
        session.set_url(url)?;
        Ok(session)
    }

    /// Replace the options
    pub fn with_session_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the function deriving the default filename from the title
    pub fn with_filename_sanitizer(mut self, sanitizer: impl Fn(&str) -> String + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Point the session at a new video and resolve all of its variants.
    ///
    /// The previous state is kept untouched if anything fatal goes wrong.
    pub fn set_url(&mut self, url: &str) -> Result<(), VidmapError> {
        info!("Resolving variants for {}", url);
        self.resolver.reset();

        let page = self.fetcher.fetch(url)?;
        let config = PlayerConfig::from_page(&page, &self.options.marker)?;
        let title = config.title().to_string();
        let filename = (self.sanitizer)(&title);

        let (stream_map, decode_errors) = StreamMap::decode_lenient(config.stream_map());
        debug!(
            "Stream map has {} records ({} malformed)",
            stream_map.len(),
            decode_errors.len()
        );

        let mut script = None;
        let mut videos = Vec::with_capacity(stream_map.len());

        for (index, record) in stream_map.records().enumerate() {
            match self.resolve_record(url, &config, &record, &filename, &mut script) {
                Ok(Some(variant)) => videos.push(variant),
                Ok(None) => {}
                Err(e) if e.is_per_record() => {
                    warn!("Dropping stream map record {}: {}", index, e);
                }
                Err(VidmapError::CipherError(message))
                    if self.options.cipher_failure == CipherFailurePolicy::DropVariant =>
                {
                    warn!("Dropping stream map record {}: {}", index, message);
                }
                Err(e) => return Err(e),
            }
        }

        sort_variants(&mut videos);
        info!("Resolved {} variants for {:?}", videos.len(), title);

        self.state = SessionState {
            url: Some(url.to_string()),
            title: Some(title),
            filename: None,
            videos,
            script,
        };
        Ok(())
    }

    /// Build the variant for one record; `None` if its format is unknown
    fn resolve_record(
        &mut self,
        locator: &str,
        config: &PlayerConfig,
        record: &StreamMapRecord<'_>,
        filename: &str,
        script: &mut Option<CompanionScript>,
    ) -> Result<Option<Variant>, VidmapError> {
        let url = record
            .url
            .ok_or_else(|| VidmapError::DecodeError("record has no url".to_string()))?;

        let Some(itag) = record
            .itag
            .and_then(|itag| itag.parse().ok())
            .or_else(|| itag_from_url(url))
        else {
            debug!("Skipping record without itag");
            return Ok(None);
        };

        let Some(format) = formats::lookup(itag) else {
            debug!("Skipping unknown itag {}", itag);
            return Ok(None);
        };

        let signed_url = if has_signature(url) {
            url.to_string()
        } else if let Some(sig) = record.sig {
            sign_stream_url(url, sig)?
        } else if let Some(scrambled) = record.s {
            let script_text = load_script(
                self.fetcher.as_ref(),
                locator,
                config,
                &self.options.default_script_scheme,
                script,
            )?;
            let signature = self.resolver.resolve(scrambled, script_text)?;
            sign_stream_url(url, &signature)?
        } else {
            return Err(VidmapError::DecodeError(format!(
                "itag {} needs a signature but carries no token",
                itag
            )));
        };

        Ok(Some(Variant::new(signed_url, itag, format, filename)))
    }

    /// Source locator of the current video
    pub fn url(&self) -> Option<&str> {
        self.state.url.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.state.title.as_deref()
    }

    /// Video ID derived from the locator
    pub fn video_id(&self) -> Option<String> {
        self.state
            .url
            .as_deref()
            .and_then(|url| extract_video_id(url).ok())
    }

    /// Display filename: the override if one was set, else derived from the title
    pub fn filename(&self) -> String {
        match &self.state.filename {
            Some(filename) => filename.clone(),
            None => (self.sanitizer)(self.state.title.as_deref().unwrap_or_default()),
        }
    }

    /// Override the display filename of the session and every variant
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        let filename = filename.into();
        for video in &mut self.state.videos {
            video.set_filename(&filename);
        }
        self.state.filename = Some(filename);
    }

    /// Resolved variants in canonical order
    pub fn videos(&self) -> &[Variant] {
        &self.state.videos
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.state.videos.iter()
    }

    /// URL of the companion script fetched by the last refresh, if any
    pub fn script_url(&self) -> Option<&str> {
        self.state.script.as_ref().map(|s| s.url.as_str())
    }

    /// The single variant matching the criteria, see [`query::get`]
    pub fn get(
        &self,
        extension: Option<&str>,
        resolution: Option<&str>,
    ) -> Result<Option<&Variant>, VidmapError> {
        query::get(&self.state.videos, extension, resolution)
    }

    /// All variants matching the criteria, see [`query::filter`]
    pub fn filter(&self, extension: Option<&str>, resolution: Option<&str>) -> Vec<&Variant> {
        query::filter(&self.state.videos, extension, resolution)
    }
}

impl<'a> IntoIterator for &'a Session {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Signed stream URL; a URL that cannot carry a signature only costs its record
fn sign_stream_url(url: &str, signature: &str) -> Result<String, VidmapError> {
    set_signature(url, signature)
        .map_err(|e| VidmapError::DecodeError(format!("cannot sign {:?}: {}", url, e)))
}

/// Companion script text for this refresh, fetched on first use
fn load_script<'a>(
    fetcher: &dyn Fetch,
    locator: &str,
    config: &PlayerConfig,
    default_scheme: &str,
    script: &'a mut Option<CompanionScript>,
) -> Result<&'a str, VidmapError> {
    if script.is_none() {
        let path = config.script_path().ok_or_else(|| {
            VidmapError::ConfigError("scrambled signature but no companion script".to_string())
        })?;
        let url = resolve_script_url(locator, path, default_scheme)?;
        info!("Fetching companion script {}", url);
        let text = fetcher.fetch(&url)?;
        *script = Some(CompanionScript { url, text });
    }

    script
        .as_ref()
        .map(|s| s.text.as_str())
        .ok_or_else(|| VidmapError::CipherError("companion script unavailable".to_string()))
}

//! Error types for vidmap

use thiserror::Error;

/// Main error type for vidmap operations
#[derive(Debug, Error)]
pub enum VidmapError {
    /// The page no longer has the marker or balanced block we expect
    #[error("Page structure error: {0}")]
    StructureError(String),

    /// The embedded player configuration is not usable
    #[error("Player config error: {0}")]
    ConfigError(String),

    /// A stream map record is malformed
    #[error("Stream map decode error: {0}")]
    DecodeError(String),

    /// No candidate transformation produced a plausible signature
    #[error("Cipher error: {0}")]
    CipherError(String),

    #[error("get() returned more than one variant -- it returned {0}")]
    AmbiguousResult(usize),

    /// The script evaluator itself could not run
    #[error("Evaluator error: {0}")]
    EvaluatorError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl VidmapError {
    /// Check if the error means the host changed its page or cipher format
    pub fn is_host_change(&self) -> bool {
        matches!(
            self,
            VidmapError::StructureError(_)
                | VidmapError::ConfigError(_)
                | VidmapError::CipherError(_)
        )
    }

    /// Check if the error only affects a single stream map record
    pub fn is_per_record(&self) -> bool {
        matches!(self, VidmapError::DecodeError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_change_classification() {
        assert!(VidmapError::StructureError("x".into()).is_host_change());
        assert!(VidmapError::ConfigError("x".into()).is_host_change());
        assert!(VidmapError::CipherError("x".into()).is_host_change());
        assert!(!VidmapError::DecodeError("x".into()).is_host_change());
        assert!(!VidmapError::AmbiguousResult(2).is_host_change());
    }

    #[test]
    fn test_ambiguous_message() {
        let err = VidmapError::AmbiguousResult(3);
        assert_eq!(
            err.to_string(),
            "get() returned more than one variant -- it returned 3"
        );
        assert!(!err.is_per_record());
        assert!(VidmapError::DecodeError("bad".into()).is_per_record());
    }
}

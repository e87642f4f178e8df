//! # vidmap
//!
//! Resolve a video page into directly downloadable stream URLs, one per
//! quality/encoding variant.
//!
//! ## Pipeline
//!
//! - Extract the player configuration embedded in the page
//! - Decode the host's non-standard stream map
//! - Map format identifiers (itags) to encoding attributes
//! - Recover the signature cipher from the companion script and run it
//!   through an external evaluator for scrambled tokens
//!
//! ## Example
//!
//! ```rust,no_run
//! use vidmap::Session;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::open("http://www.youtube.com/watch?v=VIDEO_ID")?;
//!
//!     println!("{:?}", session.title());
//!     for video in &session {
//!         println!("{} {}", video, video.url());
//!     }
//!
//!     if let Some(video) = session.get(Some("mp4"), Some("720p"))? {
//!         println!("720p: {}", video.url());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use crate::core::{CipherFailurePolicy, Session, SessionOptions, Variant};
pub use error::VidmapError;
pub use platform::{
    Fetch, HttpClientConfig, HttpFetcher, JsCipher, ProcessEvaluator, ScriptEvaluator,
    SignatureResolver,
};

/// Result type alias for vidmap operations
pub type Result<T> = std::result::Result<T, VidmapError>;

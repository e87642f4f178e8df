//! Host-specific extraction: page config, stream map, formats and cipher

pub mod cipher;
pub mod client;
pub mod evaluator;
pub mod extract;
pub mod formats;
pub mod player_config;
pub mod stream_map;

pub use cipher::{CipherProgram, JsCipher, SignatureResolver};
pub use client::{Fetch, HttpClientConfig, HttpFetcher};
pub use evaluator::{ProcessEvaluator, ScriptEvaluator};
pub use formats::FormatDescriptor;
pub use player_config::PlayerConfig;
pub use stream_map::{StreamMap, StreamMapRecord};

#[cfg(feature = "deno")]
pub use evaluator::DenoEvaluator;

//! Utility functions for vidmap

pub mod filename;
pub mod logging;
pub mod url;

pub use self::filename::*;
pub use self::logging::*;
pub use self::url::*;

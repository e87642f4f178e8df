//! Core functionality for vidmap

pub mod query;
pub mod session;
pub mod variant;

pub use session::*;
pub use variant::*;

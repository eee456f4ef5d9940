//! Error types for the renderer bridge.
//!
//! Nothing here crosses the C boundary: `ffi::exports` turns every variant into a
//! null pointer or `false`, and records the message for `maprender_last_error`.

use thiserror::Error;

use crate::render::style::StyleError;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Non-positive dimensions or ratio, empty style payload, null handle.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine context, surface or map could not be built.
    ///
    /// Recoverable: the next render attempt retries construction.
    #[error("Engine construction failed: {0}")]
    Construction(String),

    /// A single render attempt failed on an otherwise usable session.
    #[error("Rendering failed: {0}")]
    Render(String),

    /// The handle was destroyed or never validly created.
    #[error("Invalid renderer handle")]
    InvalidHandle,
}

impl From<StyleError> for Error {
    fn from(err: StyleError) -> Self {
        Error::Construction(err.to_string())
    }
}

//! maprender-bridge (staticlib / cdylib)
//!
//! A small C ABI for rendering static map PNGs: create a renderer, render a
//! camera pose, read the image bytes, destroy the renderer. The engine session
//! behind each renderer is built lazily and rebuilt after it idles past a TTL.
//!
//! Design rule: keep this file thin.

pub mod cache;
pub mod engine;
pub mod error;
mod ffi;
pub mod handle;
pub mod render;
pub mod util;

// Export C ABI symbols.
pub use ffi::exports::*;

pub use engine::{Backend, RenderSession, SessionParams, SoftwareBackend};
pub use error::{Error, Result};
pub use handle::{HandleOptions, RendererHandle};
pub use render::CameraPose;

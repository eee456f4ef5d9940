//! Bundled static-map engine.
//!
//! Design rule: nothing in here knows about handles, TTLs or the C ABI. The
//! engine session (`crate::engine`) is the only consumer.

pub mod camera;
pub mod encode;
pub mod frontend;
pub mod geojson;
pub mod map;
pub mod paint;
pub mod projection;
pub mod style;

pub use camera::{Camera, CameraPose};
pub use encode::encode_png;
pub use frontend::{HeadlessFrontend, Size};
pub use map::StaticMap;
pub use style::{Style, StyleError};

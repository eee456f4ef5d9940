use tiny_skia::{Color, Pixmap, Transform};

use crate::error::{Error, Result};
use crate::render::map::StaticMap;

/// Largest physical side length, matching common GPU texture limits.
pub const MAX_SURFACE_DIMENSION: u32 = 16384;

/// Logical viewport size, before the pixel ratio is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Offscreen drawing surface a `StaticMap` renders into.
///
/// The surface holds `ceil(size * pixel_ratio)` physical pixels; maps draw in
/// logical pixels and the frontend scales.
pub struct HeadlessFrontend {
    surface: Pixmap,
    size: Size,
    pixel_ratio: f32,
}

impl HeadlessFrontend {
    pub fn new(size: Size, pixel_ratio: f32) -> Result<Self> {
        if size.width == 0 || size.height == 0 || !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "surface {}x{} @{pixel_ratio}",
                size.width, size.height
            )));
        }
        let (pw, ph) = physical_size(size, pixel_ratio)
            .ok_or_else(|| {
                Error::Construction(format!(
                    "surface {}x{} @{pixel_ratio} exceeds {MAX_SURFACE_DIMENSION}px",
                    size.width, size.height
                ))
            })?;
        let surface = Pixmap::new(pw, ph).ok_or_else(|| {
            Error::Construction(format!("could not allocate a {pw}x{ph} surface"))
        })?;
        Ok(Self { surface, size, pixel_ratio })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Draw one still frame of `map` into the surface and lend it out.
    pub fn render(&mut self, map: &StaticMap) -> &Pixmap {
        self.surface.fill(Color::TRANSPARENT);
        let transform = Transform::from_scale(self.pixel_ratio, self.pixel_ratio);
        map.draw(&mut self.surface, transform);
        &self.surface
    }
}

fn physical_size(size: Size, ratio: f32) -> Option<(u32, u32)> {
    let scale = |v: u32| {
        let px = (v as f64 * ratio as f64).ceil();
        (px >= 1.0 && px <= MAX_SURFACE_DIMENSION as f64).then_some(px as u32)
    };
    Some((scale(size.width)?, scale(size.height)?))
}

use std::f64::consts::PI;

use crate::render::camera::{Camera, MAX_LATITUDE};

/// Logical pixel size of one tile at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Project `(lon, lat)` onto a Web Mercator world `world` pixels wide.
pub fn project(lon: f64, lat: f64, world: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lon + 180.0) / 360.0 * world;
    let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0 * world;
    (x, y)
}

/// Maps geographic positions to logical viewport pixels for one camera.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    world: f64,
    center: (f64, f64),
    half_size: (f64, f64),
    cos: f64,
    sin: f64,
}

impl Projector {
    pub fn new(camera: &Camera, width: f64, height: f64) -> Self {
        let world = world_size(camera.zoom);
        let (sin, cos) = camera.bearing.to_radians().sin_cos();
        Self {
            world,
            center: project(camera.lon, camera.lat, world),
            half_size: (width / 2.0, height / 2.0),
            cos,
            sin,
        }
    }

    /// Viewport position of `(lon, lat)`; the map is rotated so `bearing` points up.
    pub fn to_screen(&self, lon: f64, lat: f64) -> (f32, f32) {
        let (x, y) = project(lon, lat, self.world);
        let dx = x - self.center.0;
        let dy = y - self.center.1;
        let rx = dx * self.cos + dy * self.sin;
        let ry = dy * self.cos - dx * self.sin;
        ((rx + self.half_size.0) as f32, (ry + self.half_size.1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn null_island_is_the_world_center() {
        let (x, y) = project(0.0, 0.0, world_size(0.0));
        assert!((x - 256.0).abs() < 1e-9);
        assert!((y - 256.0).abs() < 1e-9);
    }

    #[test]
    fn camera_center_lands_in_viewport_center() {
        let cam = Camera { lon: 13.4, lat: 52.5, zoom: 10.0, ..Camera::default() };
        let p = Projector::new(&cam, 256.0, 128.0);
        let (x, y) = p.to_screen(13.4, 52.5);
        assert!(close(x, 128.0) && close(y, 64.0));
    }

    #[test]
    fn bearing_rotates_east_to_up() {
        let cam = Camera { bearing: 90.0, zoom: 2.0, ..Camera::default() };
        let p = Projector::new(&cam, 200.0, 200.0);
        let (x, y) = p.to_screen(10.0, 0.0);
        assert!(close(x, 100.0));
        assert!(y < 100.0);
    }
}

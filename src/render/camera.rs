use crate::error::{Error, Result};

/// Web Mercator cannot represent the poles; latitudes are clamped to this.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 25.5;
pub const MAX_PITCH: f64 = 60.0;

/// Camera parameters of one render request, as passed over the C ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraPose {
    /// Degrees east.
    pub lon: f64,
    /// Degrees north.
    pub lat: f64,
    pub zoom: f64,
    /// Degrees clockwise from north.
    pub bearing: f64,
    /// Degrees away from straight down.
    pub pitch: f64,
}

impl CameraPose {
    pub fn new(lon: f64, lat: f64, zoom: f64, bearing: f64, pitch: f64) -> Self {
        Self { lon, lat, zoom, bearing, pitch }
    }
}

/// A pose after clamping into the range the engine can draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub lon: f64,
    pub lat: f64,
    pub zoom: f64,
    pub bearing: f64,
    pub pitch: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { lon: 0.0, lat: 0.0, zoom: 0.0, bearing: 0.0, pitch: 0.0 }
    }
}

impl Camera {
    /// Clamp a pose. Non-finite components are rejected rather than clamped.
    pub fn from_pose(pose: &CameraPose) -> Result<Self> {
        let fields = [
            ("lon", pose.lon),
            ("lat", pose.lat),
            ("zoom", pose.zoom),
            ("bearing", pose.bearing),
            ("pitch", pose.pitch),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Render(format!("camera {name} is not finite: {value}")));
        }

        Ok(Self {
            lon: wrap_degrees(pose.lon),
            lat: pose.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            zoom: pose.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            bearing: wrap_degrees(pose.bearing),
            pitch: pose.pitch.clamp(0.0, MAX_PITCH),
        })
    }
}

/// Normalise an angle into (-180, 180].
fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

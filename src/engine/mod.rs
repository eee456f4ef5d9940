pub mod run_loop;

use std::sync::Arc;

use tiny_skia::Pixmap;

use crate::error::{Error, Result};
use crate::render::{CameraPose, HeadlessFrontend, Size, StaticMap, Style};

pub use run_loop::{RunLoop, RunLoopGuard};

/// Everything needed to build a session. Fixed for the lifetime of a handle.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub style: Arc<str>,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl SessionParams {
    pub fn size(&self) -> Size {
        Size { width: self.width, height: self.height }
    }
}

/// One live engine instance bound to a size, pixel ratio and style.
pub trait RenderSession: Send {
    /// Move the camera to `pose` and draw one frame.
    ///
    /// The frame is borrowed from the session and is overwritten by the next call.
    /// A failure only fails this frame; the session stays usable.
    fn render(&mut self, pose: &CameraPose) -> Result<&Pixmap>;
}

/// Builds sessions for a handle.
///
/// Design rule: construction is all-or-nothing. A backend either returns a
/// fully loaded session or an error, with anything it allocated already released.
pub trait Backend: Send + Sync {
    type Session: RenderSession;

    fn create_session(&self, params: &SessionParams) -> Result<Self::Session>;
}

/// The bundled pure-Rust static map engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBackend;

impl Backend for SoftwareBackend {
    type Session = EngineSession;

    fn create_session(&self, params: &SessionParams) -> Result<EngineSession> {
        EngineSession::create(params)
    }
}

/// Run loop membership, offscreen surface and loaded map.
///
/// Fields drop in declaration order, which is the required teardown order:
/// map, then frontend, then the run loop registration.
pub struct EngineSession {
    map: StaticMap,
    frontend: HeadlessFrontend,
    run_loop: RunLoopGuard,
}

impl EngineSession {
    /// Enter the run loop, allocate the surface, then load the style.
    ///
    /// Anything built before a failing step is dropped on the way out.
    pub fn create(params: &SessionParams) -> Result<Self> {
        let run_loop = RunLoop::shared().enter();
        let frontend = HeadlessFrontend::new(params.size(), params.pixel_ratio).map_err(|e| match e {
            Error::InvalidArgument(msg) => Error::Construction(msg),
            other => other,
        })?;
        let style = Style::from_json(&params.style)?;
        let map = StaticMap::new(style, frontend.size());

        log::debug!(
            "session {} created: {}x{} @{} ({} layers)",
            run_loop.session_id(),
            params.width,
            params.height,
            params.pixel_ratio,
            map.style().layers.len()
        );
        Ok(Self { map, frontend, run_loop })
    }

    pub fn id(&self) -> u64 {
        self.run_loop.session_id()
    }

    pub fn map(&self) -> &StaticMap {
        &self.map
    }
}

impl RenderSession for EngineSession {
    fn render(&mut self, pose: &CameraPose) -> Result<&Pixmap> {
        self.map.jump_to(pose)?;
        Ok(self.frontend.render(&self.map))
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        log::debug!("session {} released", self.run_loop.session_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(style: &str) -> SessionParams {
        SessionParams { style: Arc::from(style), width: 32, height: 16, pixel_ratio: 2.0 }
    }

    const STYLE: &str = r##"{"version": 8, "sources": {}, "layers": [
        {"id": "bg", "type": "background", "paint": {"background-color": "white"}}]}"##;

    #[test]
    fn renders_at_physical_size() {
        let mut session = SoftwareBackend.create_session(&params(STYLE)).unwrap();
        let image = session.render(&CameraPose::default()).unwrap();
        assert_eq!((image.width(), image.height()), (64, 32));
        assert_eq!(image.pixel(0, 0).unwrap().alpha(), 255);
    }

    #[test]
    fn malformed_style_fails_construction() {
        let err = EngineSession::create(&params("{\"version\": 8, \"layers\": [")).err().unwrap();
        assert!(matches!(err, Error::Construction(_)));
    }

    #[test]
    fn render_failure_keeps_session_usable() {
        let mut session = EngineSession::create(&params(STYLE)).unwrap();
        let bad = CameraPose { zoom: f64::NAN, ..CameraPose::default() };
        assert!(matches!(session.render(&bad), Err(Error::Render(_))));
        assert!(session.render(&CameraPose::default()).is_ok());
    }

    #[test]
    fn sessions_hold_run_loop_membership_until_dropped() {
        let session = EngineSession::create(&params(STYLE)).unwrap();
        assert!(RunLoop::shared().live_sessions() >= 1);
        let id = session.id();
        drop(session);
        let next = EngineSession::create(&params(STYLE)).unwrap();
        assert!(next.id() > id);
    }
}

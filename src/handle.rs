use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::cache::TtlSlot;
use crate::engine::{Backend, RenderSession, SessionParams, SoftwareBackend};
use crate::error::{Error, Result};
use crate::render::{encode_png, CameraPose};
use crate::util::config::{bridge_config, BridgeConfig};

/// Session reuse policy of one handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOptions {
    /// Idle time after which the session is rebuilt before the next render.
    pub session_ttl: Duration,
    /// Build the session at creation and fail creation if that fails.
    pub eager_session: bool,
}

impl HandleOptions {
    pub fn from_config(cfg: &BridgeConfig) -> Self {
        Self { session_ttl: cfg.session_ttl, eager_session: cfg.eager_session }
    }
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}

struct HandleState<S> {
    session: TtlSlot<S>,
    /// Encoded bytes of the last successful render; empty otherwise.
    last_image: Vec<u8>,
    valid: bool,
}

/// A renderer identity whose engine session is built lazily and rebuilt after idling.
///
/// All mutable state sits behind one mutex, held for the whole of `render` and
/// `destroy`, so the staleness check, teardown and rebuild never interleave.
pub struct RendererHandle<B: Backend = SoftwareBackend> {
    backend: B,
    params: SessionParams,
    state: Mutex<HandleState<B::Session>>,
}

impl RendererHandle<SoftwareBackend> {
    /// Create a handle on the bundled engine using the process configuration.
    pub fn create(style: &str, width: i32, height: i32, pixel_ratio: f64) -> Result<Self> {
        let options = HandleOptions::from_config(bridge_config());
        Self::with_options(SoftwareBackend, style, width, height, pixel_ratio, options)
    }
}

impl<B: Backend> RendererHandle<B> {
    /// Validate arguments and store them. No session is built unless `options.eager_session`.
    pub fn with_options(
        backend: B,
        style: &str,
        width: i32,
        height: i32,
        pixel_ratio: f64,
        options: HandleOptions,
    ) -> Result<Self> {
        if style.trim().is_empty() {
            return Err(Error::InvalidArgument("style payload is empty".to_string()));
        }
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidArgument(format!("size {width}x{height} must be positive")));
        }
        // Sessions take an `f32` ratio; check what they will actually receive.
        let ratio = pixel_ratio as f32;
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "pixel ratio {pixel_ratio} must be a positive f32"
            )));
        }

        let handle = Self {
            backend,
            params: SessionParams {
                style: Arc::from(style),
                width: width as u32,
                height: height as u32,
                pixel_ratio: ratio,
            },
            state: Mutex::new(HandleState {
                session: TtlSlot::new(options.session_ttl),
                last_image: Vec::new(),
                valid: true,
            }),
        };

        if options.eager_session {
            let session = handle.backend.create_session(&handle.params)?;
            handle.lock()?.session.insert(Instant::now(), session);
        }
        Ok(handle)
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn session_ttl(&self) -> Duration {
        self.lock().map(|s| s.session.ttl()).unwrap_or_default()
    }

    /// Render one frame at `pose` and keep it as the handle's PNG.
    ///
    /// The previous image is discarded first, so after a failure `last_image` is empty.
    /// A construction failure is reported for this attempt only; the next call retries.
    pub fn render(&self, pose: &CameraPose) -> Result<()> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if !state.valid {
            return Err(Error::InvalidHandle);
        }
        state.last_image.clear();

        let now = Instant::now();
        if let Some(stale) = state.session.evict_stale(now) {
            log::debug!("session idle for more than {:?}, rebuilding", state.session.ttl());
            drop(stale);
        }

        let session = state
            .session
            .get_or_try_insert_with(now, || self.backend.create_session(&self.params))
            .map_err(|e| {
                log::warn!("render: {e}");
                e
            })?;
        let png = session.render(pose).and_then(encode_png);
        state.session.touch(now);

        let png = png.map_err(|e| {
            log::warn!("render: {e}");
            e
        })?;
        state.last_image = png;
        Ok(())
    }

    /// Run `f` over the last successful image (empty if none, or if destroyed).
    pub fn with_last_image<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        match self.lock() {
            Ok(state) if state.valid => f(&state.last_image),
            _ => f(&[]),
        }
    }

    pub fn last_image(&self) -> Vec<u8> {
        self.with_last_image(<[u8]>::to_vec)
    }

    /// Drop the image and the session and refuse all further work. Idempotent.
    pub fn destroy(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !state.valid {
            return;
        }
        state.last_image = Vec::new();
        drop(state.session.take());
        state.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.lock().map(|s| s.valid).unwrap_or(false)
    }

    pub fn has_session(&self) -> bool {
        self.lock().map(|s| s.session.is_occupied()).unwrap_or(false)
    }

    /// A panic while the lock was held leaves the session in an unknown state,
    /// so a poisoned handle is torn down and reported as invalid.
    fn lock(&self) -> Result<MutexGuard<'_, HandleState<B::Session>>> {
        match self.state.lock() {
            Ok(state) => Ok(state),
            Err(poisoned) => {
                let mut state = poisoned.into_inner();
                if state.valid {
                    log::warn!("renderer handle poisoned by an earlier panic; invalidating");
                    state.valid = false;
                    state.last_image = Vec::new();
                    drop(state.session.take());
                }
                Err(Error::InvalidHandle)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLE: &str = r##"{"version": 8, "sources": {}, "layers": [
        {"id": "bg", "type": "background", "paint": {"background-color": "#204060"}}]}"##;

    fn handle(style: &str) -> RendererHandle {
        RendererHandle::with_options(SoftwareBackend, style, 64, 32, 1.0, HandleOptions::default())
            .unwrap()
    }

    #[test]
    fn creation_is_lazy() {
        let h = handle(STYLE);
        assert!(h.is_valid());
        assert!(!h.has_session());
        assert!(h.last_image().is_empty());
    }

    #[test]
    fn rejects_invalid_arguments() {
        let opts = HandleOptions::default();
        for (style, w, h, ratio) in [
            ("", 10, 10, 1.0),
            ("  \n", 10, 10, 1.0),
            (STYLE, 0, 10, 1.0),
            (STYLE, 10, -1, 1.0),
            (STYLE, 10, 10, 0.0),
            (STYLE, 10, 10, f64::NAN),
            (STYLE, 10, 10, 1e-50),
            (STYLE, 10, 10, 1e300),
        ] {
            let res = RendererHandle::with_options(SoftwareBackend, style, w, h, ratio, opts);
            assert!(matches!(res, Err(Error::InvalidArgument(_))), "{style:?} {w}x{h}@{ratio}");
        }
    }

    #[test]
    fn accepted_ratios_survive_narrowing() {
        let opts = HandleOptions::default();
        let h = RendererHandle::with_options(SoftwareBackend, STYLE, 8, 8, 1e-30, opts).unwrap();
        assert!(h.params().pixel_ratio > 0.0);
        assert!(!matches!(h.render(&CameraPose::default()), Err(Error::Construction(_))));
    }

    #[test]
    fn render_produces_png_and_keeps_session() {
        let h = handle(STYLE);
        h.render(&CameraPose::default()).unwrap();
        assert!(h.has_session());
        let png = h.last_image();
        let decoded = tiny_skia::Pixmap::decode_png(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn bad_style_fails_render_but_not_creation() {
        let h = handle("{\"version\": 8");
        assert!(matches!(h.render(&CameraPose::default()), Err(Error::Construction(_))));
        assert!(h.is_valid());
        assert!(!h.has_session());
        assert!(h.last_image().is_empty());
    }

    #[test]
    fn failed_render_clears_previous_image() {
        let h = handle(STYLE);
        h.render(&CameraPose::default()).unwrap();
        assert!(!h.last_image().is_empty());

        let bad = CameraPose { lat: f64::NAN, ..CameraPose::default() };
        assert!(matches!(h.render(&bad), Err(Error::Render(_))));
        assert!(h.last_image().is_empty());
        assert!(h.has_session());
    }

    #[test]
    fn destroy_is_idempotent_and_final() {
        let h = handle(STYLE);
        h.render(&CameraPose::default()).unwrap();
        h.destroy();
        h.destroy();
        assert!(!h.is_valid());
        assert!(!h.has_session());
        assert!(h.last_image().is_empty());
        assert_eq!(h.render(&CameraPose::default()), Err(Error::InvalidHandle));
    }

    #[test]
    fn eager_handles_build_at_creation() {
        let opts = HandleOptions { eager_session: true, ..HandleOptions::default() };
        let h = RendererHandle::with_options(SoftwareBackend, STYLE, 8, 8, 1.0, opts).unwrap();
        assert!(h.has_session());

        let bad = RendererHandle::with_options(SoftwareBackend, "[]", 8, 8, 1.0, opts);
        assert!(matches!(bad, Err(Error::Construction(_))));
    }
}

use core::ffi::{c_char, c_int};
use std::sync::{Mutex, OnceLock};

use crate::error::{Error, Result};
use crate::ffi::registry;
use crate::ffi::types::{cstr_to_str, write_c_string};
use crate::handle::RendererHandle;
use crate::render::CameraPose;

/// Bumped whenever an exported signature changes.
pub const ABI_VERSION: i32 = 1;

static LAST_ERROR: OnceLock<Mutex<Option<String>>> = OnceLock::new();

fn set_last_error(msg: String) {
    let lock = LAST_ERROR.get_or_init(|| Mutex::new(None));
    if let Ok(mut guard) = lock.lock() {
        *guard = Some(msg);
    }
}

fn take_last_error() -> Option<String> {
    let lock = LAST_ERROR.get_or_init(|| Mutex::new(None));
    if let Ok(mut guard) = lock.lock() {
        guard.take()
    } else {
        None
    }
}

/// Run `body`, converting both errors and panics into `fallback`.
fn guarded<T>(op: &str, fallback: T, body: impl FnOnce() -> Result<T>) -> T {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(body)) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            log::warn!("{op}: {err}");
            set_last_error(format!("{op}: {err}"));
            fallback
        }
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("{op}: caught panic: {msg}");
            set_last_error(format!("{op}: internal error: {msg}"));
            fallback
        }
    }
}

/// Create a renderer for `style_json` (a NUL-terminated UTF-8 style document).
///
/// Returns null on invalid arguments, or if the session is built eagerly and fails.
/// The handle must be released with `maprender_destroy_renderer`.
#[no_mangle]
pub extern "C" fn maprender_create_renderer(
    style_json: *const c_char,
    width: c_int,
    height: c_int,
    pixel_ratio: f64,
) -> *mut RendererHandle {
    crate::util::logging::init_logger();

    guarded("maprender_create_renderer", core::ptr::null_mut(), || {
        let style = cstr_to_str(style_json)
            .ok_or_else(|| Error::InvalidArgument("style is null or not UTF-8".to_string()))?;
        let handle = RendererHandle::create(style, width, height, pixel_ratio)?;
        Ok(registry::register(handle))
    })
}

/// Render one PNG at the given camera. On success the bytes are available from
/// `maprender_get_image` until the next render or destroy.
#[no_mangle]
pub extern "C" fn maprender_render_png(
    handle: *mut RendererHandle,
    lon: f64,
    lat: f64,
    zoom: f64,
    bearing: f64,
    pitch: f64,
) -> bool {
    guarded("maprender_render_png", false, || {
        let handle = registry::lookup(handle)?;
        handle.render(&CameraPose::new(lon, lat, zoom, bearing, pitch))?;
        Ok(true)
    })
}

/// Pointer to the last rendered PNG, owned by the handle.
///
/// Returns null and writes 0 to `buffer_size` (if non-null) when there is no image.
/// The pointer is invalidated by the next `maprender_render_png` or by destroy.
/// Read-only: an unknown handle is not recorded in `maprender_last_error`.
#[no_mangle]
pub extern "C" fn maprender_get_image(handle: *mut RendererHandle, buffer_size: *mut usize) -> *const u8 {
    let lookup = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        match registry::lookup(handle) {
            Ok(handle) => handle.with_last_image(|bytes| {
                if bytes.is_empty() {
                    (core::ptr::null(), 0)
                } else {
                    (bytes.as_ptr(), bytes.len())
                }
            }),
            Err(err) => {
                log::debug!("maprender_get_image: {err}");
                (core::ptr::null(), 0)
            }
        }
    }));
    let (ptr, len) = lookup.unwrap_or_else(|_| {
        log::error!("maprender_get_image: caught panic");
        (core::ptr::null(), 0)
    });
    if !buffer_size.is_null() {
        // Safety: caller passes either null or a writable `size_t`.
        unsafe { *buffer_size = len };
    }
    ptr
}

/// Release the renderer. Calling it again on the same pointer is a no-op.
#[no_mangle]
pub extern "C" fn maprender_destroy_renderer(handle: *mut RendererHandle) {
    guarded("maprender_destroy_renderer", (), || {
        match registry::unregister(handle) {
            Some(owned) => owned.destroy(),
            None if handle.is_null() => {}
            None => log::debug!("maprender_destroy_renderer: {handle:p} is not live"),
        }
        Ok(())
    })
}

/// Copy the most recent failure message into `out` (NUL-terminated) and clear it.
/// Returns the number of bytes written, excluding the NUL.
#[no_mangle]
pub extern "C" fn maprender_last_error(out: *mut c_char, out_len: u32) -> u32 {
    if out.is_null() || out_len == 0 {
        return 0;
    }
    let msg = take_last_error().unwrap_or_default();
    write_c_string(out, out_len as usize, &msg) as u32
}

#[no_mangle]
pub extern "C" fn maprender_abi_version() -> i32 {
    ABI_VERSION
}

/// Handles currently owned on behalf of C callers.
pub fn live_renderers() -> usize {
    registry::live_count()
}

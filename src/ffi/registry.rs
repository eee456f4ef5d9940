use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::error::{Error, Result};
use crate::handle::RendererHandle;

/// Handles owned on behalf of C callers, keyed by the token handed out.
///
/// Design rule: the pointer C holds is an opaque token, never an address. Tokens
/// are not reused; stale, doubly destroyed or foreign pointers are rejected.
static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(1);
static LIVE: OnceLock<Mutex<HashMap<usize, Arc<RendererHandle>>>> = OnceLock::new();

fn live() -> MutexGuard<'static, HashMap<usize, Arc<RendererHandle>>> {
    let lock = LIVE.get_or_init(|| Mutex::new(HashMap::new()));
    // The map is never left half-updated, so a poisoned lock is still usable.
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Take ownership of `handle` and return the opaque token for C.
pub fn register(handle: RendererHandle) -> *mut RendererHandle {
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    live().insert(token, Arc::new(handle));
    token as *mut RendererHandle
}

/// Resolve a C pointer to a shared reference that outlives a concurrent destroy.
pub fn lookup(ptr: *const RendererHandle) -> Result<Arc<RendererHandle>> {
    if ptr.is_null() {
        return Err(Error::InvalidArgument("null renderer handle".to_string()));
    }
    live().get(&(ptr as usize)).cloned().ok_or(Error::InvalidHandle)
}

/// Remove the entry; the handle is freed once no in-flight call still holds it.
pub fn unregister(ptr: *const RendererHandle) -> Option<Arc<RendererHandle>> {
    if ptr.is_null() {
        return None;
    }
    live().remove(&(ptr as usize))
}

pub fn live_count() -> usize {
    live().len()
}

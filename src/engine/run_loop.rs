use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Process-wide execution context every engine session runs on.
///
/// Design rule: created on first session construction, shared by all handles,
/// never torn down. Its lifetime is the process lifetime.
#[derive(Debug)]
pub struct RunLoop {
    next_session_id: AtomicU64,
    live_sessions: AtomicUsize,
}

static RUN_LOOP: OnceLock<RunLoop> = OnceLock::new();

impl RunLoop {
    /// The shared run loop, started exactly once under `OnceLock`'s init lock.
    pub fn shared() -> &'static RunLoop {
        RUN_LOOP.get_or_init(|| {
            log::debug!("run loop started");
            RunLoop {
                next_session_id: AtomicU64::new(1),
                live_sessions: AtomicUsize::new(0),
            }
        })
    }

    pub fn is_started() -> bool {
        RUN_LOOP.get().is_some()
    }

    /// Register a session; it stays registered until the guard drops.
    pub fn enter(&'static self) -> RunLoopGuard {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.live_sessions.fetch_add(1, Ordering::AcqRel);
        RunLoopGuard { run_loop: self, session_id }
    }

    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::Acquire)
    }
}

/// A session's membership in the run loop.
#[derive(Debug)]
pub struct RunLoopGuard {
    run_loop: &'static RunLoop,
    session_id: u64,
}

impl RunLoopGuard {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }
}

impl Drop for RunLoopGuard {
    fn drop(&mut self) {
        self.run_loop.live_sessions.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_is_a_singleton() {
        assert!(std::ptr::eq(RunLoop::shared(), RunLoop::shared()));
        assert!(RunLoop::is_started());
    }

    #[test]
    fn guards_get_distinct_ids() {
        let rl = RunLoop::shared();
        let a = rl.enter();
        let b = rl.enter();
        assert_ne!(a.session_id(), b.session_id());
        assert!(rl.live_sessions() >= 2);
    }
}

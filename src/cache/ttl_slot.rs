use std::time::{Duration, Instant};

/// A one-entry cache whose value expires after `ttl` of idleness.
///
/// Idleness is measured from the last `touch`, not from insertion, so a value
/// used more often than `ttl` lives indefinitely. Expired values are dropped
/// before a replacement is built; the slot never holds two values at once.
#[derive(Debug)]
pub struct TtlSlot<T> {
    value: Option<T>,
    last_used: Option<Instant>,
    ttl: Duration,
}

impl<T> TtlSlot<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { value: None, last_used: None, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_occupied(&self) -> bool {
        self.value.is_some()
    }

    pub fn last_used(&self) -> Option<Instant> {
        self.last_used
    }

    /// True when a value is present and has been idle for more than `ttl`.
    pub fn is_stale(&self, now: Instant) -> bool {
        match (&self.value, self.last_used) {
            (Some(_), Some(at)) => now.saturating_duration_since(at) > self.ttl,
            // Inserted but never touched: only a rebuild can make it fresh.
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Remove and return the value if it is stale at `now`.
    pub fn evict_stale(&mut self, now: Instant) -> Option<T> {
        if self.is_stale(now) {
            self.value.take()
        } else {
            None
        }
    }

    /// Return the live value, dropping a stale one and building a replacement if needed.
    ///
    /// Does not touch the slot; a failed build leaves it empty.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        now: Instant,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E> {
        drop(self.evict_stale(now));
        let value = match self.value.take() {
            Some(value) => value,
            None => build()?,
        };
        Ok(self.value.insert(value))
    }

    /// Insert a value and mark it used at `now`, dropping any previous value first.
    pub fn insert(&mut self, now: Instant, value: T) {
        drop(self.value.take());
        self.value = Some(value);
        self.last_used = Some(now);
    }

    /// Restart the idle window.
    pub fn touch(&mut self, now: Instant) {
        self.last_used = Some(now);
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(20);

    #[test]
    fn empty_slot_is_never_stale() {
        let slot: TtlSlot<u32> = TtlSlot::new(TTL);
        assert!(!slot.is_occupied());
        assert!(!slot.is_stale(Instant::now() + TTL * 10));
    }

    #[test]
    fn value_goes_stale_only_after_ttl() {
        let t0 = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.insert(t0, 7);
        assert!(!slot.is_stale(t0 + TTL));
        assert!(slot.is_stale(t0 + TTL + Duration::from_millis(1)));
    }

    #[test]
    fn touch_extends_the_idle_window() {
        let t0 = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.insert(t0, 1);
        slot.touch(t0 + Duration::from_secs(15));
        assert!(!slot.is_stale(t0 + Duration::from_secs(30)));
        assert_eq!(slot.evict_stale(t0 + Duration::from_secs(36)), Some(1));
        assert!(!slot.is_occupied());
    }

    #[test]
    fn fresh_value_is_reused_without_building() {
        let t0 = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.insert(t0, 5);
        let got = slot
            .get_or_try_insert_with::<()>(t0 + Duration::from_secs(1), || panic!("rebuilt"))
            .map(|v| *v);
        assert_eq!(got, Ok(5));
    }

    #[test]
    fn stale_value_is_replaced() {
        let t0 = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.insert(t0, 5);
        let got = slot
            .get_or_try_insert_with::<()>(t0 + TTL * 2, || Ok(6))
            .map(|v| *v);
        assert_eq!(got, Ok(6));
    }

    #[test]
    fn failed_build_leaves_slot_empty() {
        let t0 = Instant::now();
        let mut slot: TtlSlot<u8> = TtlSlot::new(TTL);
        let got = slot.get_or_try_insert_with(t0, || Err("boom"));
        assert_eq!(got.map(|v| *v), Err("boom"));
        assert!(!slot.is_occupied());
    }
}

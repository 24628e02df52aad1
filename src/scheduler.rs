use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::difficulty::DelayRange;

/// Identifies one armed trigger. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerHandle(u64);

#[derive(Debug)]
struct Armed<T> {
    handle: TriggerHandle,
    due_at_ms: u64,
    payload: T,
}

/// Single-slot one-shot timer.
///
/// The scheduler owns at most one live trigger. Arming always replaces the
/// previous trigger, so two deferred transitions can never race each other, and
/// a cancelled trigger is gone from the slot so `poll` cannot deliver it.
#[derive(Debug)]
pub struct DelayScheduler<T, R = StdRng> {
    rng: R,
    next_id: u64,
    slot: Option<Armed<T>>,
}

impl<T> DelayScheduler<T, StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<T, R: Rng> DelayScheduler<T, R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            next_id: 0,
            slot: None,
        }
    }

    /// Uniform integer delay in `[min_ms, max_ms]`, both ends inclusive.
    pub fn draw_delay(&mut self, range: DelayRange) -> u64 {
        self.rng.gen_range(range.min_ms..=range.max_ms)
    }

    /// Arms a trigger after a random delay drawn from `range`.
    pub fn arm(&mut self, range: DelayRange, payload: T, now_ms: u64) -> TriggerHandle {
        let delay_ms = self.draw_delay(range);
        self.arm_after(delay_ms, payload, now_ms)
    }

    /// Arms a trigger after a fixed delay, cancelling whatever was pending.
    pub fn arm_after(&mut self, delay_ms: u64, payload: T, now_ms: u64) -> TriggerHandle {
        if let Some(stale) = self.cancel_pending() {
            log::debug!("replaced pending trigger {:?}", stale);
        }
        self.next_id += 1;
        let handle = TriggerHandle(self.next_id);
        self.slot = Some(Armed {
            handle,
            due_at_ms: now_ms.saturating_add(delay_ms),
            payload,
        });
        handle
    }

    /// Cancels `handle` if it is still live. Returns whether anything was cancelled.
    pub fn cancel(&mut self, handle: TriggerHandle) -> bool {
        match &self.slot {
            Some(armed) if armed.handle == handle => {
                self.slot = None;
                true
            }
            _ => false,
        }
    }

    /// Cancels the live trigger, whatever it is.
    pub fn cancel_pending(&mut self) -> Option<TriggerHandle> {
        self.slot.take().map(|armed| armed.handle)
    }

    /// Delivers the live trigger's payload once its deadline has passed.
    pub fn poll(&mut self, now_ms: u64) -> Option<(TriggerHandle, T)> {
        match &self.slot {
            Some(armed) if now_ms >= armed.due_at_ms => self
                .slot
                .take()
                .map(|armed| (armed.handle, armed.payload)),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<TriggerHandle> {
        self.slot.as_ref().map(|armed| armed.handle)
    }

    pub fn due_at(&self) -> Option<u64> {
        self.slot.as_ref().map(|armed| armed.due_at_ms)
    }

    pub fn pending_payload(&self) -> Option<&T> {
        self.slot.as_ref().map(|armed| &armed.payload)
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_draws_delays_inside_every_difficulty_range() {
        let mut scheduler: DelayScheduler<()> = DelayScheduler::seeded(7);
        for level in crate::Difficulty::ALL {
            let range = level.delay_range();
            for _ in 0..2_000 {
                scheduler.arm(range, (), 0);
                let due = scheduler.due_at().unwrap();
                assert!(range.contains(due), "{} outside {:?}", due, range);
            }
        }
    }

    #[test]
    fn delays_are_uniformly_distributed() {
        let mut scheduler: DelayScheduler<()> = DelayScheduler::seeded(42);
        let range = DelayRange::new(10, 19).unwrap();
        let draws = 20_000u64;
        let mut buckets = [0u64; 10];

        for _ in 0..draws {
            let d = scheduler.draw_delay(range);
            buckets[(d - range.min_ms) as usize] += 1;
        }

        // both endpoints must be reachable
        assert!(buckets[0] > 0 && buckets[9] > 0);
        let expected = draws / range.span();
        for (i, count) in buckets.iter().enumerate() {
            let diff = (*count as i64 - expected as i64).abs();
            assert!(diff < 300, "bucket {} has {} draws", i, count);
        }
    }

    #[test]
    fn poll_waits_for_the_deadline() {
        let mut scheduler = DelayScheduler::seeded(1);
        let handle = scheduler.arm_after(500, "ready", 1_000);

        assert_eq!(scheduler.poll(1_499), None);
        assert_eq!(scheduler.poll(1_500), Some((handle, "ready")));
        // one-shot
        assert_eq!(scheduler.poll(2_000), None);
    }

    #[test]
    fn cancelled_trigger_never_fires_even_when_overdue() {
        let mut scheduler = DelayScheduler::seeded(1);
        let handle = scheduler.arm_after(100, "ready", 0);

        assert!(scheduler.cancel(handle));
        assert_eq!(scheduler.poll(10_000), None);
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn cancel_is_a_noop_after_fire_or_second_cancel() {
        let mut scheduler = DelayScheduler::seeded(1);
        let handle = scheduler.arm_after(10, 1u8, 0);
        assert!(scheduler.poll(10).is_some());
        assert!(!scheduler.cancel(handle));

        let other = scheduler.arm_after(10, 2u8, 0);
        assert!(scheduler.cancel(other));
        assert!(!scheduler.cancel(other));
    }

    #[test]
    fn arming_replaces_the_pending_trigger() {
        let mut scheduler = DelayScheduler::seeded(1);
        let first = scheduler.arm_after(100, "first", 0);
        let second = scheduler.arm_after(300, "second", 0);

        assert_ne!(first, second);
        assert_eq!(scheduler.pending(), Some(second));
        // the stale handle cannot cancel the new trigger
        assert!(!scheduler.cancel(first));
        assert_eq!(scheduler.poll(200), None);
        assert_eq!(scheduler.poll(300), Some((second, "second")));
    }
}

//! Cooperative timers on a virtual millisecond clock
//!
//! The session owns the clock and advances it by host frame time. Periodic
//! timers fire at a fixed cadence; deferred events fire once and carry the
//! session generation they were scheduled under, so a late event from a
//! superseded session can be recognised and dropped.

/// Fixed-cadence timer. Stopped timers never fire, and neither do timers
/// whose period is not a positive number.
#[derive(Debug, Clone)]
pub struct Periodic {
    period_ms: f64,
    next_due_ms: Option<f64>,
}

impl Periodic {
    pub fn new(period_ms: f64) -> Self {
        Self {
            period_ms,
            next_due_ms: None,
        }
    }

    /// Start (or restart) so the first firing is one period after `now_ms`.
    /// Missed periods are never replayed.
    pub fn start(&mut self, now_ms: f64) {
        self.next_due_ms = Some(now_ms + self.period_ms);
    }

    pub fn stop(&mut self) {
        self.next_due_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due_ms.is_some()
    }

    fn has_valid_period(&self) -> bool {
        self.period_ms.is_finite() && self.period_ms > 0.0
    }

    /// When the timer next fires, if running
    pub fn due(&self) -> Option<f64> {
        self.next_due_ms.filter(|_| self.has_valid_period())
    }

    /// Consume the current firing and schedule the next one
    pub fn fire(&mut self) {
        if let Some(due) = self.next_due_ms.as_mut() {
            *due += self.period_ms;
        }
    }

    /// Cap the backlog before `target_ms` to `max_steps` firings, dropping
    /// the oldest. Returns how many firings were dropped.
    pub fn limit_backlog(&mut self, target_ms: f64, max_steps: u32) -> u64 {
        let Some(due) = self.next_due_ms else {
            return 0;
        };
        if due > target_ms || max_steps == 0 || !self.has_valid_period() {
            return 0;
        }

        let pending = ((target_ms - due) / self.period_ms).floor() as u64 + 1;
        let max = u64::from(max_steps);
        if pending <= max {
            return 0;
        }
        self.next_due_ms = Some(due + (pending - max) as f64 * self.period_ms);
        pending - max
    }
}

/// A one-shot event waiting for its due time
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred<E> {
    pub due_ms: f64,
    pub generation: u64,
    pub event: E,
}

/// One-shot events, fired in due order (ties in scheduling order)
#[derive(Debug, Clone)]
pub struct DeferredQueue<E> {
    items: Vec<Deferred<E>>,
    /// Set while frozen; due times are shifted by the frozen span on thaw
    frozen_at: Option<f64>,
}

impl<E> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> DeferredQueue<E> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            frozen_at: None,
        }
    }

    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, generation: u64, event: E) {
        self.items.push(Deferred {
            due_ms: now_ms + delay_ms,
            generation,
            event,
        });
    }

    /// Earliest due time; frozen queues report nothing
    pub fn next_due(&self) -> Option<f64> {
        if self.frozen_at.is_some() {
            return None;
        }
        self.items.iter().map(|d| d.due_ms).reduce(f64::min)
    }

    /// Remove and return the earliest event due at or before `upto_ms`
    pub fn pop_due(&mut self, upto_ms: f64) -> Option<Deferred<E>> {
        if self.frozen_at.is_some() {
            return None;
        }
        let mut best: Option<usize> = None;
        for (i, item) in self.items.iter().enumerate() {
            if item.due_ms > upto_ms {
                continue;
            }
            match best {
                Some(b) if self.items[b].due_ms <= item.due_ms => {}
                _ => best = Some(i),
            }
        }
        best.map(|i| self.items.remove(i))
    }

    /// Suspend the countdown of every pending event
    pub fn freeze(&mut self, now_ms: f64) {
        if self.frozen_at.is_none() {
            self.frozen_at = Some(now_ms);
        }
    }

    /// Resume countdowns with the time remaining when frozen
    pub fn thaw(&mut self, now_ms: f64) {
        if let Some(frozen_at) = self.frozen_at.take() {
            let span = (now_ms - frozen_at).max(0.0);
            for item in &mut self.items {
                item.due_ms += span;
            }
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_at.is_some()
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.items.clear();
        self.frozen_at = None;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_fires_each_period() {
        let mut t = Periodic::new(10.0);
        assert_eq!(t.due(), None);
        t.start(5.0);
        assert_eq!(t.due(), Some(15.0));
        t.fire();
        assert_eq!(t.due(), Some(25.0));
        t.stop();
        assert!(!t.is_running());
        t.fire();
        assert_eq!(t.due(), None);
    }

    #[test]
    fn backlog_is_capped() {
        let mut t = Periodic::new(10.0);
        t.start(0.0);
        // Due at 10, 20, ... 1000: 100 firings, keep the last 8
        let dropped = t.limit_backlog(1000.0, 8);
        assert_eq!(dropped, 92);
        assert_eq!(t.due(), Some(930.0));

        // Nothing to drop when within the cap
        let mut t = Periodic::new(10.0);
        t.start(0.0);
        assert_eq!(t.limit_backlog(50.0, 8), 0);
        assert_eq!(t.due(), Some(10.0));
    }

    #[test]
    fn zero_period_never_fires() {
        let mut t = Periodic::new(0.0);
        t.start(0.0);
        assert!(t.is_running());
        assert_eq!(t.due(), None);
        assert_eq!(t.limit_backlog(1000.0, 8), 0);

        let mut t = Periodic::new(f64::INFINITY);
        t.start(0.0);
        assert_eq!(t.due(), None);
    }

    #[test]
    fn deferred_pops_in_due_order() {
        let mut q = DeferredQueue::new();
        q.schedule(0.0, 30.0, 0, "c");
        q.schedule(0.0, 10.0, 0, "a");
        q.schedule(0.0, 10.0, 0, "b");
        assert_eq!(q.next_due(), Some(10.0));

        assert_eq!(q.pop_due(5.0), None);
        assert_eq!(q.pop_due(20.0).map(|d| d.event), Some("a"));
        assert_eq!(q.pop_due(20.0).map(|d| d.event), Some("b"));
        assert_eq!(q.pop_due(20.0), None);
        assert_eq!(q.pop_due(30.0).map(|d| d.event), Some("c"));
        assert!(q.is_empty());
    }

    #[test]
    fn frozen_queue_keeps_remaining_time() {
        let mut q = DeferredQueue::new();
        q.schedule(0.0, 600.0, 3, ());
        q.freeze(200.0);
        assert!(q.is_frozen());
        assert_eq!(q.next_due(), None);
        assert_eq!(q.pop_due(10_000.0), None);

        q.thaw(1200.0);
        assert_eq!(q.next_due(), Some(1600.0));
        let fired = q.pop_due(1600.0).unwrap();
        assert_eq!(fired.generation, 3);
    }

    #[test]
    fn clear_drops_everything() {
        let mut q = DeferredQueue::new();
        q.schedule(0.0, 1.0, 0, 1u8);
        q.freeze(0.5);
        q.clear();
        assert!(q.is_empty());
        assert!(!q.is_frozen());
    }
}

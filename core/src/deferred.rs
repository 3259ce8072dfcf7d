use web_time::Instant;

#[derive(Debug)]
struct Pending<E> {
    due: Instant,
    seq: u64,
    effect: E,
}

/// Effects waiting for their delay to elapse, handed out in due order.
///
/// Clearing the queue is how a session discards effects that outlived the state they were
/// scheduled for.
#[derive(Debug)]
pub struct DeferredQueue<E> {
    pending: Vec<Pending<E>>,
    next_seq: u64,
}

impl<E> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<E> DeferredQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, due: Instant, effect: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending { due, seq, effect });
    }

    /// Removes and returns the earliest effect due at `now`, ties go in scheduling order.
    pub fn pop_due(&mut self, now: Instant) -> Option<E> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= now)
            .min_by_key(|(_, pending)| (pending.due, pending.seq))
            .map(|(index, _)| index)?;
        Some(self.pending.swap_remove(index).effect)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|pending| pending.due).min()
    }

    /// Drops every pending effect, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            log::trace!("Discarded {} deferred effects", dropped);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    #[test]
    fn pops_in_due_order() {
        let t0 = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(t0 + Duration::from_millis(200), "late");
        queue.schedule(t0 + Duration::from_millis(100), "early");
        queue.schedule(t0 + Duration::from_millis(100), "early-second");

        assert_eq!(queue.pop_due(t0 + Duration::from_millis(50)), None);
        assert_eq!(queue.next_due(), Some(t0 + Duration::from_millis(100)));

        let now = t0 + Duration::from_millis(250);
        assert_eq!(queue.pop_due(now), Some("early"));
        assert_eq!(queue.pop_due(now), Some("early-second"));
        assert_eq!(queue.pop_due(now), Some("late"));
        assert!(queue.is_empty());
    }

    #[test]
    fn cleared_effects_never_fire() {
        let t0 = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(t0, 1);
        queue.schedule(t0, 2);

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.pop_due(t0 + Duration::from_secs(10)), None);
        assert_eq!(queue.next_due(), None);
    }
}

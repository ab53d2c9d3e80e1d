//! Deadline-ordered timer queue on a lock-free skip list

use crossbeam_skiplist::SkipMap;

use super::{TimerHandle, TimerService};

/// Timer service keeping armed deadlines sorted by `(deadline, sequence)`
///
/// Arm, cancel and per-timer expiry are O(log n); a sweep touches only the timers that
/// actually fire.
pub struct DeadlineQueue<T> {
    timers: SkipMap<(u64, u64), T>,
    next_sequence: u64,
}

impl<T> std::fmt::Debug for DeadlineQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineQueue")
            .field("pending", &self.timers.len())
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

impl<T: Clone + Send + 'static> DeadlineQueue<T> {
    pub fn new() -> Self {
        Self {
            timers: SkipMap::new(),
            next_sequence: 0,
        }
    }
}

impl<T: Clone + Send + 'static> Default for DeadlineQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> TimerService<T> for DeadlineQueue<T> {
    fn arm(&mut self, token: T, deadline: u64) -> TimerHandle {
        let handle = TimerHandle::new(deadline, self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.timers.insert(handle.key(), token);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle.key()).is_some()
    }

    fn expire(&mut self, now: u64) -> Vec<(TimerHandle, T)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.timers.front() {
            let (deadline, sequence) = *entry.key();
            if deadline > now {
                break;
            }
            let token = entry.value().clone();
            entry.remove();
            fired.push((TimerHandle::new(deadline, sequence), token));
        }
        fired
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }

    fn next_deadline(&self) -> Option<u64> {
        self.timers.front().map(|entry| entry.key().0)
    }

    fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_returns_elapsed_in_deadline_order() {
        let mut queue = DeadlineQueue::new();
        queue.arm("late", 30);
        queue.arm("early", 10);
        queue.arm("middle", 20);

        assert!(queue.expire(9).is_empty());

        let fired: Vec<_> = queue.expire(20).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec!["early", "middle"]);
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.next_deadline(), Some(30));
    }

    #[test]
    fn test_same_deadline_fires_in_arm_order() {
        let mut queue = DeadlineQueue::new();
        for token in 0..5 {
            queue.arm(token, 7);
        }
        let fired: Vec<_> = queue.expire(7).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut queue = DeadlineQueue::new();
        let handle = queue.arm(1u32, 5);

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(queue.expire(100).is_empty());
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut queue = DeadlineQueue::new();
        let handle = queue.arm(1u32, 5);
        assert_eq!(queue.expire(5).len(), 1);
        assert!(!queue.cancel(handle));
    }

    #[test]
    fn test_rearm_moves_deadline() {
        let mut queue = DeadlineQueue::new();
        let first = queue.arm('k', 5);
        let second = queue.rearm(Some(first), 'k', 15);

        assert_eq!(queue.pending(), 1);
        assert!(queue.expire(10).is_empty());
        assert_eq!(queue.expire(15), vec![(second, 'k')]);
    }
}

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use chat_logging::chat_warn;
use prioritizer_core::Timer;

#[derive(Debug)]
struct Pending {
    due: Instant,
    seq: u64,
    timer: Timer,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Deadline-ordered timers; equal deadlines fire in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Pending>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timer whose deadline cannot be represented would never fire, so it is dropped.
    pub fn schedule(&mut self, now: Instant, after: Duration, timer: Timer) {
        let Some(due) = now.checked_add(after) else {
            chat_warn!("dropping {:?}: delay {:?} is out of range", timer, after);
            return;
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Pending { due, seq, timer }));
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(pending)| pending.due)
    }

    /// Removes and returns every timer due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<Timer> {
        let mut due = Vec::new();
        while let Some(Reverse(pending)) = self.heap.peek() {
            if pending.due > now {
                break;
            }
            if let Some(Reverse(pending)) = self.heap.pop() {
                due.push(pending.timer);
            }
        }
        due
    }
}

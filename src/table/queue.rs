use std::collections::VecDeque;
use std::time::Instant;

/// One pending claim on the pool: who asked, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub seat: usize,
    pub at: Instant,
}

/// FIFO of pending requests. A seat holds at most one entry at a time;
/// `enqueue` is idempotent against duplicates and `remove` against absent
/// entries, so callers never need to pre-check membership.
#[derive(Debug, Default)]
pub struct RequestQueue {
    entries: VecDeque<Request>,
}

impl RequestQueue {
    /// Appends `(seat, at)` unless the seat is already queued. Returns whether
    /// a new entry was added.
    pub fn enqueue(&mut self, seat: usize, at: Instant) -> bool {
        if self.contains(seat) {
            return false;
        }
        self.entries.push_back(Request { seat, at });
        true
    }

    /// Removes the entry for `seat` if present. Returns whether one existed.
    pub fn remove(&mut self, seat: usize) -> bool {
        match self.entries.iter().position(|r| r.seat == seat) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Drops every entry the predicate rejects, preserving order of the rest.
    pub fn retain(&mut self, keep: impl FnMut(&Request) -> bool) {
        self.entries.retain(keep);
    }

    pub fn contains(&self, seat: usize) -> bool {
        self.entries.iter().any(|r| r.seat == seat)
    }

    pub fn front(&self) -> Option<&Request> {
        self.entries.front()
    }

    /// Entries in insertion (FIFO) order.
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::RequestQueue;
    use std::time::Instant;

    #[test]
    fn preserves_insertion_order() {
        let mut q = RequestQueue::default();
        let now = Instant::now();
        for seat in [3, 1, 4] {
            assert!(q.enqueue(seat, now));
        }
        let order: Vec<usize> = q.iter().map(|r| r.seat).collect();
        assert_eq!(order, [3, 1, 4]);
        assert_eq!(q.front().unwrap().seat, 3);
    }

    #[test]
    fn duplicate_enqueue_is_rejected() {
        let mut q = RequestQueue::default();
        let first = Instant::now();
        assert!(q.enqueue(2, first));
        assert!(!q.enqueue(2, Instant::now()));
        assert_eq!(q.len(), 1);
        // the original timestamp survives
        assert_eq!(q.front().unwrap().at, first);
    }

    #[test]
    fn remove_middle_keeps_order() {
        let mut q = RequestQueue::default();
        let now = Instant::now();
        for seat in [0, 1, 2] {
            q.enqueue(seat, now);
        }
        assert!(q.remove(1));
        let order: Vec<usize> = q.iter().map(|r| r.seat).collect();
        assert_eq!(order, [0, 2]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut q = RequestQueue::default();
        let now = Instant::now();
        q.enqueue(0, now);
        q.enqueue(1, now);
        assert!(!q.remove(7));
        let order: Vec<usize> = q.iter().map(|r| r.seat).collect();
        assert_eq!(order, [0, 1]);
    }
}

//! Thread-safe double-ended queue.
//!
//! A mutex-protected deque with bulk push/pop that takes the lock once per
//! call. Counts are tracked by the caller (see [`crate::uts::worker`]) via
//! atomics kept in lockstep with pushes/pops under the same lock.

use std::collections::VecDeque;

use parking_lot::Mutex;

pub struct Deque<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Deque<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_front(&self, item: T) {
        self.inner.lock().push_front(item);
    }

    pub fn push_back(&self, item: T) {
        self.inner.lock().push_back(item);
    }

    pub fn push_front_bulk(&self, items: Vec<T>) {
        let mut guard = self.inner.lock();
        for item in items.into_iter().rev() {
            guard.push_front(item);
        }
    }

    pub fn push_back_bulk(&self, items: Vec<T>) {
        let mut guard = self.inner.lock();
        guard.extend(items);
    }

    pub fn pop_front(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    pub fn pop_back(&self) -> Option<T> {
        self.inner.lock().pop_back()
    }

    /// Pops up to `n` items from the front. Returns fewer than `n` only if
    /// the deque holds fewer than `n` items.
    pub fn pop_front_bulk(&self, n: usize) -> Vec<T> {
        let mut guard = self.inner.lock();
        let take = n.min(guard.len());
        guard.drain(..take).collect()
    }

    /// Pops up to `n` items from the back, nearest-first (last pushed
    /// first popped), preserving push order within the returned vector.
    pub fn pop_back_bulk(&self, n: usize) -> Vec<T> {
        let mut guard = self.inner.lock();
        let len = guard.len();
        let take = n.min(len);
        guard.split_off(len - take).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_back_pop_front_is_fifo() {
        let q: Deque<i32> = Deque::new();
        q.push_back(1);
        q.push_back(2);
        q.push_back(3);
        assert_eq!(q.pop_front(), Some(1));
        assert_eq!(q.pop_front(), Some(2));
    }

    #[test]
    fn push_back_pop_back_is_lifo() {
        let q: Deque<i32> = Deque::new();
        q.push_back(1);
        q.push_back(2);
        q.push_back(3);
        assert_eq!(q.pop_back(), Some(3));
        assert_eq!(q.pop_back(), Some(2));
    }

    #[test]
    fn bulk_pop_front_returns_fewer_than_n_when_short() {
        let q: Deque<i32> = Deque::new();
        q.push_back_bulk(vec![1, 2]);
        let popped = q.pop_front_bulk(5);
        assert_eq!(popped, vec![1, 2]);
        assert!(q.is_empty());
    }

    #[test]
    fn bulk_pop_back_takes_the_most_recent_items() {
        let q: Deque<i32> = Deque::new();
        q.push_back_bulk(vec![1, 2, 3, 4]);
        let popped = q.pop_back_bulk(2);
        assert_eq!(popped, vec![3, 4]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn push_front_bulk_preserves_order_at_the_front() {
        let q: Deque<i32> = Deque::new();
        q.push_back(9);
        q.push_front_bulk(vec![1, 2, 3]);
        assert_eq!(q.pop_front_bulk(4), vec![1, 2, 3, 9]);
    }
}

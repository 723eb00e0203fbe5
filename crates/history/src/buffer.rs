use std::collections::VecDeque;

/// Fixed-capacity ring of recent values, oldest first.
///
/// Pushing onto a full ring hands back the evicted head.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends at the tail, returning the evicted head when at capacity.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.buf.iter()
    }

    /// Copies the contents into a `Vec`, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_under_capacity_keeps_everything() {
        let mut rb = RingBuffer::new(5);
        assert_eq!(rb.push(1), None);
        assert_eq!(rb.push(2), None);
        assert_eq!(rb.push(3), None);

        assert_eq!(rb.len(), 3);
        assert_eq!(rb.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn push_over_capacity_returns_evicted() {
        let mut rb = RingBuffer::new(3);
        let evicted: Vec<Option<i32>> = (1..=5).map(|i| rb.push(i)).collect();

        assert_eq!(evicted, vec![None, None, None, Some(1), Some(2)]);
        assert_eq!(rb.to_vec(), vec![3, 4, 5]);
        assert_eq!(rb.len(), rb.capacity());
    }

    #[test]
    fn empty_buffer() {
        let rb: RingBuffer<f64> = RingBuffer::new(10);

        assert!(rb.is_empty());
        assert_eq!(rb.last(), None);
        assert_eq!(rb.iter().len(), 0);
        assert_eq!(rb.capacity(), 10);
    }

    #[test]
    fn last_and_reverse_iteration() {
        let mut rb = RingBuffer::new(3);
        for i in 1..=4 {
            rb.push(i);
        }

        assert_eq!(rb.last(), Some(&4));
        let newest_first: Vec<&i32> = rb.iter().rev().collect();
        assert_eq!(newest_first, vec![&4, &3, &2]);
    }

    #[test]
    fn capacity_one_always_holds_newest() {
        let mut rb = RingBuffer::new(1);
        rb.push("a");
        assert_eq!(rb.push("b"), Some("a"));
        assert_eq!(rb.to_vec(), vec!["b"]);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = RingBuffer::<i32>::new(0);
    }
}

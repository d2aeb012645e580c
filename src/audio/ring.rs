//! Bounded ring buffer for captured audio.
//!
//! The capture thread appends blocks as they arrive; the segment packer
//! takes snapshots of the most recent samples on its own schedule. The
//! two sides never block each other for longer than a memcpy.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Fixed-capacity sample buffer that evicts oldest samples on overflow.
///
/// All methods take `&self`; interior locking makes the buffer safe to
/// share between the capture and packer threads behind an `Arc`.
pub struct RingAudioBuffer {
    inner: Mutex<VecDeque<i16>>,
    capacity: usize,
    sample_rate: u32,
}

impl RingAudioBuffer {
    /// Creates a buffer holding `seconds` of audio at `sample_rate`.
    pub fn new(seconds: f64, sample_rate: u32) -> Self {
        let capacity = (seconds * sample_rate as f64).max(1.0) as usize;
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            sample_rate,
        }
    }

    /// Appends a block of samples, evicting the oldest samples first if
    /// the block would exceed capacity.
    pub fn append(&self, block: &[i16]) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if block.len() >= self.capacity {
            // Block alone fills the buffer: keep only its newest tail.
            inner.clear();
            inner.extend(&block[block.len() - self.capacity..]);
            return;
        }
        let overflow = (inner.len() + block.len()).saturating_sub(self.capacity);
        for _ in 0..overflow {
            inner.pop_front();
        }
        inner.extend(block);
    }

    /// Copies out the most recent `count` samples, oldest first.
    ///
    /// Returns fewer samples if the buffer holds fewer; never blocks
    /// waiting for more audio to arrive.
    pub fn snapshot_last(&self, count: usize) -> Vec<i16> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let take = count.min(inner.len());
        let start = inner.len() - take;
        inner.iter().skip(start).copied().collect()
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true if no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seconds of audio currently buffered.
    pub fn duration_seconds(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Maximum number of samples the buffer retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discards all buffered samples.
    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_from_seconds() {
        let buffer = RingAudioBuffer::new(15.0, 16000);
        assert_eq!(buffer.capacity(), 240000);
    }

    #[test]
    fn test_append_and_snapshot() {
        let buffer = RingAudioBuffer::new(1.0, 1000);
        buffer.append(&[1, 2, 3, 4, 5]);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.snapshot_last(3), vec![3, 4, 5]);
    }

    #[test]
    fn test_snapshot_tolerates_short_buffer() {
        let buffer = RingAudioBuffer::new(1.0, 1000);
        buffer.append(&[7, 8]);
        // Asking for more than is buffered returns what exists.
        assert_eq!(buffer.snapshot_last(100), vec![7, 8]);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let buffer = RingAudioBuffer::new(0.005, 1000); // capacity 5
        buffer.append(&[1, 2, 3, 4, 5]);
        buffer.append(&[6, 7]);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.snapshot_last(5), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_oversized_block_keeps_newest_tail() {
        let buffer = RingAudioBuffer::new(0.004, 1000); // capacity 4
        buffer.append(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(buffer.snapshot_last(4), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_bound_holds_under_sustained_writes() {
        let buffer = RingAudioBuffer::new(0.01, 1000); // capacity 10
        for i in 0..100 {
            buffer.append(&[i as i16; 3]);
            assert!(buffer.len() <= buffer.capacity());
        }
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_clear() {
        let buffer = RingAudioBuffer::new(1.0, 1000);
        buffer.append(&[1, 2, 3]);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.snapshot_last(10), Vec::<i16>::new());
    }

    #[test]
    fn test_duration_seconds() {
        let buffer = RingAudioBuffer::new(10.0, 16000);
        buffer.append(&vec![0i16; 16000]);
        assert!((buffer.duration_seconds() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shared_between_threads() {
        use std::sync::Arc;
        use std::thread;

        let buffer = Arc::new(RingAudioBuffer::new(0.1, 1000)); // capacity 100
        let writer = {
            let buffer = buffer.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    buffer.append(&[42i16; 10]);
                }
            })
        };
        for _ in 0..50 {
            let snap = buffer.snapshot_last(100);
            assert!(snap.len() <= 100);
        }
        writer.join().unwrap();
        assert_eq!(buffer.len(), 100);
    }
}

//! Bounded work queue between the segment packer and the transcription
//! worker.
//!
//! The queue is deliberately small and drop-on-full: when transcription
//! falls behind, fresh audio matters more than stale segments, and the
//! capture path must never block.

use crate::types::AudioSegment;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Item carried by the work queue.
#[derive(Debug, Clone)]
pub enum WorkItem {
    /// A segment ready for transcription.
    Segment(AudioSegment),
    /// Shutdown sentinel; the worker drains nothing further after it.
    Stop,
}

/// Producer side of the work queue.
#[derive(Clone)]
pub struct WorkSender {
    tx: Sender<WorkItem>,
    dropped: Arc<AtomicU64>,
}

impl WorkSender {
    /// Offers a segment without blocking.
    ///
    /// Returns `true` if queued; on a full queue the segment is dropped,
    /// the drop counter incremented, and `false` returned.
    pub fn try_push(&self, segment: AudioSegment) -> bool {
        match self.tx.try_send(WorkItem::Segment(segment)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::SeqCst) + 1;
                eprintln!("transvox: work queue full, dropping segment ({} total)", total);
                false
            }
        }
    }

    /// Enqueues the shutdown sentinel, waiting for space if needed.
    pub fn push_stop(&self) {
        // Blocking send: shutdown must reach the worker even when the
        // queue is momentarily full. Fails only if the worker is gone,
        // in which case there is nothing left to stop.
        let _ = self.tx.send(WorkItem::Stop);
    }

    /// Total number of segments dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Consumer side of the work queue.
pub struct WorkReceiver {
    rx: Receiver<WorkItem>,
}

impl WorkReceiver {
    /// Waits up to `timeout` for the next item.
    ///
    /// `None` means the timeout elapsed or all senders are gone; callers
    /// use the window to re-check their running flag.
    pub fn pop(&self, timeout: Duration) -> Option<WorkItem> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Creates a bounded work queue with the given capacity in items.
pub fn work_queue(capacity: usize) -> (WorkSender, WorkReceiver) {
    let (tx, rx) = bounded(capacity);
    (
        WorkSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        WorkReceiver { rx },
    )
}

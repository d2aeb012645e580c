//! Transcription worker.
//!
//! Drains the work queue on a dedicated thread, runs each segment
//! through the speech engine, suppresses immediate repeats caused by
//! segment overlap, and hands accepted results to a consumer callback.

use crate::defaults;
use crate::queue::{WorkItem, WorkReceiver};
use crate::stt::SpeechEngine;
use crate::types::TranscriptionResult;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Callback invoked with each accepted transcription, on the worker
/// thread.
pub type ResultConsumer = Box<dyn FnMut(TranscriptionResult) + Send>;

/// Sliding window of recent transcripts used to suppress duplicates.
///
/// Comparison is case-insensitive and whitespace-trimmed: the lookahead
/// overlap between consecutive segments routinely produces the same
/// phrase twice with different capitalization.
pub struct RecentTextWindow {
    entries: VecDeque<String>,
    capacity: usize,
}

impl RecentTextWindow {
    /// Creates a window holding up to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }

    /// Returns true if `text` matches a recently accepted transcript.
    pub fn is_duplicate(&self, text: &str) -> bool {
        let normalized = Self::normalize(text);
        self.entries.iter().any(|e| *e == normalized)
    }

    /// Records an accepted transcript, evicting the oldest entry when
    /// the window is full.
    pub fn record(&mut self, text: &str) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Self::normalize(text));
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the window holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Background thread that turns queued segments into transcriptions.
pub struct TranscriptionWorker {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TranscriptionWorker {
    /// Spawns the worker thread.
    ///
    /// The worker runs until it receives [`WorkItem::Stop`] or
    /// [`stop`](TranscriptionWorker::stop) is called. Engine errors are
    /// logged and the segment skipped; the worker never dies on a bad
    /// segment.
    pub fn start(
        mut engine: Box<dyn SpeechEngine>,
        queue: WorkReceiver,
        mut consumer: ResultConsumer,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let thread = thread::spawn(move || {
            let poll = Duration::from_millis(defaults::WORKER_POLL_MS);
            let mut recent = RecentTextWindow::new(defaults::RECENT_TEXT_WINDOW);

            while thread_running.load(Ordering::SeqCst) {
                let item = match queue.pop(poll) {
                    Some(item) => item,
                    None => continue,
                };

                let segment = match item {
                    WorkItem::Segment(segment) => segment,
                    WorkItem::Stop => break,
                };

                let transcription = match engine.transcribe(&segment) {
                    Ok(t) => t,
                    Err(e) => {
                        eprintln!("transvox: transcription error: {}", e);
                        continue;
                    }
                };

                let text = transcription.text.trim();
                if text.is_empty() {
                    continue;
                }
                if recent.is_duplicate(text) {
                    continue;
                }
                recent.record(text);

                consumer(TranscriptionResult::new(
                    text.to_string(),
                    transcription.language,
                    transcription.confidence,
                ));
            }
            thread_running.store(false, Ordering::SeqCst);
        });

        Self {
            running,
            thread: Some(thread),
        }
    }

    /// Returns true while the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals the worker to stop and waits for the thread to exit.
    ///
    /// Prefer enqueueing [`WorkItem::Stop`] first so queued segments are
    /// observed; this flag bounds the wait to one poll interval.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                eprintln!("transvox: worker thread panicked");
            }
        }
    }

    /// Abandons the worker thread without joining.
    ///
    /// Last resort for a worker stuck inside a hung engine call; the
    /// thread exits on its own when (if) the call returns.
    pub fn detach(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            drop(thread);
        }
    }
}

impl Drop for TranscriptionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

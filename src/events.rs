//! Event model and the queue that merges all producers
//!
//! Three independently-timed producers feed the dashboard: the terminal
//! input thread, the broker poll worker, and (indirectly, via the
//! worker's poll call) the rebalance callback. Everything the renderer
//! reacts to is funnelled through one [`EventQueue`] as a closed set of
//! [`Event`] variants, so the render loop is a plain
//! dequeue-dispatch-draw cycle with no other synchronization.
//!
//! Ordering: events from a single producer are observed in enqueue
//! order. No ordering is guaranteed between producers beyond
//! enqueued-before-is-observed-before at the queue boundary.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use crossterm::event::KeyEvent;
use rdkafka::Timestamp;
use thiserror::Error;

/// Where a message timestamp came from.
///
/// Mirrors the broker's timestamp types: set by the producer at
/// creation, set by the broker on append, or not available at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// Producer-assigned creation time.
    CreateTime,
    /// Broker-assigned log-append time.
    LogAppendTime,
    /// The broker provided no timestamp.
    Unavailable,
}

impl TimestampSource {
    /// Short label for display next to a rendered timestamp.
    pub fn label(self) -> &'static str {
        match self {
            TimestampSource::CreateTime => "create",
            TimestampSource::LogAppendTime => "append",
            TimestampSource::Unavailable => "n/a",
        }
    }
}

/// A message consumed from the broker, with all buffers owned.
///
/// The poll worker copies key and payload out of the client's borrowed
/// message before enqueueing, because client-owned buffers are only
/// valid until the next poll call. From that point the message has a
/// single owner: it moves into the queue entry, then into the renderer,
/// which either converts it into long-lived storage or drops it.
#[derive(Debug, Clone)]
pub struct ConsumerMessage {
    /// Topic the message was read from.
    pub topic: String,
    /// Message key, if present.
    pub key: Option<Vec<u8>>,
    /// Message payload, if present.
    pub payload: Option<Vec<u8>>,
    /// Partition index.
    pub partition: i32,
    /// Offset within the partition (monotonic per partition).
    pub offset: i64,
    /// Millisecond timestamp, if the broker provided one.
    pub timestamp_ms: Option<i64>,
    /// Which clock produced `timestamp_ms`.
    pub timestamp_source: TimestampSource,
}

impl ConsumerMessage {
    /// Splits a broker timestamp into its millisecond value and source tag.
    pub fn split_timestamp(ts: Timestamp) -> (Option<i64>, TimestampSource) {
        match ts {
            Timestamp::CreateTime(ms) => (Some(ms), TimestampSource::CreateTime),
            Timestamp::LogAppendTime(ms) => (Some(ms), TimestampSource::LogAppendTime),
            Timestamp::NotAvailable => (None, TimestampSource::Unavailable),
        }
    }
}

/// Everything the render loop reacts to.
///
/// The variant set is fixed here; producers construct variants, the
/// renderer consumes each exactly once.
#[derive(Debug)]
pub enum Event {
    /// A keypress from the terminal input thread.
    KeyPress(KeyEvent),
    /// The terminal was resized to (width, height).
    Resize(u16, u16),
    /// The terminal regained focus.
    FocusIn,
    /// A message consumed by the poll worker. Ownership of the buffers
    /// transfers with the event.
    ConsumerMessage(ConsumerMessage),
    /// The poll worker hit a non-recoverable error and has exited.
    /// Carried to the renderer so the failure is shown instead of the
    /// message stream silently freezing.
    WorkerError(String),
}

/// Why an enqueue was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed by the shutdown path; no further events are
    /// accepted.
    #[error("event queue is closed")]
    Closed,
}

struct QueueState {
    events: VecDeque<Event>,
    closed: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,
    ready: Condvar,
}

/// Thread-safe FIFO merging all event producers.
///
/// Cloning is cheap and shares the underlying queue; producers hold
/// clones, the renderer holds one and is the only caller of
/// [`dequeue`](EventQueue::dequeue).
#[derive(Clone)]
pub struct EventQueue {
    inner: Arc<QueueInner>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Creates a new, open, empty queue.
    pub fn new() -> Self {
        EventQueue {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    events: VecDeque::new(),
                    closed: false,
                }),
                ready: Condvar::new(),
            }),
        }
    }

    /// Appends an event, waking the renderer if it is blocked.
    ///
    /// Callable from any thread; never blocks beyond lock acquisition.
    ///
    /// # Errors
    /// Returns [`QueueError::Closed`] once [`close`](EventQueue::close)
    /// has been called. Producers outside controlled shutdown should
    /// treat that as non-fatal (log and continue).
    pub fn enqueue(&self, event: Event) -> Result<(), QueueError> {
        let mut state = self.inner.state.lock().expect("event queue lock poisoned");
        if state.closed {
            return Err(QueueError::Closed);
        }
        state.events.push_back(event);
        drop(state);
        self.inner.ready.notify_one();
        Ok(())
    }

    /// Removes and returns the oldest event, blocking until one is
    /// available.
    ///
    /// Returns `None` once the queue has been closed and drained.
    /// Intended to be called only from the renderer thread; the wait
    /// parks on a condvar, there is no busy-waiting.
    pub fn dequeue(&self) -> Option<Event> {
        let mut state = self.inner.state.lock().expect("event queue lock poisoned");
        loop {
            if let Some(event) = state.events.pop_front() {
                return Some(event);
            }
            if state.closed {
                return None;
            }
            state = self
                .inner
                .ready
                .wait(state)
                .expect("event queue lock poisoned");
        }
    }

    /// Removes the oldest event without blocking.
    pub fn try_dequeue(&self) -> Option<Event> {
        self.inner
            .state
            .lock()
            .expect("event queue lock poisoned")
            .events
            .pop_front()
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        self.inner
            .state
            .lock()
            .expect("event queue lock poisoned")
            .events
            .len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the queue: subsequent enqueues fail and `dequeue` returns
    /// `None` once the remaining events are drained.
    ///
    /// Part of the shutdown path; wakes every blocked consumer.
    pub fn close(&self) {
        let mut state = self.inner.state.lock().expect("event queue lock poisoned");
        state.closed = true;
        drop(state);
        self.inner.ready.notify_all();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner
            .state
            .lock()
            .expect("event queue lock poisoned")
            .closed
    }
}

//! Terminal input source
//!
//! The third event producer: a thread that reads terminal events with
//! a bounded poll and posts the variants the dashboard reacts to
//! (key presses, resizes, focus-in) into the shared event queue. The
//! renderer itself never touches the terminal input stream; it only
//! ever sees the typed events this thread produces.
//!
//! Lifecycle mirrors the poll worker: cooperative cancellation via an
//! atomic flag checked each iteration, with shutdown latency bounded
//! by the input poll timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use tracing::{debug, error, warn};

use crate::events::{Event, EventQueue, QueueError};

/// Bounded wait per input poll. Also the stop latency bound.
const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Handle to the input-reading thread.
pub struct InputSource {
    queue: EventQueue,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputSource {
    /// Spawns the input thread, posting into `queue`.
    pub fn start(queue: EventQueue) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = cancel.clone();
        let thread_queue = queue.clone();
        let handle = thread::Builder::new()
            .name("kafkawatch-input".to_string())
            .spawn(move || run_input_loop(&thread_queue, &thread_cancel))
            .expect("failed to spawn input thread");

        InputSource {
            queue,
            cancel,
            handle: Some(handle),
        }
    }

    /// Posts an event into the queue on behalf of this source.
    ///
    /// Thread-safe; usable to inject synthetic input.
    pub fn post_event(&self, event: Event) -> Result<(), QueueError> {
        self.queue.enqueue(event)
    }

    /// Requests cancellation and joins the input thread.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("input thread panicked");
            }
        }
    }
}

impl Drop for InputSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_input_loop(queue: &EventQueue, cancel: &AtomicBool) {
    debug!("input thread started");
    while !cancel.load(Ordering::Relaxed) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => {
                let term_event = match event::read() {
                    Ok(ev) => ev,
                    Err(err) => {
                        warn!(error = %err, "failed to read terminal event");
                        continue;
                    }
                };
                let Some(event) = translate(term_event) else {
                    continue;
                };
                if queue.enqueue(event).is_err() {
                    debug!("event queue closed, input thread exiting");
                    return;
                }
            }
            Ok(false) => {
                // Poll timeout: no pending input.
            }
            Err(err) => {
                warn!(error = %err, "terminal event poll failed");
                // Avoid spinning if the terminal is gone; retry at the
                // normal cadence.
                thread::sleep(INPUT_POLL_TIMEOUT);
            }
        }
    }
    debug!("input thread cancelled");
}

/// Maps a raw terminal event onto the dashboard's event set.
///
/// Key releases and events outside the fixed variant set are dropped.
fn translate(event: TermEvent) -> Option<Event> {
    match event {
        TermEvent::Key(key) if key.kind != KeyEventKind::Release => Some(Event::KeyPress(key)),
        TermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        TermEvent::FocusGained => Some(Event::FocusIn),
        _ => None,
    }
}

//! Broker poll worker
//!
//! A background thread that repeatedly polls the consumer with a short
//! bounded timeout and pushes each received message into the event
//! queue as an owned [`ConsumerMessage`]. A poll timeout is a liveness
//! contract, not an error: an empty poll just loops. Transient poll
//! errors are logged and the loop continues at the same cadence;
//! non-recoverable errors surface to the renderer as a single
//! [`Event::WorkerError`] before the thread exits.
//!
//! Cancellation is cooperative: the worker checks an atomic flag once
//! per iteration, and because the poll timeout bounds each iteration,
//! [`PollWorker::stop`] returns within roughly one timeout period.
//! After the loop exits the worker performs no further enqueues.
//!
//! Polling goes through the [`MessageSource`] trait so tests can drive
//! the loop with a scripted source instead of a live broker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaError;
use rdkafka::message::BorrowedMessage;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::Message;
use tracing::{debug, error, warn};

use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::events::{ConsumerMessage, Event, EventQueue};
use crate::rebalance::{RebalanceState, WatchConsumerContext};

/// Poll timeout per worker iteration. Also the shutdown latency bound.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Source of consumed messages, polled with a bounded timeout.
///
/// Implemented by [`KafkaMessageSource`] for the live broker and by
/// scripted mocks in tests.
pub trait MessageSource: Send {
    /// Polls for the next message, waiting at most `timeout`.
    ///
    /// `Ok(None)` means the timeout elapsed with nothing to deliver.
    ///
    /// # Errors
    /// Transient errors (`WatchError::Poll`) let the loop continue;
    /// anything fatal ends the worker.
    fn poll_message(&self, timeout: Duration) -> Result<Option<ConsumerMessage>, WatchError>;
}

/// Creates the consumer, registers the rebalance context, and
/// subscribes to the configured topic.
///
/// The rebalance callback runs synchronously on whichever thread calls
/// `poll`; in this dashboard that is the poll worker's thread.
///
/// # Errors
/// `ClientCreation` if the client cannot be constructed,
/// `Subscription` if the topic subscription fails. Both are fatal at
/// startup.
pub fn connect(
    config: &WatchConfig,
    rebalance: Arc<RebalanceState>,
) -> Result<BaseConsumer<WatchConsumerContext>, WatchError> {
    let context = WatchConsumerContext::new(rebalance);
    let consumer: BaseConsumer<WatchConsumerContext> = config
        .client_config()
        .create_with_context(context)
        .map_err(WatchError::ClientCreation)?;

    consumer
        .subscribe(&[config.topic.as_str()])
        .map_err(|source| WatchError::Subscription {
            topic: config.topic.clone(),
            source,
        })?;

    Ok(consumer)
}

/// Live-broker message source.
///
/// Owns the consumer for the lifetime of the worker thread. Key and
/// payload buffers are copied out of the client's borrowed message
/// before the next poll invalidates them.
pub struct KafkaMessageSource {
    consumer: BaseConsumer<WatchConsumerContext>,
}

impl KafkaMessageSource {
    pub fn new(consumer: BaseConsumer<WatchConsumerContext>) -> Self {
        KafkaMessageSource { consumer }
    }
}

impl MessageSource for KafkaMessageSource {
    fn poll_message(&self, timeout: Duration) -> Result<Option<ConsumerMessage>, WatchError> {
        match self.consumer.poll(timeout) {
            None => Ok(None),
            Some(Ok(message)) => Ok(Some(detach_message(&message))),
            Some(Err(err)) => Err(classify_poll_error(err)),
        }
    }
}

/// Copies a borrowed client message into a fully owned one.
fn detach_message(message: &BorrowedMessage<'_>) -> ConsumerMessage {
    let (timestamp_ms, timestamp_source) = ConsumerMessage::split_timestamp(message.timestamp());
    ConsumerMessage {
        topic: message.topic().to_string(),
        key: message.key().map(<[u8]>::to_vec),
        payload: message.payload().map(<[u8]>::to_vec),
        partition: message.partition(),
        offset: message.offset(),
        timestamp_ms,
        timestamp_source,
    }
}

/// Maps a client poll error into the taxonomy: fatal error codes end
/// the worker, everything else is a transient `Poll`.
fn classify_poll_error(err: KafkaError) -> WatchError {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::Fatal) => WatchError::ConsumerFatal(err),
        _ => WatchError::Poll(err),
    }
}

/// Handle to the background poll thread.
pub struct PollWorker {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PollWorker {
    /// Spawns the poll loop over `source`, enqueueing into `queue`.
    pub fn spawn<S>(source: S, queue: EventQueue) -> Self
    where
        S: MessageSource + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name("kafkawatch-poll".to_string())
            .spawn(move || run_poll_loop(&source, &queue, &thread_cancel))
            .expect("failed to spawn poll worker thread");

        PollWorker {
            cancel,
            handle: Some(handle),
        }
    }

    /// Requests cancellation and joins the worker thread.
    ///
    /// Returns once the thread has exited; because every iteration is
    /// bounded by [`POLL_TIMEOUT`], that takes at most about one
    /// timeout period. After this returns, the worker performs no
    /// further enqueues or rebalance-state mutations.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("poll worker thread panicked");
            }
        }
    }
}

impl Drop for PollWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_poll_loop<S: MessageSource>(source: &S, queue: &EventQueue, cancel: &AtomicBool) {
    debug!("poll worker started");
    while !cancel.load(Ordering::Relaxed) {
        match source.poll_message(POLL_TIMEOUT) {
            Ok(Some(message)) => {
                debug!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    "message consumed"
                );
                if queue.enqueue(Event::ConsumerMessage(message)).is_err() {
                    // The queue only closes during controlled shutdown.
                    debug!("event queue closed, poll worker exiting");
                    return;
                }
            }
            Ok(None) => {
                // Poll timeout: nothing available this interval.
            }
            Err(err) if !err.is_fatal() => {
                warn!(error = %err, "transient poll error, continuing");
            }
            Err(err) => {
                error!(error = %err, "non-recoverable poll error, worker exiting");
                let _ = queue.enqueue(Event::WorkerError(error_chain(&err)));
                return;
            }
        }
    }
    debug!("poll worker cancelled");
}

/// Renders an error with its root cause for display in the UI.
fn error_chain(err: &WatchError) -> String {
    match std::error::Error::source(err) {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}

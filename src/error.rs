//! Error taxonomy for the dashboard core
//!
//! Distinguishes errors that abort startup (configuration, client
//! creation, subscription, initial metadata fetches) from errors the
//! poll worker survives (a single failed poll). The binary wraps these
//! in `anyhow` at the top level; the worker loop branches on
//! [`WatchError::is_fatal`].

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Errors produced by the consumer, poll worker, and metadata fetches.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The consumer configuration is invalid. Fatal at startup.
    #[error("invalid consumer configuration: {0}")]
    Configuration(String),

    /// The broker client could not be constructed. Fatal at startup.
    #[error("failed to create Kafka consumer")]
    ClientCreation(#[source] KafkaError),

    /// Subscribing to the topic failed. Without a subscription the
    /// worker has nothing to poll, so this is fatal.
    #[error("failed to subscribe to topic '{topic}'")]
    Subscription {
        topic: String,
        #[source]
        source: KafkaError,
    },

    /// A single poll call failed. Non-fatal: the worker logs it and
    /// keeps polling at the same cadence; the client manages its own
    /// reconnection.
    #[error("poll failed")]
    Poll(#[source] KafkaError),

    /// The client reported a fatal error code; the consumer cannot
    /// make further progress and the worker must exit.
    #[error("consumer entered a fatal state")]
    ConsumerFatal(#[source] KafkaError),

    /// Topic metadata could not be fetched. Fatal for the initial
    /// fetch, which the topic pane depends on.
    #[error("failed to fetch topic metadata")]
    Metadata(#[source] KafkaError),

    /// Consumer-group listing failed. Fatal for the initial fetch.
    #[error("failed to list consumer groups")]
    GroupList(#[source] KafkaError),

    /// An event was posted to a queue that has already been closed by
    /// the shutdown path.
    #[error("event queue is closed")]
    QueueClosed,
}

impl WatchError {
    /// Whether this error ends the worker loop.
    ///
    /// Only `Poll` is survivable per-iteration; everything else either
    /// prevents startup or invalidates the worker's ability to make
    /// progress.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WatchError::Poll(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_errors_are_transient() {
        let err = WatchError::Poll(KafkaError::NoMessageReceived);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_startup_errors_are_fatal() {
        assert!(WatchError::Configuration("bad".into()).is_fatal());
        assert!(WatchError::Subscription {
            topic: "orders".into(),
            source: KafkaError::Subscription("orders".into()),
        }
        .is_fatal());
        assert!(WatchError::QueueClosed.is_fatal());
    }
}

//! kafkawatch library
//!
//! Core functionality for the kafkawatch dashboard: the event queue
//! and event model, the broker poll worker, rebalance-state tracking,
//! and the renderer-owned application state.
//! Modules are exposed for integration testing.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod metadata;
pub mod rebalance;
pub mod ui;
pub mod utils;
pub mod worker;

// Re-export commonly used types for testing
pub use app::{AppState, StoredMessage, MESSAGE_RETENTION};
pub use config::{FileConfig, WatchConfig};
pub use error::WatchError;
pub use events::{ConsumerMessage, Event, EventQueue, QueueError, TimestampSource};
pub use input::InputSource;
pub use metadata::{GroupInfo, TopicInfo};
pub use rebalance::{GroupState, GroupStateInfo, RebalanceState, WatchConsumerContext};
pub use worker::{KafkaMessageSource, MessageSource, PollWorker, POLL_TIMEOUT};

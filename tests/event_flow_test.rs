//! Integration tests for the event-integration layer
//!
//! Exercises the full producer-to-renderer path through the public
//! surface: queue ordering under concurrency, ownership transfer of
//! consumed messages into application state, rebalance-callback state
//! transitions, and the shutdown contract of the poll worker.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rdkafka::consumer::{ConsumerContext, Rebalance};
use rdkafka::TopicPartitionList;

use kafkawatch::{
    AppState, ConsumerMessage, Event, EventQueue, GroupState, MessageSource, PollWorker,
    RebalanceState, TimestampSource, TopicInfo, WatchConsumerContext, WatchError,
    MESSAGE_RETENTION, POLL_TIMEOUT,
};

/// Delivers `limit` synthetic messages, one per poll, then idles.
struct SyntheticSource {
    next_offset: AtomicI64,
    limit: i64,
}

impl SyntheticSource {
    fn new(limit: i64) -> Self {
        SyntheticSource {
            next_offset: AtomicI64::new(0),
            limit,
        }
    }
}

impl MessageSource for SyntheticSource {
    fn poll_message(&self, timeout: Duration) -> Result<Option<ConsumerMessage>, WatchError> {
        let offset = self.next_offset.fetch_add(1, Ordering::Relaxed);
        if offset >= self.limit {
            thread::sleep(timeout);
            return Ok(None);
        }
        Ok(Some(ConsumerMessage {
            topic: "orders".to_string(),
            key: Some(b"k1".to_vec()),
            payload: Some(b"hello".to_vec()),
            partition: 2,
            offset,
            timestamp_ms: Some(1_700_000_000_000),
            timestamp_source: TimestampSource::CreateTime,
        }))
    }
}

fn dashboard_state() -> AppState {
    AppState::new(
        "orders".to_string(),
        "dashboard".to_string(),
        "localhost:9092".to_string(),
        vec![TopicInfo {
            name: "orders".to_string(),
            partitions: 4,
        }],
        Vec::new(),
    )
}

#[test]
fn test_fifo_order_survives_concurrent_producers() {
    let queue = EventQueue::new();
    let producers = 3;
    let per_producer = 200;

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = queue.clone();
            thread::spawn(move || {
                for offset in 0..per_producer {
                    queue
                        .enqueue(Event::ConsumerMessage(ConsumerMessage {
                            topic: format!("topic-{}", p),
                            key: None,
                            payload: None,
                            partition: p,
                            offset,
                            timestamp_ms: None,
                            timestamp_source: TimestampSource::Unavailable,
                        }))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut next = vec![0i64; producers as usize];
    let mut total = 0u64;
    while let Some(event) = queue.try_dequeue() {
        let Event::ConsumerMessage(msg) = event else {
            panic!("unexpected event variant");
        };
        assert_eq!(msg.offset, next[msg.partition as usize]);
        next[msg.partition as usize] += 1;
        total += 1;
    }
    assert_eq!(total, producers as u64 * per_producer as u64);
}

#[test]
fn test_thousand_messages_drain_to_baseline() {
    let queue = EventQueue::new();
    let mut worker = PollWorker::spawn(SyntheticSource::new(1000), queue.clone());
    let mut app = dashboard_state();

    // The renderer side: consume exactly the thousand events.
    for _ in 0..1000 {
        let event = queue.dequeue().expect("queue closed early");
        assert!(!app.handle_event(event));
    }
    worker.stop();

    // Every message was either retained in state or evicted; none
    // remain in flight.
    assert!(queue.is_empty());
    assert_eq!(app.stats.messages_consumed, 1000);
    assert_eq!(app.stats.messages_evicted, 0);
    assert_eq!(app.messages.get("orders").unwrap().len(), 1000);
}

#[test]
fn test_retention_accounts_for_every_message() {
    let total = (MESSAGE_RETENTION + 200) as i64;
    let queue = EventQueue::new();
    let mut worker = PollWorker::spawn(SyntheticSource::new(total), queue.clone());
    let mut app = dashboard_state();

    for _ in 0..total {
        let event = queue.dequeue().expect("queue closed early");
        app.handle_event(event);
    }
    worker.stop();

    let stored = app.messages.get("orders").unwrap().len() as u64;
    assert_eq!(stored, MESSAGE_RETENTION as u64);
    assert_eq!(stored + app.stats.messages_evicted, total as u64);
}

#[test]
fn test_raw_message_round_trip() {
    let queue = EventQueue::new();
    let mut worker = PollWorker::spawn(SyntheticSource::new(43), queue.clone());
    let mut app = dashboard_state();

    for _ in 0..43 {
        let event = queue.dequeue().expect("queue closed early");
        app.handle_event(event);
    }
    worker.stop();

    let stored = &app.messages.get("orders").unwrap()[42];
    assert_eq!(stored.topic, "orders");
    assert_eq!(stored.key.as_deref(), Some("k1"));
    assert_eq!(stored.payload, "hello");
    assert_eq!(stored.partition, 2);
    assert_eq!(stored.offset, 42);
    assert_eq!(stored.timestamp, "2023-11-14 22:13:20");
}

#[test]
fn test_shutdown_joins_within_poll_timeout() {
    let queue = EventQueue::new();
    let mut worker = PollWorker::spawn(SyntheticSource::new(0), queue.clone());
    thread::sleep(Duration::from_millis(30));

    let started = Instant::now();
    worker.stop();
    assert!(
        started.elapsed() < POLL_TIMEOUT + Duration::from_millis(250),
        "join exceeded the shutdown latency bound"
    );

    // Post-join freeze: no further enqueues.
    let frozen = queue.len();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(queue.len(), frozen);
}

#[test]
fn test_rebalance_callback_drives_state_machine() {
    let rebalance = Arc::new(RebalanceState::new());
    let context = WatchConsumerContext::new(rebalance.clone());
    rebalance.update(GroupState::Stable);

    let assignment = TopicPartitionList::new();

    // Assign phase as the client would deliver it around a poll call.
    context.pre_rebalance(&Rebalance::Assign(&assignment));
    let mid = rebalance.snapshot();
    assert!(mid.is_rebalancing);
    assert_eq!(mid.state, GroupState::Assigning);
    assert_eq!(mid.state.as_str(), "Rebalancing - Assigning");
    let first_stamp = mid.last_rebalance.expect("rebalance must be stamped");

    context.post_rebalance(&Rebalance::Assign(&assignment));
    let done = rebalance.snapshot();
    assert!(!done.is_rebalancing);
    assert_eq!(done.state, GroupState::Stable);
    assert!(done.last_rebalance.unwrap() >= first_stamp);
}

#[test]
fn test_revoke_keeps_group_rebalancing_until_reassignment() {
    let rebalance = Arc::new(RebalanceState::new());
    let context = WatchConsumerContext::new(rebalance.clone());
    rebalance.update(GroupState::Stable);

    let assignment = TopicPartitionList::new();
    context.pre_rebalance(&Rebalance::Revoke(&assignment));
    context.post_rebalance(&Rebalance::Revoke(&assignment));
    assert!(rebalance.snapshot().is_rebalancing);

    context.pre_rebalance(&Rebalance::Assign(&assignment));
    context.post_rebalance(&Rebalance::Assign(&assignment));
    let done = rebalance.snapshot();
    assert!(!done.is_rebalancing);
    assert_eq!(done.state, GroupState::Stable);
}

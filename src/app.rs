//! Application state owned by the render loop
//!
//! [`AppState`] is mutated only by the renderer thread, one event at a
//! time: the render loop dequeues an [`Event`], applies it here, then
//! redraws. Nothing in this module takes a lock or blocks.
//!
//! Consumed messages transfer ownership on arrival: `handle_event`
//! either converts the [`ConsumerMessage`] into a [`StoredMessage`] in
//! the per-topic history (retain) or lets it drop at the end of the
//! match arm (release); every message takes exactly one of the two
//! paths.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;

use crate::events::{ConsumerMessage, Event, TimestampSource};
use crate::metadata::{GroupInfo, TopicInfo};
use crate::rebalance::{GroupState, GroupStateInfo};
use crate::utils::formatting::{format_timestamp, render_key, render_payload};

/// Maximum stored messages per topic; oldest are evicted beyond this.
pub const MESSAGE_RETENTION: usize = 1000;

/// Maximum retained error-log entries.
const ERROR_LOG_CAPACITY: usize = 100;

/// A consumed message duplicated into renderer-owned storage.
///
/// Holds decoded display fields only; the original message's buffers
/// are consumed during conversion.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Topic the message came from
    pub topic: String,
    /// Decoded key, if present
    pub key: Option<String>,
    /// Rendered payload (text, pretty JSON, or a binary placeholder)
    pub payload: String,
    /// Raw payload size in bytes
    pub payload_bytes: usize,
    /// Partition index
    pub partition: i32,
    /// Offset within the partition
    pub offset: i64,
    /// UTC calendar rendering of the broker timestamp
    pub timestamp: String,
    /// Which clock produced the timestamp
    pub timestamp_source: TimestampSource,
}

impl StoredMessage {
    /// Converts an owned consumer message into display storage,
    /// consuming it.
    pub fn from_consumer(message: ConsumerMessage) -> Self {
        StoredMessage {
            key: render_key(message.key.as_deref()),
            payload: render_payload(message.payload.as_deref()),
            payload_bytes: message.payload.as_ref().map_or(0, Vec::len),
            timestamp: format_timestamp(message.timestamp_ms),
            timestamp_source: message.timestamp_source,
            topic: message.topic,
            partition: message.partition,
            offset: message.offset,
        }
    }
}

/// Which pane has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// Topic list (left)
    Topics,
    /// Message stream (right)
    Messages,
}

/// Running consumption counters shown in the header.
#[derive(Debug, Default)]
pub struct ConsumeStats {
    /// Messages stored since startup
    pub messages_consumed: u64,
    /// Payload bytes stored since startup
    pub bytes_consumed: u64,
    /// Messages evicted by the retention cap
    pub messages_evicted: u64,
}

/// Mutable application state, single-threaded by construction.
pub struct AppState {
    /// Subscribed topic
    pub topic_name: String,
    /// Consumer group this dashboard polls as
    pub group_id: String,
    /// Broker address for the header
    pub broker_address: String,
    /// Topic snapshots from the startup metadata fetch
    pub topics: Vec<TopicInfo>,
    /// Consumer-group snapshots from the startup listing
    pub groups: Vec<GroupInfo>,
    /// Per-topic message history, newest at the back
    pub messages: HashMap<String, VecDeque<StoredMessage>>,
    /// Pane with keyboard focus
    pub focus: Pane,
    /// Selection cursor for the topic list
    pub topic_list_state: ListState,
    /// Selection cursor for the message list
    pub message_list_state: ListState,
    /// Latest rebalance snapshot, refreshed by the render loop
    pub group_state: GroupStateInfo,
    /// Recent errors, newest at the back
    pub error_log: VecDeque<(DateTime<Utc>, String)>,
    /// Whether the error panel is visible
    pub show_errors: bool,
    /// Set once the poll worker has reported a fatal error
    pub worker_failed: bool,
    /// Consumption counters
    pub stats: ConsumeStats,
}

impl AppState {
    /// Creates the initial state around the startup snapshots.
    ///
    /// The topic cursor starts on the subscribed topic so the message
    /// pane shows the live stream immediately.
    pub fn new(
        topic_name: String,
        group_id: String,
        broker_address: String,
        topics: Vec<TopicInfo>,
        groups: Vec<GroupInfo>,
    ) -> Self {
        let mut topic_list_state = ListState::default();
        let initial = topics
            .iter()
            .position(|t| t.name == topic_name)
            .unwrap_or(0);
        if !topics.is_empty() {
            topic_list_state.select(Some(initial));
        }

        AppState {
            topic_name,
            group_id,
            broker_address,
            topics,
            groups,
            messages: HashMap::new(),
            focus: Pane::Messages,
            topic_list_state,
            message_list_state: ListState::default(),
            group_state: GroupStateInfo {
                is_rebalancing: false,
                last_rebalance: None,
                state: GroupState::Unknown,
            },
            error_log: VecDeque::with_capacity(ERROR_LOG_CAPACITY),
            show_errors: false,
            worker_failed: false,
            stats: ConsumeStats::default(),
        }
    }

    /// Applies one event; returns `true` when the user requested quit.
    ///
    /// Called exactly once per dequeued event, synchronously, before
    /// the next dequeue. Never blocks: consumed messages arrive fully
    /// materialized.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::KeyPress(key) => return self.handle_key(key),
            Event::Resize(_, _) | Event::FocusIn => {
                // Layout is recomputed by the full redraw that follows
                // every event.
            }
            Event::ConsumerMessage(message) => self.store_message(message),
            Event::WorkerError(text) => {
                self.worker_failed = true;
                self.show_errors = true;
                self.log_error(format!("consumer stopped: {}", text));
            }
        }
        false
    }

    /// Name of the topic currently under the cursor.
    pub fn selected_topic(&self) -> Option<&str> {
        let index = self.topic_list_state.selected()?;
        self.topics.get(index).map(|t| t.name.as_str())
    }

    /// Message history for the topic under the cursor.
    pub fn current_messages(&self) -> Option<&VecDeque<StoredMessage>> {
        self.messages.get(self.selected_topic()?)
    }

    /// Appends an error to the log, evicting the oldest past capacity.
    pub fn log_error(&mut self, error: String) {
        if self.error_log.len() >= ERROR_LOG_CAPACITY {
            self.error_log.pop_front();
        }
        self.error_log.push_back((Utc::now(), error));
    }

    /// Moves a consumed message into the per-topic history.
    ///
    /// When the cursor was on the tail of the visible list it follows
    /// the new message, so an idle dashboard tracks the live stream.
    fn store_message(&mut self, message: ConsumerMessage) {
        let selected_topic_matches = self.selected_topic() == Some(message.topic.as_str());

        self.stats.messages_consumed += 1;
        self.stats.bytes_consumed += message.payload.as_ref().map_or(0, Vec::len) as u64;

        let stored = StoredMessage::from_consumer(message);
        let history = self.messages.entry(stored.topic.clone()).or_default();
        history.push_back(stored);

        let mut evicted = 0usize;
        while history.len() > MESSAGE_RETENTION {
            history.pop_front();
            evicted += 1;
        }
        self.stats.messages_evicted += evicted as u64;
        let len = history.len();

        if selected_topic_matches {
            let selected = self.message_list_state.selected();
            // History length before this message arrived.
            let previous_len = len + evicted - 1;
            let at_tail = selected.map_or(true, |index| index + 1 >= previous_len);
            if at_tail {
                self.message_list_state.select(Some(len - 1));
            } else if evicted > 0 {
                // Keep the cursor on the same message as the window slides.
                let index = selected.unwrap_or(0).saturating_sub(evicted);
                self.message_list_state.select(Some(index));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Pane::Topics => Pane::Messages,
                    Pane::Messages => Pane::Topics,
                };
            }
            KeyCode::Char('e') => self.show_errors = !self.show_errors,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Home => self.jump_selection(false),
            KeyCode::End | KeyCode::Char('G') => self.jump_selection(true),
            _ => {}
        }
        false
    }

    fn move_selection(&mut self, delta: i64) {
        let (state, len) = match self.focus {
            Pane::Topics => (&mut self.topic_list_state, self.topics.len()),
            Pane::Messages => {
                let len = self.current_messages().map_or(0, VecDeque::len);
                (&mut self.message_list_state, len)
            }
        };
        if len == 0 {
            return;
        }

        let current = state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, len as i64 - 1);
        state.select(Some(next as usize));

        if self.focus == Pane::Topics {
            // Changing topic shows a different history; restart its cursor.
            self.message_list_state = ListState::default();
        }
    }

    fn jump_selection(&mut self, to_end: bool) {
        let (state, len) = match self.focus {
            Pane::Topics => (&mut self.topic_list_state, self.topics.len()),
            Pane::Messages => {
                let len = self.current_messages().map_or(0, VecDeque::len);
                (&mut self.message_list_state, len)
            }
        };
        if len == 0 {
            return;
        }
        state.select(Some(if to_end { len - 1 } else { 0 }));

        if self.focus == Pane::Topics {
            // Changing topic shows a different history; restart its cursor.
            self.message_list_state = ListState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_topic(topic: &str) -> AppState {
        AppState::new(
            topic.to_string(),
            "dashboard".to_string(),
            "localhost:9092".to_string(),
            vec![TopicInfo {
                name: topic.to_string(),
                partitions: 4,
            }],
            Vec::new(),
        )
    }

    fn message(topic: &str, offset: i64) -> ConsumerMessage {
        ConsumerMessage {
            topic: topic.to_string(),
            key: Some(b"k1".to_vec()),
            payload: Some(b"hello".to_vec()),
            partition: 2,
            offset,
            timestamp_ms: Some(1_700_000_000_000),
            timestamp_source: TimestampSource::CreateTime,
        }
    }

    #[test]
    fn test_stored_message_round_trip() {
        let stored = StoredMessage::from_consumer(message("orders", 42));
        assert_eq!(stored.topic, "orders");
        assert_eq!(stored.key.as_deref(), Some("k1"));
        assert_eq!(stored.payload, "hello");
        assert_eq!(stored.partition, 2);
        assert_eq!(stored.offset, 42);
        assert_eq!(stored.timestamp, "2023-11-14 22:13:20");
        assert_eq!(stored.timestamp_source, TimestampSource::CreateTime);
    }

    #[test]
    fn test_consumer_message_is_stored_and_counted() {
        let mut app = state_with_topic("orders");
        assert!(!app.handle_event(Event::ConsumerMessage(message("orders", 1))));

        let history = app.messages.get("orders").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(app.stats.messages_consumed, 1);
        assert_eq!(app.stats.bytes_consumed, 5);
    }

    #[test]
    fn test_retention_cap_evicts_oldest() {
        let mut app = state_with_topic("orders");
        let total = MESSAGE_RETENTION as i64 + 50;
        for offset in 0..total {
            app.handle_event(Event::ConsumerMessage(message("orders", offset)));
        }

        let history = app.messages.get("orders").unwrap();
        assert_eq!(history.len(), MESSAGE_RETENTION);
        assert_eq!(history.front().unwrap().offset, 50);
        assert_eq!(history.back().unwrap().offset, total - 1);
        assert_eq!(app.stats.messages_evicted, 50);
        assert_eq!(app.stats.messages_consumed, total as u64);
    }

    #[test]
    fn test_cursor_follows_tail() {
        let mut app = state_with_topic("orders");
        for offset in 0..5 {
            app.handle_event(Event::ConsumerMessage(message("orders", offset)));
        }
        assert_eq!(app.message_list_state.selected(), Some(4));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = state_with_topic("orders");
        assert!(app.handle_event(Event::KeyPress(KeyEvent::from(KeyCode::Char('q')))));
        assert!(app.handle_event(Event::KeyPress(KeyEvent::from(KeyCode::Esc))));
        assert!(app.handle_event(Event::KeyPress(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        ))));
        assert!(!app.handle_event(Event::KeyPress(KeyEvent::from(KeyCode::Tab))));
    }

    #[test]
    fn test_worker_error_lands_in_error_log() {
        let mut app = state_with_topic("orders");
        assert!(!app.handle_event(Event::WorkerError("broker unreachable".to_string())));
        assert!(app.worker_failed);
        assert!(app.show_errors);
        assert_eq!(app.error_log.len(), 1);
        assert!(app.error_log[0].1.contains("broker unreachable"));
    }

    #[test]
    fn test_tab_switches_focus() {
        let mut app = state_with_topic("orders");
        assert_eq!(app.focus, Pane::Messages);
        app.handle_event(Event::KeyPress(KeyEvent::from(KeyCode::Tab)));
        assert_eq!(app.focus, Pane::Topics);
    }

    #[test]
    fn test_selection_clamps_to_bounds() {
        let mut app = state_with_topic("orders");
        app.focus = Pane::Topics;
        app.handle_event(Event::KeyPress(KeyEvent::from(KeyCode::Up)));
        assert_eq!(app.topic_list_state.selected(), Some(0));
        app.handle_event(Event::KeyPress(KeyEvent::from(KeyCode::Down)));
        assert_eq!(app.topic_list_state.selected(), Some(0));
    }

    #[test]
    fn test_topic_jump_resets_message_cursor() {
        let mut app = AppState::new(
            "orders".to_string(),
            "dashboard".to_string(),
            "localhost:9092".to_string(),
            vec![
                TopicInfo {
                    name: "orders".to_string(),
                    partitions: 4,
                },
                TopicInfo {
                    name: "payments".to_string(),
                    partitions: 2,
                },
            ],
            Vec::new(),
        );
        for offset in 0..5 {
            app.handle_event(Event::ConsumerMessage(message("orders", offset)));
        }
        assert_eq!(app.message_list_state.selected(), Some(4));

        // Jumping to another topic must not carry the old cursor over.
        app.focus = Pane::Topics;
        app.handle_event(Event::KeyPress(KeyEvent::from(KeyCode::End)));
        assert_eq!(app.topic_list_state.selected(), Some(1));
        assert_eq!(app.message_list_state.selected(), None);
    }

    #[test]
    fn test_error_log_capped() {
        let mut app = state_with_topic("orders");
        for i in 0..150 {
            app.log_error(format!("error {}", i));
        }
        assert_eq!(app.error_log.len(), 100);
        assert!(app.error_log.back().unwrap().1.contains("149"));
    }
}

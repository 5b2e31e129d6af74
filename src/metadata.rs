//! Topic and consumer-group metadata snapshots
//!
//! Fetched once at startup from the broker's metadata and group-listing
//! interfaces, with bounded timeouts. The resulting records are plain
//! owned values: read-only after construction, owned by whoever asked
//! for them, and copied rather than shared across threads.

use std::time::Duration;

use rdkafka::consumer::{BaseConsumer, Consumer, ConsumerContext};

use crate::error::WatchError;

/// Snapshot of one topic's metadata.
#[derive(Debug, Clone)]
pub struct TopicInfo {
    /// Topic name
    pub name: String,
    /// Number of partitions
    pub partitions: usize,
}

/// Snapshot of one consumer group as reported by the broker.
#[derive(Debug, Clone)]
pub struct GroupInfo {
    /// Group name
    pub name: String,
    /// Broker-reported group state (e.g., "Stable")
    pub state: String,
    /// Partition-assignment protocol in use
    pub protocol: String,
    /// Number of members currently in the group
    pub members: usize,
}

/// Fetches all topics with their partition counts.
///
/// Internal topics (prefixed with "__") are filtered out and the
/// result is sorted by name.
///
/// # Errors
/// `Metadata` if the fetch fails; fatal for the startup fetch the
/// topic pane depends on.
pub fn fetch_topics<C: ConsumerContext>(
    consumer: &BaseConsumer<C>,
    timeout: Duration,
) -> Result<Vec<TopicInfo>, WatchError> {
    let metadata = consumer
        .fetch_metadata(None, timeout)
        .map_err(WatchError::Metadata)?;

    let mut topics: Vec<TopicInfo> = metadata
        .topics()
        .iter()
        .filter(|topic| !topic.name().starts_with("__"))
        .map(|topic| TopicInfo {
            name: topic.name().to_string(),
            partitions: topic.partitions().len(),
        })
        .collect();

    topics.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(topics)
}

/// Fetches all consumer groups known to the broker.
///
/// # Errors
/// `GroupList` if the listing fails; fatal for the startup fetch.
pub fn fetch_groups<C: ConsumerContext>(
    consumer: &BaseConsumer<C>,
    timeout: Duration,
) -> Result<Vec<GroupInfo>, WatchError> {
    let group_list = consumer
        .fetch_group_list(None, timeout)
        .map_err(WatchError::GroupList)?;

    let mut groups: Vec<GroupInfo> = group_list
        .groups()
        .iter()
        .map(|group| GroupInfo {
            name: group.name().to_string(),
            state: group.state().to_string(),
            protocol: group.protocol().to_string(),
            members: group.members().len(),
        })
        .collect();

    groups.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(groups)
}

//! Registry of known topic-level configuration keys
//!
//! Used only to seed tab completion for the `config` command. The list is
//! deliberately not used for validation: unknown keys are forwarded to the
//! broker, which is the authority on what it accepts.

use std::sync::OnceLock;

static TOPIC_KEYS: OnceLock<Vec<&'static str>> = OnceLock::new();

/// Topic configuration keys recognized by Apache Kafka brokers, sorted.
/// Computed once and cached for the process lifetime.
pub fn topic_config_keys() -> &'static [&'static str] {
    TOPIC_KEYS
        .get_or_init(|| {
            let mut keys = vec![
                "cleanup.policy",
                "compression.type",
                "delete.retention.ms",
                "file.delete.delay.ms",
                "flush.messages",
                "flush.ms",
                "follower.replication.throttled.replicas",
                "index.interval.bytes",
                "leader.replication.throttled.replicas",
                "local.retention.bytes",
                "local.retention.ms",
                "max.compaction.lag.ms",
                "max.message.bytes",
                "message.downconversion.enable",
                "message.timestamp.difference.max.ms",
                "message.timestamp.type",
                "min.cleanable.dirty.ratio",
                "min.compaction.lag.ms",
                "min.insync.replicas",
                "preallocate",
                "remote.storage.enable",
                "retention.bytes",
                "retention.ms",
                "segment.bytes",
                "segment.index.bytes",
                "segment.jitter.ms",
                "segment.ms",
                "unclean.leader.election.enable",
            ];
            keys.sort_unstable();
            keys
        })
        .as_slice()
}

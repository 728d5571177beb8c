//! Broker client seam
//!
//! The shell never talks the wire protocol itself; everything goes through
//! the [`BrokerAdmin`] trait (metadata, topic CRUD, config describe/alter,
//! consumer groups) and, for the `consume` command, the [`MessageSource`]
//! trait. The production implementation wraps `rdkafka` (see
//! `admin_kafka.rs`); tests use the in-memory mock from `crate::testing`.
//!
//! All types here are plain data so command code and tests stay independent
//! of the client library's own structs.

use std::time::Duration;

use crate::Result;

/// A topic name as returned by a metadata listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicListing {
    pub name: String,
}

/// A consumer group id with its state, when the broker reports one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListing {
    pub id: String,
    pub state: Option<String>,
}

/// One broker node in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
    pub rack: Option<String>,
}

/// Result of a cluster describe. Controller id and authorized operations are
/// optional: not every client library (or broker ACL setup) reports them.
#[derive(Debug, Clone, Default)]
pub struct ClusterInfo {
    pub cluster_id: Option<String>,
    pub controller_id: Option<i32>,
    /// ACL operation codes the caller is authorized for, when reported
    pub authorized_operations: Option<Vec<i8>>,
    pub nodes: Vec<NodeInfo>,
}

/// One member of a consumer group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub consumer_id: String,
    pub host: String,
    /// Static membership id; groups without static members have none
    pub group_instance_id: Option<String>,
}

/// Result of a consumer group describe
#[derive(Debug, Clone)]
pub struct GroupInfo {
    pub id: String,
    pub state: String,
    pub partition_assignor: String,
    pub members: Vec<GroupMember>,
}

/// Result of a topic describe
#[derive(Debug, Clone)]
pub struct TopicInfo {
    pub name: String,
    pub partitions: usize,
}

/// One configuration entry of a topic or broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntryInfo {
    pub name: String,
    /// Broker-side nulls stay `None` and print as `null`
    pub value: Option<String>,
    /// True when the entry is a dynamic override rather than a default or
    /// static setting; only dynamic entries survive an alter round trip
    pub is_dynamic: bool,
}

/// The kind of resource a config describe/alter addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Topic,
    Broker,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Topic => write!(f, "topic"),
            ResourceKind::Broker => write!(f, "broker"),
        }
    }
}

/// A (kind, name) pair identifying a topic or broker for config operations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl ConfigResourceRef {
    pub fn topic(name: impl Into<String>) -> Self {
        Self { kind: ResourceKind::Topic, name: name.into() }
    }

    pub fn broker(name: impl Into<String>) -> Self {
        Self { kind: ResourceKind::Broker, name: name.into() }
    }
}

/// One incremental configuration change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOp {
    Set { key: String, value: String },
    Delete { key: String },
    Append { key: String, value: String },
    Subtract { key: String, value: String },
}

impl ConfigOp {
    pub fn key(&self) -> &str {
        match self {
            ConfigOp::Set { key, .. }
            | ConfigOp::Delete { key }
            | ConfigOp::Append { key, .. }
            | ConfigOp::Subtract { key, .. } => key,
        }
    }
}

/// Where a newly opened consumer should start reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOffset {
    Beginning,
    Latest,
    At(i64),
}

/// Parameters for opening a consumer
#[derive(Debug, Clone)]
pub struct ConsumeRequest {
    pub topic: String,
    /// Consumer group id; a random one is generated when absent
    pub group: Option<String>,
    /// Seek applied to newly assigned partitions; broker default when absent
    pub start: Option<StartOffset>,
}

/// A record delivered by a [`MessageSource`] poll
#[derive(Debug, Clone, Default)]
pub struct PolledRecord {
    pub partition: i32,
    pub offset: i64,
    pub timestamp_ms: Option<i64>,
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
    pub headers: Vec<(String, Option<Vec<u8>>)>,
}

/// A subscribed consumer delivering one record per poll. Dropping the source
/// closes the underlying consumer.
pub trait MessageSource {
    /// Wait up to `timeout` for the next record. `Ok(None)` means the
    /// timeout elapsed with nothing to deliver; `Err` is a per-record or
    /// transport error (the `skipErrors` option decides whether it aborts).
    fn poll(&mut self, timeout: Duration) -> Result<Option<PolledRecord>>;
}

/// Synchronous facade over the broker admin and consumer APIs.
///
/// Every call blocks until the underlying request resolves; no timeouts
/// beyond the client library's own are applied.
pub trait BrokerAdmin: Send + Sync {
    fn list_topics(&self) -> Result<Vec<TopicListing>>;
    fn list_groups(&self) -> Result<Vec<GroupListing>>;
    fn describe_topic(&self, name: &str) -> Result<TopicInfo>;
    fn describe_group(&self, id: &str) -> Result<GroupInfo>;
    fn describe_cluster(&self) -> Result<ClusterInfo>;
    fn describe_configs(&self, resource: &ConfigResourceRef) -> Result<Vec<ConfigEntryInfo>>;
    /// Apply every listed op to the resource in a single alter request
    fn alter_configs(&self, resource: &ConfigResourceRef, ops: &[ConfigOp]) -> Result<()>;
    fn create_topic(&self, name: &str, partitions: i32, replication: i32) -> Result<()>;
    fn delete_topic(&self, name: &str) -> Result<()>;
    fn delete_group(&self, id: &str) -> Result<()>;
    fn open_consumer(&self, request: &ConsumeRequest) -> Result<Box<dyn MessageSource>>;

    /// Release the client handle. Called exactly once at shutdown.
    fn close(&self) {}
}

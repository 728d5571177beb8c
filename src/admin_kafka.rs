//! rdkafka-backed implementation of [`BrokerAdmin`]
//!
//! Wraps an `AdminClient` for topic/config operations and a metadata
//! `BaseConsumer` for listings and describes. The admin API is async, so a
//! small current-thread runtime drives its futures to completion; every
//! trait method stays blocking.
//!
//! Not everything the trait models is reachable through librdkafka: the
//! controller id, broker racks and static group member ids are not exposed,
//! so those fields stay `None` here. Config alters are submitted through the
//! legacy alter call, rebuilt from the resource's current dynamic entries so
//! untouched overrides survive.

use std::collections::BTreeMap;
use std::time::Duration;

use rdkafka::admin::{
    AdminClient, AdminOptions, AlterConfig, ConfigSource, NewTopic, OwnedResourceSpecifier,
    ResourceSpecifier, TopicReplication,
};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::message::{Headers, Message};
use rdkafka::{Offset, TopicPartitionList};
use tracing::debug;
use uuid::Uuid;

use crate::admin::{
    BrokerAdmin, ClusterInfo, ConfigEntryInfo, ConfigOp, ConfigResourceRef, ConsumeRequest,
    GroupInfo, GroupListing, GroupMember, MessageSource, NodeInfo, PolledRecord, ResourceKind,
    StartOffset, TopicInfo, TopicListing,
};
use crate::profile::Properties;
use crate::{Result, ShellError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Broker admin over rdkafka clients built from profile properties
pub struct KafkaAdmin {
    admin: AdminClient<DefaultClientContext>,
    metadata: BaseConsumer,
    properties: Properties,
    runtime: tokio::runtime::Runtime,
}

impl KafkaAdmin {
    /// Build the admin and metadata clients and verify the bootstrap
    /// connection with an initial metadata fetch.
    pub fn connect(properties: &Properties) -> Result<Self> {
        let config = client_config(properties);
        let admin: AdminClient<DefaultClientContext> =
            config.create().map_err(ShellError::admin)?;

        let mut meta_config = client_config(properties);
        meta_config.set("group.id", format!("kshell-meta-{}", Uuid::new_v4()));
        let metadata: BaseConsumer = meta_config.create().map_err(ShellError::admin)?;

        metadata
            .fetch_metadata(None, REQUEST_TIMEOUT)
            .map_err(ShellError::admin)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self { admin, metadata, properties: properties.clone(), runtime })
    }

    fn options(&self) -> AdminOptions {
        AdminOptions::new().operation_timeout(Some(REQUEST_TIMEOUT))
    }
}

fn client_config(properties: &Properties) -> ClientConfig {
    let mut config = ClientConfig::new();
    for (key, value) in properties {
        config.set(key, value);
    }
    config
}

fn broker_id(name: &str) -> Result<i32> {
    name.parse()
        .map_err(|_| ShellError::Admin(format!("invalid broker id '{name}'")))
}

impl BrokerAdmin for KafkaAdmin {
    fn list_topics(&self) -> Result<Vec<TopicListing>> {
        let metadata = self
            .metadata
            .fetch_metadata(None, REQUEST_TIMEOUT)
            .map_err(ShellError::admin)?;
        Ok(metadata
            .topics()
            .iter()
            .filter(|t| !t.name().starts_with("__"))
            .map(|t| TopicListing { name: t.name().to_string() })
            .collect())
    }

    fn list_groups(&self) -> Result<Vec<GroupListing>> {
        let groups = self
            .metadata
            .fetch_group_list(None, REQUEST_TIMEOUT)
            .map_err(ShellError::admin)?;
        Ok(groups
            .groups()
            .iter()
            .map(|g| GroupListing {
                id: g.name().to_string(),
                state: Some(g.state().to_string()).filter(|s| !s.is_empty()),
            })
            .collect())
    }

    fn describe_topic(&self, name: &str) -> Result<TopicInfo> {
        let metadata = self
            .metadata
            .fetch_metadata(Some(name), REQUEST_TIMEOUT)
            .map_err(ShellError::admin)?;
        let topic = metadata
            .topics()
            .iter()
            .find(|t| t.name() == name)
            .filter(|t| !t.partitions().is_empty())
            .ok_or_else(|| ShellError::Admin(format!("Unknown topic '{name}'")))?;
        Ok(TopicInfo { name: name.to_string(), partitions: topic.partitions().len() })
    }

    fn describe_group(&self, id: &str) -> Result<GroupInfo> {
        let groups = self
            .metadata
            .fetch_group_list(Some(id), REQUEST_TIMEOUT)
            .map_err(ShellError::admin)?;
        let group = groups
            .groups()
            .iter()
            .find(|g| g.name() == id)
            .ok_or_else(|| ShellError::Admin(format!("Unknown group '{id}'")))?;
        Ok(GroupInfo {
            id: group.name().to_string(),
            state: group.state().to_string(),
            partition_assignor: group.protocol().to_string(),
            members: group
                .members()
                .iter()
                .map(|m| GroupMember {
                    consumer_id: m.id().to_string(),
                    host: m.client_host().to_string(),
                    group_instance_id: None,
                })
                .collect(),
        })
    }

    fn describe_cluster(&self) -> Result<ClusterInfo> {
        let metadata = self
            .metadata
            .fetch_metadata(None, REQUEST_TIMEOUT)
            .map_err(ShellError::admin)?;
        let cluster_id = self.metadata.client().fetch_cluster_id(REQUEST_TIMEOUT);
        Ok(ClusterInfo {
            cluster_id,
            controller_id: None,
            authorized_operations: None,
            nodes: metadata
                .brokers()
                .iter()
                .map(|b| NodeInfo {
                    id: b.id(),
                    host: b.host().to_string(),
                    port: b.port(),
                    rack: None,
                })
                .collect(),
        })
    }

    fn describe_configs(&self, resource: &ConfigResourceRef) -> Result<Vec<ConfigEntryInfo>> {
        let specifier = match resource.kind {
            ResourceKind::Topic => ResourceSpecifier::Topic(&resource.name),
            ResourceKind::Broker => ResourceSpecifier::Broker(broker_id(&resource.name)?),
        };
        let results = self
            .runtime
            .block_on(self.admin.describe_configs([&specifier], &self.options()))
            .map_err(ShellError::admin)?;
        let config = results
            .into_iter()
            .next()
            .ok_or_else(|| {
                ShellError::Admin(format!("no config returned for {} '{}'", resource.kind, resource.name))
            })?
            .map_err(ShellError::admin)?;

        debug!(kind = %resource.kind, name = %resource.name, entries = config.entries.len(), "described configs");
        Ok(config
            .entries
            .into_iter()
            .map(|e| ConfigEntryInfo {
                name: e.name,
                value: e.value,
                is_dynamic: matches!(
                    e.source,
                    ConfigSource::DynamicTopic
                        | ConfigSource::DynamicBroker
                        | ConfigSource::DynamicDefaultBroker
                ),
            })
            .collect())
    }

    fn alter_configs(&self, resource: &ConfigResourceRef, ops: &[ConfigOp]) -> Result<()> {
        let current = self.describe_configs(resource)?;

        // Legacy alter replaces the whole dynamic config set, so start from
        // the existing dynamic overrides and apply the ops on top.
        let mut desired: BTreeMap<String, String> = current
            .iter()
            .filter(|e| e.is_dynamic)
            .filter_map(|e| e.value.clone().map(|v| (e.name.clone(), v)))
            .collect();

        let effective = |key: &str| -> Option<String> {
            current
                .iter()
                .find(|e| e.name == key)
                .and_then(|e| e.value.clone())
        };

        for op in ops {
            match op {
                ConfigOp::Set { key, value } => {
                    desired.insert(key.clone(), value.clone());
                }
                ConfigOp::Delete { key } => {
                    desired.remove(key);
                }
                ConfigOp::Append { key, value } => {
                    let base = desired.get(key).cloned().or_else(|| effective(key));
                    let joined = match base {
                        Some(old) if !old.is_empty() => format!("{old},{value}"),
                        _ => value.clone(),
                    };
                    desired.insert(key.clone(), joined);
                }
                ConfigOp::Subtract { key, value } => {
                    if let Some(old) = desired.get(key).cloned().or_else(|| effective(key)) {
                        let kept: Vec<&str> = old.split(',').filter(|v| v != value).collect();
                        desired.insert(key.clone(), kept.join(","));
                    }
                }
            }
        }

        let mut alter = AlterConfig {
            specifier: match resource.kind {
                ResourceKind::Topic => ResourceSpecifier::Topic(&resource.name),
                ResourceKind::Broker => ResourceSpecifier::Broker(broker_id(&resource.name)?),
            },
            entries: Default::default(),
        };
        for (key, value) in &desired {
            alter = alter.set(key, value);
        }

        let results = self
            .runtime
            .block_on(self.admin.alter_configs([&alter], &self.options()))
            .map_err(ShellError::admin)?;
        for result in results {
            if let Err((specifier, code)) = result {
                let name = match specifier {
                    OwnedResourceSpecifier::Topic(n) => n,
                    OwnedResourceSpecifier::Broker(id) => id.to_string(),
                    OwnedResourceSpecifier::Group(n) => n,
                };
                return Err(ShellError::Admin(format!("alter of '{name}' failed: {code}")));
            }
        }
        Ok(())
    }

    fn create_topic(&self, name: &str, partitions: i32, replication: i32) -> Result<()> {
        let topic = NewTopic::new(name, partitions, TopicReplication::Fixed(replication));
        let results = self
            .runtime
            .block_on(self.admin.create_topics([&topic], &self.options()))
            .map_err(ShellError::admin)?;
        for result in results {
            if let Err((topic, code)) = result {
                return Err(ShellError::Admin(format!("creating '{topic}' failed: {code}")));
            }
        }
        Ok(())
    }

    fn delete_topic(&self, name: &str) -> Result<()> {
        let results = self
            .runtime
            .block_on(self.admin.delete_topics(&[name], &self.options()))
            .map_err(ShellError::admin)?;
        for result in results {
            if let Err((topic, code)) = result {
                return Err(ShellError::Admin(format!("deleting '{topic}' failed: {code}")));
            }
        }
        Ok(())
    }

    fn delete_group(&self, id: &str) -> Result<()> {
        let results = self
            .runtime
            .block_on(self.admin.delete_groups(&[id], &self.options()))
            .map_err(ShellError::admin)?;
        for result in results {
            if let Err((group, code)) = result {
                return Err(ShellError::Admin(format!("removing '{group}' failed: {code}")));
            }
        }
        Ok(())
    }

    fn open_consumer(&self, request: &ConsumeRequest) -> Result<Box<dyn MessageSource>> {
        let group = request
            .group
            .clone()
            .unwrap_or_else(|| format!("kshell-{}", Uuid::new_v4()));

        let mut config = client_config(&self.properties);
        config.set("group.id", &group);
        config.set("enable.auto.commit", "false");
        config.set("session.timeout.ms", "6000");
        config.set(
            "auto.offset.reset",
            match request.start {
                Some(StartOffset::Latest) | None => "latest",
                Some(StartOffset::Beginning) | Some(StartOffset::At(_)) => "earliest",
            },
        );

        let consumer: BaseConsumer = config.create().map_err(ShellError::admin)?;
        consumer.subscribe(&[&request.topic]).map_err(ShellError::admin)?;
        debug!(topic = %request.topic, group = %group, "consumer subscribed");

        Ok(Box::new(KafkaSource {
            consumer,
            pending_seek: request.start.map(start_offset),
        }))
    }

    fn close(&self) {
        self.metadata.unsubscribe();
    }
}

/// Seek target for a requested start position. Beginning and latest must go
/// through an explicit seek too: `auto.offset.reset` only kicks in when the
/// group has no committed offsets, while the start option applies even when
/// it does.
fn start_offset(start: StartOffset) -> Offset {
    match start {
        StartOffset::Beginning => Offset::Beginning,
        StartOffset::Latest => Offset::End,
        StartOffset::At(offset) => Offset::Offset(offset),
    }
}

/// Message source over a subscribed `BaseConsumer`. A requested start offset
/// is applied with a seek once the first partition assignment arrives.
struct KafkaSource {
    consumer: BaseConsumer,
    pending_seek: Option<Offset>,
}

impl KafkaSource {
    fn apply_pending_seek(&mut self) -> Result<()> {
        let Some(offset) = self.pending_seek else {
            return Ok(());
        };
        let assignment: TopicPartitionList =
            self.consumer.assignment().map_err(ShellError::admin)?;
        if assignment.count() == 0 {
            return Ok(());
        }
        for elem in assignment.elements() {
            self.consumer
                .seek(elem.topic(), elem.partition(), offset, REQUEST_TIMEOUT)
                .map_err(ShellError::admin)?;
        }
        self.pending_seek = None;
        Ok(())
    }
}

impl MessageSource for KafkaSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<PolledRecord>> {
        match self.consumer.poll(timeout) {
            None => {
                self.apply_pending_seek()?;
                Ok(None)
            }
            Some(Err(e)) => Err(ShellError::admin(e)),
            Some(Ok(message)) => {
                let message = message.detach();
                // A record arriving before the seek was applied belongs to
                // the pre-seek position; drop it after seeking.
                if self.pending_seek.is_some() {
                    self.apply_pending_seek()?;
                    if self.pending_seek.is_none() {
                        return Ok(None);
                    }
                }
                let headers = message
                    .headers()
                    .map(|hs| {
                        hs.iter()
                            .map(|h| (h.key.to_string(), h.value.map(|v| v.to_vec())))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Some(PolledRecord {
                    partition: message.partition(),
                    offset: message.offset(),
                    timestamp_ms: message.timestamp().to_millis(),
                    key: message.key().map(|k| k.to_vec()),
                    value: message.payload().map(|v| v.to_vec()),
                    headers,
                }))
            }
        }
    }
}

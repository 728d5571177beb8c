//! Testing utilities for kshell
//!
//! Provides an in-memory [`MockAdmin`] implementing [`BrokerAdmin`] and a
//! scriptable [`MockSource`] for the consume loop, so command and dispatch
//! tests run without a broker. Used by the in-file unit tests and the
//! integration tests under `tests/`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::admin::{
    BrokerAdmin, ClusterInfo, ConfigEntryInfo, ConfigOp, ConfigResourceRef, ConsumeRequest,
    GroupInfo, GroupListing, MessageSource, PolledRecord, TopicListing,
};
use crate::{Result, ShellError};

/// One scripted consume event
#[derive(Debug, Clone)]
pub enum MockEvent {
    Record(PolledRecord),
    Error(String),
}

/// Scriptable message source: pops one event per poll, then reports
/// end-of-script as empty polls.
pub struct MockSource {
    events: VecDeque<MockEvent>,
}

impl MockSource {
    pub fn new(events: Vec<MockEvent>) -> Self {
        Self { events: events.into() }
    }
}

impl MessageSource for MockSource {
    fn poll(&mut self, _timeout: Duration) -> Result<Option<PolledRecord>> {
        match self.events.pop_front() {
            Some(MockEvent::Record(rec)) => Ok(Some(rec)),
            Some(MockEvent::Error(msg)) => Err(ShellError::Admin(msg)),
            None => Ok(None),
        }
    }
}

/// Cloneable in-memory sink for asserting on session output
#[derive(Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// A boxed writer suitable for [`Session::with_output`](crate::shell::Session::with_output)
    pub fn writer(&self) -> Box<dyn Write> {
        Box::new(self.clone())
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct MockState {
    topics: BTreeMap<String, usize>,
    groups: Vec<GroupListing>,
    group_details: HashMap<String, GroupInfo>,
    cluster: ClusterInfo,
    configs: HashMap<ConfigResourceRef, Vec<ConfigEntryInfo>>,
    alter_calls: Vec<(ConfigResourceRef, Vec<ConfigOp>)>,
    created: Vec<(String, i32, i32)>,
    deleted_topics: Vec<String>,
    deleted_groups: Vec<String>,
    consume_script: Vec<MockEvent>,
    consume_requests: Vec<ConsumeRequest>,
    fail_with: Option<String>,
}

/// In-memory broker backend for tests
#[derive(Default)]
pub struct MockAdmin {
    state: Mutex<MockState>,
    closed: AtomicUsize,
}

impl MockAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_topic(&self, name: &str, partitions: usize) {
        let mut st = self.lock();
        st.topics.insert(name.to_string(), partitions);
    }

    pub fn add_group(&self, id: &str, state: Option<&str>) {
        let mut st = self.lock();
        st.groups.push(GroupListing { id: id.to_string(), state: state.map(String::from) });
    }

    pub fn set_group_detail(&self, info: GroupInfo) {
        let mut st = self.lock();
        st.group_details.insert(info.id.clone(), info);
    }

    pub fn set_cluster(&self, cluster: ClusterInfo) {
        self.lock().cluster = cluster;
    }

    pub fn set_config(&self, resource: ConfigResourceRef, entries: Vec<ConfigEntryInfo>) {
        self.lock().configs.insert(resource, entries);
    }

    pub fn script_consume(&self, events: Vec<MockEvent>) {
        self.lock().consume_script = events;
    }

    /// Make every admin call fail with the given message
    pub fn fail_with(&self, msg: &str) {
        self.lock().fail_with = Some(msg.to_string());
    }

    pub fn alter_calls(&self) -> Vec<(ConfigResourceRef, Vec<ConfigOp>)> {
        self.lock().alter_calls.clone()
    }

    pub fn created_topics(&self) -> Vec<(String, i32, i32)> {
        self.lock().created.clone()
    }

    pub fn deleted_topics(&self) -> Vec<String> {
        self.lock().deleted_topics.clone()
    }

    pub fn deleted_groups(&self) -> Vec<String> {
        self.lock().deleted_groups.clone()
    }

    pub fn consume_requests(&self) -> Vec<ConsumeRequest> {
        self.lock().consume_requests.clone()
    }

    /// Current value of a config entry, for round-trip assertions
    pub fn config_value(&self, resource: &ConfigResourceRef, key: &str) -> Option<String> {
        self.lock()
            .configs
            .get(resource)
            .and_then(|entries| entries.iter().find(|e| e.name == key))
            .and_then(|e| e.value.clone())
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_fail(&self) -> Result<()> {
        if let Some(msg) = &self.lock().fail_with {
            return Err(ShellError::Admin(msg.clone()));
        }
        Ok(())
    }
}

impl BrokerAdmin for MockAdmin {
    fn list_topics(&self) -> Result<Vec<TopicListing>> {
        self.check_fail()?;
        Ok(self
            .lock()
            .topics
            .keys()
            .map(|name| TopicListing { name: name.clone() })
            .collect())
    }

    fn list_groups(&self) -> Result<Vec<GroupListing>> {
        self.check_fail()?;
        Ok(self.lock().groups.clone())
    }

    fn describe_topic(&self, name: &str) -> Result<crate::admin::TopicInfo> {
        self.check_fail()?;
        let st = self.lock();
        let partitions = st
            .topics
            .get(name)
            .copied()
            .ok_or_else(|| ShellError::Admin(format!("Unknown topic '{name}'")))?;
        Ok(crate::admin::TopicInfo { name: name.to_string(), partitions })
    }

    fn describe_group(&self, id: &str) -> Result<GroupInfo> {
        self.check_fail()?;
        self.lock()
            .group_details
            .get(id)
            .cloned()
            .ok_or_else(|| ShellError::Admin(format!("Unknown group '{id}'")))
    }

    fn describe_cluster(&self) -> Result<ClusterInfo> {
        self.check_fail()?;
        Ok(self.lock().cluster.clone())
    }

    fn describe_configs(&self, resource: &ConfigResourceRef) -> Result<Vec<ConfigEntryInfo>> {
        self.check_fail()?;
        self.lock()
            .configs
            .get(resource)
            .cloned()
            .ok_or_else(|| ShellError::Admin(format!("Unknown {} '{}'", resource.kind, resource.name)))
    }

    fn alter_configs(&self, resource: &ConfigResourceRef, ops: &[ConfigOp]) -> Result<()> {
        self.check_fail()?;
        let mut st = self.lock();
        let entries = st.configs.entry(resource.clone()).or_default();
        for op in ops {
            match op {
                ConfigOp::Set { key, value } => {
                    match entries.iter_mut().find(|e| e.name == *key) {
                        Some(entry) => entry.value = Some(value.clone()),
                        None => entries.push(ConfigEntryInfo {
                            name: key.clone(),
                            value: Some(value.clone()),
                            is_dynamic: true,
                        }),
                    }
                }
                ConfigOp::Delete { key } => entries.retain(|e| e.name != *key),
                ConfigOp::Append { key, value } => {
                    match entries.iter_mut().find(|e| e.name == *key) {
                        Some(entry) => {
                            let joined = match entry.value.take() {
                                Some(old) if !old.is_empty() => format!("{old},{value}"),
                                _ => value.clone(),
                            };
                            entry.value = Some(joined);
                        }
                        None => entries.push(ConfigEntryInfo {
                            name: key.clone(),
                            value: Some(value.clone()),
                            is_dynamic: true,
                        }),
                    }
                }
                ConfigOp::Subtract { key, value } => {
                    if let Some(entry) = entries.iter_mut().find(|e| e.name == *key) {
                        if let Some(old) = entry.value.take() {
                            let kept: Vec<&str> =
                                old.split(',').filter(|v| v != value).collect();
                            entry.value = Some(kept.join(","));
                        }
                    }
                }
            }
        }
        st.alter_calls.push((resource.clone(), ops.to_vec()));
        Ok(())
    }

    fn create_topic(&self, name: &str, partitions: i32, replication: i32) -> Result<()> {
        self.check_fail()?;
        let mut st = self.lock();
        if st.topics.contains_key(name) {
            return Err(ShellError::Admin(format!("Topic '{name}' already exists.")));
        }
        st.topics.insert(name.to_string(), partitions.max(0) as usize);
        st.created.push((name.to_string(), partitions, replication));
        Ok(())
    }

    fn delete_topic(&self, name: &str) -> Result<()> {
        self.check_fail()?;
        let mut st = self.lock();
        st.topics.remove(name);
        st.deleted_topics.push(name.to_string());
        Ok(())
    }

    fn delete_group(&self, id: &str) -> Result<()> {
        self.check_fail()?;
        let mut st = self.lock();
        st.groups.retain(|g| g.id != id);
        st.deleted_groups.push(id.to_string());
        Ok(())
    }

    fn open_consumer(&self, request: &ConsumeRequest) -> Result<Box<dyn MessageSource>> {
        self.check_fail()?;
        let mut st = self.lock();
        st.consume_requests.push(request.clone());
        Ok(Box::new(MockSource::new(st.consume_script.clone())))
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

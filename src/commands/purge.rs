use std::time::Duration;

use tracing::warn;

use super::Command;
use crate::admin::{ConfigEntryInfo, ConfigOp, ConfigResourceRef};
use crate::complete::{Node, Term};
use crate::shell::Session;
use crate::Result;

const CLEANUP_POLICY: &str = "cleanup.policy";
const RETENTION_MS: &str = "retention.ms";
const FILE_DELETE_DELAY_MS: &str = "file.delete.delay.ms";

/// Purges a topic by dropping retention to zero, waiting for the broker to
/// delete segments, then restoring the previous settings. Best effort: a
/// failure between the two alters leaves the topic with zero retention.
pub struct PurgeCommand {
    settle: Duration,
}

impl PurgeCommand {
    pub fn new() -> Self {
        Self { settle: Duration::from_secs(1) }
    }

    /// Override the post-alter wait (the broker segment-deletion window)
    pub fn with_settle(settle: Duration) -> Self {
        Self { settle }
    }
}

impl Default for PurgeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for PurgeCommand {
    fn verb(&self) -> &'static str {
        "purge"
    }

    fn help(&self) -> String {
        format!(
            "<topic_name>\n{}Purges all messages in a topic by setting the retention.ms to 0 and restoring it back to the previous setting.",
            " ".repeat(15)
        )
    }

    fn completion_tree(&self) -> Node {
        Node::literal("purge", vec![Node::dynamic(Term::Topics, Vec::new())])
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()> {
        let Some(topic) = words.get(1) else {
            return session.println("Missing topic name.");
        };
        let resource = ConfigResourceRef::topic(topic);
        let before = session.admin().describe_configs(&resource)?;

        session.admin().alter_configs(
            &resource,
            &[
                set(CLEANUP_POLICY, "delete"),
                set(RETENTION_MS, "0"),
                set(FILE_DELETE_DELAY_MS, "10"),
            ],
        )?;

        // Give the broker time to delete the emptied segments
        std::thread::sleep(self.settle);

        let revert: Vec<ConfigOp> = [CLEANUP_POLICY, RETENTION_MS, FILE_DELETE_DELAY_MS]
            .iter()
            .map(|key| match original_value(&before, key) {
                Some(value) => set(key, &value),
                None => ConfigOp::Delete { key: (*key).to_string() },
            })
            .collect();
        if let Err(e) = session.admin().alter_configs(&resource, &revert) {
            warn!(topic = %topic, error = %e, "failed to restore retention settings");
            return Err(e);
        }

        session.println(format!("Topic {topic} purged."))
    }
}

fn set(key: &str, value: &str) -> ConfigOp {
    ConfigOp::Set { key: key.to_string(), value: value.to_string() }
}

fn original_value(entries: &[ConfigEntryInfo], key: &str) -> Option<String> {
    entries.iter().find(|e| e.name == key).and_then(|e| e.value.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{CapturedOutput, MockAdmin};

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn entry(name: &str, value: &str) -> ConfigEntryInfo {
        ConfigEntryInfo { name: name.into(), value: Some(value.into()), is_dynamic: true }
    }

    #[test]
    fn test_purge_restores_original_settings() {
        let admin = Arc::new(MockAdmin::new());
        let resource = ConfigResourceRef::topic("orders");
        admin.set_config(
            resource.clone(),
            vec![
                entry(CLEANUP_POLICY, "compact"),
                entry(RETENTION_MS, "604800000"),
                entry(FILE_DELETE_DELAY_MS, "60000"),
            ],
        );
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin.clone(), Default::default(), out.writer());

        PurgeCommand::with_settle(Duration::ZERO)
            .invoke(&mut session, &words("purge orders"))
            .unwrap();

        assert_eq!(out.contents(), "Topic orders purged.\n");
        assert_eq!(admin.alter_calls().len(), 2);
        assert_eq!(admin.config_value(&resource, CLEANUP_POLICY), Some("compact".into()));
        assert_eq!(admin.config_value(&resource, RETENTION_MS), Some("604800000".into()));
        assert_eq!(admin.config_value(&resource, FILE_DELETE_DELAY_MS), Some("60000".into()));
    }

    #[test]
    fn test_purge_first_alter_sets_zero_retention() {
        let admin = Arc::new(MockAdmin::new());
        let resource = ConfigResourceRef::topic("orders");
        admin.set_config(resource.clone(), vec![entry(RETENTION_MS, "1000")]);
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin.clone(), Default::default(), out.writer());

        PurgeCommand::with_settle(Duration::ZERO)
            .invoke(&mut session, &words("purge orders"))
            .unwrap();

        let calls = admin.alter_calls();
        assert!(calls[0].1.contains(&ConfigOp::Set {
            key: RETENTION_MS.to_string(),
            value: "0".to_string()
        }));
    }

    #[test]
    fn test_purge_deletes_overrides_that_were_absent() {
        let admin = Arc::new(MockAdmin::new());
        let resource = ConfigResourceRef::topic("orders");
        admin.set_config(resource.clone(), vec![entry(RETENTION_MS, "1000")]);
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin.clone(), Default::default(), out.writer());

        PurgeCommand::with_settle(Duration::ZERO)
            .invoke(&mut session, &words("purge orders"))
            .unwrap();

        // cleanup.policy had no value before the purge, so the revert drops it
        assert_eq!(admin.config_value(&resource, CLEANUP_POLICY), None);
        assert_eq!(admin.config_value(&resource, RETENTION_MS), Some("1000".into()));
    }

    #[test]
    fn test_purge_without_topic_prints_message() {
        let admin = Arc::new(MockAdmin::new());
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin.clone(), Default::default(), out.writer());

        PurgeCommand::with_settle(Duration::ZERO)
            .invoke(&mut session, &words("purge"))
            .unwrap();
        assert_eq!(out.contents(), "Missing topic name.\n");
        assert!(admin.alter_calls().is_empty());
    }
}

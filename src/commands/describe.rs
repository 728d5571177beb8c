use super::{help_lines, Command};
use crate::admin::{ConfigEntryInfo, ConfigResourceRef};
use crate::complete::{Node, Term};
use crate::shell::Session;
use crate::{Result, ShellError};

/// Describes topics, consumer groups, the cluster or a broker
pub struct DescribeCommand;

impl Command for DescribeCommand {
    fn verb(&self) -> &'static str {
        "describe"
    }

    fn help(&self) -> String {
        help_lines(
            15,
            &[
                "topic <topic_name> [config name]",
                "group <group_name>",
                "cluster",
                "broker <broker_id> [config name]",
            ],
        )
    }

    fn completion_tree(&self) -> Node {
        Node::literal(
            "describe",
            vec![
                Node::literal("topic", vec![Node::dynamic(Term::Topics, Vec::new())]),
                Node::literal("group", vec![Node::dynamic(Term::Groups, Vec::new())]),
                Node::literal("cluster", Vec::new()),
                Node::literal("broker", vec![Node::dynamic(Term::Brokers, Vec::new())]),
            ],
        )
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()> {
        let subtype = words.get(1).ok_or_else(|| {
            ShellError::syntax("describe requires a subtype: topic, group, cluster or broker")
        })?;
        match subtype.to_ascii_lowercase().as_str() {
            "topic" => {
                let name = words
                    .get(2)
                    .ok_or_else(|| ShellError::syntax("Missing topic name."))?;
                describe_topic(session, name, words.get(3).map(String::as_str))
            }
            "group" => {
                let name = words
                    .get(2)
                    .ok_or_else(|| ShellError::syntax("Missing group name."))?;
                describe_group(session, name)
            }
            "cluster" => describe_cluster(session),
            "broker" => {
                let id = words
                    .get(2)
                    .ok_or_else(|| ShellError::syntax("Missing broker id."))?;
                describe_broker(session, id, words.get(3).map(String::as_str))
            }
            other => Err(ShellError::Syntax(format!("Unknown type {other}"))),
        }
    }
}

fn describe_topic(session: &mut Session, name: &str, filter: Option<&str>) -> Result<()> {
    let info = session.admin().describe_topic(name)?;
    let entries = session
        .admin()
        .describe_configs(&ConfigResourceRef::topic(name))?;
    session.println(format!("{} (partitions={})", info.name, info.partitions))?;
    print_config(session, entries, filter)
}

fn describe_broker(session: &mut Session, id: &str, filter: Option<&str>) -> Result<()> {
    let entries = session
        .admin()
        .describe_configs(&ConfigResourceRef::broker(id))?;
    session.println(format!("Broker: {id}"))?;
    print_config(session, entries, filter)
}

fn describe_group(session: &mut Session, name: &str) -> Result<()> {
    let info = session.admin().describe_group(name)?;
    session.println(format!(
        "Group={} (state={} partition assigner={})",
        info.id, info.state, info.partition_assignor
    ))?;
    let members: Vec<String> = info
        .members
        .iter()
        .map(|m| {
            format!(
                "{}@{} ==> {}",
                m.consumer_id,
                m.host,
                m.group_instance_id.as_deref().unwrap_or("No group")
            )
        })
        .collect();
    session.println(format!("members=[\n{}]", members.join("\n")))?;
    session.println("--------------------------------------------")
}

fn describe_cluster(session: &mut Session) -> Result<()> {
    let cluster = session.admin().describe_cluster()?;
    session.println(format!(
        "Cluster ID: {}",
        cluster.cluster_id.as_deref().unwrap_or("unknown")
    ))?;
    if let Some(ops) = &cluster.authorized_operations {
        let codes: Vec<String> = ops.iter().map(|code| format!("0x{code:x}")).collect();
        session.println(format!("ACL Operations: {}", codes.join(",")))?;
    }
    session.println("Nodes:")?;
    session.println("---------")?;
    let mut nodes = cluster.nodes;
    nodes.sort_by_key(|n| n.id);
    for node in &nodes {
        let marker = if cluster.controller_id == Some(node.id) { "*->" } else { "   " };
        session.println(format!(
            "{} {}@host={}:{} [rack={}]",
            marker,
            node.id,
            node.host,
            node.port,
            node.rack.as_deref().unwrap_or("no rack")
        ))?;
    }
    session.println("\n* denotes controller")
}

/// Print config entries sorted by name, optionally filtered to names that
/// start with the given prefix (case-insensitive)
fn print_config(session: &mut Session, mut entries: Vec<ConfigEntryInfo>, filter: Option<&str>) -> Result<()> {
    session.println("Config:")?;
    session.println("----------")?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let prefix = filter.map(str::to_ascii_lowercase);
    for entry in entries {
        if let Some(prefix) = &prefix {
            if !entry.name.to_ascii_lowercase().starts_with(prefix) {
                continue;
            }
        }
        session.println(format!("{} = {}", entry.name, entry.value.as_deref().unwrap_or("null")))?;
    }
    Ok(())
}

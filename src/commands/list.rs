use super::Command;
use crate::complete::Node;
use crate::shell::Session;
use crate::{Result, ShellError};

/// Lists topics, consumer groups or (unimplemented) offsets
pub struct ListCommand;

impl Command for ListCommand {
    fn verb(&self) -> &'static str {
        "list"
    }

    fn help(&self) -> String {
        "<topics|groups|offsets>".to_string()
    }

    fn completion_tree(&self) -> Node {
        Node::literal("list", Node::leaves(&["topics", "groups", "offsets"]))
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()> {
        let subtype = words
            .get(1)
            .ok_or_else(|| ShellError::syntax("list requires a subtype: topics, groups or offsets"))?;
        match subtype.to_ascii_lowercase().as_str() {
            "topics" => list_topics(session),
            "groups" => list_groups(session),
            "offsets" => session.println("Listing offsets is not implemented yet."),
            other => Err(ShellError::Syntax(format!("Unknown type {other}"))),
        }
    }
}

fn list_topics(session: &mut Session) -> Result<()> {
    let mut topics = session.admin().list_topics()?;
    topics.sort_by(|a, b| a.name.cmp(&b.name));
    session.println(format!("Topics ({})", topics.len()))?;
    session.println("-----------")?;
    for topic in topics {
        session.println(topic.name)?;
    }
    Ok(())
}

fn list_groups(session: &mut Session) -> Result<()> {
    let mut groups = session.admin().list_groups()?;
    groups.sort_by(|a, b| a.id.cmp(&b.id));
    session.println(format!("Consumer Groups ({})", groups.len()))?;
    session.println("-----------------------")?;
    for group in groups {
        let state = group.state.as_deref().unwrap_or("UNKNOWN");
        session.println(format!("{} ({state})", group.id))?;
    }
    Ok(())
}

use super::Command;
use crate::complete::{Node, Term};
use crate::options::get_option;
use crate::shell::Session;
use crate::{Result, ShellError};

/// Creates a topic with optional partition and replication overrides
pub struct CreateCommand;

const DEFAULT_PARTITIONS: i32 = 1;
const DEFAULT_REPLICATION: i32 = 3;

impl Command for CreateCommand {
    fn verb(&self) -> &'static str {
        "create"
    }

    fn help(&self) -> String {
        "topic <topic_name> [partitions N] [replication N]".to_string()
    }

    fn completion_tree(&self) -> Node {
        Node::literal(
            "create",
            vec![Node::literal(
                "topic",
                vec![Node::dynamic(Term::Any, Node::leaves(&["partitions", "replication"]))],
            )],
        )
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()> {
        let subtype = words
            .get(1)
            .ok_or_else(|| ShellError::syntax("create requires a subtype: topic"))?;
        if !subtype.eq_ignore_ascii_case("topic") {
            return Err(ShellError::Syntax(format!("Unknown type {subtype}")));
        }
        let name = words
            .get(2)
            .ok_or_else(|| ShellError::syntax("Missing topic name."))?;

        let partitions = parse_count(words, "partitions", DEFAULT_PARTITIONS)?;
        let replication = parse_count(words, "replication", DEFAULT_REPLICATION)?;

        session.admin().create_topic(name, partitions, replication)?;
        session.println(format!("Topic {name} was created."))
    }
}

fn parse_count(words: &[String], option: &str, default: i32) -> Result<i32> {
    match get_option(words, option) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ShellError::Syntax(format!("Invalid {option} value '{raw}'"))),
    }
}

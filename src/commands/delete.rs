use super::Command;
use crate::complete::{Node, Term};
use crate::shell::Session;
use crate::{Result, ShellError};

/// Deletes a topic or a consumer group
pub struct DeleteCommand;

impl Command for DeleteCommand {
    fn verb(&self) -> &'static str {
        "delete"
    }

    fn help(&self) -> String {
        "<topic|group> <name>".to_string()
    }

    fn completion_tree(&self) -> Node {
        Node::literal(
            "delete",
            vec![
                Node::literal("topic", vec![Node::dynamic(Term::Topics, Vec::new())]),
                Node::literal("group", vec![Node::dynamic(Term::Groups, Vec::new())]),
            ],
        )
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()> {
        let subtype = words
            .get(1)
            .ok_or_else(|| ShellError::syntax("delete requires a subtype: topic or group"))?;
        match subtype.to_ascii_lowercase().as_str() {
            "topic" => {
                let name = words
                    .get(2)
                    .ok_or_else(|| ShellError::syntax("Missing topic name."))?;
                session.admin().delete_topic(name)?;
                session.println(format!("Topic {name} deleted."))
            }
            "group" => {
                let name = words
                    .get(2)
                    .ok_or_else(|| ShellError::syntax("Missing group name."))?;
                session.admin().delete_group(name)?;
                session.println(format!("Consumer group {name} removed."))
            }
            other => Err(ShellError::Syntax(format!("Unknown type {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{CapturedOutput, MockAdmin};

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_delete_topic() {
        let admin = Arc::new(MockAdmin::new());
        admin.add_topic("orders", 1);
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin.clone(), Default::default(), out.writer());

        DeleteCommand.invoke(&mut session, &words("delete topic orders")).unwrap();
        assert_eq!(admin.deleted_topics(), vec!["orders".to_string()]);
        assert_eq!(out.contents(), "Topic orders deleted.\n");
    }

    #[test]
    fn test_delete_group() {
        let admin = Arc::new(MockAdmin::new());
        admin.add_group("billing", Some("Empty"));
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin.clone(), Default::default(), out.writer());

        DeleteCommand.invoke(&mut session, &words("delete group billing")).unwrap();
        assert_eq!(admin.deleted_groups(), vec!["billing".to_string()]);
        assert_eq!(out.contents(), "Consumer group billing removed.\n");
    }

    #[test]
    fn test_delete_unknown_subtype() {
        let admin = Arc::new(MockAdmin::new());
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin, Default::default(), out.writer());

        let err = DeleteCommand.invoke(&mut session, &words("delete cluster x")).unwrap_err();
        assert!(matches!(err, ShellError::Syntax(_)));
    }
}

use super::{help_lines, Command};
use crate::admin::{ConfigOp, ConfigResourceRef};
use crate::complete::{Node, Term};
use crate::options::split_key_value;
use crate::shell::Session;
use crate::{Result, ShellError};

/// Alters topic or broker configuration entries
pub struct ConfigureCommand;

const OPS: [&str; 4] = ["set", "delete", "append", "subtract"];

impl Command for ConfigureCommand {
    fn verb(&self) -> &'static str {
        "config"
    }

    fn help(&self) -> String {
        help_lines(
            15,
            &[
                "topic <topic_name> set <config_name_1=config_value_1>...<config_name_n=config_value_n>",
                "topic <topic_name> delete <config_name_1>...<config_name_n>",
                "topic <topic_name> append <config_name_1=config_value_1>...<config_name_n=config_value_n>",
                "topic <topic_name> subtract <config_name_1[=config_value_1]>...<config_name_n[=config_value_n]>",
                "broker <broker_id> set <config_name_1=config_value_1>...<config_name_n=config_value_n>",
                "broker <broker_id> delete <config_name_1>...<config_name_n>",
                "broker <broker_id> append <config_name_1=config_value_1>...<config_name_n=config_value_n>",
                "broker <broker_id> subtract <config_name_1[=config_value_1]>...<config_name_n[=config_value_n]>",
            ],
        )
    }

    fn completion_tree(&self) -> Node {
        let ops_over = |keys: Node| -> Vec<Node> {
            OPS.iter().map(|op| Node::literal(*op, vec![keys.clone()])).collect()
        };
        Node::literal(
            "config",
            vec![
                Node::literal(
                    "topic",
                    vec![Node::dynamic(
                        Term::Topics,
                        ops_over(Node::dynamic(Term::ConfigKeys, Vec::new())),
                    )],
                ),
                Node::literal(
                    "broker",
                    vec![Node::dynamic(
                        Term::Brokers,
                        ops_over(Node::dynamic(Term::Any, Vec::new())),
                    )],
                ),
            ],
        )
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()> {
        if words.len() < 5 {
            return Err(ShellError::syntax("Syntax error!  See help for layout of the command."));
        }

        let resource = match words[1].to_ascii_lowercase().as_str() {
            "topic" => ConfigResourceRef::topic(&words[2]),
            "broker" => ConfigResourceRef::broker(&words[2]),
            other => return Err(ShellError::Syntax(format!("Unknown type {other}"))),
        };
        let operation = words[3].to_ascii_lowercase();

        let mut ops = Vec::with_capacity(words.len() - 4);
        for token in &words[4..] {
            ops.push(parse_op(&operation, token)?);
        }

        session.admin().alter_configs(&resource, &ops)?;
        session.println("Configuration change applied.")
    }
}

/// Map one config token to an alter op. `set` and `append` require a
/// `key=value` token; `delete` takes a bare key (anything after `=` is
/// ignored); `subtract` removes one value from a list when given
/// `key=value`, or the whole entry when given a bare key.
fn parse_op(operation: &str, token: &str) -> Result<ConfigOp> {
    let pair = split_key_value(token);
    match operation {
        "set" => {
            let (key, value) =
                pair.ok_or_else(|| ShellError::Syntax(format!("set expects key=value, got '{token}'")))?;
            Ok(ConfigOp::Set { key: key.to_string(), value: value.to_string() })
        }
        "append" => {
            let (key, value) = pair
                .ok_or_else(|| ShellError::Syntax(format!("append expects key=value, got '{token}'")))?;
            Ok(ConfigOp::Append { key: key.to_string(), value: value.to_string() })
        }
        "delete" => {
            let key = pair.map(|(k, _)| k).unwrap_or(token);
            Ok(ConfigOp::Delete { key: key.to_string() })
        }
        "subtract" => match pair {
            Some((key, value)) => {
                Ok(ConfigOp::Subtract { key: key.to_string(), value: value.to_string() })
            }
            None => Ok(ConfigOp::Delete { key: token.to_string() }),
        },
        other => Err(ShellError::Syntax(format!(
            "Unknown operation {other}; expected set, delete, append or subtract"
        ))),
    }
}

//! Shell commands
//!
//! Each command owns a verb, a help string, a completion tree and an
//! `invoke` implementation. Commands talk to the broker only through the
//! session's [`BrokerAdmin`](crate::admin::BrokerAdmin) handle and write
//! output through the session sink, so every one of them is testable
//! against the in-memory mock.

use crate::complete::Node;
use crate::shell::Session;
use crate::Result;

mod configure;
mod consume;
mod create;
mod delete;
mod describe;
mod exit;
mod help;
mod list;
mod purge;

pub use configure::ConfigureCommand;
pub use consume::{run_poll_loop, ConsumeCommand};
pub use create::CreateCommand;
pub use delete::DeleteCommand;
pub use describe::DescribeCommand;
pub use exit::ExitCommand;
pub use help::HelpCommand;
pub use list::ListCommand;
pub use purge::PurgeCommand;

/// Contract shared by all shell commands
pub trait Command {
    /// The word that selects this command, matched case-insensitively
    fn verb(&self) -> &'static str;

    /// Help text shown by the `help` command; continuation lines carry
    /// their own indentation
    fn help(&self) -> String;

    /// Completion tree rooted at the verb
    fn completion_tree(&self) -> Node {
        Node::leaf(self.verb())
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()>;
}

/// Join help lines, indenting continuation lines to the given column
pub(crate) fn help_lines(indent: usize, lines: &[&str]) -> String {
    lines.join(&format!("\n{}", " ".repeat(indent)))
}

/// Build the command registry in dispatch order. The `help` command gets a
/// snapshot of every (verb, help) pair, its own included.
pub fn registry() -> Vec<Box<dyn Command>> {
    let tail: Vec<Box<dyn Command>> = vec![
        Box::new(ListCommand),
        Box::new(DescribeCommand),
        Box::new(CreateCommand),
        Box::new(ConfigureCommand),
        Box::new(ConsumeCommand::new()),
        Box::new(DeleteCommand),
        Box::new(PurgeCommand::new()),
        Box::new(ExitCommand),
    ];

    let mut entries = vec![("help".to_string(), HelpCommand::SUMMARY.to_string())];
    entries.extend(tail.iter().map(|c| (c.verb().to_string(), c.help())));

    let mut commands: Vec<Box<dyn Command>> = vec![Box::new(HelpCommand::new(entries))];
    commands.extend(tail);
    commands
}

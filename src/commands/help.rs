use super::Command;
use crate::shell::Session;
use crate::Result;

/// Prints every registered command with its help text
pub struct HelpCommand {
    entries: Vec<(String, String)>,
}

impl HelpCommand {
    pub const SUMMARY: &'static str = "Receive help on the commands.";

    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }
}

impl Command for HelpCommand {
    fn verb(&self) -> &'static str {
        "help"
    }

    fn help(&self) -> String {
        Self::SUMMARY.to_string()
    }

    fn invoke(&self, session: &mut Session, _words: &[String]) -> Result<()> {
        session.println("Commands:")?;
        for (verb, help) in &self.entries {
            session.println(format!("{verb:<15}{help}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::registry;
    use crate::testing::{CapturedOutput, MockAdmin};

    #[test]
    fn test_help_lists_every_verb_in_order() {
        let out = CapturedOutput::new();
        let mut session = crate::shell::Session::with_output(
            Arc::new(MockAdmin::new()),
            Default::default(),
            out.writer(),
        );
        let commands = registry();
        commands[0].invoke(&mut session, &["help".to_string()]).unwrap();

        let text = out.contents();
        assert!(text.starts_with("Commands:\n"));
        // Multi-line help texts add continuation lines, so check each verb
        // starts a line at column 0 and appears in registry order.
        let starts: Vec<usize> = commands
            .iter()
            .map(|c| {
                text.find(&format!("\n{:<15}", c.verb()))
                    .unwrap_or_else(|| panic!("missing help line for {}", c.verb()))
            })
            .collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }
}

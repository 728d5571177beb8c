use super::Command;
use crate::shell::Session;
use crate::Result;

/// Ends the read loop after the current iteration
pub struct ExitCommand;

impl Command for ExitCommand {
    fn verb(&self) -> &'static str {
        "exit"
    }

    fn help(&self) -> String {
        "Quits the shell.".to_string()
    }

    fn invoke(&self, session: &mut Session, _words: &[String]) -> Result<()> {
        session.stop();
        Ok(())
    }
}

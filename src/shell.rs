//! Read-eval loop, dispatch and session state
//!
//! The [`Session`] owns the broker handle, the loaded profile properties and
//! the output sink; it is created at startup and shut down exactly once.
//! [`dispatch_line`] is the single translation point from command errors to
//! user-facing text, so individual commands just return `Err` and the loop
//! keeps going.

use std::io::Write;
use std::sync::Arc;

use rustyline::config::{CompletionType, Config, EditMode};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tracing::{debug, error};

use crate::admin::BrokerAdmin;
use crate::commands::{registry, Command};
use crate::complete::ShellHelper;
use crate::profile::{profile_dir, Properties};
use crate::{Result, ShellError};

/// Per-process shell state shared with every command invocation
pub struct Session {
    admin: Arc<dyn BrokerAdmin>,
    properties: Properties,
    out: Box<dyn Write>,
    running: bool,
    closed: bool,
}

impl Session {
    pub fn new(admin: Arc<dyn BrokerAdmin>, properties: Properties) -> Self {
        Self::with_output(admin, properties, Box::new(std::io::stdout()))
    }

    /// Build a session writing to the given sink instead of stdout
    pub fn with_output(
        admin: Arc<dyn BrokerAdmin>,
        properties: Properties,
        out: Box<dyn Write>,
    ) -> Self {
        Self { admin, properties, out, running: true, closed: false }
    }

    pub fn admin(&self) -> &dyn BrokerAdmin {
        self.admin.as_ref()
    }

    pub fn admin_handle(&self) -> Arc<dyn BrokerAdmin> {
        Arc::clone(&self.admin)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn out(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    pub fn println(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// End the read loop after the current iteration
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stop and release the broker handle. Safe to call more than once; the
    /// handle is closed only the first time.
    pub fn shutdown(&mut self) {
        self.running = false;
        if !self.closed {
            self.closed = true;
            self.admin.close();
        }
    }
}

/// Tokenize one input line and route it to the matching command. Empty
/// lines are skipped; an unrecognized verb gets an explicit message rather
/// than a silent re-prompt.
pub fn dispatch_line(
    session: &mut Session,
    commands: &[Box<dyn Command>],
    line: &str,
) -> Result<()> {
    let words: Vec<String> = line.split_whitespace().map(String::from).collect();
    let Some(verb) = words.first() else {
        return Ok(());
    };
    let Some(command) = commands.iter().find(|c| c.verb().eq_ignore_ascii_case(verb)) else {
        return session.println(format!("Unknown command: {verb}"));
    };

    debug!(verb = command.verb(), "dispatching");
    match command.invoke(session, &words) {
        Ok(()) => Ok(()),
        Err(ShellError::Syntax(message)) => session.println(message),
        Err(ShellError::Interrupted) => {
            session.stop();
            Ok(())
        }
        Err(e @ (ShellError::Admin(_) | ShellError::Config(_) | ShellError::Format(_))) => {
            error!(error = %e, "command failed");
            session.println(format!("Error: {e}"))
        }
        Err(e) => {
            error!(error = %e, "unexpected command failure");
            session.println(format!("Unexpected error: {e}"))
        }
    }
}

/// Run the interactive loop until `exit`, end-of-input or interrupt, then
/// shut the session down.
pub fn run(session: &mut Session) -> Result<()> {
    let commands = registry();
    let trees = commands.iter().map(|c| c.completion_tree()).collect();

    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .max_history_size(1000)
        .map_err(editor_error)?
        .build();
    let mut editor: Editor<ShellHelper, DefaultHistory> =
        Editor::with_config(config).map_err(editor_error)?;
    editor.set_helper(Some(ShellHelper::new(trees, session.admin_handle())));

    let history_path = profile_dir().join("history");
    if editor.load_history(&history_path).is_err() {
        debug!("no previous history");
    }

    while session.is_running() {
        match editor.readline("> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                eval_line(session, &commands, &line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => session.stop(),
            Err(e) => {
                error!(error = %e, "read error, exiting");
                session.stop();
            }
        }
    }

    if let Err(e) = editor.save_history(&history_path) {
        debug!(error = %e, "could not save history");
    }
    session.shutdown();
    Ok(())
}

/// Dispatch one line, containing output-sink failures. A dead sink stops
/// the loop instead of propagating, so `shutdown` still runs and the broker
/// handle is released.
fn eval_line(session: &mut Session, commands: &[Box<dyn Command>], line: &str) {
    if let Err(e) = dispatch_line(session, commands, line) {
        error!(error = %e, "output error, exiting");
        session.stop();
    }
}

fn editor_error(e: ReadlineError) -> ShellError {
    ShellError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CapturedOutput, MockAdmin};

    fn session_with(admin: Arc<MockAdmin>) -> (Session, CapturedOutput) {
        let out = CapturedOutput::new();
        let session = Session::with_output(admin, Default::default(), out.writer());
        (session, out)
    }

    #[test]
    fn test_empty_line_produces_no_output() {
        let (mut session, out) = session_with(Arc::new(MockAdmin::new()));
        let commands = registry();
        dispatch_line(&mut session, &commands, "").unwrap();
        dispatch_line(&mut session, &commands, "   ").unwrap();
        assert!(out.contents().is_empty());
        assert!(session.is_running());
    }

    #[test]
    fn test_unknown_verb_is_reported() {
        let (mut session, out) = session_with(Arc::new(MockAdmin::new()));
        dispatch_line(&mut session, &registry(), "frobnicate now").unwrap();
        assert_eq!(out.contents(), "Unknown command: frobnicate\n");
    }

    #[test]
    fn test_verb_match_is_case_insensitive() {
        let admin = Arc::new(MockAdmin::new());
        let (mut session, out) = session_with(admin);
        dispatch_line(&mut session, &registry(), "LIST topics").unwrap();
        assert!(out.contents().starts_with("Topics (0)"));
    }

    #[test]
    fn test_broker_errors_are_printed_and_loop_continues() {
        let admin = Arc::new(MockAdmin::new());
        admin.fail_with("broker unavailable");
        let (mut session, out) = session_with(admin);
        dispatch_line(&mut session, &registry(), "list topics").unwrap();
        assert_eq!(out.contents(), "Error: broker unavailable\n");
        assert!(session.is_running());
    }

    struct DeadSink;

    impl Write for DeadSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dead_output_sink_stops_the_loop_and_still_closes_the_handle() {
        let admin = Arc::new(MockAdmin::new());
        let mut session =
            Session::with_output(admin.clone(), Default::default(), Box::new(DeadSink));
        let commands = registry();
        eval_line(&mut session, &commands, "help");
        assert!(!session.is_running());
        session.shutdown();
        assert_eq!(admin.close_count(), 1);
    }

    #[test]
    fn test_shutdown_closes_the_handle_once() {
        let admin = Arc::new(MockAdmin::new());
        let (mut session, _out) = session_with(admin.clone());
        dispatch_line(&mut session, &registry(), "exit").unwrap();
        assert!(!session.is_running());
        session.shutdown();
        session.shutdown();
        assert_eq!(admin.close_count(), 1);
    }
}

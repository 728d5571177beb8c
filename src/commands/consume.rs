use std::io::Write;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use tracing::debug;

use super::{help_lines, Command};
use crate::admin::{ConsumeRequest, MessageSource, StartOffset};
use crate::complete::{Node, Term};
use crate::format::{FormatOptions, RecordFormatter};
use crate::options::{get_option, has_option};
use crate::shell::Session;
use crate::{Result, ShellError};

/// Streams a topic's records to the console until `q` is pressed
pub struct ConsumeCommand {
    poll_timeout: Duration,
}

const DEFAULT_PARTITION: i32 = 1;

/// How long the quit check may block waiting for a keypress after an idle
/// poll. While records are flowing the check must not wait at all.
const QUIT_POLL_WAIT: Duration = Duration::from_millis(50);

impl ConsumeCommand {
    pub fn new() -> Self {
        Self { poll_timeout: Duration::from_millis(500) }
    }
}

impl Default for ConsumeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for ConsumeCommand {
    fn verb(&self) -> &'static str {
        "consume"
    }

    fn help(&self) -> String {
        help_lines(
            20,
            &[
                "<topic>",
                "[offset <beginning|latest|numeric>]",
                "[partition <numeric>]",
                "[group <group_name>]",
                "[skipErrors]",
                "[print.key]",
                "[print.value]",
                "[print.headers]",
                "[print.timestamp]",
                "[print.partition]",
                "[print.offset]",
                "[key.deserializer <codec>]",
                "[value.deserializer <codec>]",
                "[key.separator <separator>]",
                "[headers.separator <separator>]",
                "[null.literal <literal>]",
            ],
        )
    }

    fn completion_tree(&self) -> Node {
        Node::literal(
            "consume",
            vec![Node::dynamic(
                Term::Topics,
                vec![
                    Node::literal("offset", Node::leaves(&["beginning", "latest"])),
                    Node::leaf("partition"),
                    Node::leaf("group"),
                    Node::leaf("skipErrors"),
                    Node::leaf("print.key"),
                    Node::leaf("print.value"),
                    Node::leaf("print.headers"),
                    Node::leaf("print.timestamp"),
                    Node::leaf("print.partition"),
                    Node::leaf("print.offset"),
                    Node::leaf("key.deserializer"),
                    Node::leaf("value.deserializer"),
                    Node::leaf("key.separator"),
                    Node::leaf("headers.separator"),
                    Node::leaf("null.literal"),
                ],
            )],
        )
    }

    fn invoke(&self, session: &mut Session, words: &[String]) -> Result<()> {
        if words.len() < 2 {
            return session.println("Missing topic to consume.");
        }
        let topic = &words[1];
        let skip_errors = has_option(words, "skipErrors");
        let partition = match get_option(words, "partition") {
            None => DEFAULT_PARTITION,
            Some(raw) => raw
                .parse()
                .map_err(|_| ShellError::Syntax(format!("Invalid partition value '{raw}'")))?,
        };
        let start = get_option(words, "offset").map(parse_offset).transpose()?;
        let group = get_option(words, "group").map(String::from);

        let formatter = RecordFormatter::new(FormatOptions::from_words(words)?);
        let request = ConsumeRequest { topic: topic.clone(), group, start };
        let mut source = session.admin().open_consumer(&request)?;
        debug!(topic = %topic, partition, "consuming");

        session.println(format!("Reading from topic {topic} - Press Q to quit"))?;
        let raw_guard = RawModeGuard::enable();
        let mut quit = quit_pressed;
        let count = run_poll_loop(
            source.as_mut(),
            &formatter,
            partition,
            skip_errors,
            self.poll_timeout,
            session.out(),
            &mut quit,
        )?;
        drop(raw_guard);
        session.println(format!("Received {count} messages"))
    }
}

fn parse_offset(raw: &str) -> Result<StartOffset> {
    if raw.eq_ignore_ascii_case("beginning") {
        Ok(StartOffset::Beginning)
    } else if raw.eq_ignore_ascii_case("latest") {
        Ok(StartOffset::Latest)
    } else {
        raw.parse()
            .map(StartOffset::At)
            .map_err(|_| ShellError::Syntax(format!("Invalid offset value '{raw}'")))
    }
}

/// Poll records until the quit check fires, writing each record that lands
/// on the requested partition. Returns the number of records written. With
/// `skip_errors`, per-record failures are dropped and polling continues; an
/// output write failure always ends the loop.
///
/// The quit check runs once per poll and receives the wait it may spend
/// looking for a keypress: zero while records are arriving, so a busy topic
/// drains at full speed, and [`QUIT_POLL_WAIT`] after an idle poll.
pub fn run_poll_loop(
    source: &mut dyn MessageSource,
    formatter: &RecordFormatter,
    partition: i32,
    skip_errors: bool,
    timeout: Duration,
    out: &mut dyn Write,
    quit: &mut dyn FnMut(Duration) -> bool,
) -> Result<u64> {
    let mut count = 0u64;
    loop {
        let mut busy = false;
        match source.poll(timeout) {
            Ok(Some(record)) if record.partition == partition => {
                busy = true;
                count += 1;
                match formatter.write_to(&record, out) {
                    Ok(()) => {}
                    Err(ShellError::Io(_)) => break,
                    Err(_) if skip_errors => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(Some(_)) => busy = true,
            Ok(None) => {}
            Err(_) if skip_errors => {}
            Err(e) => return Err(e),
        }
        if quit(if busy { Duration::ZERO } else { QUIT_POLL_WAIT }) {
            break;
        }
    }
    Ok(count)
}

/// Raw-mode guard so single keypresses are readable without Enter. Terminal
/// state is restored on drop; failure to enter raw mode is tolerated (the
/// quit key then needs a newline).
struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    fn enable() -> Self {
        Self { active: terminal::enable_raw_mode().is_ok() }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = terminal::disable_raw_mode();
        }
    }
}

fn quit_pressed(wait: Duration) -> bool {
    match event::poll(wait) {
        Ok(true) => matches!(
            event::read(),
            Ok(Event::Key(key))
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::admin::{BrokerAdmin, PolledRecord};
    use crate::testing::{CapturedOutput, MockAdmin, MockEvent, MockSource};

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn record(partition: i32, offset: i64, value: &str) -> PolledRecord {
        PolledRecord {
            partition,
            offset,
            value: Some(value.as_bytes().to_vec()),
            ..PolledRecord::default()
        }
    }

    /// Quit once the scripted events are exhausted
    fn quit_after(polls: usize) -> impl FnMut(Duration) -> bool {
        let mut seen = 0;
        move |_wait| {
            seen += 1;
            seen >= polls
        }
    }

    #[test]
    fn test_poll_loop_counts_matching_partition_only() {
        let mut source = MockSource::new(vec![
            MockEvent::Record(record(1, 0, "a")),
            MockEvent::Record(record(0, 0, "skipped")),
            MockEvent::Record(record(1, 1, "b")),
        ]);
        let formatter = RecordFormatter::new(FormatOptions::default());
        let mut out = Vec::new();
        let mut quit = quit_after(3);

        let count = run_poll_loop(
            &mut source,
            &formatter,
            1,
            false,
            Duration::ZERO,
            &mut out,
            &mut quit,
        )
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_poll_loop_aborts_on_error_without_skip() {
        let mut source = MockSource::new(vec![
            MockEvent::Record(record(1, 0, "a")),
            MockEvent::Error("broker gone".into()),
            MockEvent::Record(record(1, 1, "b")),
        ]);
        let formatter = RecordFormatter::new(FormatOptions::default());
        let mut out = Vec::new();
        let mut quit = quit_after(10);

        let err = run_poll_loop(
            &mut source,
            &formatter,
            1,
            false,
            Duration::ZERO,
            &mut out,
            &mut quit,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broker gone"));
    }

    #[test]
    fn test_poll_loop_skips_errors_when_asked() {
        let mut source = MockSource::new(vec![
            MockEvent::Record(record(1, 0, "a")),
            MockEvent::Error("transient".into()),
            MockEvent::Record(record(1, 1, "b")),
        ]);
        let formatter = RecordFormatter::new(FormatOptions::default());
        let mut out = Vec::new();
        let mut quit = quit_after(3);

        let count = run_poll_loop(
            &mut source,
            &formatter,
            1,
            true,
            Duration::ZERO,
            &mut out,
            &mut quit,
        )
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_quit_check_waits_only_after_idle_polls() {
        let mut source = MockSource::new(vec![
            MockEvent::Record(record(1, 0, "a")),
            MockEvent::Record(record(0, 0, "other partition")),
        ]);
        let formatter = RecordFormatter::new(FormatOptions::default());
        let mut out = Vec::new();
        let mut waits = Vec::new();
        let mut quit = |wait: Duration| {
            waits.push(wait);
            waits.len() >= 3
        };

        run_poll_loop(&mut source, &formatter, 1, false, Duration::ZERO, &mut out, &mut quit)
            .unwrap();

        assert_eq!(waits, vec![Duration::ZERO, Duration::ZERO, QUIT_POLL_WAIT]);
    }

    #[test]
    fn test_missing_topic_prints_message() {
        let admin = Arc::new(MockAdmin::new());
        let out = CapturedOutput::new();
        let mut session = Session::with_output(admin.clone(), Default::default(), out.writer());

        ConsumeCommand::new().invoke(&mut session, &words("consume")).unwrap();
        assert_eq!(out.contents(), "Missing topic to consume.\n");
        assert!(admin.consume_requests().is_empty());
    }

    #[test]
    fn test_consume_request_carries_options() {
        let admin = Arc::new(MockAdmin::new());
        admin.script_consume(Vec::new());
        let request = {
            let req_words = words("consume orders offset beginning group readers partition 0");
            let start = get_option(&req_words, "offset").map(parse_offset).transpose().unwrap();
            ConsumeRequest {
                topic: req_words[1].clone(),
                group: get_option(&req_words, "group").map(String::from),
                start,
            }
        };
        admin.open_consumer(&request).unwrap();
        let recorded = admin.consume_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].topic, "orders");
        assert_eq!(recorded[0].group.as_deref(), Some("readers"));
        assert_eq!(recorded[0].start, Some(StartOffset::Beginning));
    }

    #[test]
    fn test_parse_offset_variants() {
        assert_eq!(parse_offset("beginning").unwrap(), StartOffset::Beginning);
        assert_eq!(parse_offset("LATEST").unwrap(), StartOffset::Latest);
        assert_eq!(parse_offset("42").unwrap(), StartOffset::At(42));
        assert!(parse_offset("nowhere").is_err());
    }
}

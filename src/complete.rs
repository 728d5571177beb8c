//! Tab completion for the shell
//!
//! Each command contributes a prefix tree describing its argument grammar.
//! Tree nodes are either literal words or dynamic candidate sets resolved
//! live through the admin handle (topic names, group ids, broker ids, config
//! keys). The [`ShellHelper`] aggregates every command's tree and walks them
//! against the words typed so far.

use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::Context;

use crate::admin::BrokerAdmin;
use crate::config_keys::topic_config_keys;

/// What a completion node stands for
#[derive(Debug, Clone)]
pub enum Term {
    /// A fixed word
    Literal(String),
    /// Topic names fetched from the broker
    Topics,
    /// Consumer group ids fetched from the broker
    Groups,
    /// Broker ids from cluster metadata
    Brokers,
    /// Known topic configuration keys
    ConfigKeys,
    /// A free-form argument: matches anything, suggests nothing
    Any,
}

/// One node of a command's completion tree
#[derive(Debug, Clone)]
pub struct Node {
    pub term: Term,
    pub children: Vec<Node>,
}

impl Node {
    pub fn literal(word: impl Into<String>, children: Vec<Node>) -> Self {
        Self { term: Term::Literal(word.into()), children }
    }

    pub fn dynamic(term: Term, children: Vec<Node>) -> Self {
        Self { term, children }
    }

    pub fn leaf(word: impl Into<String>) -> Self {
        Self::literal(word, Vec::new())
    }

    /// Convenience for a run of literal leaves under one parent
    pub fn leaves(words: &[&str]) -> Vec<Node> {
        words.iter().map(|w| Node::leaf(*w)).collect()
    }

    fn matches(&self, word: &str) -> bool {
        match &self.term {
            Term::Literal(lit) => lit.eq_ignore_ascii_case(word),
            _ => !word.is_empty(),
        }
    }
}

fn resolve(term: &Term, admin: &dyn BrokerAdmin) -> Vec<String> {
    match term {
        Term::Literal(lit) => vec![lit.clone()],
        Term::Topics => admin
            .list_topics()
            .map(|ts| ts.into_iter().map(|t| t.name).collect())
            .unwrap_or_default(),
        Term::Groups => admin
            .list_groups()
            .map(|gs| gs.into_iter().map(|g| g.id).collect())
            .unwrap_or_default(),
        Term::Brokers => admin
            .describe_cluster()
            .map(|c| c.nodes.into_iter().map(|n| n.id.to_string()).collect())
            .unwrap_or_default(),
        Term::ConfigKeys => topic_config_keys().iter().map(|k| k.to_string()).collect(),
        Term::Any => Vec::new(),
    }
}

/// Candidates offered at the current level after consuming `completed` words
fn candidates_at(nodes: &[Node], completed: &[&str], admin: &dyn BrokerAdmin) -> Vec<String> {
    match completed.split_first() {
        None => nodes.iter().flat_map(|n| resolve(&n.term, admin)).collect(),
        Some((word, rest)) => nodes
            .iter()
            .filter(|n| n.matches(word))
            .flat_map(|n| candidates_at(&n.children, rest, admin))
            .collect(),
    }
}

/// Compute the replacement start position and matching candidates for a line
/// prefix. Shared by the rustyline impl and the tests.
pub fn completion_candidates(
    trees: &[Node],
    admin: &dyn BrokerAdmin,
    line: &str,
    pos: usize,
) -> (usize, Vec<String>) {
    let head = &line[..pos];
    let mut words: Vec<&str> = head.split_whitespace().collect();
    let prefix = if head.ends_with(char::is_whitespace) || words.is_empty() {
        ""
    } else {
        words.pop().unwrap_or("")
    };

    let mut matches: Vec<String> = candidates_at(trees, &words, admin)
        .into_iter()
        .filter(|c| c.starts_with(prefix))
        .collect();
    matches.sort_unstable();
    matches.dedup();

    let start = head.rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
    (start, matches)
}

/// rustyline helper carrying the aggregated completion trees
pub struct ShellHelper {
    trees: Vec<Node>,
    admin: Arc<dyn BrokerAdmin>,
    highlighter: MatchingBracketHighlighter,
    hinter: HistoryHinter,
}

impl ShellHelper {
    pub fn new(trees: Vec<Node>, admin: Arc<dyn BrokerAdmin>) -> Self {
        Self {
            trees,
            admin,
            highlighter: MatchingBracketHighlighter::new(),
            hinter: HistoryHinter::new(),
        }
    }
}

impl rustyline::Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let (start, matches) = completion_candidates(&self.trees, self.admin.as_ref(), line, pos);
        let pairs = matches
            .into_iter()
            .map(|m| Pair { display: m.clone(), replacement: m })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> std::borrow::Cow<'b, str> {
        if default {
            std::borrow::Cow::Owned(format!("\x1b[1;32m{}\x1b[0m", prompt))
        } else {
            std::borrow::Cow::Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> std::borrow::Cow<'h, str> {
        std::borrow::Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

impl Validator for ShellHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAdmin;

    fn trees() -> Vec<Node> {
        vec![
            Node::literal(
                "list",
                vec![Node::leaf("topics"), Node::leaf("groups"), Node::leaf("offsets")],
            ),
            Node::literal(
                "describe",
                vec![
                    Node::literal("topic", vec![Node::dynamic(Term::Topics, Vec::new())]),
                    Node::literal("cluster", Vec::new()),
                ],
            ),
        ]
    }

    #[test]
    fn test_verb_completion_by_prefix() {
        let admin = MockAdmin::new();
        let (start, matches) = completion_candidates(&trees(), &admin, "li", 2);
        assert_eq!(start, 0);
        assert_eq!(matches, vec!["list".to_string()]);
    }

    #[test]
    fn test_subtype_completion_after_verb() {
        let admin = MockAdmin::new();
        let (start, matches) = completion_candidates(&trees(), &admin, "list ", 5);
        assert_eq!(start, 5);
        assert_eq!(matches, vec!["groups".to_string(), "offsets".into(), "topics".into()]);
    }

    #[test]
    fn test_dynamic_topic_candidates() {
        let admin = MockAdmin::new();
        admin.add_topic("orders", 3);
        admin.add_topic("events", 1);
        let line = "describe topic ";
        let (_, matches) = completion_candidates(&trees(), &admin, line, line.len());
        assert_eq!(matches, vec!["events".to_string(), "orders".into()]);
    }

    #[test]
    fn test_partial_word_filters_candidates() {
        let admin = MockAdmin::new();
        admin.add_topic("orders", 3);
        admin.add_topic("events", 1);
        let line = "describe topic or";
        let (start, matches) = completion_candidates(&trees(), &admin, line, line.len());
        assert_eq!(start, "describe topic ".len());
        assert_eq!(matches, vec!["orders".to_string()]);
    }

    #[test]
    fn test_verb_match_is_case_insensitive() {
        let admin = MockAdmin::new();
        let (_, matches) = completion_candidates(&trees(), &admin, "LIST t", 6);
        assert_eq!(matches, vec!["topics".to_string()]);
    }

    #[test]
    fn test_no_candidates_for_unknown_path() {
        let admin = MockAdmin::new();
        let (_, matches) = completion_candidates(&trees(), &admin, "create ", 7);
        assert!(matches.is_empty());
    }
}

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # kshell
//!
//! An interactive admin shell for Kafka clusters: create, describe, delete
//! and purge topics, alter topic and broker configuration, inspect consumer
//! groups and the cluster, and stream a topic's records to the console.
//!
//! Connection settings come from properties-style profiles under
//! `~/.kafka/` (default profile `client`, falling back to a localhost
//! plaintext broker when no profile file exists).
//!
//! ```text
//! $ kshell --profile staging
//! > list topics
//! > describe topic orders retention
//! > create topic payments partitions 6
//! > consume payments offset beginning print.key print.value
//! > exit
//! ```
//!
//! All broker access goes through the [`admin::BrokerAdmin`] trait; the
//! production backend wraps `rdkafka`, and [`testing`] ships an in-memory
//! mock so command behavior is testable without a cluster.

pub mod admin;
pub mod admin_kafka;
pub mod commands;
pub mod complete;
pub mod config_keys;
pub mod error;
pub mod format;
pub mod options;
pub mod profile;
pub mod shell;
pub mod testing;

pub use error::{Result, ShellError};
pub use shell::Session;

//! Connection profiles
//!
//! A profile is a Java-properties-style `key=value` file under
//! `~/.kafka/<name>.properties`, holding client configuration that is handed
//! to the broker client as-is (`bootstrap.servers`, `security.protocol`,
//! SASL/TLS settings, ...). When the file is missing, a minimal localhost
//! plaintext configuration is used instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{Result, ShellError};

/// Default profile name looked up when none is given on the command line
pub const DEFAULT_PROFILE: &str = "client";

/// Client properties loaded from a profile file
pub type Properties = BTreeMap<String, String>;

/// Get the per-user profile directory (`~/.kafka`)
pub fn profile_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".kafka"))
        .unwrap_or_else(|| PathBuf::from(".kafka"))
}

/// Load the named profile from the default profile directory
pub fn load_profile(name: &str) -> Result<Properties> {
    load_profile_from(&profile_dir(), name)
}

/// Load the named profile from `dir`, creating `dir` if absent and falling
/// back to the default localhost configuration when the file does not exist.
pub fn load_profile_from(dir: &Path, name: &str) -> Result<Properties> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }

    let path = dir.join(format!("{name}.properties"));
    if path.exists() {
        info!(path = %path.display(), "loading profile");
        let contents = std::fs::read_to_string(&path)?;
        let properties = parse_properties(&contents);
        if properties.is_empty() {
            return Err(ShellError::Config(format!(
                "profile '{}' contains no properties",
                path.display()
            )));
        }
        Ok(properties)
    } else {
        info!(profile = name, "no profile found, using default properties");
        let mut properties = Properties::new();
        properties.insert("bootstrap.servers".into(), "localhost:9092".into());
        properties.insert("security.protocol".into(), "PLAINTEXT".into());
        Ok(properties)
    }
}

/// Parse properties-file text: one `key=value` per line, `#`/`!` comments,
/// blank lines skipped, keys and values trimmed. Only the first `=` splits.
fn parse_properties(text: &str) -> Properties {
    let mut properties = Properties::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                properties.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties_basic() {
        let props = parse_properties(
            "bootstrap.servers=broker1:9092,broker2:9092\nsecurity.protocol=SASL_SSL\n",
        );
        assert_eq!(
            props.get("bootstrap.servers").map(String::as_str),
            Some("broker1:9092,broker2:9092")
        );
        assert_eq!(
            props.get("security.protocol").map(String::as_str),
            Some("SASL_SSL")
        );
    }

    #[test]
    fn test_parse_properties_skips_comments_and_blanks() {
        let props = parse_properties("# a comment\n\n! another\nkey=value\n");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("key").map(String::as_str), Some("value"));
    }

    #[test]
    fn test_parse_properties_splits_on_first_equals() {
        let props = parse_properties("sasl.jaas.config=user=admin;pass=x\n");
        assert_eq!(
            props.get("sasl.jaas.config").map(String::as_str),
            Some("user=admin;pass=x")
        );
    }

    #[test]
    fn test_parse_properties_trims_whitespace() {
        let props = parse_properties("  key  =  value  \n");
        assert_eq!(props.get("key").map(String::as_str), Some("value"));
    }

    #[test]
    fn test_load_missing_profile_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let props = load_profile_from(dir.path(), "client").unwrap();
        assert_eq!(
            props.get("bootstrap.servers").map(String::as_str),
            Some("localhost:9092")
        );
        assert_eq!(
            props.get("security.protocol").map(String::as_str),
            Some("PLAINTEXT")
        );
    }

    #[test]
    fn test_load_named_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("staging.properties"),
            "bootstrap.servers=stage:9092\n",
        )
        .unwrap();
        let props = load_profile_from(dir.path(), "staging").unwrap();
        assert_eq!(
            props.get("bootstrap.servers").map(String::as_str),
            Some("stage:9092")
        );
    }

    #[test]
    fn test_load_empty_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.properties"), "# nothing here\n").unwrap();
        assert!(load_profile_from(dir.path(), "empty").is_err());
    }
}

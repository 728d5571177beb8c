//! Record formatting for the `consume` command
//!
//! Mirrors the option bag of Kafka's console-consumer formatter: `print.*`
//! flags select which fields appear, separators and the null literal are
//! overridable, and key/value payloads run through a named codec. Field
//! order is fixed: timestamp, partition, offset, headers, key, value.

use std::io::Write;

use crate::admin::PolledRecord;
use crate::options::{get_option, has_option};
use crate::{Result, ShellError};

/// Payload codec selected by the `key.deserializer` / `value.deserializer`
/// options. The original tool takes deserializer class names; here the same
/// options accept codec names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// Raw bytes written as UTF-8 (lossy)
    #[default]
    Bytes,
    /// Strict UTF-8; invalid sequences are a format error
    Str,
    /// Lowercase hex dump
    Hex,
    /// Validated JSON, re-emitted compactly
    Json,
}

impl Codec {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bytes" => Ok(Codec::Bytes),
            "string" => Ok(Codec::Str),
            "hex" => Ok(Codec::Hex),
            "json" => Ok(Codec::Json),
            other => Err(ShellError::Format(format!(
                "unknown deserializer '{other}' (expected bytes, string, hex or json)"
            ))),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Codec::Bytes => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Codec::Str => String::from_utf8(bytes.to_vec())
                .map_err(|e| ShellError::Format(format!("invalid UTF-8 payload: {e}"))),
            Codec::Hex => Ok(bytes.iter().map(|b| format!("{b:02x}")).collect()),
            Codec::Json => {
                let value: serde_json::Value = serde_json::from_slice(bytes)
                    .map_err(|e| ShellError::Format(format!("invalid JSON payload: {e}")))?;
                serde_json::to_string(&value)
                    .map_err(|e| ShellError::Format(format!("JSON re-encode failed: {e}")))
            }
        }
    }
}

/// Formatting options assembled from the `consume` command line
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub print_timestamp: bool,
    pub print_key: bool,
    pub print_headers: bool,
    pub print_offset: bool,
    pub print_partition: bool,
    pub print_value: bool,
    pub key_separator: String,
    pub line_separator: String,
    pub headers_separator: String,
    pub null_literal: String,
    pub key_codec: Codec,
    pub value_codec: Codec,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            print_timestamp: false,
            print_key: false,
            print_headers: false,
            print_offset: false,
            print_partition: false,
            print_value: true,
            key_separator: "\t".into(),
            line_separator: "\n".into(),
            headers_separator: ",".into(),
            null_literal: "null".into(),
            key_codec: Codec::Bytes,
            value_codec: Codec::Bytes,
        }
    }
}

impl FormatOptions {
    /// Build options from a tokenized `consume` line. When no `print.*` flag
    /// is present the value alone is printed.
    pub fn from_words(words: &[String]) -> Result<Self> {
        let mut opts = FormatOptions {
            print_timestamp: has_option(words, "print.timestamp"),
            print_key: has_option(words, "print.key"),
            print_headers: has_option(words, "print.headers"),
            print_offset: has_option(words, "print.offset"),
            print_partition: has_option(words, "print.partition"),
            print_value: has_option(words, "print.value"),
            ..FormatOptions::default()
        };

        if !(opts.print_timestamp
            || opts.print_key
            || opts.print_headers
            || opts.print_offset
            || opts.print_partition
            || opts.print_value)
        {
            opts.print_value = true;
        }

        if let Some(sep) = get_option(words, "key.separator") {
            opts.key_separator = sep.to_string();
        }
        if let Some(sep) = get_option(words, "line.separator") {
            opts.line_separator = sep.to_string();
        }
        if let Some(sep) = get_option(words, "headers.separator") {
            opts.headers_separator = sep.to_string();
        }
        if let Some(lit) = get_option(words, "null.literal") {
            opts.null_literal = lit.to_string();
        }
        if let Some(name) = get_option(words, "key.deserializer") {
            opts.key_codec = Codec::parse(name)?;
        }
        if let Some(name) = get_option(words, "value.deserializer") {
            opts.value_codec = Codec::parse(name)?;
        }

        Ok(opts)
    }
}

/// Writes polled records as text lines per the configured options
#[derive(Debug, Clone)]
pub struct RecordFormatter {
    opts: FormatOptions,
}

impl RecordFormatter {
    pub fn new(opts: FormatOptions) -> Self {
        Self { opts }
    }

    /// Render one record to a string, without the trailing line separator
    pub fn render(&self, record: &PolledRecord) -> Result<String> {
        let opts = &self.opts;
        let mut fields: Vec<String> = Vec::new();

        if opts.print_timestamp {
            fields.push(match record.timestamp_ms {
                Some(ms) => format!("CreateTime:{ms}"),
                None => "NO_TIMESTAMP".to_string(),
            });
        }
        if opts.print_partition {
            fields.push(format!("Partition:{}", record.partition));
        }
        if opts.print_offset {
            fields.push(format!("Offset:{}", record.offset));
        }
        if opts.print_headers {
            if record.headers.is_empty() {
                fields.push("NO_HEADERS".to_string());
            } else {
                let rendered: Vec<String> = record
                    .headers
                    .iter()
                    .map(|(k, v)| match v {
                        Some(v) => format!("{k}:{}", String::from_utf8_lossy(v)),
                        None => format!("{k}:{}", opts.null_literal),
                    })
                    .collect();
                fields.push(rendered.join(&opts.headers_separator));
            }
        }
        if opts.print_key {
            fields.push(self.decode_or_null(record.key.as_deref(), opts.key_codec)?);
        }
        if opts.print_value {
            fields.push(self.decode_or_null(record.value.as_deref(), opts.value_codec)?);
        }

        Ok(fields.join(&opts.key_separator))
    }

    /// Render one record and write it, followed by the line separator
    pub fn write_to(&self, record: &PolledRecord, out: &mut dyn Write) -> Result<()> {
        let line = self.render(record)?;
        out.write_all(line.as_bytes())?;
        out.write_all(self.opts.line_separator.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn decode_or_null(&self, bytes: Option<&[u8]>, codec: Codec) -> Result<String> {
        match bytes {
            Some(b) => codec.decode(b),
            None => Ok(self.opts.null_literal.clone()),
        }
    }
}

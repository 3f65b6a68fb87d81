//! Serialization formats for config sources.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::config::Config;
use crate::error::{ConfigError, Result};

/// A serialization format bridging config state and byte streams.
///
/// `read` parses a stream and applies it to the config through the typed
/// section operations; `write` renders the config's current state.
/// Receivers are `&mut self` so implementations may buffer parser state,
/// but any state buffered during a call must be cleared before returning:
/// a later call with the same instance against a different config must not
/// see sections from an earlier one.
pub trait Format: Send {
    fn read(&mut self, reader: &mut dyn BufRead, config: &mut Config) -> Result<()>;
    fn write(&mut self, writer: &mut dyn Write, config: &Config) -> Result<()>;
}

/// The default format: a line-oriented INI dialect.
///
/// Grammar: `[name]` section headers (the text between the brackets is
/// taken verbatim), `key = value` or `key: value` option lines with key
/// and value trimmed, `#` and `;` comment lines, blank lines ignored.
/// There are no continuation lines and no inherited default section.
///
/// Reading parses the whole stream first and only then applies it, so a
/// parse error leaves the config untouched. Options land through the
/// encoded path; an option rejected by a strict section is logged and
/// skipped while the rest of the stream still applies. Sections with no
/// options in the stream are never created.
#[derive(Debug, Default)]
pub struct IniFormat;

impl IniFormat {
    pub fn new() -> Self {
        Self
    }
}

impl Format for IniFormat {
    fn read(&mut self, reader: &mut dyn BufRead, config: &mut Config) -> Result<()> {
        let mut parsed: Vec<(String, Vec<(String, String)>)> = Vec::new();
        let mut current: Option<usize> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if let Some(inner) = trimmed.strip_prefix('[') {
                let Some(name) = inner.strip_suffix(']') else {
                    return Err(ConfigError::parse(lineno, "malformed section header"));
                };
                if name.is_empty() {
                    return Err(ConfigError::parse(lineno, "empty section name"));
                }
                let pos = match parsed.iter().position(|(n, _)| n == name) {
                    Some(i) => i,
                    None => {
                        parsed.push((name.to_string(), Vec::new()));
                        parsed.len() - 1
                    }
                };
                current = Some(pos);
                continue;
            }

            let Some((key, value)) = split_option_line(trimmed) else {
                return Err(ConfigError::parse(
                    lineno,
                    format!("expected `key = value`, got {:?}", trimmed),
                ));
            };
            if key.is_empty() {
                return Err(ConfigError::parse(lineno, "empty option key"));
            }
            let Some(pos) = current else {
                return Err(ConfigError::parse(lineno, "option before any section header"));
            };
            parsed[pos].1.push((key.to_string(), value.to_string()));
        }

        for (name, options) in parsed {
            if options.is_empty() {
                continue;
            }
            let mut section = config.section(&name);
            for (key, text) in options {
                match section.set_encoded(&key, &text) {
                    Ok(()) => {}
                    Err(ConfigError::UnknownOption(option)) => {
                        warn!("Skipping unknown option '{}' in section '{}'", option, name);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(())
    }

    fn write(&mut self, writer: &mut dyn Write, config: &Config) -> Result<()> {
        for section in config.sections() {
            writeln!(writer, "[{}]", section.name())?;
            for (key, value) in section.encoded_items() {
                writeln!(writer, "{} = {}", key, value)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Split an option line on its first `=` or `:`, whichever comes first.
fn split_option_line(line: &str) -> Option<(&str, &str)> {
    let pos = match (line.find('='), line.find(':')) {
        (Some(eq), Some(colon)) => eq.min(colon),
        (Some(eq), None) => eq,
        (None, Some(colon)) => colon,
        (None, None) => return None,
    };
    let (key, rest) = line.split_at(pos);
    Some((key.trim_end(), rest[1..].trim_start()))
}

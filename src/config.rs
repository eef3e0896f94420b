//! Profile configuration file reader.
//!
//! A profile directory may carry a `profile.cfg` file made of `key = value`
//! lines. The file is optional and parsing is lenient: a missing file yields
//! an empty map and lines that do not parse are skipped. Skipped lines are
//! reported at debug level so `--verbose` can explain what was ignored.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Fixed name of the configuration file inside a profile directory
pub const CONFIG_FILE_NAME: &str = "profile.cfg";

/// Parsed configuration: unique keys, later duplicates win
pub type ConfigMap = BTreeMap<String, String>;

/// Read `profile.cfg` from `dir`.
///
/// Never fails: a missing file is the common case and an unreadable one is
/// logged as a warning. Both produce an empty map. Lines that are not valid
/// UTF-8 are skipped one at a time, like any other malformed line.
pub fn read_config(dir: &Path) -> ConfigMap {
    let path = dir.join(CONFIG_FILE_NAME);

    match fs::read(&path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "reading profile config");
            parse_config_bytes(&content)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no profile config, using defaults");
            ConfigMap::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read profile config");
            ConfigMap::new()
        }
    }
}

/// Parse the text of a config file
pub fn parse_config(content: &str) -> ConfigMap {
    let mut map = ConfigMap::new();
    for (index, line) in content.lines().enumerate() {
        add_line(&mut map, index + 1, line);
    }
    map
}

/// Parse raw file contents, decoding each line on its own
fn parse_config_bytes(content: &[u8]) -> ConfigMap {
    let mut map = ConfigMap::new();
    for (index, line) in content.split(|&b| b == b'\n').enumerate() {
        match std::str::from_utf8(line) {
            Ok(line) => add_line(&mut map, index + 1, line),
            Err(_) => tracing::debug!(line = index + 1, "skipping config line that is not valid UTF-8"),
        }
    }
    map
}

fn add_line(map: &mut ConfigMap, line_no: usize, line: &str) {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return;
    }

    match parse_line(trimmed) {
        Some((key, value)) => {
            if let Some(old) = map.insert(key.to_string(), value.to_string()) {
                tracing::debug!(line = line_no, key, old = %old, "duplicate key overrides earlier value");
            }
        }
        None => tracing::debug!(line = line_no, content = trimmed, "skipping malformed config line"),
    }
}

/// Split one line on the first `=`, dropping whitespace around it.
///
/// Returns `None` unless both key and value are non-empty.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim_end();
    let value = strip_quotes(value.trim_start());

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Remove one pair of matching outer quotes.
///
/// A value that opens with a quote but does not close with the same one
/// (or is a lone quote character) is kept verbatim.
fn strip_quotes(value: &str) -> &str {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('"' | '\'')), Some(last)) if first == last => &value[1..value.len() - 1],
        _ => value,
    }
}

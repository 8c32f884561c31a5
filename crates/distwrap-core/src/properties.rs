use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use fs4::FileExt;

use crate::error::{WrapperError, WrapperResult};

/// Ordered key-value pairs in Java properties syntax.
///
/// Insertion order is kept so a rewritten file stays diffable against the
/// one it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        let mut properties = Self::new();
        for line in logical_lines(raw) {
            let (key, value) = split_key_value(&line);
            properties.set(unescape(key), unescape(value));
        }
        properties
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Copies every entry of `other` over this set, later wins.
    pub fn extend_from(&mut self, other: &Properties) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}

/// Reads a properties file under a shared lock.
///
/// Returns `Ok(None)` when the file does not exist, which is the normal state
/// of a project that has no wrapper yet.
pub fn read_properties_file(path: &Path) -> WrapperResult<Option<Properties>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(WrapperError::io(
                format!("failed to open {}", path.display()),
                err,
            ))
        }
    };

    FileExt::lock_shared(&file)
        .map_err(|err| WrapperError::io(format!("failed to lock {}", path.display()), err))?;
    let mut raw = String::new();
    let read = file.read_to_string(&mut raw);
    let _ = FileExt::unlock(&file);
    read.map_err(|err| WrapperError::io(format!("failed to read {}", path.display()), err))?;

    Ok(Some(Properties::parse(&raw)))
}

/// Rewrites a properties file in place under an exclusive lock so concurrent
/// readers never observe a torn file.
pub fn write_properties_file(path: &Path, properties: &Properties) -> WrapperResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| WrapperError::io(format!("failed to create {}", parent.display()), err))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|err| WrapperError::io(format!("failed to open {}", path.display()), err))?;
    FileExt::lock_exclusive(&file)
        .map_err(|err| WrapperError::io(format!("failed to lock {}", path.display()), err))?;

    let written = overwrite(&mut file, properties.serialize().as_bytes());
    let _ = FileExt::unlock(&file);
    written.map_err(|err| WrapperError::io(format!("failed to write {}", path.display()), err))
}

fn overwrite(file: &mut File, payload: &[u8]) -> io::Result<()> {
    file.set_len(0)?;
    file.write_all(payload)?;
    file.flush()
}

fn logical_lines(raw: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for physical in raw.lines() {
        let trimmed = physical.trim_start_matches([' ', '\t', '\x0c']);
        let mut current = match pending.take() {
            Some(mut prefix) => {
                prefix.push_str(trimmed);
                prefix
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };

        let trailing = current.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            current.pop();
            pending = Some(current);
        } else {
            lines.push(current);
        }
    }

    if let Some(rest) = pending {
        lines.push(rest);
    }
    lines
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = index;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\x0c']);
    }
    (key, rest)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for (index, ch) in raw.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out
}

//! Show-identification payload parsing.
//!
//! Three layouts are accepted, all UTF-8 (a leading BOM is ignored):
//!
//! ```text
//! {"show": "X MEN 3D", "auditorium": 4}      JSON object
//!
//! title = X MEN 3D                            key/value lines, `=` or `:`
//! screen: 4
//!
//! X MEN 3D                                    a single bare line
//! ```
//!
//! Show-name keys are `show`, `title`, `movie` and `name`; auditorium keys are
//! `auditorium`, `screen` and `hall`. Keys are case-insensitive. Lines whose
//! key is not recognized are ignored once any recognized key is present.

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::ShowEvent;

pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_AUDITORIUM_CHARS: usize = 32;

const NAME_KEYS: &[&str] = &["show", "title", "movie", "name"];
const AUDITORIUM_KEYS: &[&str] = &["auditorium", "screen", "hall"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("upload is empty")]
    Empty,

    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("upload is not valid UTF-8")]
    InvalidEncoding,

    #[error("upload contains control characters")]
    ControlCharacters,

    #[error("no show name in upload")]
    MissingShowName,

    #[error("show name exceeds {} characters", MAX_NAME_CHARS)]
    NameTooLong,

    #[error("auditorium exceeds {} characters", MAX_AUDITORIUM_CHARS)]
    AuditoriumTooLong,

    #[error("unrecognized upload: {0}")]
    Unrecognized(String),
}

#[derive(Debug, Default)]
struct Fields {
    name: Option<String>,
    auditorium: Option<String>,
}

/// Parse an upload into a show event.
///
/// Never returns a partially filled event: any doubt is a `ParseError`.
pub fn parse(bytes: &[u8], max_bytes: usize) -> Result<ShowEvent, ParseError> {
    if bytes.len() > max_bytes {
        return Err(ParseError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidEncoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    if text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(ParseError::ControlCharacters);
    }

    let fields = if text.trim_start().starts_with('{') {
        parse_json(text)?
    } else {
        parse_lines(text)?
    };

    let name = fields
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(ParseError::MissingShowName)?;
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ParseError::NameTooLong);
    }

    let auditorium = fields
        .auditorium
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    if let Some(aud) = &auditorium {
        if aud.chars().count() > MAX_AUDITORIUM_CHARS {
            return Err(ParseError::AuditoriumTooLong);
        }
    }

    // JSON escapes can smuggle control characters past the raw-text check.
    if name.chars().chain(auditorium.iter().flat_map(|a| a.chars())).any(char::is_control) {
        return Err(ParseError::ControlCharacters);
    }

    Ok(ShowEvent::new(name, auditorium))
}

fn parse_json(text: &str) -> Result<Fields, ParseError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ParseError::Unrecognized(format!("invalid JSON: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(ParseError::Unrecognized("expected a JSON object".to_string()));
    };

    let name = match lookup(&map, NAME_KEYS) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(ParseError::Unrecognized(
                "show name must be a string".to_string(),
            ))
        }
    };
    let auditorium = match lookup(&map, AUDITORIUM_KEYS) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        Some(_) => {
            return Err(ParseError::Unrecognized(
                "auditorium must be a string or an integer".to_string(),
            ))
        }
    };

    Ok(Fields { name, auditorium })
}

/// First of `keys` present in `map`, compared case-insensitively.
fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        map.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

enum Key {
    Name,
    Auditorium,
}

/// Split `key = value` / `key: value`, returning only recognized keys.
fn keyed(line: &str) -> Option<(Key, &str)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim().to_ascii_lowercase();
    let value = unquote(line[idx + 1..].trim());

    if NAME_KEYS.contains(&key.as_str()) {
        Some((Key::Name, value))
    } else if AUDITORIUM_KEYS.contains(&key.as_str()) {
        Some((Key::Auditorium, value))
    } else {
        None
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_lines(text: &str) -> Result<Fields, ParseError> {
    let mut fields = Fields::default();
    let mut saw_key = false;
    let mut bare = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match keyed(line) {
            Some((Key::Name, value)) => {
                saw_key = true;
                fields.name.get_or_insert_with(|| value.to_string());
            }
            Some((Key::Auditorium, value)) => {
                saw_key = true;
                fields.auditorium.get_or_insert_with(|| value.to_string());
            }
            None => bare.push(line),
        }
    }

    if saw_key {
        return Ok(fields);
    }

    match bare.as_slice() {
        [only] => Ok(Fields {
            name: Some(only.to_string()),
            auditorium: None,
        }),
        _ => Err(ParseError::Unrecognized(format!(
            "{} lines without a recognized key",
            bare.len()
        ))),
    }
}

//! Filename templates such as `{artist}/{artist} - {title}`.
//!
//! Placeholders name keys of a [`TrackInfo`]; `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::url_model::{sanitize, Platform};

/// Value of one track metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TrackValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for TrackValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackValue::Int(n) => write!(f, "{}", n),
            TrackValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TrackValue {
    fn from(s: &str) -> Self {
        TrackValue::Text(s.to_string())
    }
}

impl From<i64> for TrackValue {
    fn from(n: i64) -> Self {
        TrackValue::Int(n)
    }
}

/// Metadata fields available to filename templates.
pub type TrackInfo = BTreeMap<String, TrackValue>;

/// Keys every resolved track provides.
pub const TRACK_INFO_KEYS: [&str; 3] = ["item_id", "artist", "title"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
    #[error("unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),
}

/// Substitutes every `{key}` in `format` with the matching value of `info`.
pub fn render(format: &str, info: &TrackInfo) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(format.len() + 32);
    let mut rest = format;
    let mut pos = 0usize;

    while let Some(i) = rest.find(['{', '}']) {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];
        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            pos += i + 2;
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            pos += i + 2;
        } else if tail.starts_with('}') {
            return Err(TemplateError::UnmatchedClose(pos + i));
        } else {
            let close = tail.find('}').ok_or(TemplateError::Unterminated(pos + i))?;
            let key = &tail[1..close];
            let value = info
                .get(key)
                .ok_or_else(|| TemplateError::UnknownPlaceholder(key.to_string()))?;
            out.push_str(&value.to_string());
            rest = &tail[close + 1..];
            pos += i + close + 1;
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Sanitizes every text value for `platform`; numbers pass through untouched.
pub fn sanitize_track_info(info: &TrackInfo, platform: Platform) -> TrackInfo {
    info.iter()
        .map(|(k, v)| {
            let v = match v {
                TrackValue::Text(s) => TrackValue::Text(sanitize(s, platform)),
                other => other.clone(),
            };
            (k.clone(), v)
        })
        .collect()
}

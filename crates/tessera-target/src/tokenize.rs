//! Splitting raw target strings into option and array tokens.

use crate::codec::{ESCAPE, QUOTE};
use crate::error::{Result, TargetError};

/// Split `s` on unquoted occurrences of `separator`.
///
/// Escape sequences and quotes are copied into the token verbatim so that
/// [`crate::codec::interpret`] can decode them later. Empty tokens are dropped.
pub fn split(s: &str, separator: char) -> Result<Vec<String>> {
    let chars: Vec<char> = s.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c == separator && !quoted {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            pos += 1;
        } else if c == ESCAPE && pos + 1 < chars.len() {
            current.push(ESCAPE);
            current.push(chars[pos + 1]);
            pos += 2;
        } else {
            if c == QUOTE {
                quoted = !quoted;
            }
            current.push(c);
            pos += 1;
        }
    }

    if quoted {
        return Err(TargetError::value("Mismatched quotes '' in string"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Split on unquoted spaces.
pub fn split_whitespace(s: &str) -> Result<Vec<String>> {
    split(s, ' ')
}

/// Split on unquoted commas.
pub fn split_comma(s: &str) -> Result<Vec<String>> {
    split(s, ',')
}

/// Strip the leading run of dashes from an option token.
pub fn remove_prefix_dashes(s: &str) -> Result<&str> {
    let stripped = s.trim_start_matches('-');
    if stripped.len() == s.len() {
        return Err(TargetError::value(format!(
            "Attribute keys should start with '-', not an attribute key: {s}"
        )));
    }
    if stripped.is_empty() {
        return Err(TargetError::value(format!("Not an attribute key: {s}")));
    }
    Ok(stripped)
}

/// Byte offset of the first occurrence of `target` not protected by an escape.
fn find_unescaped(s: &str, target: char) -> Option<usize> {
    let mut escaping = false;
    for (i, c) in s.char_indices() {
        if escaping {
            escaping = false;
        } else if c == ESCAPE {
            escaping = true;
        } else if c == target {
            return Some(i);
        }
    }
    None
}

/// A key/value pair pulled out of the option token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    /// Attribute key with dashes already stripped.
    pub key: String,
    /// Raw, still-escaped value text.
    pub value: String,
    /// How many tokens the pair occupied (1 or 2).
    pub consumed: usize,
}

/// Extract a key/value pair from `s` and the token after it.
///
/// - `key=value` consumes one token.
/// - `key value` consumes two, when `next` exists and does not start with `-`.
/// - a bare `key` is a flag with value `"1"`.
pub fn parse_kv_pair(s: &str, next: Option<&str>) -> Result<KvPair> {
    if let Some(pos) = find_unescaped(s, '=') {
        let (key, value) = (&s[..pos], &s[pos + 1..]);
        if key.is_empty() || value.is_empty() {
            return Err(TargetError::value(format!(
                "Empty attribute key or value in \"{s}\""
            )));
        }
        return Ok(KvPair {
            key: key.to_string(),
            value: value.to_string(),
            consumed: 1,
        });
    }
    match next {
        Some(next) if !next.is_empty() && !next.starts_with('-') => Ok(KvPair {
            key: s.to_string(),
            value: next.to_string(),
            consumed: 2,
        }),
        _ => Ok(KvPair {
            key: s.to_string(),
            value: "1".to_string(),
            consumed: 1,
        }),
    }
}

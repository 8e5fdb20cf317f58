//! Canonical string form of targets.
//!
//! `kind -keys=a,b -attr1=v1 -attr2=v2`, with attributes sorted by key.
//! Array elements are escaped a second time because the array text is itself
//! interpreted once before being split on commas.

use crate::codec::{is_quoted, join, quote, uninterpret};
use crate::target::Target;
use crate::value::{ConfigMap, Value};

/// Render an atomic value. `None` for values with no flat form.
pub fn stringify_atomic(value: &Value) -> Option<String> {
    match value {
        Value::Bool(v) => Some(u8::from(*v).to_string()),
        Value::Int(v) => Some(v.to_string()),
        Value::Str(s) => Some(quote_if(uninterpret(s), ' ')),
        Value::Target(t) => Some(quote_if(uninterpret(t.str()), ' ')),
        Value::None | Value::Array(_) | Value::Map(_) => None,
    }
}

/// Render an array as comma-joined, individually escaped elements.
pub fn stringify_array(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .filter_map(stringify_atomic)
        .map(|s| quote_if(uninterpret(&s), ','))
        .collect();
    join(&elements, ',')
}

fn quote_if(s: String, special: char) -> String {
    if s.contains(special) && !is_quoted(&s) {
        quote(&s)
    } else {
        s
    }
}

/// Render attributes as `-key=value` options sorted by key. Undefined and
/// empty values are skipped, as are maps, which have no flat form.
pub fn attrs_to_raw(attrs: &ConfigMap) -> String {
    let mut options = Vec::new();
    for (key, value) in attrs {
        let rendered = match value {
            Value::Array(items) => Some(quote_if(stringify_array(items), ' ')),
            other => stringify_atomic(other),
        };
        match rendered {
            Some(text) if !text.is_empty() => options.push(format!("-{key}={text}")),
            _ => {}
        }
    }
    join(&options, ' ')
}

pub(crate) fn target_to_string(target: &Target) -> String {
    let mut out = target.kind().name().to_string();
    if !target.keys().is_empty() {
        out.push_str(" -keys=");
        out.push_str(&join(target.keys(), ','));
    }
    let attrs = attrs_to_raw(target.attrs());
    if !attrs.is_empty() {
        out.push(' ');
        out.push_str(&attrs);
    }
    out
}

//! Normalization of strings and structured configs into targets.
//!
//! Strings are tried in order as a registered tag, a `{`-prefixed
//! structured config, and finally a raw `kind -key=value ...` string. Raw
//! strings are tokenized into a config map and then normalized the same way
//! as structured input.

use std::sync::Arc;

use tracing::debug;

use crate::coerce;
use crate::device::{query_device, DeviceType};
use crate::error::{Result, TargetError};
use crate::kind::{KindExtension, TargetKind};
use crate::resolver::Resolver;
use crate::target::Target;
use crate::tokenize::{parse_kv_pair, remove_prefix_dashes, split_whitespace};
use crate::value::{ConfigMap, Value};

const KIND: &str = "kind";
const TAG: &str = "tag";
const KEYS: &str = "keys";
const DEVICE: &str = "device";
const HOST: &str = "host";
const FEATURES: &str = "features";
const FROM_DEVICE: &str = "from_device";
const TARGET_DEVICE_TYPE: &str = "target_device_type";

/// Resolve a kind by name.
pub(crate) fn resolve_kind(name: &str, resolver: &Resolver<'_>) -> Result<Arc<TargetKind>> {
    resolver
        .kinds()
        .lookup_kind(name)
        .ok_or_else(|| TargetError::value(format!("Target kind \"{name}\" is not defined")))
}

/// Build a target from a tag name, a `{`-config string, or a raw string.
pub(crate) fn from_string(s: &str, resolver: &Resolver<'_>) -> Result<Arc<Target>> {
    if let Some(target) = resolver.tags().and_then(|tags| tags.lookup_tag(s)) {
        debug!(tag = s, "resolved target from tag");
        return Ok(target);
    }
    if s.starts_with('{') {
        return from_config_string(s, resolver);
    }
    from_raw_string(s, resolver)
}

fn from_config_string(s: &str, resolver: &Resolver<'_>) -> Result<Arc<Target>> {
    let loader = resolver.config_loader().ok_or_else(|| {
        TargetError::value("no structured config loader is available to read a '{' target string")
    })?;
    let config = loader
        .load_config(s)?
        .ok_or_else(|| TargetError::value("Cannot load config dict with the config loader"))?;
    from_config(config, resolver)
}

fn from_raw_string(s: &str, resolver: &Resolver<'_>) -> Result<Arc<Target>> {
    let in_target = |e: TargetError| e.with_suffix(format!(", during parsing target `{s}`"));

    let options = split_whitespace(s).map_err(in_target)?;
    let Some(name) = options.first() else {
        return Err(TargetError::value("Cannot parse empty target string"));
    };
    let kind = resolve_kind(name, resolver)?;

    let mut config = ConfigMap::new();
    config.insert(KIND.to_string(), Value::Str(name.clone()));

    let mut iter = 1;
    while iter < options.len() {
        let next = options.get(iter + 1).map(String::as_str);
        let kv = remove_prefix_dashes(&options[iter])
            .and_then(|option| parse_kv_pair(option, next))
            .map_err(in_target)?;
        iter += kv.consumed;

        let key = kv.key;
        let value = if config.contains_key(&key) {
            Err(TargetError::value(format!(
                "The key \"{key}\" appears more than once"
            )))
        } else {
            kind.find_type_info(&key)
                .and_then(|ty| coerce::parse_str(&kv.value, ty, resolver))
        }
        .map_err(|e| e.with_suffix(format!(", during parsing target[\"{key}\"]")))?;
        config.insert(key, value);
    }

    from_config(config, resolver)
}

/// Normalize a structured config into a target.
///
/// The phases run in a fixed order: kind (and the kind's target parser),
/// tag, keys, host, attributes, device query, defaults, and finally the
/// kind's attribute preprocessor.
pub(crate) fn from_config(mut config: ConfigMap, resolver: &Resolver<'_>) -> Result<Arc<Target>> {
    if config.contains_key(FEATURES) {
        return Err(TargetError::value(
            "Target features should be generated by the target parser",
        ));
    }

    // kind
    let kind = match config.get(KIND) {
        Some(Value::Str(name)) => resolve_kind(name, resolver)?,
        Some(other) => {
            return Err(TargetError::type_error(format!(
                "Expect type of field \"kind\" is String, but get type: {}",
                other.type_key()
            )));
        }
        None => return Err(TargetError::value("Field \"kind\" is not found")),
    };
    let mut features = ConfigMap::new();
    if let KindExtension::Parser(parser) = kind.extension() {
        debug!(kind = kind.name(), "running target parser");
        config = parser(config)?;
        if let Some(produced) = config.remove(FEATURES) {
            features = match &produced {
                Value::Map(map) => coerce::string_keyed(map)?,
                other => {
                    return Err(TargetError::type_error(format!(
                        "Expect target parser to produce a map of features, but get type: {}",
                        other.type_key()
                    )));
                }
            };
        }
    }
    config.remove(KIND);

    // tag
    let tag = match config.remove(TAG) {
        Some(Value::Str(tag)) => tag,
        Some(other) => {
            return Err(TargetError::type_error(format!(
                "Expect type of field \"tag\" is String, but get type: {}",
                other.type_key()
            )));
        }
        None => String::new(),
    };

    // keys
    let mut keys = Vec::new();
    let user_keys = config.remove(KEYS);
    match &user_keys {
        Some(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::Str(key) => keys.push(key.clone()),
                    other => {
                        return Err(TargetError::type_error(format!(
                            "Expect 'keys' to be an array of strings, but it contains an element of type: {}",
                            other.type_key()
                        )));
                    }
                }
            }
        }
        Some(other) => {
            return Err(TargetError::type_error(format!(
                "Expect type of field \"keys\" is Array, but get type: {}",
                other.type_key()
            )));
        }
        None => {}
    }
    if let Some(Value::Str(device)) = config.get(DEVICE) {
        keys.push(device.clone());
    }
    if user_keys.is_none() {
        keys.extend(kind.default_keys().iter().cloned());
    }
    let keys = deduplicate_keys(keys);

    // host
    let host = match config.remove(HOST) {
        Some(Value::None) | None => None,
        Some(value) => Some(
            Target::from_value(&value, resolver)
                .map_err(|e| e.with_suffix(format!(", during parsing target[\"{HOST}\"]")))?,
        ),
    };

    // attributes
    let mut attrs = ConfigMap::new();
    for (key, value) in &config {
        let parsed = kind
            .find_type_info(key)
            .and_then(|ty| coerce::parse_value(value, ty, resolver))
            .map_err(|e| e.with_suffix(format!(", during parsing target[\"{key}\"]")))?;
        attrs.insert(key.clone(), parsed);
    }

    // explicit attributes win over queried ones
    if let Some(from_device) = attrs.remove(FROM_DEVICE) {
        let device_id = from_device.as_int().unwrap_or_default();
        let device_type = attrs
            .get(TARGET_DEVICE_TYPE)
            .and_then(Value::as_int)
            .and_then(|v| i32::try_from(v).ok())
            .map(DeviceType)
            .unwrap_or_else(|| kind.default_device_type());
        let queried = query_device(
            resolver.devices(),
            &kind,
            device_type,
            device_id,
            resolver.is_strict_device_check(),
        )?;
        for (key, value) in queried {
            attrs.entry(key).or_insert(value);
        }
    }

    for (key, default) in kind.defaults() {
        if !attrs.contains_key(key) {
            attrs.insert(key.to_string(), default.clone());
        }
    }

    if let KindExtension::Preprocessor(preprocess) = kind.extension() {
        debug!(kind = kind.name(), "running attribute preprocessor");
        attrs = preprocess(attrs)?;
    }

    Ok(Arc::new(Target::from_parts(
        kind, tag, keys, attrs, features, host,
    )))
}

/// Drop repeated keys, keeping the first occurrence of each.
fn deduplicate_keys(keys: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keys.len());
    for key in keys {
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

//! The compilation target descriptor.
//!
//! A [`Target`] is immutable once built and is shared through `Arc`.
//! Derived targets (with a different host, without a host) are fresh copies.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::config;
use crate::device::DeviceType;
use crate::error::{Result, TargetError};
use crate::kind::TargetKind;
use crate::resolver::Resolver;
use crate::stringify;
use crate::value::{ConfigMap, Value};

/// A compilation target: kind, tag, keys, typed attributes, parser-derived
/// features, and an optional host target.
pub struct Target {
    kind: Arc<TargetKind>,
    tag: String,
    keys: Vec<String>,
    attrs: ConfigMap,
    features: ConfigMap,
    host: Option<Arc<Target>>,
    repr: OnceLock<String>,
}

impl Target {
    pub(crate) fn from_parts(
        kind: Arc<TargetKind>,
        tag: String,
        keys: Vec<String>,
        attrs: ConfigMap,
        features: ConfigMap,
        host: Option<Arc<Target>>,
    ) -> Self {
        Target {
            kind,
            tag,
            keys,
            attrs,
            features,
            host,
            repr: OnceLock::new(),
        }
    }

    /// Build a target from a tag name, a `{`-prefixed config, or a raw
    /// target string such as `llvm -mcpu=skylake -keys=cpu`.
    ///
    /// Failures keep their kind and name the input.
    pub fn parse(s: &str, resolver: &Resolver<'_>) -> Result<Arc<Target>> {
        config::from_string(s, resolver)
            .map_err(|e| e.with_suffix(format!(". Target creation from string failed: {s}")))
    }

    /// Build a target from a structured config. `kind` is required.
    pub fn from_config(config: ConfigMap, resolver: &Resolver<'_>) -> Result<Arc<Target>> {
        let shown = Value::from_config(config.clone());
        config::from_config(config, resolver).map_err(|e| {
            e.with_suffix(format!(". Target creation from config dict failed: {shown}"))
        })
    }

    /// Build a target from whatever form a host or nested target arrives in:
    /// an existing target (shared as is), a string, or a string-keyed map.
    pub fn from_value(value: &Value, resolver: &Resolver<'_>) -> Result<Arc<Target>> {
        match value {
            Value::Target(target) => Ok(Arc::clone(target)),
            Value::Str(s) => Target::parse(s, resolver),
            Value::Map(map) => {
                let config = crate::coerce::string_keyed(map)?;
                Target::from_config(config, resolver)
            }
            other => Err(TargetError::type_error(format!(
                "Cannot create target with type: {}",
                other.type_key()
            ))),
        }
    }

    /// A copy of `target` whose host is `host`.
    pub fn with_host(target: &Target, host: Arc<Target>) -> Arc<Target> {
        Arc::new(Target {
            host: Some(host),
            ..target.clone()
        })
    }

    /// `target` without its host. Returns the same object when there is no host.
    pub fn without_host(target: &Arc<Target>) -> Arc<Target> {
        if target.host.is_none() {
            return Arc::clone(target);
        }
        Arc::new(Target {
            host: None,
            ..(**target).clone()
        })
    }

    pub fn kind(&self) -> &Arc<TargetKind> {
        &self.kind
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn attrs(&self) -> &ConfigMap {
        &self.attrs
    }

    pub fn features(&self) -> &ConfigMap {
        &self.features
    }

    pub fn host(&self) -> Option<&Arc<Target>> {
        self.host.as_ref()
    }

    pub fn get_attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn get_feature(&self, key: &str) -> Option<&Value> {
        self.features.get(key)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// The entries of the `libs` attribute.
    pub fn libs(&self) -> BTreeSet<String> {
        self.get_attr("libs")
            .and_then(Value::as_str_array)
            .map(|libs| libs.into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    /// The `target_device_type` attribute if set, else the kind's default.
    pub fn target_device_type(&self) -> DeviceType {
        self.get_attr("target_device_type")
            .and_then(Value::as_int)
            .and_then(|v| i32::try_from(v).ok())
            .map(DeviceType)
            .unwrap_or_else(|| self.kind.default_device_type())
    }

    /// Canonical flat string form, computed once per object.
    ///
    /// Host and features are not encoded.
    pub fn str(&self) -> &str {
        self.repr.get_or_init(|| stringify::target_to_string(self))
    }

    /// A structured form mirroring kind, tag, keys, and attributes, with the
    /// host exported recursively.
    pub fn export(&self) -> ConfigMap {
        let mut out = ConfigMap::new();
        out.insert("kind".into(), Value::from(self.kind.name()));
        out.insert("tag".into(), Value::from(self.tag.as_str()));
        out.insert("keys".into(), Value::from(self.keys.clone()));
        if let Some(host) = &self.host {
            out.insert("host".into(), Value::from_config(host.export()));
        }
        for (k, v) in &self.attrs {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    /// A verbose rendering of every field, the host included.
    pub fn to_debug_string(&self) -> String {
        let mut out = format!(
            "Target(id={:x}, kind='{}'",
            self as *const Target as usize,
            self.kind.name()
        );
        if !self.tag.is_empty() {
            out.push_str(&format!(", tag='{}'", self.tag));
        }
        if !self.keys.is_empty() {
            let keys: Vec<String> = self.keys.iter().map(|k| format!("'{k}'")).collect();
            out.push_str(&format!(", keys={{{}}}", keys.join(", ")));
        }
        if !self.attrs.is_empty() {
            let attrs: Vec<String> = self
                .attrs
                .iter()
                .map(|(k, v)| format!("'{k}': {v}"))
                .collect();
            out.push_str(&format!(", attrs={{{}}}", attrs.join(", ")));
        }
        if let Some(host) = &self.host {
            out.push_str(&format!(", host={}", host.to_debug_string()));
        }
        out.push(')');
        out
    }

    fn identity(&self) -> (&str, &str, &[String], &ConfigMap, &ConfigMap, &Option<Arc<Target>>) {
        let tag = if self.kind.tag_in_identity() {
            self.tag.as_str()
        } else {
            ""
        };
        (
            self.kind.name(),
            tag,
            &self.keys,
            &self.attrs,
            &self.features,
            &self.host,
        )
    }
}

/// Rebind `target` to carry `host` (`None` clears it), then rebind `host` to
/// the target's host.
pub fn check_and_update_host_consistency(target: &mut Arc<Target>, host: &mut Option<Arc<Target>>) {
    let updated = match host.take() {
        Some(h) => Target::with_host(target, h),
        None => Target::without_host(target),
    };
    *target = updated;
    *host = target.host().cloned();
}

impl Clone for Target {
    fn clone(&self) -> Self {
        Target {
            kind: Arc::clone(&self.kind),
            tag: self.tag.clone(),
            keys: self.keys.clone(),
            attrs: self.attrs.clone(),
            features: self.features.clone(),
            host: self.host.clone(),
            repr: self.repr.clone(),
        }
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Target {}

impl PartialOrd for Target {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Target {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl Hash for Target {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.str())
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("kind", &self.kind.name())
            .field("tag", &self.tag)
            .field("keys", &self.keys)
            .field("attrs", &self.attrs)
            .field("features", &self.features)
            .field("host", &self.host)
            .finish()
    }
}

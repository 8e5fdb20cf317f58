//! Target kind schemas.
//!
//! A [`TargetKind`] is the type contract for one family of targets: the
//! attributes it accepts and their types, default values, default keys, the
//! device type it compiles for, and at most one normalization hook.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::coerce;
use crate::device::DeviceType;
use crate::error::{Result, TargetError};
use crate::value::{ConfigMap, Value, ValueType};

/// Rewrites the fully resolved attribute map. Its output is trusted verbatim.
pub type AttrsPreprocessor = Arc<dyn Fn(ConfigMap) -> Result<ConfigMap> + Send + Sync>;

/// Rewrites the whole structured config before attributes are parsed.
///
/// A `features` entry in the returned map becomes the target's feature table.
pub type TargetParser = Arc<dyn Fn(ConfigMap) -> Result<ConfigMap> + Send + Sync>;

/// The optional normalization hook of a kind. The two hooks are exclusive.
#[derive(Clone, Default)]
pub enum KindExtension {
    #[default]
    None,
    Preprocessor(AttrsPreprocessor),
    Parser(TargetParser),
}

impl fmt::Debug for KindExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindExtension::None => write!(f, "None"),
            KindExtension::Preprocessor(_) => write!(f, "Preprocessor(..)"),
            KindExtension::Parser(_) => write!(f, "Parser(..)"),
        }
    }
}

/// Declared type and default of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSchema {
    pub value_type: ValueType,
    pub default: Option<Value>,
}

/// Schema for one kind of target.
#[derive(Debug)]
pub struct TargetKind {
    name: String,
    default_device_type: DeviceType,
    default_keys: Vec<String>,
    attrs: BTreeMap<String, AttrSchema>,
    extension: KindExtension,
    tag_in_identity: bool,
}

impl TargetKind {
    /// Start a kind definition. The attributes every kind shares are
    /// registered up front.
    pub fn builder(name: impl Into<String>, default_device_type: DeviceType) -> TargetKindBuilder {
        TargetKindBuilder::new(name.into(), default_device_type)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_device_type(&self) -> DeviceType {
        self.default_device_type
    }

    pub fn default_keys(&self) -> &[String] {
        &self.default_keys
    }

    pub fn extension(&self) -> &KindExtension {
        &self.extension
    }

    /// Whether two targets that differ only in `tag` are distinct.
    pub fn tag_in_identity(&self) -> bool {
        self.tag_in_identity
    }

    /// Look up the schema of one attribute.
    pub fn attr(&self, key: &str) -> Option<&AttrSchema> {
        self.attrs.get(key)
    }

    /// All attribute schemas, ordered by key.
    pub fn attrs(&self) -> &BTreeMap<String, AttrSchema> {
        &self.attrs
    }

    /// Look up an attribute type, failing with the list of valid keys.
    pub fn find_type_info(&self, key: &str) -> Result<&ValueType> {
        match self.attrs.get(key) {
            Some(schema) => Ok(&schema.value_type),
            None => {
                let candidates: Vec<&str> = self.attrs.keys().map(String::as_str).collect();
                Err(TargetError::type_error(format!(
                    ": Cannot recognize '{key}'. Candidates are: {}",
                    candidates.join(", ")
                )))
            }
        }
    }

    /// Attribute defaults, ordered by key.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs
            .iter()
            .filter_map(|(k, s)| s.default.as_ref().map(|d| (k.as_str(), d)))
    }
}

impl PartialEq for TargetKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TargetKind {}

/// Builder for [`TargetKind`].
pub struct TargetKindBuilder {
    name: String,
    default_device_type: DeviceType,
    default_keys: Vec<String>,
    attrs: BTreeMap<String, AttrSchema>,
    preprocessor: Option<AttrsPreprocessor>,
    parser: Option<TargetParser>,
    tag_in_identity: bool,
}

impl TargetKindBuilder {
    fn new(name: String, default_device_type: DeviceType) -> Self {
        let builder = TargetKindBuilder {
            name,
            default_device_type,
            default_keys: Vec::new(),
            attrs: BTreeMap::new(),
            preprocessor: None,
            parser: None,
            tag_in_identity: true,
        };
        builder
            .add_attr_option("tag", ValueType::Str)
            .add_attr_option("keys", ValueType::array_of(ValueType::Str))
            .add_attr_option("device", ValueType::Str)
            .add_attr_option("model", ValueType::Str)
            .add_attr_option("libs", ValueType::array_of(ValueType::Str))
            .add_attr_option("host", ValueType::Target)
            .add_attr_option("from_device", ValueType::Int)
            .add_attr_option("target_device_type", ValueType::Int)
    }

    /// Declare an attribute without a default.
    pub fn add_attr_option(mut self, key: impl Into<String>, value_type: ValueType) -> Self {
        self.attrs.insert(
            key.into(),
            AttrSchema {
                value_type,
                default: None,
            },
        );
        self
    }

    /// Declare an attribute with a default installed when it is not given.
    pub fn add_attr_option_with_default(
        mut self,
        key: impl Into<String>,
        value_type: ValueType,
        default: impl Into<Value>,
    ) -> Self {
        self.attrs.insert(
            key.into(),
            AttrSchema {
                value_type,
                default: Some(default.into()),
            },
        );
        self
    }

    pub fn set_default_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_attrs_preprocessor<F>(mut self, f: F) -> Self
    where
        F: Fn(ConfigMap) -> Result<ConfigMap> + Send + Sync + 'static,
    {
        self.preprocessor = Some(Arc::new(f));
        self
    }

    pub fn set_target_parser<F>(mut self, f: F) -> Self
    where
        F: Fn(ConfigMap) -> Result<ConfigMap> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(f));
        self
    }

    /// Treat `tag` as a debug label that does not affect equality or hashing.
    pub fn tag_is_debug_only(mut self) -> Self {
        self.tag_in_identity = false;
        self
    }

    /// Validate and finish the kind.
    ///
    /// Fails if both hooks are set, or if a default does not match the
    /// declared attribute type.
    pub fn build(self) -> Result<TargetKind> {
        let extension = match (self.preprocessor, self.parser) {
            (Some(_), Some(_)) => {
                return Err(TargetError::InvalidKind {
                    kind: self.name,
                    detail: "Cannot use both set_attrs_preprocessor and set_target_parser".into(),
                });
            }
            (Some(p), None) => KindExtension::Preprocessor(p),
            (None, Some(p)) => KindExtension::Parser(p),
            (None, None) => KindExtension::None,
        };

        for (key, schema) in &self.attrs {
            if let Some(default) = &schema.default {
                if !coerce::conforms(default, &schema.value_type) {
                    return Err(TargetError::InvalidKind {
                        kind: self.name.clone(),
                        detail: format!(
                            "default for '{key}' has type {} but {} is declared",
                            default.type_key(),
                            schema.value_type
                        ),
                    });
                }
            }
        }

        Ok(TargetKind {
            name: self.name,
            default_device_type: self.default_device_type,
            default_keys: self.default_keys,
            attrs: self.attrs,
            extension,
            tag_in_identity: self.tag_in_identity,
        })
    }
}

/// Schema lookup by kind name.
pub trait KindLookup {
    fn lookup_kind(&self, name: &str) -> Option<Arc<TargetKind>>;
}

/// An in-memory kind registry.
#[derive(Debug, Default, Clone)]
pub struct KindRegistry {
    kinds: BTreeMap<String, Arc<TargetKind>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. Names must be unique.
    pub fn register(&mut self, kind: TargetKind) -> Result<Arc<TargetKind>> {
        if self.kinds.contains_key(kind.name()) {
            return Err(TargetError::InvalidKind {
                kind: kind.name().to_string(),
                detail: "a kind with this name is already registered".into(),
            });
        }
        let kind = Arc::new(kind);
        self.kinds.insert(kind.name().to_string(), Arc::clone(&kind));
        Ok(kind)
    }

    /// Registered kind names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.kinds.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TargetKind>> {
        self.kinds.values()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl KindLookup for KindRegistry {
    fn lookup_kind(&self, name: &str) -> Option<Arc<TargetKind>> {
        self.kinds.get(name).cloned()
    }
}

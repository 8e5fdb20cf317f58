//! Named, prebuilt targets.
//!
//! A tag is a name such as `nvidia/a100` that stands for a complete target.
//! Tags are checked before a string is parsed as a raw target. Tag sets are
//! configured in `*.tags.toml` files:
//!
//! ```toml
//! [tag."nvidia/a100"]
//! kind = "cuda"
//! arch = "sm_80"
//! host = "llvm -mcpu=skylake"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, TargetError};
use crate::resolver::Resolver;
use crate::target::Target;
use crate::value::{ConfigMap, Value};

/// Tag lookup by name.
pub trait TagLookup {
    fn lookup_tag(&self, name: &str) -> Option<Arc<Target>>;
}

/// An in-memory set of tags.
#[derive(Debug, Default, Clone)]
pub struct TagRegistry {
    tags: BTreeMap<String, Arc<Target>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tag built from `config`. The target's `tag` field is set
    /// to `name`. An existing tag of the same name is replaced.
    pub fn register(
        &mut self,
        name: &str,
        mut config: ConfigMap,
        resolver: &Resolver<'_>,
    ) -> Result<Arc<Target>> {
        config.insert("tag".into(), Value::from(name));
        let target = Target::from_config(config, resolver)?;
        self.tags.insert(name.to_string(), Arc::clone(&target));
        Ok(target)
    }

    /// Register tags from the text of a tag file.
    ///
    /// Returns the names that were added, in name order.
    pub fn load_toml_str(&mut self, text: &str, resolver: &Resolver<'_>) -> Result<Vec<String>> {
        let doc: toml::Table = toml::from_str(text)?;
        let Some(section) = doc.get("tag") else {
            return Ok(Vec::new());
        };
        let toml::Value::Table(section) = section else {
            return Err(TargetError::type_error(
                "Expect [tag] in a tag file to be a table",
            ));
        };

        let mut added = Vec::new();
        for (name, body) in section {
            let Value::Map(map) = toml_to_value(body)
                .map_err(|e| e.with_suffix(format!(", in tag \"{name}\"")))?
            else {
                return Err(TargetError::type_error(format!(
                    "Expect tag \"{name}\" to be a table"
                )));
            };
            let config = crate::coerce::string_keyed(&map)?;
            self.register(name, config, resolver)?;
            debug!(tag = name.as_str(), "registered tag");
            added.push(name.clone());
        }
        Ok(added)
    }

    /// Register tags from a tag file.
    pub fn load_file(&mut self, path: &Path, resolver: &Resolver<'_>) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(path)?;
        self.load_toml_str(&text, resolver)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tags.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TagLookup for TagRegistry {
    fn lookup_tag(&self, name: &str) -> Option<Arc<Target>> {
        self.tags.get(name).cloned()
    }
}

/// Find all `*.tags.toml` files directly inside `dir`, sorted by path.
pub fn discover_tag_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_tag_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".tags.toml"));
        if is_tag_file && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn toml_to_value(value: &toml::Value) -> Result<Value> {
    match value {
        toml::Value::String(s) => Ok(Value::Str(s.clone())),
        toml::Value::Integer(i) => Ok(Value::Int(*i)),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Array(items) => items
            .iter()
            .map(toml_to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        toml::Value::Table(table) => {
            let mut map = BTreeMap::new();
            for (k, v) in table {
                map.insert(Value::Str(k.clone()), toml_to_value(v)?);
            }
            Ok(Value::Map(map))
        }
        toml::Value::Float(_) | toml::Value::Datetime(_) => Err(TargetError::type_error(format!(
            "Unsupported value in tag file: {value}"
        ))),
    }
}

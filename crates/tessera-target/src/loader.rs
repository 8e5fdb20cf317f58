//! Loading `{`-prefixed structured target strings.

use std::collections::BTreeMap;

use crate::error::{Result, TargetError};
use crate::value::{ConfigMap, Value};

/// Turns the text of a structured target string into a config.
///
/// `Ok(None)` means the text parsed but holds no config.
pub trait ConfigLoader {
    fn load_config(&self, text: &str) -> Result<Option<ConfigMap>>;
}

/// Reads structured target strings as JSON objects.
///
/// `null` loads as no config; any other non-object is a value error.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonConfigLoader;

impl ConfigLoader for JsonConfigLoader {
    fn load_config(&self, text: &str) -> Result<Option<ConfigMap>> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        match json {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(object) => {
                let mut config = ConfigMap::new();
                for (k, v) in object {
                    config.insert(k, json_to_value(v)?);
                }
                Ok(Some(config))
            }
            other => Err(TargetError::value(format!(
                "Expect a JSON object for a target config, but get: {other}"
            ))),
        }
    }
}

/// Convert a JSON value. Non-integral numbers have no attribute type.
pub fn json_to_value(json: serde_json::Value) -> Result<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::None),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Int).ok_or_else(|| {
            TargetError::type_error(format!("Unsupported number in target config: {n}"))
        }),
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(json_to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        serde_json::Value::Object(object) => {
            let mut map = BTreeMap::new();
            for (k, v) in object {
                map.insert(Value::Str(k), json_to_value(v)?);
            }
            Ok(Value::Map(map))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_objects() {
        let config = JsonConfigLoader
            .load_config(r#"{"kind": "cuda", "arch": "sm_80", "libs": ["cudnn"], "from_device": 0}"#)
            .unwrap()
            .unwrap();
        assert_eq!(config.get("kind"), Some(&Value::from("cuda")));
        assert_eq!(config.get("libs"), Some(&Value::from(vec!["cudnn"])));
        assert_eq!(config.get("from_device"), Some(&Value::Int(0)));
    }

    #[test]
    fn null_is_no_config() {
        assert!(JsonConfigLoader.load_config("null").unwrap().is_none());
    }

    #[test]
    fn arrays_are_not_configs() {
        assert!(JsonConfigLoader.load_config("[1, 2]").is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let result = JsonConfigLoader.load_config("{kind:");
        assert!(matches!(result, Err(TargetError::Json(_))));
    }

    #[test]
    fn floats_are_rejected() {
        let err = json_to_value(serde_json::json!(1.5)).unwrap_err();
        assert!(err.message().contains("Unsupported number"));
    }
}

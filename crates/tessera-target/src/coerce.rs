//! Schema-driven conversion of attribute values.
//!
//! [`parse_str`] handles raw text from the tokenizer, [`parse_value`] handles
//! values that are already structured. Both produce the same canonical
//! [`Value`] for equivalent inputs and recurse through array and map
//! element types, decorating errors with the element position.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::codec::interpret;
use crate::config;
use crate::error::{Result, TargetError};
use crate::resolver::Resolver;
use crate::tokenize::split_comma;
use crate::value::{ConfigMap, Value, ValueType};

/// Convert a raw, still-escaped token to the declared type.
pub fn parse_str(raw: &str, ty: &ValueType, resolver: &Resolver<'_>) -> Result<Value> {
    let text = interpret(raw);
    match ty {
        ValueType::Int | ValueType::Bool => {
            let v = parse_integer(&text)?;
            if *ty == ValueType::Int {
                Ok(Value::Int(v))
            } else {
                Ok(Value::Bool(v != 0))
            }
        }
        ValueType::Str => Ok(Value::Str(text.trim_matches(' ').to_string())),
        ValueType::Target => Ok(Value::Target(config::from_string(&text, resolver)?)),
        ValueType::Array(elem) => {
            let mut items = Vec::new();
            for piece in split_comma(&text)? {
                let item = parse_str(&piece, elem, resolver)
                    .map_err(|e| e.with_suffix(format!("[{}]", items.len())))?;
                items.push(item);
            }
            Ok(Value::Array(items))
        }
        ValueType::Map(..) => Err(TargetError::type_error(format!(
            "Unsupported type \"{ty}\" for parsing from string: {text}"
        ))),
    }
}

/// Integers in base 10; `true`/`false` in any case stand for 1 and 0.
fn parse_integer(text: &str) -> Result<i64> {
    if let Ok(v) = text.trim_matches(' ').parse::<i64>() {
        return Ok(v);
    }
    match text.to_ascii_lowercase().as_str() {
        "true" => Ok(1),
        "false" => Ok(0),
        _ => Err(TargetError::type_error(format!(
            "Cannot parse integer from string: {text}"
        ))),
    }
}

/// Check an already-structured value against the declared type.
pub fn parse_value(value: &Value, ty: &ValueType, resolver: &Resolver<'_>) -> Result<Value> {
    match (ty, value) {
        (ValueType::Int, Value::Int(_))
        | (ValueType::Bool, Value::Bool(_))
        | (ValueType::Str, Value::Str(_)) => Ok(value.clone()),
        (ValueType::Int | ValueType::Bool | ValueType::Str, other) => {
            Err(type_mismatch(ty, other))
        }
        (ValueType::Target, Value::Target(t)) => Ok(Value::Target(Arc::clone(t))),
        (ValueType::Target, Value::Str(s)) => Ok(Value::Target(config::from_string(s, resolver)?)),
        (ValueType::Target, Value::Map(map)) => {
            let config = string_keyed(map)?;
            Ok(Value::Target(config::from_config(config, resolver)?))
        }
        (ValueType::Target, other) => Err(TargetError::type_error(format!(
            "Expect type 'dict' or 'str' to construct Target, but get: {}",
            other.type_key()
        ))),
        (ValueType::Array(elem), Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let parsed = parse_value(item, elem, resolver)
                    .map_err(|e| e.with_prefix(format!("[{}]", out.len())))?;
                out.push(parsed);
            }
            Ok(Value::Array(out))
        }
        (ValueType::Map(key_ty, val_ty), Value::Map(map)) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                let key = parse_value(k, key_ty, resolver)
                    .map_err(|e| e.with_suffix(", during parse key of map"))?;
                let val = parse_value(v, val_ty, resolver).map_err(|e| {
                    let label = match &key {
                        Value::Str(s) => s.clone(),
                        other => other.to_string(),
                    };
                    e.with_suffix(format!(", during parsing value of map[\"{label}\"]"))
                })?;
                out.insert(key, val);
            }
            Ok(Value::Map(out))
        }
        (ValueType::Array(_) | ValueType::Map(..), other) => Err(type_mismatch(ty, other)),
    }
}

fn type_mismatch(expected: &ValueType, actual: &Value) -> TargetError {
    TargetError::type_error(format!(
        "Expects type \"{expected}\", but gets \"{}\" for object: {actual}",
        actual.type_key()
    ))
}

/// Turn a map value into a config, requiring string keys.
pub(crate) fn string_keyed(map: &BTreeMap<Value, Value>) -> Result<ConfigMap> {
    let mut config = ConfigMap::new();
    for (k, v) in map {
        match k {
            Value::Str(key) => {
                config.insert(key.clone(), v.clone());
            }
            other => {
                return Err(TargetError::type_error(format!(
                    "Target object requires key of dict to be str, but get: {}",
                    other.type_key()
                )));
            }
        }
    }
    Ok(config)
}

/// Whether `value` already has the shape `ty` declares, recursively.
pub fn conforms(value: &Value, ty: &ValueType) -> bool {
    match (ty, value) {
        (ValueType::Int, Value::Int(_))
        | (ValueType::Bool, Value::Bool(_))
        | (ValueType::Str, Value::Str(_))
        | (ValueType::Target, Value::Target(_)) => true,
        (ValueType::Array(elem), Value::Array(items)) => items.iter().all(|i| conforms(i, elem)),
        (ValueType::Map(kt, vt), Value::Map(map)) => map
            .iter()
            .all(|(k, v)| conforms(k, kt) && conforms(v, vt)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::builtin_kinds;
    use crate::error::ErrorKind;
    use crate::kind::KindRegistry;

    fn kinds() -> KindRegistry {
        builtin_kinds().unwrap()
    }

    #[test]
    fn integers_and_booleans_from_text() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        assert_eq!(parse_str("42", &ValueType::Int, &r).unwrap(), Value::Int(42));
        assert_eq!(parse_str("-7", &ValueType::Int, &r).unwrap(), Value::Int(-7));
        assert_eq!(parse_str("TRUE", &ValueType::Int, &r).unwrap(), Value::Int(1));
        assert_eq!(parse_str("false", &ValueType::Bool, &r).unwrap(), Value::Bool(false));
        assert_eq!(parse_str("1", &ValueType::Bool, &r).unwrap(), Value::Bool(true));
        assert_eq!(parse_str("'12'", &ValueType::Int, &r).unwrap(), Value::Int(12));
    }

    #[test]
    fn bad_integer_is_type_error() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let err = parse_str("twelve", &ValueType::Int, &r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.message().contains("Cannot parse integer"));
    }

    #[test]
    fn integers_strip_spaces_only() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        assert_eq!(parse_str("' 8 '", &ValueType::Int, &r).unwrap(), Value::Int(8));
        for raw in ["8\t", "\n8"] {
            let err = parse_str(raw, &ValueType::Int, &r).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type, "{raw:?}");
        }
    }

    #[test]
    fn strings_are_trimmed_after_interpretation() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        assert_eq!(
            parse_str("'  sky lake '", &ValueType::Str, &r).unwrap(),
            Value::from("sky lake")
        );
        assert_eq!(parse_str("'   '", &ValueType::Str, &r).unwrap(), Value::from(""));
        assert_eq!(parse_str(r"it\'s", &ValueType::Str, &r).unwrap(), Value::from("it's"));
    }

    #[test]
    fn arrays_split_on_unquoted_commas() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let ty = ValueType::array_of(ValueType::Str);
        assert_eq!(
            parse_str("a,b,'c,d'", &ty, &r).unwrap(),
            Value::from(vec!["a", "b", "c,d"])
        );
    }

    #[test]
    fn array_errors_carry_index_suffix() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let ty = ValueType::array_of(ValueType::Int);
        let err = parse_str("1,2,x", &ty, &r).unwrap_err();
        assert!(err.message().ends_with("[2]"), "{}", err.message());
    }

    #[test]
    fn maps_cannot_come_from_text() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let ty = ValueType::map_of(ValueType::Str, ValueType::Int);
        let err = parse_str("a=1", &ty, &r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.message().contains("Unsupported type"));
    }

    #[test]
    fn nested_target_from_text() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let v = parse_str("'llvm -mcpu=skylake'", &ValueType::Target, &r).unwrap();
        let t = v.as_target().unwrap();
        assert_eq!(t.kind().name(), "llvm");
        assert_eq!(t.get_attr("mcpu"), Some(&Value::from("skylake")));
    }

    #[test]
    fn structured_primitives_must_match() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        assert_eq!(parse_value(&Value::Int(3), &ValueType::Int, &r).unwrap(), Value::Int(3));
        let err = parse_value(&Value::from("3"), &ValueType::Int, &r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.message().contains("\"int\""));
        assert!(err.message().contains("\"str\""));
        assert!(parse_value(&Value::Int(1), &ValueType::Bool, &r).is_err());
    }

    #[test]
    fn structured_and_text_agree() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let ty = ValueType::array_of(ValueType::Str);
        let from_text = parse_str("x,y", &ty, &r).unwrap();
        let from_value = parse_value(&Value::from(vec!["x", "y"]), &ty, &r).unwrap();
        assert_eq!(from_text, from_value);
    }

    #[test]
    fn structured_array_errors_carry_index_prefix() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let ty = ValueType::array_of(ValueType::Int);
        let v = Value::Array(vec![Value::Int(1), Value::from("2")]);
        let err = parse_value(&v, &ty, &r).unwrap_err();
        assert!(err.message().starts_with("[1]"), "{}", err.message());
    }

    #[test]
    fn structured_maps_recurse() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let ty = ValueType::map_of(ValueType::Str, ValueType::Int);
        let mut map = BTreeMap::new();
        map.insert(Value::from("a"), Value::Int(1));
        let ok = parse_value(&Value::Map(map.clone()), &ty, &r).unwrap();
        assert_eq!(ok, Value::Map(map.clone()));

        map.insert(Value::from("b"), Value::from("two"));
        let err = parse_value(&Value::Map(map), &ty, &r).unwrap_err();
        assert!(err.message().contains("during parsing value of map[\"b\"]"));

        let mut bad_key = BTreeMap::new();
        bad_key.insert(Value::Int(1), Value::Int(1));
        let err = parse_value(&Value::Map(bad_key), &ty, &r).unwrap_err();
        assert!(err.message().contains("during parse key of map"));
    }

    #[test]
    fn nested_target_from_structured_inputs() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let from_str = parse_value(&Value::from("c"), &ValueType::Target, &r).unwrap();
        let mut config = ConfigMap::new();
        config.insert("kind".into(), Value::from("c"));
        let from_map = parse_value(&Value::from(config), &ValueType::Target, &r).unwrap();
        assert_eq!(from_str, from_map);

        let reused = parse_value(&from_str, &ValueType::Target, &r).unwrap();
        assert!(Arc::ptr_eq(
            reused.as_target().unwrap(),
            from_str.as_target().unwrap()
        ));

        let err = parse_value(&Value::Int(1), &ValueType::Target, &r).unwrap_err();
        assert!(err.message().contains("'dict' or 'str'"));
    }

    #[test]
    fn non_string_keys_rejected_for_target_maps() {
        let kinds = kinds();
        let r = Resolver::new(&kinds);
        let mut map = BTreeMap::new();
        map.insert(Value::Int(0), Value::from("c"));
        let err = parse_value(&Value::Map(map), &ValueType::Target, &r).unwrap_err();
        assert!(err.message().contains("key of dict to be str"));
    }

    #[test]
    fn conformance() {
        let ty = ValueType::array_of(ValueType::Int);
        assert!(conforms(&Value::Array(vec![Value::Int(1)]), &ty));
        assert!(!conforms(&Value::Array(vec![Value::from("1")]), &ty));
        assert!(!conforms(&Value::None, &ValueType::Str));
    }
}

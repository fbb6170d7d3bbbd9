//! JSON conversion utilities for Val types

use anyhow::Result;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use super::types::Val;

/// Nesting depth beyond which a value is assumed to be cyclic
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    #[error("Converting circular structure to JSON")]
    Circular,
    /// Output would exceed the byte budget
    #[error("JSON output too large")]
    TooLarge,
}

pub fn json_to_val_map(json: &JsonValue) -> Result<BTreeMap<String, Val>> {
    match json {
        JsonValue::Object(map) => {
            let mut result = BTreeMap::new();
            for (key, value) in map {
                result.insert(key.clone(), json_to_val(value)?);
            }
            Ok(result)
        }
        _ => Err(anyhow::anyhow!("Expected JSON object for scope")),
    }
}

pub fn json_to_val(json: &JsonValue) -> Result<Val> {
    let val = match json {
        JsonValue::Null => Val::Null,
        JsonValue::Bool(b) => Val::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Val::Num(i as f64)
            } else if let Some(f) = n.as_f64() {
                Val::Num(f)
            } else {
                return Err(anyhow::anyhow!("Invalid number in JSON"));
            }
        }
        JsonValue::String(s) => Val::Str(s.clone()),
        JsonValue::Array(arr) => {
            let vals: Result<Vec<Val>> = arr.iter().map(json_to_val).collect();
            Val::list(vals?)
        }
        JsonValue::Object(_) => Val::obj(json_to_val_map(json)?),
    };
    Ok(val)
}

/// Convert a value to JSON the way `JSON.stringify` would
///
/// `undefined` and functions are dropped from objects and become `null` in
/// arrays; non-finite numbers become `null`.
pub fn val_to_json(val: &Val) -> Result<JsonValue, JsonError> {
    to_json(val, 0, &mut usize::MAX)
}

/// Like [`val_to_json`], failing once the output would pass roughly `max_bytes`
pub fn val_to_json_within(val: &Val, max_bytes: usize) -> Result<JsonValue, JsonError> {
    let mut budget = max_bytes;
    to_json(val, 0, &mut budget)
}

fn spend(budget: &mut usize, bytes: usize) -> Result<(), JsonError> {
    *budget = budget.checked_sub(bytes).ok_or(JsonError::TooLarge)?;
    Ok(())
}

fn to_json(val: &Val, depth: usize, budget: &mut usize) -> Result<JsonValue, JsonError> {
    if depth > MAX_DEPTH {
        return Err(JsonError::Circular);
    }
    spend(budget, 1)?;

    let json = match val {
        Val::Undefined | Val::Null => JsonValue::Null,
        Val::Bool(b) => JsonValue::Bool(*b),
        // Integral values print without a fraction, like `JSON.stringify` does
        Val::Num(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
            JsonValue::Number((*n as i64).into())
        }
        Val::Num(n) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Val::Str(s) => {
            spend(budget, s.len())?;
            JsonValue::String(s.clone())
        }
        Val::List(items) => {
            let mut vals = Vec::new();
            for v in items.borrow().iter() {
                if v.is_callable() {
                    vals.push(JsonValue::Null);
                } else {
                    vals.push(to_json(v, depth + 1, budget)?);
                }
            }
            JsonValue::Array(vals)
        }
        Val::Obj(obj) => {
            let mut map = serde_json::Map::new();
            for (key, value) in obj.borrow().iter() {
                if matches!(value, Val::Undefined) || value.is_callable() {
                    continue;
                }
                spend(budget, key.len())?;
                map.insert(key.clone(), to_json(value, depth + 1, budget)?);
            }
            JsonValue::Object(map)
        }
        Val::Error(error_info) => serde_json::json!({
            "name": error_info.code,
            "message": error_info.message,
        }),
        Val::Func { .. } | Val::Closure(_) | Val::Native(_) => JsonValue::Null,
    };
    Ok(json)
}

/// Render a value for display to a host (CLI output, logs)
///
/// Unlike [`val_to_json`], functions are shown by name instead of dropped.
pub fn val_to_display_json(val: &Val) -> Result<JsonValue> {
    display_json(val, 0)
}

fn display_json(val: &Val, depth: usize) -> Result<JsonValue> {
    if depth > MAX_DEPTH {
        return Err(anyhow::anyhow!("Converting circular structure to JSON"));
    }
    Ok(match val {
        Val::Func { func, .. } => JsonValue::String(format!("[Function: {}]", func.name())),
        Val::Closure(closure) => JsonValue::String(format!("[Function: {}]", closure.name())),
        Val::Native(native) => JsonValue::String(format!("[Function: {}]", native.name())),
        Val::List(items) => JsonValue::Array(
            items
                .borrow()
                .iter()
                .map(|v| display_json(v, depth + 1))
                .collect::<Result<_>>()?,
        ),
        Val::Obj(obj) => {
            let mut map = serde_json::Map::new();
            for (key, value) in obj.borrow().iter() {
                map.insert(key.clone(), display_json(value, depth + 1)?);
            }
            JsonValue::Object(map)
        }
        other => to_json(other, depth, &mut usize::MAX)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_val_nested() {
        let val = json_to_val(&json!({"a": [1, "two", null], "b": {"c": true}})).unwrap();
        let Val::Obj(map) = &val else {
            unreachable!("Expected object, got {:?}", val);
        };
        let map = map.borrow();
        assert_eq!(
            map["a"],
            Val::list(vec![Val::Num(1.0), Val::str("two"), Val::Null])
        );
        assert_eq!(
            map["b"],
            Val::obj(BTreeMap::from([("c".to_string(), Val::Bool(true))]))
        );
    }

    #[test]
    fn test_val_to_json_drops_undefined_and_functions() {
        let val = Val::obj(BTreeMap::from([
            ("keep".to_string(), Val::Num(1.0)),
            ("gone".to_string(), Val::Undefined),
            (
                "f".to_string(),
                Val::Native(crate::executor::NativeFn::new("f", |_| Ok(Val::Null))),
            ),
        ]));
        assert_eq!(val_to_json(&val).unwrap(), json!({"keep": 1}));
    }

    #[test]
    fn test_integral_numbers_have_no_fraction() {
        assert_eq!(val_to_json(&Val::Num(3.0)).unwrap().to_string(), "3");
        assert_eq!(val_to_json(&Val::Num(0.5)).unwrap().to_string(), "0.5");
    }

    #[test]
    fn test_output_budget() {
        let big = Val::list(vec![Val::str("abcdef"); 10]);
        assert!(val_to_json_within(&big, 1_000).is_ok());
        assert_eq!(val_to_json_within(&big, 40), Err(JsonError::TooLarge));
    }

    #[test]
    fn test_cyclic_value_is_rejected() {
        let list = Val::list(vec![]);
        if let Val::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert!(val_to_json(&list).is_err());
        // Break the cycle so the test does not leak
        if let Val::List(items) = &list {
            items.borrow_mut().clear();
        }
    }

    #[test]
    fn test_display_json_names_functions() {
        let native = Val::Native(crate::executor::NativeFn::new("createElement", |_| {
            Ok(Val::Null)
        }));
        assert_eq!(
            val_to_display_json(&native).unwrap(),
            json!("[Function: createElement]")
        );
    }
}

//! Cache Key Module
//!
//! Derives comparable cache keys from an action type and its payload.
//!
//! Payloads are written in a canonical form before being stored in the key:
//! object fields are sorted by name, arrays keep their order and integral
//! floats are written as integers. Two payloads that are deeply equal therefore
//! always produce the same key, no matter how their maps were built.
//!
//! An absent payload, an empty object and `null` are three distinct keys.

use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::cache::MAX_PAYLOAD_DEPTH;
use crate::error::{CacheError, Result};

// == Cache Key ==
/// Opaque identity of one cached dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    action: String,
    payload: Option<String>,
}

impl CacheKey {
    /// Action type this key was derived from.
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{}:{}", self.action, payload),
            None => write!(f, "{}", self.action),
        }
    }
}

// == Derive Key ==
/// Derives the cache key for `action` dispatched with `payload`.
///
/// Fails when the action type is empty or the payload nests deeper than
/// [`MAX_PAYLOAD_DEPTH`].
pub fn derive_key(action: &str, payload: Option<&Value>) -> Result<CacheKey> {
    if action.is_empty() {
        return Err(CacheError::EmptyActionType);
    }

    let payload = match payload {
        Some(value) => {
            let mut out = String::new();
            write_canonical(value, &mut out, 0)?;
            Some(out)
        }
        None => None,
    };

    Ok(CacheKey {
        action: action.to_string(),
        payload,
    })
}

/// Derives a key from any serializable payload, for hosts that hold typed
/// payloads rather than JSON values.
///
/// Values serde cannot turn into JSON (maps keyed by tuples, failing custom
/// `Serialize` impls) yield [`CacheError::Unserializable`]. Such a payload
/// cannot be dispatched either, so the error is only ever seen here.
pub fn derive_key_from<P>(action: &str, payload: Option<&P>) -> Result<CacheKey>
where
    P: Serialize + ?Sized,
{
    let value = payload.map(serde_json::to_value).transpose()?;
    derive_key(action, value.as_ref())
}

// == Canonical Writer ==
fn write_canonical(value: &Value, out: &mut String, depth: usize) -> Result<()> {
    if depth > MAX_PAYLOAD_DEPTH {
        return Err(CacheError::PayloadTooDeep(MAX_PAYLOAD_DEPTH));
    }

    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out),
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out, depth + 1)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Sorted explicitly: `preserve_order` may be enabled elsewhere in the build
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(name)?);
                out.push(':');
                write_canonical(field, out, depth + 1)?;
            }
            out.push('}');
        }
    }

    Ok(())
}

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn write_number(n: &Number, out: &mut String) {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
                out.push_str(&(f as i64).to_string());
                return;
            }
        }
    }
    out.push_str(&n.to_string());
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_input_same_key() {
        let a = derive_key("fetchUser", Some(&json!({"id": 1}))).unwrap();
        let b = derive_key("fetchUser", Some(&json!({"id": 1}))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let mut first = serde_json::Map::new();
        first.insert("b".to_string(), json!(2));
        first.insert("a".to_string(), json!(1));
        let mut second = serde_json::Map::new();
        second.insert("a".to_string(), json!(1));
        second.insert("b".to_string(), json!(2));

        let a = derive_key("list", Some(&Value::Object(first))).unwrap();
        let b = derive_key("list", Some(&Value::Object(second))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_array_order_matters() {
        let a = derive_key("list", Some(&json!([1, 2]))).unwrap();
        let b = derive_key("list", Some(&json!([2, 1]))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_action_type_distinguishes_keys() {
        let a = derive_key("fetchUser", Some(&json!({"id": 1}))).unwrap();
        let b = derive_key("fetchPost", Some(&json!({"id": 1}))).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.action(), "fetchUser");
    }

    #[test]
    fn test_absent_empty_and_null_payloads_are_distinct() {
        let absent = derive_key("load", None).unwrap();
        let empty = derive_key("load", Some(&json!({}))).unwrap();
        let null = derive_key("load", Some(&Value::Null)).unwrap();

        assert_ne!(absent, empty);
        assert_ne!(absent, null);
        assert_ne!(empty, null);
    }

    #[test]
    fn test_integral_float_matches_integer() {
        let a = derive_key("page", Some(&json!({"n": 1}))).unwrap();
        let b = derive_key("page", Some(&json!({"n": 1.0}))).unwrap();
        let c = derive_key("page", Some(&json!({"n": 1.5}))).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_string_and_number_do_not_collide() {
        let a = derive_key("get", Some(&json!("1"))).unwrap();
        let b = derive_key("get", Some(&json!(1))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_separator_in_action_does_not_collide() {
        let a = derive_key("a:b", None).unwrap();
        let b = derive_key("a", Some(&json!("b"))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_action_rejected() {
        assert_eq!(derive_key("", None), Err(CacheError::EmptyActionType));
    }

    #[test]
    fn test_too_deep_payload_rejected() {
        let mut value = json!(0);
        for _ in 0..=MAX_PAYLOAD_DEPTH {
            value = json!([value]);
        }

        let result = derive_key("deep", Some(&value));
        assert_eq!(result, Err(CacheError::PayloadTooDeep(MAX_PAYLOAD_DEPTH)));
    }

    #[test]
    fn test_max_depth_payload_accepted() {
        let mut value = json!(0);
        for _ in 0..MAX_PAYLOAD_DEPTH {
            value = json!([value]);
        }

        assert!(derive_key("deep", Some(&value)).is_ok());
    }

    #[test]
    fn test_derive_from_serializable() {
        #[derive(Serialize)]
        struct Query {
            id: u32,
            tag: &'static str,
        }

        let a = derive_key_from("find", Some(&Query { id: 7, tag: "x" })).unwrap();
        let b = derive_key("find", Some(&json!({"tag": "x", "id": 7}))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_from_unserializable() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), 3);

        let result = derive_key_from("find", Some(&map));
        assert!(matches!(result, Err(CacheError::Unserializable(_))));
    }

    #[test]
    fn test_display() {
        let key = derive_key("fetchUser", Some(&json!({"id": 1, "a": [true]}))).unwrap();
        assert_eq!(key.to_string(), r#"fetchUser:{"a":[true],"id":1}"#);
        assert_eq!(derive_key("ping", None).unwrap().to_string(), "ping");
    }
}

//! Deterministic JSON serialization.
//!
//! Object keys are emitted in byte order at every depth and no insignificant
//! whitespace is written, so two structurally equal values always produce the
//! same bytes regardless of how their maps were built.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

use crate::error::{CryptoError, CryptoResult};

/// Canonicalize a JSON value.
///
/// # Errors
///
/// Returns an error if a string cannot be escaped (never expected for values
/// produced by `serde_json`).
pub fn canonicalize(value: &Value) -> CryptoResult<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Canonicalize any serializable value.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> CryptoResult<Vec<u8>> {
    let value =
        serde_json::to_value(value).map_err(|e| CryptoError::Canonicalization(e.to_string()))?;
    Ok(canonicalize(&value)?.into_bytes())
}

fn write_value(out: &mut String, value: &Value) -> CryptoResult<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            write!(out, "{n}").map_err(|e| CryptoError::Canonicalization(e.to_string()))?;
        },
        Value::String(s) => write_string(out, s)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        },
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key)?;
                out.push(':');
                write_value(out, item)?;
            }
            out.push('}');
        },
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) -> CryptoResult<()> {
    let escaped =
        serde_json::to_string(s).map_err(|e| CryptoError::Canonicalization(e.to_string()))?;
    out.push_str(&escaped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_at_every_depth() {
        let value = json!({ "b": 1, "a": { "z": true, "m": [ { "y": 1, "x": 2 } ] } });
        assert_eq!(
            canonicalize(&value).unwrap(),
            r#"{"a":{"m":[{"x":2,"y":1}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut first = serde_json::Map::new();
        first.insert("phase".into(), json!("plan"));
        first.insert("agent".into(), json!("researcher"));
        let mut second = serde_json::Map::new();
        second.insert("agent".into(), json!("researcher"));
        second.insert("phase".into(), json!("plan"));

        assert_eq!(
            canonicalize(&Value::Object(first)).unwrap(),
            canonicalize(&Value::Object(second)).unwrap()
        );
    }

    #[test]
    fn test_strings_are_escaped() {
        let value = json!({ "note": "line\n\"quoted\"" });
        assert_eq!(
            canonicalize(&value).unwrap(),
            r#"{"note":"line\n\"quoted\""}"#
        );
    }

    #[test]
    fn test_array_order_is_preserved() {
        assert_eq!(canonicalize(&json!([3, 1, 2])).unwrap(), "[3,1,2]");
    }

    #[test]
    fn test_canonical_bytes_of_struct() {
        #[derive(Serialize)]
        struct Event {
            zeta: u8,
            alpha: &'static str,
        }
        let bytes = canonical_bytes(&Event { zeta: 1, alpha: "a" }).unwrap();
        assert_eq!(bytes, br#"{"alpha":"a","zeta":1}"#.to_vec());
    }
}

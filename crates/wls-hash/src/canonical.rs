use std::fmt::Write;

use serde_json::{Map, Number, Value};

/// Largest integer magnitude an IEEE-754 double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Deterministic renderer of JSON-like values.
///
/// - `null`, `true`, `false` render literally.
/// - Strings render JSON-quoted and escaped.
/// - Numbers render in their shortest textual form; a float with no
///   fractional part inside ±2^53 renders as an integer, so `1.0` and `1`
///   encode identically.
/// - Arrays render as `[e0,e1,...]` in their original order.
/// - Objects render as `{"k1":v1,"k2":v2,...}` with keys in byte order,
///   whatever order they were inserted in.
pub struct CanonicalEncoder;

impl CanonicalEncoder {
    /// Render `value` into its canonical string.
    pub fn encode(value: &Value) -> String {
        let mut out = String::new();
        Self::encode_into(value, &mut out);
        out
    }

    /// Render `value` into its canonical UTF-8 bytes.
    pub fn encode_bytes(value: &Value) -> Vec<u8> {
        Self::encode(value).into_bytes()
    }

    /// Append the canonical rendering of `value` to `out`.
    pub fn encode_into(value: &Value, out: &mut String) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Number(n) => encode_number(n, out),
            Value::String(s) => encode_string(s, out),
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    Self::encode_into(item, out);
                }
                out.push(']');
            }
            Value::Object(map) => encode_object(map, out),
        }
    }
}

fn encode_object(map: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_string(key, out);
        out.push(':');
        CanonicalEncoder::encode_into(value, out);
    }
    out.push('}');
}

fn encode_number(n: &Number, out: &mut String) {
    if n.is_i64() || n.is_u64() {
        let _ = write!(out, "{n}");
        return;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => {
            // -0.0 collapses to 0 as well.
            let _ = write!(out, "{}", f as i64);
        }
        _ => {
            let _ = write!(out, "{n}");
        }
    }
}

fn encode_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

//! Rendering of OTLP values into GELF-compatible text and fields

use opentelemetry_proto::tonic::common::v1::{AnyValue, KeyValue, any_value};
use serde_json::{Map, Number, Value};

use crate::domain::FieldValue;

/// Convert an `AnyValue` into a JSON value, keeping structure for arrays and
/// maps. Bytes become lowercase hex strings.
pub fn any_value_to_json(value: &AnyValue) -> Value {
    match &value.value {
        Some(any_value::Value::StringValue(s)) => Value::String(s.clone()),
        Some(any_value::Value::BoolValue(b)) => Value::Bool(*b),
        Some(any_value::Value::IntValue(i)) => Value::Number((*i).into()),
        Some(any_value::Value::DoubleValue(d)) => Number::from_f64(*d)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(d.to_string())),
        Some(any_value::Value::BytesValue(b)) => Value::String(hex::encode(b)),
        Some(any_value::Value::ArrayValue(arr)) => {
            Value::Array(arr.values.iter().map(any_value_to_json).collect())
        }
        Some(any_value::Value::KvlistValue(kv)) => {
            let map: Map<String, Value> = kv
                .values
                .iter()
                .map(|kv| {
                    let val = kv.value.as_ref().map(any_value_to_json).unwrap_or(Value::Null);
                    (kv.key.clone(), val)
                })
                .collect();
            Value::Object(map)
        }
        None => Value::Null,
    }
}

/// Render an `AnyValue` as text: strings verbatim, scalars via their display
/// form, bytes as hex, arrays and maps as compact JSON.
pub fn any_value_to_text(value: &AnyValue) -> String {
    match &value.value {
        Some(any_value::Value::StringValue(s)) => s.clone(),
        Some(any_value::Value::BoolValue(b)) => b.to_string(),
        Some(any_value::Value::IntValue(i)) => i.to_string(),
        Some(any_value::Value::DoubleValue(d)) => d.to_string(),
        Some(any_value::Value::BytesValue(b)) => hex::encode(b),
        Some(any_value::Value::ArrayValue(_)) | Some(any_value::Value::KvlistValue(_)) => {
            any_value_to_json(value).to_string()
        }
        None => String::new(),
    }
}

/// Convert an `AnyValue` into a GELF additional field value.
///
/// Integers and finite doubles stay numeric; everything else is text.
pub fn any_value_to_field(value: &AnyValue) -> FieldValue {
    match &value.value {
        Some(any_value::Value::IntValue(i)) => FieldValue::Integer(*i),
        Some(any_value::Value::DoubleValue(d)) if d.is_finite() => FieldValue::Float(*d),
        _ => FieldValue::Text(any_value_to_text(value)),
    }
}

/// Record body as short message text. A missing body is the empty string.
pub fn body_text(body: Option<&AnyValue>) -> String {
    body.map(any_value_to_text).unwrap_or_default()
}

/// Look up a string-valued attribute by key.
pub fn string_attribute<'a>(attributes: &'a [KeyValue], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|kv| kv.key == key)
        .and_then(|kv| kv.value.as_ref())
        .and_then(|v| match &v.value {
            Some(any_value::Value::StringValue(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        })
}

/// Replace every character outside the GELF field-name alphabet
/// (`[A-Za-z0-9_.-]`) with `_`.
pub fn sanitize_field_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Encode trace_id bytes to 32-char hex string
pub fn encode_trace_id(bytes: &[u8]) -> String {
    encode_fixed_width(bytes, 16)
}

/// Encode span_id bytes to 16-char hex string
pub fn encode_span_id(bytes: &[u8]) -> String {
    encode_fixed_width(bytes, 8)
}

fn encode_fixed_width(bytes: &[u8], width: usize) -> String {
    if bytes.is_empty() || bytes.iter().all(|&b| b == 0) {
        return "0".repeat(width * 2);
    }
    // Left-pad short ids, keep the trailing bytes of long ones
    let mut padded = vec![0u8; width];
    let copy_len = bytes.len().min(width);
    let start = width - copy_len;
    padded[start..].copy_from_slice(&bytes[bytes.len() - copy_len..]);
    hex::encode(padded)
}

//! # Wire Value Encoding
//!
//! The vendor transport serializes a flat list of values per message. This
//! module owns the closed set of value kinds the device firmware can decode
//! — small integers, 32-bit floats, strings, and lists/maps of the same —
//! and converts them into the JSON-like tree the transport serializer
//! accepts. Numbers go through the transport's native numeric formats;
//! strings and maps pass through as-is.
//!
//! Every outbound message leads with a single unsigned-byte type tag that
//! selects the firmware decoder (see [`crate::messages`] for the registry).

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors from converting foreign values into wire values.
///
/// Raised while *building* a message, before any send is attempted — a
/// message that fails conversion never reaches the transport, so the device
/// is never handed a partially encoded payload.
#[derive(Error, Debug)]
pub enum WireError {
    /// The value is not one of the kinds the firmware can decode.
    #[error("unsupported value kind: {0}")]
    UnsupportedValueKind(&'static str),
}

/// A value the device firmware can decode.
///
/// Closed and recursive: lists and maps may only contain further
/// `WireValue`s, which rules out surprises like nested nulls at encode
/// time rather than on the device.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    U8(u8),
    I16(i16),
    I32(i32),
    F32(f32),
    Str(String),
    List(Vec<WireValue>),
    /// String-keyed map; insertion order is preserved on the wire.
    Map(Vec<(String, WireValue)>),
}

impl WireValue {
    /// Render this value into the tree the transport serializer accepts.
    pub fn to_transport(&self) -> Value {
        match self {
            WireValue::U8(n) => json!(n),
            WireValue::I16(n) => json!(n),
            WireValue::I32(n) => json!(n),
            WireValue::F32(n) => json!(n),
            WireValue::Str(s) => Value::String(s.clone()),
            WireValue::List(items) => {
                Value::Array(items.iter().map(WireValue::to_transport).collect())
            }
            WireValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_transport());
                }
                Value::Object(map)
            }
        }
    }

    /// Convert a JSON-like value (settings entries, UI-provided maps) into
    /// a wire value.
    ///
    /// Integers are narrowed to the smallest firmware integer kind that
    /// holds them; all floats become `f32`. Nulls, booleans and integers
    /// beyond 32 bits have no wire representation and fail with
    /// [`WireError::UnsupportedValueKind`].
    pub fn from_json(value: &Value) -> Result<WireValue, WireError> {
        match value {
            Value::Null => Err(WireError::UnsupportedValueKind("null")),
            Value::Bool(_) => Err(WireError::UnsupportedValueKind("bool")),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if (0..=u8::MAX as i64).contains(&i) {
                        Ok(WireValue::U8(i as u8))
                    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&i) {
                        Ok(WireValue::I16(i as i16))
                    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&i) {
                        Ok(WireValue::I32(i as i32))
                    } else {
                        Err(WireError::UnsupportedValueKind("integer beyond 32 bits"))
                    }
                } else if let Some(f) = n.as_f64() {
                    Ok(WireValue::F32(f as f32))
                } else {
                    Err(WireError::UnsupportedValueKind("non-finite number"))
                }
            }
            Value::String(s) => Ok(WireValue::Str(s.clone())),
            Value::Array(items) => Ok(WireValue::List(
                items.iter().map(WireValue::from_json).collect::<Result<_, _>>()?,
            )),
            Value::Object(entries) => Ok(WireValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), WireValue::from_json(v)?)))
                    .collect::<Result<_, WireError>>()?,
            )),
        }
    }
}

/// Encode one outbound message: `[tag, ...payload]` in transport form.
///
/// Pure transform, no side effects; callers hand the result to the
/// transport layer.
pub fn encode_message(tag: u8, payload: &[WireValue]) -> Vec<Value> {
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(json!(tag));
    out.extend(payload.iter().map(WireValue::to_transport));
    out
}

//! # Structured Codec
//!
//! JSON encoding for primitives. Every primitive implements
//! [`StructuredCodec`] over [`serde_json::Value`]; its `serde` impls are
//! derived from that single implementation (see `impl_serde_via_structured!`)
//! so serde users and direct callers hit exactly the same validation.
//!
//! [`decode_json`] and [`encode_json`] are the byte-level entry points. Unlike
//! going through `serde_json::from_slice`, they return the primitive's
//! [`BrickError`] with its kind and context intact.

use serde_json::Value;

use crate::error::BrickError;

/// Encode to / decode from a JSON value.
pub trait StructuredCodec: Sized {
    /// JSON token for this value.
    fn to_structured(&self) -> Value;

    /// Decode, normalize and validate a JSON token.
    fn from_structured(value: &Value) -> Result<Self, BrickError>;
}

/// Decode a primitive from raw JSON bytes.
///
/// # Errors
///
/// Returns an invalid-input error carrying `input_json` if the bytes are not
/// JSON, or the primitive's own error if the token fails validation.
pub fn decode_json<T: StructuredCodec>(input: &[u8]) -> Result<T, BrickError> {
    let value: Value = serde_json::from_slice(input).map_err(|err| {
        BrickError::validation("Input is not valid JSON.")
            .with_context("input_json", String::from_utf8_lossy(input).into_owned())
            .with_source(err)
    })?;
    T::from_structured(&value).map_err(|err| {
        tracing::debug!(
            target_type = std::any::type_name::<T>(),
            error = %err,
            "structured decode rejected input"
        );
        err
    })
}

/// Encode a primitive to JSON bytes.
///
/// # Errors
///
/// Returns an internal error if the JSON writer fails.
pub fn encode_json<T: StructuredCodec>(value: &T) -> Result<Vec<u8>, BrickError> {
    serde_json::to_vec(&value.to_structured()).map_err(|err| {
        BrickError::internal()
            .with_context("operation", "encode_json")
            .with_source(err)
    })
}

/// Name of a JSON token's type, for diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Error for an explicit JSON `null` decoded into a non-nullable primitive.
pub(crate) fn null_rejected(target_type: &'static str) -> BrickError {
    BrickError::validation(format!(
        "{target_type} cannot be null (received JSON 'null')."
    ))
    .with_context("input_json", "null")
    .with_context("target_type", target_type)
}

/// Error for a JSON token of the wrong type.
pub(crate) fn wrong_token(target_type: &'static str, expected: &str, value: &Value) -> BrickError {
    BrickError::validation(format!(
        "{target_type} must be a valid JSON {expected} (received: {value})."
    ))
    .with_context("input_json", value.to_string())
    .with_context("received_type", json_type_name(value))
    .with_context("target_type", target_type)
}

/// Derive `Serialize`/`Deserialize` from a [`StructuredCodec`] impl.
macro_rules! impl_serde_via_structured {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serde::Serialize::serialize(
                    &$crate::codec::StructuredCodec::to_structured(self),
                    serializer,
                )
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                <$ty as $crate::codec::StructuredCodec>::from_structured(&value)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_serde_via_structured;

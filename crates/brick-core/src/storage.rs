//! # Storage Codec
//!
//! The driver-level "value out / scan in" contract. A primitive encodes to
//! one [`SqlValue`] and decodes from any of the variants it accepts.
//!
//! Every decoder accepts both `Text` and `Bytes` carrying the same textual
//! content, and rejects unsupported variants with the received variant's
//! name under `received_type` in the error context.

use chrono::{DateTime, Utc};

use crate::error::BrickError;

/// A value as exchanged with a relational storage driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// Signed 64-bit integer.
    Int64(i64),
    /// Raw byte sequence.
    Bytes(Vec<u8>),
    /// Text.
    Text(String),
    /// An instant in time.
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Name of the variant, recorded in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int64(_) => "int64",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Whether this is SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Encode to / decode from a storage driver value.
pub trait StorageCodec: Sized {
    /// Value written to storage.
    fn to_storage(&self) -> SqlValue;

    /// Value read back from storage, normalized and validated.
    fn from_storage(src: SqlValue) -> Result<Self, BrickError>;
}

/// Error for a `NULL` scanned into a non-nullable primitive.
pub(crate) fn null_rejected(target_type: &'static str) -> BrickError {
    BrickError::validation(format!(
        "Scanned nil value for non-nullable {target_type} from database."
    ))
    .with_context("target_type", target_type)
}

/// Error for a driver value of a variant the primitive does not accept.
pub(crate) fn unsupported(target_type: &'static str, src: &SqlValue, expected: &str) -> BrickError {
    BrickError::validation(format!(
        "Incompatible type ({}) for {target_type} scan. Expected {expected}.",
        src.type_name()
    ))
    .with_context("received_type", src.type_name())
    .with_context("target_type", target_type)
}

/// Decode UTF-8 bytes scanned from storage.
pub(crate) fn utf8_text(target_type: &'static str, bytes: Vec<u8>) -> Result<String, BrickError> {
    String::from_utf8(bytes).map_err(|err| {
        BrickError::validation(format!(
            "Scanned bytes for {target_type} are not valid UTF-8."
        ))
        .with_context("target_type", target_type)
        .with_context("input_bytes", String::from_utf8_lossy(err.as_bytes()).into_owned())
        .with_source(err)
    })
}

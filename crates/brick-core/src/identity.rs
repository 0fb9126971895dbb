//! # Identifiers
//!
//! [`Identifier`] wraps a 128-bit UUID. Fresh identifiers are version 7
//! (Unix-millisecond prefix, then random bits) so they sort by creation time
//! and index well as primary keys.
//!
//! The all-zero value is the nil sentinel, meaning "no identifier". It is
//! what an empty or `NULL` storage value scans to, and what is written back
//! as SQL `NULL`.
//!
//! Identifiers generated by one process are strictly increasing, even within
//! a single millisecond: a process-wide v7 context carries a counter in the
//! bits after the timestamp.
//!
//! ## Generation failure
//!
//! The only way generation can fail is a wall clock set before the Unix
//! epoch. That is an environment fault, not bad caller input, so it is
//! reported as [`ErrorKind::Internal`](crate::ErrorKind::Internal).

use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use serde_json::Value;
use uuid::{ContextV7, Timestamp, Uuid};

use crate::codec::{impl_serde_via_structured, null_rejected, wrong_token, StructuredCodec};
use crate::error::BrickError;
use crate::primitive::{must, scan_rejected};
use crate::storage::{self, SqlValue, StorageCodec};

/// Counter state shared by every [`Identifier::generate`] call.
static V7_CONTEXT: Lazy<Mutex<ContextV7>> = Lazy::new(|| Mutex::new(ContextV7::new()));

/// A UUID-backed identifier; nil when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier(Uuid);

impl Identifier {
    /// The all-zero sentinel.
    pub const NIL: Self = Self(Uuid::nil());

    const TYPE_NAME: &'static str = "Identifier";

    /// The all-zero sentinel.
    pub fn nil() -> Self {
        Self::NIL
    }

    /// Generate a time-ordered (v7) identifier from the wall clock.
    ///
    /// # Errors
    ///
    /// Internal error, with `operation` in the context, if the clock reads
    /// before the Unix epoch.
    pub fn generate() -> Result<Self, BrickError> {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|err| {
            BrickError::internal()
                .with_context("operation", "generate_v7_uuid")
                .with_source(err)
        })?;
        let context = V7_CONTEXT.lock().unwrap_or_else(PoisonError::into_inner);
        let ts = Timestamp::from_unix(&*context, elapsed.as_secs(), elapsed.subsec_nanos());
        Ok(Self(Uuid::new_v7(ts)))
    }

    /// Like [`Identifier::generate`], aborting the process on clock failure.
    pub fn must_generate() -> Self {
        must(Self::generate())
    }

    /// Parse the textual form.
    ///
    /// Accepts hyphenated, simple, braced and URN forms. The all-zero text
    /// parses to [`Identifier::NIL`].
    ///
    /// # Errors
    ///
    /// Invalid input, with the text under `input_string`.
    pub fn parse(s: &str) -> Result<Self, BrickError> {
        Uuid::parse_str(s).map(Self).map_err(|err| {
            BrickError::validation(format!("Invalid UUID string format: '{s}'."))
                .with_context("input_string", s)
                .with_source(err)
        })
    }

    /// Like [`Identifier::parse`], aborting the process on malformed text.
    pub fn must_parse(s: &str) -> Self {
        must(Self::parse(s))
    }

    /// Whether this is the nil sentinel.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Identifier {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Identifier> for Uuid {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for Identifier {
    type Err = BrickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl StructuredCodec for Identifier {
    fn to_structured(&self) -> Value {
        Value::String(self.to_string())
    }

    fn from_structured(value: &Value) -> Result<Self, BrickError> {
        match value {
            Value::String(s) => {
                Self::parse(s).map_err(|err| err.with_context("input_json", value.to_string()))
            }
            Value::Null => Err(null_rejected(Self::TYPE_NAME)),
            other => Err(wrong_token(Self::TYPE_NAME, "string", other)),
        }
    }
}

impl_serde_via_structured!(Identifier);

impl StorageCodec for Identifier {
    fn to_storage(&self) -> SqlValue {
        if self.is_nil() {
            SqlValue::Null
        } else {
            SqlValue::Text(self.to_string())
        }
    }

    fn from_storage(src: SqlValue) -> Result<Self, BrickError> {
        let result = match src {
            SqlValue::Null => Ok(Self::NIL),
            SqlValue::Text(text) if text.is_empty() => Ok(Self::NIL),
            SqlValue::Text(text) => Self::parse(&text),
            SqlValue::Bytes(bytes) if bytes.is_empty() => Ok(Self::NIL),
            SqlValue::Bytes(bytes) if bytes.len() == 16 => {
                Uuid::from_slice(&bytes).map(Self).map_err(|err| {
                    BrickError::validation("Scanned bytes are not a valid UUID.").with_source(err)
                })
            }
            SqlValue::Bytes(bytes) => storage::utf8_text(Self::TYPE_NAME, bytes)
                .and_then(|text| Self::parse(&text)),
            other => Err(storage::unsupported(Self::TYPE_NAME, &other, "text or bytes")),
        };
        result.map_err(|err| scan_rejected(Self::TYPE_NAME, err))
    }
}

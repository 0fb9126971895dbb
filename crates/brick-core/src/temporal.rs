//! # Audit Timestamps
//!
//! [`CreatedAt`] and [`UpdatedAt`] are always-set UTC instants. They encode
//! to RFC 3339 (UTC, `Z` suffix, as many fractional digits as needed) in
//! JSON and text, and to a native timestamp in storage.
//!
//! ## Decoding
//!
//! JSON decode is strict: an RFC 3339 string, nothing else, and `null` is
//! rejected. Storage and text decode are lenient because drivers hand back
//! timestamps in several textual shapes. They try [`STORAGE_LAYOUTS`] in
//! order and take the first match.
//!
//! ## Year range
//!
//! RFC 3339 has four-digit years, so only instants in years
//! [`MIN_YEAR`]`..=`[`MAX_YEAR`] have a canonical text form. Every entry
//! point, constructors and storage decode alike, rejects instants outside
//! that range; anything a timestamp type holds can be encoded and read back.

use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use crate::codec::wrong_token;
use crate::error::BrickError;
use crate::storage::{self, SqlValue};

/// Earliest year a timestamp may fall in.
pub const MIN_YEAR: i32 = 0;
/// Latest year a timestamp may fall in.
pub const MAX_YEAR: i32 = 9999;

/// One textual timestamp shape accepted from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLayout {
    /// RFC 3339, fractional seconds optional.
    Rfc3339,
    /// A `strftime` pattern that carries a UTC offset.
    WithOffset(&'static str),
    /// A `strftime` pattern without an offset; read as UTC.
    Naive(&'static str),
}

impl TimeLayout {
    /// Parse `s` in this layout.
    pub fn parse(&self, s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match self {
            Self::Rfc3339 => DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc)),
            Self::WithOffset(fmt) => {
                DateTime::parse_from_str(s, fmt).map(|t| t.with_timezone(&Utc))
            }
            Self::Naive(fmt) => {
                NaiveDateTime::parse_from_str(s, fmt).map(|t| Utc.from_utc_datetime(&t))
            }
        }
    }
}

/// Storage text layouts, in the order they are tried.
pub static STORAGE_LAYOUTS: [TimeLayout; 7] = [
    TimeLayout::Rfc3339,
    TimeLayout::WithOffset("%Y-%m-%d %H:%M:%S%.f%:z"),
    TimeLayout::WithOffset("%Y-%m-%d %H:%M:%S%.f%z"),
    // PostgreSQL prints whole-hour offsets as `+00`.
    TimeLayout::WithOffset("%Y-%m-%d %H:%M:%S%.f%#z"),
    TimeLayout::Naive("%Y-%m-%d %H:%M:%S%.f"),
    TimeLayout::WithOffset("%Y-%m-%dT%H:%M:%S%:z"),
    TimeLayout::Naive("%Y-%m-%d %H:%M:%S"),
];

/// Parse text with the first matching entry of [`STORAGE_LAYOUTS`].
///
/// # Errors
///
/// Invalid input with the text under `input_string`; the last layout's parse
/// error is attached as the cause.
pub fn parse_with_layouts(s: &str) -> Result<DateTime<Utc>, BrickError> {
    let mut last_err = None;
    for layout in &STORAGE_LAYOUTS {
        match layout.parse(s) {
            Ok(t) => {
                return check_year_range(t).map_err(|err| err.with_context("input_string", s));
            }
            Err(err) => last_err = Some(err),
        }
    }
    let err = BrickError::validation(format!(
        "Could not parse time '{s}' with any known layout."
    ))
    .with_context("input_string", s);
    Err(match last_err {
        Some(cause) => err.with_source(cause),
        None => err,
    })
}

/// Pass `t` through if its year has a four-digit RFC 3339 form.
///
/// # Errors
///
/// Invalid input with the instant under `input_time`.
pub(crate) fn check_year_range(t: DateTime<Utc>) -> Result<DateTime<Utc>, BrickError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&t.year()) {
        return Ok(t);
    }
    Err(BrickError::validation(format!(
        "Year {} is outside the supported range {MIN_YEAR:04}-{MAX_YEAR}.",
        t.year()
    ))
    .with_context("input_time", t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    .with_context("min_year", MIN_YEAR)
    .with_context("max_year", MAX_YEAR))
}

/// Canonical text of an instant.
pub(crate) fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Strict JSON decode of a non-null timestamp token.
pub(crate) fn time_from_json(target_type: &'static str, value: &Value) -> Result<DateTime<Utc>, BrickError> {
    let Value::String(s) = value else {
        return Err(wrong_token(target_type, "timestamp string", value));
    };
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|err| {
            BrickError::validation(format!("{target_type} must be a valid JSON timestamp."))
                .with_context("input_json", value.to_string())
                .with_context("target_type", target_type)
                .with_source(err)
        })
}

/// Lenient storage decode of a non-null value.
pub(crate) fn time_from_storage(
    target_type: &'static str,
    src: SqlValue,
) -> Result<DateTime<Utc>, BrickError> {
    match src {
        SqlValue::Timestamp(t) => {
            check_year_range(t).map_err(|err| err.with_context("target_type", target_type))
        }
        SqlValue::Text(text) => parse_with_layouts(&text).map_err(|err| {
            err.with_context("target_type", target_type)
        }),
        SqlValue::Bytes(bytes) => {
            let text = storage::utf8_text(target_type, bytes)?;
            parse_with_layouts(&text).map_err(|err| {
                err.with_context("input_bytes", text.as_str())
                    .with_context("target_type", target_type)
            })
        }
        SqlValue::Null => Err(storage::null_rejected(target_type)),
        other => Err(storage::unsupported(target_type, &other, "timestamp, text or bytes")),
    }
}

/// Define an always-set audit timestamp.
macro_rules! audit_timestamp {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(DateTime<Utc>);

        impl $name {
            const TYPE_NAME: &'static str = stringify!($name);

            /// Wrap an instant.
            ///
            /// # Errors
            ///
            /// Invalid input if `t` falls outside years `MIN_YEAR..=MAX_YEAR`.
            pub fn new(t: DateTime<Utc>) -> Result<Self, BrickError> {
                check_year_range(t)
                    .map(Self)
                    .map_err(|err| err.with_context("target_type", Self::TYPE_NAME))
            }

            /// Like `new`, aborting the process on an out-of-range instant.
            pub fn must_new(t: DateTime<Utc>) -> Self {
                $crate::primitive::must(Self::new(t))
            }

            /// The current instant.
            pub fn now() -> Self {
                Self(Utc::now())
            }

            /// The wrapped instant.
            pub fn time(&self) -> DateTime<Utc> {
                self.0
            }
        }

        impl TryFrom<DateTime<Utc>> for $name {
            type Error = BrickError;

            fn try_from(t: DateTime<Utc>) -> Result<Self, Self::Error> {
                Self::new(t)
            }
        }

        impl From<$name> for DateTime<Utc> {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&format_time(&self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = BrickError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_with_layouts(s)
                    .map(Self)
                    .map_err(|err| err.with_context("target_type", Self::TYPE_NAME))
            }
        }

        impl $crate::codec::StructuredCodec for $name {
            fn to_structured(&self) -> Value {
                Value::String(format_time(&self.0))
            }

            fn from_structured(value: &Value) -> Result<Self, BrickError> {
                if value.is_null() {
                    return Err($crate::codec::null_rejected(Self::TYPE_NAME));
                }
                time_from_json(Self::TYPE_NAME, value).map(Self)
            }
        }

        $crate::codec::impl_serde_via_structured!($name);

        impl $crate::storage::StorageCodec for $name {
            fn to_storage(&self) -> SqlValue {
                SqlValue::Timestamp(self.0)
            }

            fn from_storage(src: SqlValue) -> Result<Self, BrickError> {
                time_from_storage(Self::TYPE_NAME, src)
                    .map(Self)
                    .map_err(|err| $crate::primitive::scan_rejected(Self::TYPE_NAME, err))
            }
        }
    };
}

audit_timestamp!(
    /// When a record was created.
    CreatedAt
);

audit_timestamp!(
    /// When a record was last modified.
    UpdatedAt
);

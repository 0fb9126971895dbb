//! # Validated Primitive Capability
//!
//! One construct/normalize/validate pipeline, specialized per primitive
//! through two hooks, plus the macros that derive the three codecs
//! (structured, text, storage) from it. A primitive implements the pipeline
//! once; every entry point (constructor, `FromStr`, JSON, storage scan) runs
//! the same normalization.
//!
//! ## Two-tier constructors
//!
//! Each fallible constructor has a `must_*` twin for call sites whose input is
//! valid by construction (literals, constants). The twin goes through
//! [`must`], which logs the violation and aborts the process. It never
//! unwinds, so it cannot be caught and used as control flow.

use crate::error::BrickError;

/// Normalize-then-validate pipeline for text-backed primitives.
pub(crate) trait TextPrimitive: Sized {
    /// Type name used in messages and context.
    const TYPE_NAME: &'static str;

    /// Non-failing normalization applied before validation.
    fn normalize(raw: &str) -> String;

    /// Validate the normalized form. `raw` is the caller's input, kept for
    /// diagnostics only.
    fn validate(normalized: String, raw: &str) -> Result<Self, BrickError>;

    /// Canonical text of a constructed value.
    fn canonical(&self) -> &str;

    /// The pipeline: normalize, then validate.
    fn construct(raw: &str) -> Result<Self, BrickError> {
        Self::validate(Self::normalize(raw), raw)
    }
}

/// Range-checked pipeline for integer-backed primitives.
pub(crate) trait IntegerPrimitive: Sized {
    /// Type name used in messages and context.
    const TYPE_NAME: &'static str;

    /// Validate an integer.
    fn from_i64(value: i64) -> Result<Self, BrickError>;

    /// Canonical integer of a constructed value.
    fn to_i64(&self) -> i64;

    /// Parse textual digits, then validate.
    fn parse_text(raw: &str) -> Result<Self, BrickError> {
        let value = raw.trim().parse::<i64>().map_err(|err| {
            BrickError::validation(format!(
                "{} must be an integer (received: '{raw}').",
                Self::TYPE_NAME
            ))
            .with_context("input_text", raw)
            .with_context("target_type", Self::TYPE_NAME)
            .with_source(err)
        })?;
        Self::from_i64(value)
    }
}

/// Unwrap a constructor result whose input the caller guarantees is valid.
///
/// A failure here is a caller-side bug, not a data problem: the error is
/// logged and the process aborts.
pub fn must<T>(result: Result<T, BrickError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(
                error = %err,
                kind = %err.kind(),
                context = ?err.context(),
                "statically valid input failed validation; aborting"
            );
            std::process::abort()
        }
    }
}

/// Record a storage decode rejection and pass the error through.
pub(crate) fn scan_rejected(target_type: &'static str, err: BrickError) -> BrickError {
    tracing::debug!(target_type, error = %err, "storage decode rejected input");
    err
}

/// Derive `Display`, `FromStr`, JSON, serde and storage codecs for a
/// [`TextPrimitive`].
///
/// Storage decode accepts `Text` and `Bytes`; the scanned value is added to the
/// error context under `scan_source_value`.
macro_rules! impl_text_codecs {
    ($ty:ty) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::primitive::TextPrimitive::canonical(self))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::error::BrickError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as $crate::primitive::TextPrimitive>::construct(s)
            }
        }

        impl $crate::codec::StructuredCodec for $ty {
            fn to_structured(&self) -> serde_json::Value {
                serde_json::Value::String(
                    $crate::primitive::TextPrimitive::canonical(self).to_string(),
                )
            }

            fn from_structured(
                value: &serde_json::Value,
            ) -> Result<Self, $crate::error::BrickError> {
                const NAME: &str = <$ty as $crate::primitive::TextPrimitive>::TYPE_NAME;
                match value {
                    serde_json::Value::String(s) => {
                        <$ty as $crate::primitive::TextPrimitive>::construct(s)
                    }
                    serde_json::Value::Null => Err($crate::codec::null_rejected(NAME)),
                    other => Err($crate::codec::wrong_token(NAME, "string", other)),
                }
            }
        }

        $crate::codec::impl_serde_via_structured!($ty);

        impl $crate::storage::StorageCodec for $ty {
            fn to_storage(&self) -> $crate::storage::SqlValue {
                $crate::storage::SqlValue::Text(
                    $crate::primitive::TextPrimitive::canonical(self).to_string(),
                )
            }

            fn from_storage(
                src: $crate::storage::SqlValue,
            ) -> Result<Self, $crate::error::BrickError> {
                use $crate::storage::SqlValue;
                const NAME: &str = <$ty as $crate::primitive::TextPrimitive>::TYPE_NAME;
                let text = match src {
                    SqlValue::Text(text) => text,
                    SqlValue::Bytes(bytes) => $crate::storage::utf8_text(NAME, bytes)
                        .map_err(|err| $crate::primitive::scan_rejected(NAME, err))?,
                    SqlValue::Null => {
                        return Err($crate::primitive::scan_rejected(
                            NAME,
                            $crate::storage::null_rejected(NAME),
                        ))
                    }
                    other => {
                        return Err($crate::primitive::scan_rejected(
                            NAME,
                            $crate::storage::unsupported(NAME, &other, "text or bytes"),
                        ))
                    }
                };
                <$ty as $crate::primitive::TextPrimitive>::construct(&text).map_err(|err| {
                    $crate::primitive::scan_rejected(
                        NAME,
                        err.with_context("scan_source_value", text.as_str()),
                    )
                })
            }
        }
    };
}

pub(crate) use impl_text_codecs;

/// Derive `Display`, `FromStr`, JSON, serde and storage codecs for an
/// [`IntegerPrimitive`].
///
/// JSON uses a number token. Storage writes `Int64` and reads `Int64`,
/// `Text` or `Bytes`.
macro_rules! impl_integer_codecs {
    ($ty:ty) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", $crate::primitive::IntegerPrimitive::to_i64(self))
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::error::BrickError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as $crate::primitive::IntegerPrimitive>::parse_text(s)
            }
        }

        impl $crate::codec::StructuredCodec for $ty {
            fn to_structured(&self) -> serde_json::Value {
                serde_json::Value::from($crate::primitive::IntegerPrimitive::to_i64(self))
            }

            fn from_structured(
                value: &serde_json::Value,
            ) -> Result<Self, $crate::error::BrickError> {
                const NAME: &str = <$ty as $crate::primitive::IntegerPrimitive>::TYPE_NAME;
                match value {
                    serde_json::Value::Null => Err($crate::codec::null_rejected(NAME)),
                    serde_json::Value::Number(n) => match n.as_i64() {
                        Some(i) => <$ty as $crate::primitive::IntegerPrimitive>::from_i64(i)
                            .map_err(|err| err.with_context("input_json", value.to_string())),
                        None => Err($crate::codec::wrong_token(NAME, "integer", value)),
                    },
                    other => Err($crate::codec::wrong_token(NAME, "number", other)),
                }
            }
        }

        $crate::codec::impl_serde_via_structured!($ty);

        impl $crate::storage::StorageCodec for $ty {
            fn to_storage(&self) -> $crate::storage::SqlValue {
                $crate::storage::SqlValue::Int64(
                    $crate::primitive::IntegerPrimitive::to_i64(self),
                )
            }

            fn from_storage(
                src: $crate::storage::SqlValue,
            ) -> Result<Self, $crate::error::BrickError> {
                use $crate::storage::SqlValue;
                const NAME: &str = <$ty as $crate::primitive::IntegerPrimitive>::TYPE_NAME;
                let result = match src {
                    SqlValue::Int64(i) => {
                        <$ty as $crate::primitive::IntegerPrimitive>::from_i64(i)
                            .map_err(|err| err.with_context("source_value", i))
                    }
                    SqlValue::Text(text) => {
                        <$ty as $crate::primitive::IntegerPrimitive>::parse_text(&text)
                    }
                    SqlValue::Bytes(bytes) => $crate::storage::utf8_text(NAME, bytes).and_then(
                        |text| <$ty as $crate::primitive::IntegerPrimitive>::parse_text(&text),
                    ),
                    SqlValue::Null => Err($crate::storage::null_rejected(NAME)),
                    other => Err($crate::storage::unsupported(
                        NAME,
                        &other,
                        "int64, text or bytes",
                    )),
                };
                result.map_err(|err| $crate::primitive::scan_rejected(NAME, err))
            }
        }
    };
}

pub(crate) use impl_integer_codecs;

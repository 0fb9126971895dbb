//! # Nullable Wrappers
//!
//! Value/flag pairs for optional columns. The pair is private and changes
//! only as a whole, through the transitions below, so a wrapper can never
//! hold a stale value behind a cleared flag.
//!
//! | transition | value | flag |
//! |---|---|---|
//! | `with_time(t)` / `with_identifier(id)` | `t` / `id` | not zero / not nil |
//! | `cleared()` | zero / nil | `false` |
//! | `new(v, valid)` | `v` | `valid`, taken as given |
//!
//! `new(zero, true)` is deliberately representable: it is a present value
//! that happens to be the zero instant, and reports both `!is_null()` and
//! `is_zero()`.
//!
//! The zero instant is the Unix epoch, `DateTime::<Utc>::default()`.
//!
//! Constructors that take an instant reject years outside
//! [`MIN_YEAR`](crate::temporal::MIN_YEAR)`..=`[`MAX_YEAR`](crate::temporal::MAX_YEAR),
//! as the audit timestamps do.
//!
//! Equality and hashing look only at what the codecs can see: two cleared
//! pairs are equal whatever value they hide.
//!
//! ## Codecs
//!
//! - JSON: `null` when the flag is clear; `null` decodes to the cleared pair,
//!   anything else to a pair with the flag set.
//! - Text: the empty string stands for the cleared pair.
//! - Storage: SQL `NULL` both ways.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::codec::{impl_serde_via_structured, StructuredCodec};
use crate::error::BrickError;
use crate::identity::Identifier;
use crate::primitive::scan_rejected;
use crate::storage::{SqlValue, StorageCodec};
use crate::temporal::{
    check_year_range, format_time, parse_with_layouts, time_from_json, time_from_storage,
};

/// The zero instant.
pub fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

// ---- NullableTime ----

/// An optional UTC instant.
#[derive(Debug, Clone, Copy)]
pub struct NullableTime {
    time: DateTime<Utc>,
    valid: bool,
}

impl NullableTime {
    const TYPE_NAME: &'static str = "NullableTime";

    /// A pair exactly as given, including `(zero, true)`.
    ///
    /// # Errors
    ///
    /// Invalid input if `time` falls outside the supported years.
    pub fn new(time: DateTime<Utc>, valid: bool) -> Result<Self, BrickError> {
        check_year_range(time)
            .map(|time| Self { time, valid })
            .map_err(|err| err.with_context("target_type", Self::TYPE_NAME))
    }

    /// A present instant; the flag is set even for the zero instant.
    ///
    /// # Errors
    ///
    /// As [`NullableTime::new`].
    pub fn valid(time: DateTime<Utc>) -> Result<Self, BrickError> {
        Self::new(time, true)
    }

    /// The absent value.
    pub fn null() -> Self {
        Self { time: zero_time(), valid: false }
    }

    /// A pair whose flag is derived from whether `time` is the zero instant.
    ///
    /// # Errors
    ///
    /// As [`NullableTime::new`].
    pub fn with_time(time: DateTime<Utc>) -> Result<Self, BrickError> {
        Self::new(time, time != zero_time())
    }

    /// A present instant already known to be in range.
    fn present(time: DateTime<Utc>) -> Self {
        Self { time, valid: true }
    }

    /// The absent value.
    #[must_use]
    pub fn cleared(self) -> Self {
        Self::null()
    }

    /// Replace the pair with [`NullableTime::with_time`]; on error the pair
    /// is left unchanged.
    ///
    /// # Errors
    ///
    /// As [`NullableTime::new`].
    pub fn set(&mut self, time: DateTime<Utc>) -> Result<(), BrickError> {
        *self = Self::with_time(time)?;
        Ok(())
    }

    /// Replace the pair with the absent value.
    pub fn set_null(&mut self) {
        *self = self.cleared();
    }

    /// Whether the flag is clear.
    pub fn is_null(&self) -> bool {
        !self.valid
    }

    /// Whether the flag is set.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the stored instant is the zero instant, regardless of the flag.
    pub fn is_zero(&self) -> bool {
        self.time == zero_time()
    }

    /// The instant, if the flag is set.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.valid.then_some(self.time)
    }

    /// The instant, or the zero instant if the flag is clear.
    pub fn time_or_zero(&self) -> DateTime<Utc> {
        self.time().unwrap_or_else(zero_time)
    }
}

impl PartialEq for NullableTime {
    fn eq(&self, other: &Self) -> bool {
        self.time() == other.time()
    }
}

impl Eq for NullableTime {}

impl std::hash::Hash for NullableTime {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.time().hash(state);
    }
}

impl Default for NullableTime {
    fn default() -> Self {
        Self::null()
    }
}

impl TryFrom<Option<DateTime<Utc>>> for NullableTime {
    type Error = BrickError;

    fn try_from(time: Option<DateTime<Utc>>) -> Result<Self, Self::Error> {
        time.map_or_else(|| Ok(Self::null()), Self::valid)
    }
}

impl std::fmt::Display for NullableTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.time() {
            Some(t) => f.write_str(&format_time(&t)),
            None => Ok(()),
        }
    }
}

impl std::str::FromStr for NullableTime {
    type Err = BrickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::null());
        }
        parse_with_layouts(s)
            .map(Self::present)
            .map_err(|err| err.with_context("target_type", Self::TYPE_NAME))
    }
}

impl StructuredCodec for NullableTime {
    fn to_structured(&self) -> Value {
        self.time()
            .map_or(Value::Null, |t| Value::String(format_time(&t)))
    }

    fn from_structured(value: &Value) -> Result<Self, BrickError> {
        if value.is_null() {
            return Ok(Self::null());
        }
        time_from_json(Self::TYPE_NAME, value).map(Self::present)
    }
}

impl_serde_via_structured!(NullableTime);

impl StorageCodec for NullableTime {
    fn to_storage(&self) -> SqlValue {
        self.time().map_or(SqlValue::Null, SqlValue::Timestamp)
    }

    fn from_storage(src: SqlValue) -> Result<Self, BrickError> {
        if src.is_null() {
            return Ok(Self::null());
        }
        time_from_storage(Self::TYPE_NAME, src)
            .map(Self::present)
            .map_err(|err| scan_rejected(Self::TYPE_NAME, err))
    }
}

// ---- DeletedAt / ArchivedAt ----

/// Define a soft-state marker backed by a [`NullableTime`].
macro_rules! time_marker {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(NullableTime);

        impl $name {
            /// Marked at the current instant.
            pub fn now() -> Self {
                Self(NullableTime::present(Utc::now()))
            }

            /// Not marked.
            pub fn nil() -> Self {
                Self(NullableTime::null())
            }

            /// This marker, re-marked at the current instant.
            #[must_use]
            pub fn marked_now(self) -> Self {
                Self::now()
            }

            /// Mark at the current instant.
            pub fn set_now(&mut self) {
                *self = self.marked_now();
            }

            /// Whether the marker is unset.
            pub fn is_null(&self) -> bool {
                self.0.is_null()
            }

            /// Whether the stored instant is the zero instant.
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            /// When the marker was set, if it is.
            pub fn time(&self) -> Option<DateTime<Utc>> {
                self.0.time()
            }

            /// The underlying pair.
            pub fn inner(&self) -> &NullableTime {
                &self.0
            }
        }

        impl From<NullableTime> for $name {
            fn from(inner: NullableTime) -> Self {
                Self(inner)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = BrickError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<NullableTime>().map(Self)
            }
        }

        impl StructuredCodec for $name {
            fn to_structured(&self) -> Value {
                self.0.to_structured()
            }

            fn from_structured(value: &Value) -> Result<Self, BrickError> {
                NullableTime::from_structured(value).map(Self)
            }
        }

        impl_serde_via_structured!($name);

        impl StorageCodec for $name {
            fn to_storage(&self) -> SqlValue {
                self.0.to_storage()
            }

            fn from_storage(src: SqlValue) -> Result<Self, BrickError> {
                NullableTime::from_storage(src).map(Self)
            }
        }
    };
}

time_marker!(
    /// Soft-deletion marker; null while the record is live.
    DeletedAt
);

time_marker!(
    /// Archival marker; null while the record is active.
    ArchivedAt
);

// ---- NullableIdentifier ----

/// An optional [`Identifier`].
#[derive(Debug, Clone, Copy)]
pub struct NullableIdentifier {
    id: Identifier,
    valid: bool,
}

impl NullableIdentifier {
    const TYPE_NAME: &'static str = "NullableIdentifier";

    /// A pair exactly as given.
    pub fn new(id: Identifier, valid: bool) -> Self {
        Self { id, valid }
    }

    /// A present identifier; the flag is set even for nil.
    pub fn valid(id: Identifier) -> Self {
        Self::new(id, true)
    }

    /// The absent value.
    pub fn null() -> Self {
        Self::new(Identifier::NIL, false)
    }

    /// A pair whose flag is derived from whether `id` is nil.
    pub fn with_identifier(id: Identifier) -> Self {
        Self::new(id, !id.is_nil())
    }

    /// The absent value.
    #[must_use]
    pub fn cleared(self) -> Self {
        Self::null()
    }

    /// Replace the pair with [`NullableIdentifier::with_identifier`].
    pub fn set(&mut self, id: Identifier) {
        *self = Self::with_identifier(id);
    }

    /// Replace the pair with the absent value.
    pub fn set_null(&mut self) {
        *self = self.cleared();
    }

    /// Whether the flag is clear.
    pub fn is_null(&self) -> bool {
        !self.valid
    }

    /// Whether the flag is set and the identifier is not nil.
    pub fn is_valid(&self) -> bool {
        self.valid && !self.id.is_nil()
    }

    /// The identifier whenever the flag is set, nil included.
    pub fn get(&self) -> Option<Identifier> {
        self.valid.then_some(self.id)
    }

    /// The identifier, or nil if the flag is clear.
    pub fn identifier_or_nil(&self) -> Identifier {
        self.get().unwrap_or(Identifier::NIL)
    }
}

impl PartialEq for NullableIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for NullableIdentifier {}

impl std::hash::Hash for NullableIdentifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

impl Default for NullableIdentifier {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Option<Identifier>> for NullableIdentifier {
    fn from(id: Option<Identifier>) -> Self {
        id.map_or_else(Self::null, Self::valid)
    }
}

impl std::fmt::Display for NullableIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(id) => std::fmt::Display::fmt(&id, f),
            None => Ok(()),
        }
    }
}

impl std::str::FromStr for NullableIdentifier {
    type Err = BrickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::null());
        }
        Identifier::parse(s).map(Self::valid)
    }
}

impl StructuredCodec for NullableIdentifier {
    fn to_structured(&self) -> Value {
        self.get().map_or(Value::Null, |id| id.to_structured())
    }

    fn from_structured(value: &Value) -> Result<Self, BrickError> {
        if value.is_null() {
            return Ok(Self::null());
        }
        Identifier::from_structured(value)
            .map(Self::valid)
            .map_err(|err| err.with_context("target_type", Self::TYPE_NAME))
    }
}

impl_serde_via_structured!(NullableIdentifier);

impl StorageCodec for NullableIdentifier {
    fn to_storage(&self) -> SqlValue {
        self.get().map_or(SqlValue::Null, |id| id.to_storage())
    }

    fn from_storage(src: SqlValue) -> Result<Self, BrickError> {
        Identifier::from_storage(src)
            .map(Self::with_identifier)
            .map_err(|err| err.with_context("target_type", Self::TYPE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_json;
    use crate::error::ErrorKind;
    use chrono::TimeZone;
    use serde_json::json;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 20, 30).unwrap()
    }

    fn hash_of<T: std::hash::Hash>(value: &T) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher;
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    // ---- NullableTime ----

    #[test]
    fn with_time_derives_validity() {
        assert!(NullableTime::with_time(zero_time()).unwrap().is_null());
        let nt = NullableTime::with_time(instant()).unwrap();
        assert!(nt.is_valid());
        assert_eq!(nt.time(), Some(instant()));
    }

    #[test]
    fn forced_valid_zero_is_present_and_zero() {
        let nt = NullableTime::new(zero_time(), true).unwrap();
        assert!(!nt.is_null());
        assert!(nt.is_zero());
        assert_eq!(nt.time(), Some(zero_time()));
    }

    #[test]
    fn transitions_replace_whole_pair() {
        let mut nt = NullableTime::valid(instant()).unwrap();
        nt.set_null();
        assert_eq!(nt, NullableTime::null());
        assert_eq!(nt.time_or_zero(), zero_time());
        nt.set(instant()).unwrap();
        assert_eq!(nt.time_or_zero(), instant());
        assert_eq!(nt.cleared(), NullableTime::default());
    }

    #[test]
    fn invalid_pair_hides_stored_time() {
        let nt = NullableTime::new(instant(), false).unwrap();
        assert!(nt.is_null());
        assert_eq!(nt.time(), None);
        assert_eq!(nt.time_or_zero(), zero_time());
        assert!(!nt.is_zero());
    }

    #[test]
    fn cleared_pairs_compare_equal_whatever_they_hide() {
        let hidden = NullableTime::new(instant(), false).unwrap();
        assert_eq!(hidden, NullableTime::null());
        assert_eq!(hash_of(&hidden), hash_of(&NullableTime::null()));
        assert_eq!(DeletedAt::from(hidden), DeletedAt::nil());
        assert_ne!(NullableTime::valid(instant()).unwrap(), NullableTime::null());
        assert_ne!(NullableTime::new(zero_time(), true).unwrap(), NullableTime::null());

        let id = Identifier::must_parse(SAMPLE);
        let hidden = NullableIdentifier::new(id, false);
        assert_eq!(hidden, NullableIdentifier::null());
        assert_eq!(hash_of(&hidden), hash_of(&NullableIdentifier::null()));
        assert_ne!(NullableIdentifier::valid(id), hidden);
    }

    #[test]
    fn out_of_range_years_are_rejected() {
        let beyond = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::seconds(1);
        for err in [
            NullableTime::valid(beyond).unwrap_err(),
            NullableTime::with_time(beyond).unwrap_err(),
            NullableTime::new(beyond, false).unwrap_err(),
            NullableTime::try_from(Some(beyond)).unwrap_err(),
            NullableTime::from_storage(SqlValue::Timestamp(beyond)).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert_eq!(err.context_value("target_type"), Some(&json!("NullableTime")));
        }

        let mut nt = NullableTime::valid(instant()).unwrap();
        assert!(nt.set(beyond).is_err());
        assert_eq!(nt.time(), Some(instant()));
    }

    #[test]
    fn time_json() {
        assert_eq!(NullableTime::null().to_structured(), Value::Null);
        let nt = NullableTime::valid(instant()).unwrap();
        assert_eq!(nt.to_structured(), json!("2024-03-15T10:20:30Z"));
        assert_eq!(decode_json::<NullableTime>(b"null").unwrap(), NullableTime::null());
        assert_eq!(decode_json::<NullableTime>(br#""2024-03-15T10:20:30Z""#).unwrap(), nt);

        let forced = decode_json::<NullableTime>(br#""1970-01-01T00:00:00Z""#).unwrap();
        assert!(!forced.is_null() && forced.is_zero());

        let err = decode_json::<NullableTime>(br#""tomorrow""#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.context_value("target_type"), Some(&json!("NullableTime")));
    }

    #[test]
    fn time_text_and_storage() {
        assert_eq!(NullableTime::null().to_string(), "");
        assert_eq!("".parse::<NullableTime>().unwrap(), NullableTime::null());
        let nt: NullableTime = "2024-03-15 10:20:30".parse().unwrap();
        assert_eq!(nt, NullableTime::valid(instant()).unwrap());

        assert_eq!(NullableTime::null().to_storage(), SqlValue::Null);
        assert_eq!(nt.to_storage(), SqlValue::Timestamp(instant()));
        assert_eq!(NullableTime::from_storage(SqlValue::Null).unwrap(), NullableTime::null());
        assert_eq!(
            NullableTime::from_storage(SqlValue::Text("2024-03-15 10:20:30+00".into())).unwrap(),
            nt
        );
        let err = NullableTime::from_storage(SqlValue::Int64(3)).unwrap_err();
        assert_eq!(err.context_value("received_type"), Some(&json!("int64")));
    }

    #[test]
    fn option_conversion() {
        assert_eq!(NullableTime::try_from(None).unwrap(), NullableTime::null());
        assert_eq!(NullableTime::try_from(Some(instant())).unwrap().time(), Some(instant()));
    }

    // ---- markers ----

    #[test]
    fn markers() {
        let mut deleted = DeletedAt::nil();
        assert!(deleted.is_null());
        assert!(deleted.is_zero());
        deleted.set_now();
        assert!(!deleted.is_null());
        assert!(deleted.time().is_some());

        let archived = ArchivedAt::default().marked_now();
        assert!(archived.inner().is_valid());
        assert!(!ArchivedAt::now().is_null());
    }

    #[test]
    fn marker_codecs_delegate() {
        let deleted = DeletedAt::from(NullableTime::valid(instant()).unwrap());
        assert_eq!(deleted.to_structured(), json!("2024-03-15T10:20:30Z"));
        assert_eq!(decode_json::<DeletedAt>(b"null").unwrap(), DeletedAt::nil());
        assert_eq!(deleted.to_storage(), SqlValue::Timestamp(instant()));
        assert_eq!(ArchivedAt::from_storage(SqlValue::Null).unwrap(), ArchivedAt::nil());
        assert_eq!(deleted.to_string().parse::<DeletedAt>().unwrap(), deleted);
    }

    // ---- NullableIdentifier ----

    const SAMPLE: &str = "0190a6c4-3e1b-7c3a-9f5e-2b1d4c6e8a0f";

    #[test]
    fn identifier_validity() {
        let id = Identifier::must_parse(SAMPLE);
        assert!(NullableIdentifier::valid(id).is_valid());
        assert!(!NullableIdentifier::valid(Identifier::NIL).is_valid());
        assert_eq!(NullableIdentifier::valid(Identifier::NIL).get(), Some(Identifier::NIL));
        assert!(NullableIdentifier::with_identifier(Identifier::NIL).is_null());
        assert_eq!(NullableIdentifier::new(id, false).get(), None);
        assert_eq!(NullableIdentifier::null().identifier_or_nil(), Identifier::NIL);
    }

    #[test]
    fn identifier_transitions() {
        let id = Identifier::must_parse(SAMPLE);
        let mut nid = NullableIdentifier::default();
        nid.set(id);
        assert_eq!(nid.get(), Some(id));
        nid.set_null();
        assert_eq!(nid, NullableIdentifier::null());
        assert_eq!(NullableIdentifier::valid(id).cleared(), NullableIdentifier::null());
    }

    #[test]
    fn identifier_json() {
        let id = Identifier::must_parse(SAMPLE);
        assert_eq!(NullableIdentifier::null().to_structured(), Value::Null);
        assert_eq!(NullableIdentifier::valid(id).to_structured(), json!(SAMPLE));
        assert_eq!(
            decode_json::<NullableIdentifier>(b"null").unwrap(),
            NullableIdentifier::null()
        );
        let decoded = decode_json::<NullableIdentifier>(format!("\"{SAMPLE}\"").as_bytes()).unwrap();
        assert_eq!(decoded.get(), Some(id));

        let err = decode_json::<NullableIdentifier>(br#""bogus""#).unwrap_err();
        assert_eq!(err.context_value("target_type"), Some(&json!("NullableIdentifier")));
    }

    #[test]
    fn identifier_text_and_storage() {
        let id = Identifier::must_parse(SAMPLE);
        let nid = NullableIdentifier::valid(id);
        assert_eq!(nid.to_string(), SAMPLE);
        assert_eq!(NullableIdentifier::null().to_string(), "");
        assert_eq!(SAMPLE.parse::<NullableIdentifier>().unwrap(), nid);
        assert_eq!(" ".parse::<NullableIdentifier>().unwrap(), NullableIdentifier::null());

        assert_eq!(NullableIdentifier::null().to_storage(), SqlValue::Null);
        assert_eq!(nid.to_storage(), SqlValue::Text(SAMPLE.into()));
        assert_eq!(NullableIdentifier::from_storage(SqlValue::Text(SAMPLE.into())).unwrap(), nid);
        assert!(NullableIdentifier::from_storage(SqlValue::Null).unwrap().is_null());
        assert!(NullableIdentifier::from_storage(SqlValue::Bytes(Vec::new())).unwrap().is_null());
        assert!(NullableIdentifier::from_storage(SqlValue::Int64(1)).is_err());
    }
}

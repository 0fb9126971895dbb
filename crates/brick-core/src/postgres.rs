//! # PostgreSQL Bridge
//!
//! `sqlx` `Type`, `Encode` and `Decode` impls for [`Postgres`], enabled by the
//! `postgres` feature. Each impl reuses the primitive's storage codec, so a
//! value read through `sqlx` is normalized and validated exactly as one read
//! through [`StorageCodec::from_storage`].
//!
//! | primitive | column type |
//! |---|---|
//! | `Email`, `Phone`, `Currency` | `TEXT` / `VARCHAR` |
//! | `Day`, `Version` | `INT8` |
//! | `CreatedAt`, `UpdatedAt`, `NullableTime`, `DeletedAt`, `ArchivedAt` | `TIMESTAMPTZ` |
//! | `Identifier`, `NullableIdentifier` | `UUID` |
//!
//! Nil identifiers and cleared nullable wrappers bind as SQL `NULL`.

use chrono::{DateTime, Utc};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type, ValueRef};
use uuid::Uuid;

use crate::calendar::Day;
use crate::currency::Currency;
use crate::email::Email;
use crate::identity::Identifier;
use crate::nullable::{ArchivedAt, DeletedAt, NullableIdentifier, NullableTime};
use crate::phone::Phone;
use crate::primitive::{IntegerPrimitive, TextPrimitive};
use crate::storage::{SqlValue, StorageCodec};
use crate::temporal::{CreatedAt, UpdatedAt};
use crate::version::Version;

/// Declare `$ty` to have the same column type as `$repr`.
macro_rules! pg_type_as {
    ($ty:ty, $repr:ty) => {
        impl Type<Postgres> for $ty {
            fn type_info() -> PgTypeInfo {
                <$repr as Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <$repr as Type<Postgres>>::compatible(ty)
            }
        }
    };
}

macro_rules! pg_text {
    ($($ty:ty),+ $(,)?) => {$(
        pg_type_as!($ty, String);

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
                <&str as Encode<Postgres>>::encode_by_ref(&TextPrimitive::canonical(self), buf)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let text = <&str as Decode<Postgres>>::decode(value)?;
                Ok(<$ty>::from_storage(SqlValue::Text(text.to_owned()))?)
            }
        }
    )+};
}

macro_rules! pg_integer {
    ($($ty:ty),+ $(,)?) => {$(
        pg_type_as!($ty, i64);

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
                <i64 as Encode<Postgres>>::encode_by_ref(&IntegerPrimitive::to_i64(self), buf)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let n = <i64 as Decode<Postgres>>::decode(value)?;
                Ok(<$ty>::from_storage(SqlValue::Int64(n))?)
            }
        }
    )+};
}

macro_rules! pg_timestamp {
    ($($ty:ty),+ $(,)?) => {$(
        pg_type_as!($ty, DateTime<Utc>);

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
                <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(&self.time(), buf)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let t = <DateTime<Utc> as Decode<Postgres>>::decode(value)?;
                Ok(<$ty>::from_storage(SqlValue::Timestamp(t))?)
            }
        }
    )+};
}

macro_rules! pg_nullable_time {
    ($($ty:ty),+ $(,)?) => {$(
        pg_type_as!($ty, DateTime<Utc>);

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
                match self.time() {
                    Some(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(&t, buf),
                    None => Ok(IsNull::Yes),
                }
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                if value.is_null() {
                    return Ok(<$ty>::from_storage(SqlValue::Null)?);
                }
                let t = <DateTime<Utc> as Decode<Postgres>>::decode(value)?;
                Ok(<$ty>::from_storage(SqlValue::Timestamp(t))?)
            }
        }
    )+};
}

pg_text!(Email, Phone, Currency);
pg_integer!(Day, Version);
pg_timestamp!(CreatedAt, UpdatedAt);
pg_nullable_time!(NullableTime, DeletedAt, ArchivedAt);

// ---- identifiers ----

pg_type_as!(Identifier, Uuid);

impl Encode<'_, Postgres> for Identifier {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        if self.is_nil() {
            return Ok(IsNull::Yes);
        }
        <Uuid as Encode<Postgres>>::encode_by_ref(self.as_uuid(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for Identifier {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(Self::NIL);
        }
        <Uuid as Decode<Postgres>>::decode(value).map(Self::from)
    }
}

pg_type_as!(NullableIdentifier, Uuid);

impl Encode<'_, Postgres> for NullableIdentifier {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        match self.get() {
            Some(id) => <Identifier as Encode<Postgres>>::encode_by_ref(&id, buf),
            None => Ok(IsNull::Yes),
        }
    }
}

impl<'r> Decode<'r, Postgres> for NullableIdentifier {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        <Identifier as Decode<Postgres>>::decode(value).map(Self::with_identifier)
    }
}

#![deny(missing_docs)]

//! # brick-core: Domain Primitives with a Uniform Codec Contract
//!
//! Scalar value types that cannot exist in an invalid state once constructed:
//! identifiers, email addresses, phone numbers, currency codes, days of the
//! month, version counters, audit timestamps, and nullable time/identifier
//! wrappers.
//!
//! ## Key Design Principles
//!
//! 1. **Validate once, at the edge.** A primitive is obtained only through its
//!    validating constructor or a decode entry point, and every entry point
//!    runs the same normalize-then-validate pipeline. Holding an `Email`
//!    means holding a lower-cased, well-formed address.
//!
//! 2. **Three codecs, one contract.** Every primitive round-trips through
//!    JSON ([`StructuredCodec`], plus `serde`), plain text (`Display` /
//!    `FromStr`) and storage ([`StorageCodec`] over [`SqlValue`]). With the
//!    `postgres` feature the same storage codec backs `sqlx` bindings.
//!
//! 3. **One error type.** Every failure is a [`BrickError`] with a
//!    machine-readable [`ErrorKind`], a message, a diagnostic context holding
//!    the raw input, an optional cause, and optional child errors. It maps to
//!    an HTTP status and projects to an [`ErrorResponse`].
//!
//! 4. **Two-tier constructors.** `new` / `parse` / `generate` return
//!    `Result`; `must_*` twins are for statically valid input and abort the
//!    process on failure.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - No I/O beyond reading the wall clock. The only shared mutable state is
//!   the v7 identifier counter, behind a mutex.
//! - Logging goes through `tracing`; the crate never installs a subscriber.

pub mod calendar;
pub mod codec;
pub mod currency;
pub mod email;
pub mod error;
pub mod identity;
pub mod nullable;
pub mod phone;
pub mod primitive;
pub mod storage;
pub mod temporal;
pub mod version;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export primary types for ergonomic imports.
pub use calendar::{Day, MAX_DAY, MIN_DAY};
pub use codec::{decode_json, encode_json, StructuredCodec};
pub use currency::Currency;
pub use email::{Email, EMAIL_PATTERN, MAX_EMAIL_LENGTH};
pub use error::{BrickError, ErrorContext, ErrorKind, ErrorResponse};
pub use identity::Identifier;
pub use nullable::{zero_time, ArchivedAt, DeletedAt, NullableIdentifier, NullableTime};
pub use phone::Phone;
pub use primitive::must;
pub use storage::{SqlValue, StorageCodec};
pub use temporal::{
    parse_with_layouts, CreatedAt, TimeLayout, UpdatedAt, MAX_YEAR, MIN_YEAR, STORAGE_LAYOUTS,
};
pub use version::Version;

//! # Version Counter
//!
//! Optimistic-locking counter for aggregates. A fresh aggregate starts at 1
//! and every accepted write increments it. Zero is representable (it is what
//! [`Version::previous`] returns at the bottom) but negatives are not.

use crate::error::BrickError;
use crate::primitive::{impl_integer_codecs, IntegerPrimitive};

/// A non-negative version counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(i64);

impl Version {
    /// The first version of a new aggregate.
    pub const INITIAL: Self = Self(1);

    /// Version 1.
    pub fn new() -> Self {
        Self::INITIAL
    }

    /// The counter value.
    pub fn get(&self) -> i64 {
        self.0
    }

    /// The next version.
    #[must_use]
    pub fn incremented(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Advance in place.
    pub fn increment(&mut self) {
        *self = self.incremented();
    }

    /// The prior version, bottoming out at 0.
    #[must_use]
    pub fn previous(&self) -> Self {
        if self.0 <= 1 {
            Self(0)
        } else {
            Self(self.0 - 1)
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegerPrimitive for Version {
    const TYPE_NAME: &'static str = "Version";

    fn from_i64(value: i64) -> Result<Self, BrickError> {
        if value < 0 {
            return Err(BrickError::validation(format!(
                "Version cannot be negative (received: {value})."
            ))
            .with_context("input_value", value)
            .with_context("target_type", Self::TYPE_NAME));
        }
        Ok(Self(value))
    }

    fn to_i64(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Version {
    type Error = BrickError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_i64(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl_integer_codecs!(Version);

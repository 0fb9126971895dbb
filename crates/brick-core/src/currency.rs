//! # Currency Code
//!
//! A closed set of ISO 4217 codes. Input is case-insensitive and surrounding
//! whitespace is ignored; the canonical form is the upper-case code.

use crate::error::BrickError;
use crate::primitive::{impl_text_codecs, must, TextPrimitive};

/// A supported ISO 4217 currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    /// Brazilian real.
    Brl,
    /// United States dollar.
    Usd,
    /// Euro.
    Eur,
}

impl Currency {
    /// Brazilian real.
    pub const BRL: Self = Self::Brl;
    /// United States dollar.
    pub const USD: Self = Self::Usd;
    /// Euro.
    pub const EUR: Self = Self::Eur;

    /// Every supported currency, in declaration order.
    pub const ALL: [Self; 3] = [Self::Brl, Self::Usd, Self::Eur];

    /// Parse a currency code.
    ///
    /// # Errors
    ///
    /// Invalid input when the code is not one of [`Currency::ALL`].
    pub fn new(raw: &str) -> Result<Self, BrickError> {
        Self::construct(raw)
    }

    /// Like [`Currency::new`], aborting the process on an unknown code.
    pub fn must_new(raw: &str) -> Self {
        must(Self::new(raw))
    }

    /// The three-letter code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brl => "BRL",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

impl TextPrimitive for Currency {
    const TYPE_NAME: &'static str = "Currency";

    fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    fn validate(normalized: String, raw: &str) -> Result<Self, BrickError> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(Currency::as_str).collect();
                BrickError::validation(format!(
                    "Currency '{raw}' is not supported. Supported currencies: {}.",
                    supported.join(", ")
                ))
                .with_context("input_currency", raw)
                .with_context("supported_currencies", supported)
            })
    }

    fn canonical(&self) -> &str {
        self.as_str()
    }
}

impl_text_codecs!(Currency);

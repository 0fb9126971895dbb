//! # Phone Number
//!
//! [`Phone`] stores a 13-digit string: country code (2), area code (2) and
//! subscriber number (9), e.g. `5562982870053`.
//!
//! ## Normalization
//!
//! 1. Trim; reject empty input.
//! 2. Reject input longer than [`MAX_RAW_PHONE_INPUT_LENGTH`] characters,
//!    before any further work.
//! 3. Strip every non-digit.
//! 4. An 11-digit result lacks the country code and gets
//!    [`DEFAULT_COUNTRY_CODE`] prepended, unless it already starts with those
//!    digits. That case is ambiguous and is rejected rather than guessed.
//! 5. Require exactly [`NORMALIZED_PHONE_LENGTH`] digits.
//! 6. Require the [`DEFAULT_COUNTRY_CODE`] prefix.
//!
//! The constructor, `FromStr`, JSON decode and storage scan all run this same
//! pipeline.

use crate::error::BrickError;
use crate::primitive::{impl_text_codecs, must, TextPrimitive};

/// Country code prepended to local numbers and required on every number.
pub const DEFAULT_COUNTRY_CODE: &str = "55";
/// Digits in the country code.
pub const COUNTRY_CODE_LENGTH: usize = 2;
/// Digits in the area code.
pub const AREA_CODE_LENGTH: usize = 2;
/// Digits in the subscriber number.
pub const SUBSCRIBER_LENGTH: usize = 9;
/// Digits in a normalized number.
pub const NORMALIZED_PHONE_LENGTH: usize = COUNTRY_CODE_LENGTH + AREA_CODE_LENGTH + SUBSCRIBER_LENGTH;
/// Maximum characters accepted in raw input, after trimming.
pub const MAX_RAW_PHONE_INPUT_LENGTH: usize = 30;

/// A normalized phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Phone(String);

impl Phone {
    /// Normalize and validate a phone number.
    ///
    /// # Errors
    ///
    /// Invalid input for any failed normalization step. The raw input is
    /// recorded under `input_phone`.
    pub fn new(raw: &str) -> Result<Self, BrickError> {
        Self::construct(raw)
    }

    /// Like [`Phone::new`], aborting the process on invalid input.
    pub fn must_new(raw: &str) -> Self {
        must(Self::new(raw))
    }

    /// The 13-digit normalized number.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Country code digits.
    pub fn country_code(&self) -> &str {
        self.0.get(..COUNTRY_CODE_LENGTH).unwrap_or_default()
    }

    /// Area code digits.
    pub fn area_code(&self) -> &str {
        self.0
            .get(COUNTRY_CODE_LENGTH..COUNTRY_CODE_LENGTH + AREA_CODE_LENGTH)
            .unwrap_or_default()
    }

    /// Subscriber digits.
    pub fn subscriber(&self) -> &str {
        self.0
            .get(COUNTRY_CODE_LENGTH + AREA_CODE_LENGTH..)
            .unwrap_or_default()
    }
}

/// Prefix a local number with the country code and check the final shape.
fn prefix_and_check(digits: String, raw: &str) -> Result<String, BrickError> {
    let mut number = digits;

    if number.len() == AREA_CODE_LENGTH + SUBSCRIBER_LENGTH {
        if number.starts_with(DEFAULT_COUNTRY_CODE) {
            return Err(BrickError::validation(format!(
                "Invalid phone number format: 11-digit number starting with country code '{DEFAULT_COUNTRY_CODE}' is ambiguous or incomplete."
            ))
            .with_context("input_phone", raw)
            .with_context("normalized_phone", number));
        }
        number.insert_str(0, DEFAULT_COUNTRY_CODE);
    }

    if number.len() != NORMALIZED_PHONE_LENGTH {
        return Err(BrickError::validation(format!(
            "Normalized phone number must have {NORMALIZED_PHONE_LENGTH} digits (e.g., 55DDNNNNNNNNN), got {}.",
            number.len()
        ))
        .with_context("input_phone", raw)
        .with_context("expected_length", NORMALIZED_PHONE_LENGTH)
        .with_context("actual_length", number.len())
        .with_context("normalized_phone_after_prefix_attempt", number));
    }

    if !number.starts_with(DEFAULT_COUNTRY_CODE) {
        return Err(BrickError::validation(format!(
            "Normalized {NORMALIZED_PHONE_LENGTH}-digit phone number must start with country code '{DEFAULT_COUNTRY_CODE}'."
        ))
        .with_context("input_phone", raw)
        .with_context("expected_prefix", DEFAULT_COUNTRY_CODE)
        .with_context("normalized_phone", number));
    }

    Ok(number)
}

impl TextPrimitive for Phone {
    const TYPE_NAME: &'static str = "Phone";

    fn normalize(raw: &str) -> String {
        raw.trim().to_string()
    }

    fn validate(normalized: String, raw: &str) -> Result<Self, BrickError> {
        if normalized.is_empty() {
            return Err(BrickError::validation("Phone number cannot be empty.")
                .with_context("input_phone", raw));
        }

        let length = normalized.chars().count();
        if length > MAX_RAW_PHONE_INPUT_LENGTH {
            return Err(BrickError::validation(format!(
                "Raw phone input (length {length}) exceeds maximum length of {MAX_RAW_PHONE_INPUT_LENGTH} characters."
            ))
            .with_context("max_length", MAX_RAW_PHONE_INPUT_LENGTH)
            .with_context("input_phone", raw));
        }

        let digits: String = normalized.chars().filter(char::is_ascii_digit).collect();
        prefix_and_check(digits, raw).map(Self)
    }

    fn canonical(&self) -> &str {
        &self.0
    }
}

impl_text_codecs!(Phone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_json;
    use crate::error::ErrorKind;
    use crate::storage::{SqlValue, StorageCodec};
    use serde_json::json;

    #[test]
    fn formatted_inputs_normalize_to_same_number() {
        for raw in [
            "5562982870053",
            "62982870053",
            "(62) 98287-0053",
            "+55 62 98287-0053",
            "  +55 (62) 9 8287 0053  ",
        ] {
            assert_eq!(Phone::new(raw).unwrap().as_str(), "5562982870053", "{raw}");
        }
    }

    #[test]
    fn parts() {
        let phone = Phone::new("(62) 98287-0053").unwrap();
        assert_eq!(phone.country_code(), "55");
        assert_eq!(phone.area_code(), "62");
        assert_eq!(phone.subscriber(), "982870053");
    }

    #[test]
    fn rejects_empty() {
        let err = Phone::new(" \t ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.message().contains("cannot be empty"));
        assert_eq!(err.context_value("input_phone"), Some(&json!(" \t ")));
    }

    #[test]
    fn rejects_wrong_country_code() {
        let err = Phone::new("5462982870053").unwrap_err();
        assert!(err.message().contains("must start with country code '55'"));
        assert_eq!(err.context_value("expected_prefix"), Some(&json!("55")));
        assert_eq!(err.context_value("input_phone"), Some(&json!("5462982870053")));
    }

    #[test]
    fn rejects_ambiguous_eleven_digits() {
        let err = Phone::new("55123456789").unwrap_err();
        assert!(err.message().contains("is ambiguous"));
        assert_eq!(err.context_value("normalized_phone"), Some(&json!("55123456789")));
    }

    #[test]
    fn rejects_wrong_lengths() {
        for (raw, actual) in [
            ("6298287005", 10),
            ("55629828700531", 14),
            ("abc-def", 0),
            ("() -", 0),
        ] {
            let err = Phone::new(raw).unwrap_err();
            assert!(err.message().contains("must have 13 digits"), "{raw}");
            assert_eq!(err.context_value("expected_length"), Some(&json!(13)));
            assert_eq!(err.context_value("actual_length"), Some(&json!(actual)));
            assert_eq!(err.context_value("input_phone"), Some(&json!(raw)));
        }
    }

    #[test]
    fn rejects_raw_input_over_limit_before_stripping() {
        let raw = "1".repeat(MAX_RAW_PHONE_INPUT_LENGTH + 1);
        let err = Phone::new(&raw).unwrap_err();
        assert!(err.message().contains("Raw phone input (length 31) exceeds maximum length"));
        assert_eq!(err.context_value("max_length"), Some(&json!(30)));
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        // 13 digits padded with 17 two-byte characters: 30 chars, 47 bytes.
        let raw = format!("5562982870053{}", "é".repeat(17));
        assert_eq!(Phone::new(&raw).unwrap().as_str(), "5562982870053");
    }

    #[test]
    fn every_entry_point_normalizes() {
        let expected = Phone::new("5562982870053").unwrap();
        assert_eq!("(62) 98287-0053".parse::<Phone>().unwrap(), expected);
        assert_eq!(decode_json::<Phone>(br#""+55 62 98287-0053""#).unwrap(), expected);
        assert_eq!(
            Phone::from_storage(SqlValue::Text("62 98287 0053".into())).unwrap(),
            expected
        );
        assert_eq!(
            Phone::from_storage(SqlValue::Bytes(b"62982870053".to_vec())).unwrap(),
            expected
        );
    }

    #[test]
    fn json_rejects_non_string() {
        let err = decode_json::<Phone>(b"5562982870053").unwrap_err();
        assert!(err.message().contains("Phone must be a valid JSON string"));
        assert_eq!(err.context_value("input_json"), Some(&json!("5562982870053")));

        let err = decode_json::<Phone>(br#""invalid-phone-format""#).unwrap_err();
        assert!(err.message().contains("must have 13 digits"));
    }

    #[test]
    fn storage_scan_context() {
        let err = Phone::from_storage(SqlValue::Text("5462982870053".into())).unwrap_err();
        assert_eq!(err.context_value("scan_source_value"), Some(&json!("5462982870053")));
        assert!(Phone::from_storage(SqlValue::Null).is_err());
        let err = Phone::from_storage(SqlValue::Timestamp(chrono::Utc::now())).unwrap_err();
        assert_eq!(err.context_value("received_type"), Some(&json!("timestamp")));
    }
}

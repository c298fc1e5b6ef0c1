//! Dotted version-string codec.
//!
//! A version such as `"1.0.201"` is converted into a total order by treating
//! the dotted fields as a concatenation of decimal digits: `"1.0.201" ->
//! 10201`, `"0.5.0" -> 50`. This is cheap, total, and stable: every
//! comparison in the rest of the crate reduces to an integer compare.

use std::fmt;

use crate::error::AlphaDbError;

/// A version number parsed from a dotted string, ordered by its decimal
/// concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber(u64);

impl VersionNumber {
    /// Parse a dotted version string (e.g. `"1.0.201"`).
    ///
    /// Fields may have leading zeros; each field is read as-is and
    /// concatenated textually, not summed numerically, so `"1.0.201"`
    /// becomes the digit string `"10201"`.
    pub fn parse(s: &str) -> Result<Self, AlphaDbError> {
        if s.is_empty() {
            return Err(AlphaDbError::InvalidVersionNumber(s.to_string()));
        }

        let mut digits = String::with_capacity(s.len());
        for field in s.split('.') {
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AlphaDbError::InvalidVersionNumber(s.to_string()));
            }
            digits.push_str(field);
        }

        digits
            .parse::<u64>()
            .map(VersionNumber)
            .map_err(|_| AlphaDbError::InvalidVersionNumber(s.to_string()))
    }

    /// The raw integer this version number compares by.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for VersionNumber {
    type Error = AlphaDbError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_versions() {
        assert_eq!(VersionNumber::parse("1.2.34").unwrap().value(), 12_34);
        assert_eq!(VersionNumber::parse("0.2.6").unwrap().value(), 26);
    }

    #[test]
    fn concatenates_fields_textually() {
        assert_eq!(VersionNumber::parse("1.0.201").unwrap().value(), 10201);
        assert_eq!(VersionNumber::parse("0.5.0").unwrap().value(), 50);
    }

    #[test]
    fn leading_zero_fields_are_permitted() {
        assert_eq!(VersionNumber::parse("0.0.1").unwrap().value(), 1);
        assert_eq!(VersionNumber::parse("1.01.1").unwrap().value(), 1011);
    }

    #[test]
    fn rejects_empty_and_non_decimal_fields() {
        assert!(VersionNumber::parse("").is_err());
        assert!(VersionNumber::parse("1..2").is_err());
        assert!(VersionNumber::parse("1.a.2").is_err());
        assert!(VersionNumber::parse(".1.2").is_err());
    }

    #[test]
    fn total_order_matches_integer_compare() {
        let a = VersionNumber::parse("0.0.9").unwrap();
        let b = VersionNumber::parse("0.1.0").unwrap();
        assert!(a < b);
    }
}

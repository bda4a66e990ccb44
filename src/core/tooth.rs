//! Tooth positions in Universal Numeric Notation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A tooth position, 1-32 in Universal Numeric Notation
///
/// Teeth 1-16 run right to left across the upper arch, 17-32 left to right
/// across the lower arch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ToothNumber(u8);

/// Dental arch a tooth belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Upper,
    Lower,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Upper => write!(f, "upper"),
            Arch::Lower => write!(f, "lower"),
        }
    }
}

impl ToothNumber {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 32;

    /// Create a tooth number, rejecting anything outside 1-32
    pub fn new(n: u8) -> Result<Self, ToothError> {
        if (Self::MIN..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(ToothError::OutOfRange(n.to_string()))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn arch(self) -> Arch {
        if self.0 <= 16 {
            Arch::Upper
        } else {
            Arch::Lower
        }
    }

    /// All 32 positions in ascending order
    pub fn all() -> impl Iterator<Item = ToothNumber> {
        (Self::MIN..=Self::MAX).map(ToothNumber)
    }

    /// Parse a selection such as `"8"`, `"3,4,5"`, `"3-5"` or `"1-3, 8"`
    ///
    /// Duplicates collapse; the result is ordered.
    pub fn parse_selection(s: &str) -> Result<BTreeSet<ToothNumber>, ToothError> {
        let mut teeth = BTreeSet::new();

        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('-') {
                Some((start, end)) => {
                    let start: ToothNumber = start.trim().parse()?;
                    let end: ToothNumber = end.trim().parse()?;
                    if start > end {
                        return Err(ToothError::ReversedRange(token.to_string()));
                    }
                    teeth.extend((start.0..=end.0).map(ToothNumber));
                }
                None => {
                    teeth.insert(token.parse()?);
                }
            }
        }

        Ok(teeth)
    }
}

impl fmt::Display for ToothNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ToothNumber {
    type Err = ToothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let n: u32 = s.parse().map_err(|_| ToothError::Invalid(s.to_string()))?;
        u8::try_from(n)
            .map_err(|_| ToothError::OutOfRange(s.to_string()))
            .and_then(ToothNumber::new)
    }
}

impl TryFrom<u8> for ToothNumber {
    type Error = ToothError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        ToothNumber::new(n)
    }
}

impl From<ToothNumber> for u8 {
    fn from(tooth: ToothNumber) -> u8 {
        tooth.0
    }
}

/// Errors from parsing tooth numbers
#[derive(Debug, Error, miette::Diagnostic, PartialEq, Eq)]
pub enum ToothError {
    #[error("tooth number {0} is out of range")]
    #[diagnostic(
        code(implant_plan::tooth::out_of_range),
        help("Universal Numeric Notation uses 1-16 for the upper arch and 17-32 for the lower arch")
    )]
    OutOfRange(String),

    #[error("'{0}' is not a tooth number")]
    #[diagnostic(code(implant_plan::tooth::invalid))]
    Invalid(String),

    #[error("tooth range '{0}' runs backwards")]
    #[diagnostic(code(implant_plan::tooth::reversed_range), help("write ranges low to high, e.g. 3-5"))]
    ReversedRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teeth(ns: &[u8]) -> BTreeSet<ToothNumber> {
        ns.iter().map(|&n| ToothNumber::new(n).unwrap()).collect()
    }

    #[test]
    fn test_bounds() {
        assert!(ToothNumber::new(1).is_ok());
        assert!(ToothNumber::new(32).is_ok());
        assert_eq!(
            ToothNumber::new(0).unwrap_err(),
            ToothError::OutOfRange("0".to_string())
        );
        assert!(ToothNumber::new(33).is_err());
        assert_eq!(ToothNumber::all().count(), 32);
    }

    #[test]
    fn test_arch() {
        assert_eq!(ToothNumber::new(16).unwrap().arch(), Arch::Upper);
        assert_eq!(ToothNumber::new(17).unwrap().arch(), Arch::Lower);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("8".parse::<ToothNumber>().unwrap().get(), 8);
        assert_eq!(" 12 ".parse::<ToothNumber>().unwrap().get(), 12);
        assert!(matches!("abc".parse::<ToothNumber>(), Err(ToothError::Invalid(_))));
        assert!(matches!("-1".parse::<ToothNumber>(), Err(ToothError::Invalid(_))));
        assert!(matches!("300".parse::<ToothNumber>(), Err(ToothError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(ToothNumber::parse_selection("8").unwrap(), teeth(&[8]));
        assert_eq!(ToothNumber::parse_selection("5,3,4").unwrap(), teeth(&[3, 4, 5]));
        assert_eq!(ToothNumber::parse_selection("3-5").unwrap(), teeth(&[3, 4, 5]));
        assert_eq!(
            ToothNumber::parse_selection("1-3, 8, 2").unwrap(),
            teeth(&[1, 2, 3, 8])
        );
        assert!(ToothNumber::parse_selection("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_selection_errors() {
        assert_eq!(
            ToothNumber::parse_selection("5-3").unwrap_err(),
            ToothError::ReversedRange("5-3".to_string())
        );
        assert!(matches!(
            ToothNumber::parse_selection("30-33"),
            Err(ToothError::OutOfRange(_))
        ));
        assert!(matches!(
            ToothNumber::parse_selection("3,x"),
            Err(ToothError::Invalid(_))
        ));
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let ok: ToothNumber = serde_json::from_str("14").unwrap();
        assert_eq!(ok.get(), 14);
        assert!(serde_json::from_str::<ToothNumber>("40").is_err());
    }
}

use std::{fmt::Display, str::FromStr};

use num_bigint::{BigInt, ParseBigIntError, Sign};
use thiserror::Error;

/// An amount in the smallest on-chain unit of an 18 decimal token. Reward amounts routinely exceed
/// what fits in a float mantissa and the API makes no promise they fit in i128, so this is backed
/// by an arbitrary-precision integer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeiNewtype(pub BigInt);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseWeiError {
    #[error("empty wei amount")]
    Empty,
    #[error("wei amount {0:?} is not a base-10 integer")]
    NotBase10(String),
    #[error("invalid wei amount {raw:?}")]
    Invalid {
        raw: String,
        source: ParseBigIntError,
    },
}

/// An optional sign followed by ASCII digits only. `BigInt::from_str` on its own also accepts
/// underscore separators.
fn is_base10_integer(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl WeiNewtype {
    pub fn is_negative(&self) -> bool {
        self.0.sign() == Sign::Minus
    }
}

impl Display for WeiNewtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let WeiNewtype(amount) = self;
        write!(f, "{amount}")
    }
}

impl FromStr for WeiNewtype {
    type Err = ParseWeiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseWeiError::Empty);
        }

        if !is_base10_integer(s) {
            return Err(ParseWeiError::NotBase10(s.to_string()));
        }

        BigInt::from_str(s)
            .map(WeiNewtype)
            .map_err(|source| ParseWeiError::Invalid {
                raw: s.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_beyond_i128_test() {
        let raw = "340282366920938463463374607431768211456000";
        let wei = raw.parse::<WeiNewtype>().unwrap();
        assert_eq!(wei.to_string(), raw);
    }

    #[test]
    fn rejects_empty_test() {
        assert_eq!("".parse::<WeiNewtype>(), Err(ParseWeiError::Empty));
    }

    #[test]
    fn rejects_non_numeric_test() {
        assert_eq!(
            "abc".parse::<WeiNewtype>(),
            Err(ParseWeiError::NotBase10("abc".to_string()))
        );
    }

    #[test]
    fn rejects_decimal_point_test() {
        assert!("1.5".parse::<WeiNewtype>().is_err());
    }

    #[test]
    fn rejects_underscore_test() {
        for raw in ["1_000000000000000000", "1__0", "_1", "1_"] {
            assert_eq!(
                raw.parse::<WeiNewtype>(),
                Err(ParseWeiError::NotBase10(raw.to_string()))
            );
        }
    }

    #[test]
    fn rejects_sign_without_digits_test() {
        for raw in ["-", "+", "--1", " 1", "1 "] {
            assert!(raw.parse::<WeiNewtype>().is_err(), "{raw}");
        }
    }

    #[test]
    fn accepts_explicit_sign_test() {
        assert_eq!("+7".parse::<WeiNewtype>().unwrap().to_string(), "7");
        assert_eq!("-7".parse::<WeiNewtype>().unwrap().to_string(), "-7");
    }

    #[test]
    fn negative_test() {
        let wei = "-42".parse::<WeiNewtype>().unwrap();
        assert!(wei.is_negative());
        assert!(!"42".parse::<WeiNewtype>().unwrap().is_negative());
    }
}

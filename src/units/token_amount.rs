use std::{fmt::Display, ops::Add};

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};

use super::WeiNewtype;

/// A human scale token amount, exactly `wei / 10^decimals`. Unlike an f64 conversion this never
/// loses precision, whatever the magnitude of the raw amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    value: BigDecimal,
    decimals: u32,
}

impl TokenAmount {
    pub fn zero(decimals: u32) -> Self {
        Self {
            value: BigDecimal::new(BigInt::from(0), decimals.into()),
            decimals,
        }
    }

    pub fn from_wei(WeiNewtype(amount): &WeiNewtype, decimals: u32) -> Self {
        Self {
            value: BigDecimal::new(amount.clone(), decimals.into()),
            decimals,
        }
    }

    /// Renders with exactly `decimals` fractional digits, a dot separator, no grouping and no
    /// exponent, e.g. `1.234567890123456789`.
    pub fn to_fixed_string(&self) -> String {
        let (digits, _) = self
            .value
            .with_scale(self.decimals.into())
            .as_bigint_and_exponent();

        let sign = if digits.sign() == Sign::Minus { "-" } else { "" };
        let magnitude = digits.magnitude();
        let unit = BigUint::from(10_u32).pow(self.decimals);
        let whole = magnitude / &unit;

        if self.decimals == 0 {
            return format!("{sign}{whole}");
        }

        let fraction = (magnitude % &unit).to_string();
        format!(
            "{sign}{whole}.{fraction:0>width$}",
            width = self.decimals as usize
        )
    }
}

impl Add<TokenAmount> for TokenAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        TokenAmount {
            value: self.value + rhs.value,
            decimals: self.decimals.max(rhs.decimals),
        }
    }
}

impl Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_fixed_string())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::units::TOKEN_DECIMALS;

    fn fixed(raw: &str) -> String {
        let wei = raw.parse::<WeiNewtype>().unwrap();
        TokenAmount::from_wei(&wei, TOKEN_DECIMALS).to_fixed_string()
    }

    #[test]
    fn converts_reward_test() {
        assert_eq!(fixed("1234567890123456789"), "1.234567890123456789");
    }

    #[test]
    fn zero_pads_fraction_test() {
        assert_eq!(fixed("1"), "0.000000000000000001");
        assert_eq!(fixed("0"), "0.000000000000000000");
        assert_eq!(fixed("1000000000000000000"), "1.000000000000000000");
    }

    #[test]
    fn no_exponent_for_large_amounts_test() {
        assert_eq!(
            fixed("123456789012345678901234567890123456789"),
            "123456789012345678901.234567890123456789"
        );
    }

    #[test]
    fn negative_amount_test() {
        assert_eq!(fixed("-1"), "-0.000000000000000001");
        assert_eq!(fixed("-2500000000000000000"), "-2.500000000000000000");
    }

    #[test]
    fn round_trips_wide_amounts_test() {
        let amounts = [
            "0",
            "999999999999999999",
            "100000000000000000000000000000",
            "314159265358979323846264338327950288",
            "18446744073709551616000000000000000000001",
        ];

        for raw in amounts {
            let wei = raw.parse::<WeiNewtype>().unwrap();
            let rendered = TokenAmount::from_wei(&wei, TOKEN_DECIMALS).to_fixed_string();

            let (_, fraction) = rendered.split_once('.').unwrap();
            assert_eq!(fraction.len(), 18, "{rendered}");

            let parsed = BigDecimal::from_str(&rendered).unwrap();
            let numerator = parsed.with_scale(18).as_bigint_and_exponent().0;
            assert_eq!(numerator, wei.0, "{rendered}");
        }
    }

    #[test]
    fn add_is_exact_test() {
        let a = TokenAmount::from_wei(&"1".parse().unwrap(), TOKEN_DECIMALS);
        let b = TokenAmount::from_wei(
            &"99999999999999999999999999999".parse().unwrap(),
            TOKEN_DECIMALS,
        );
        assert_eq!((a + b).to_fixed_string(), "100000000000.000000000000000000");
    }

    #[test]
    fn zero_decimals_test() {
        let amount = TokenAmount::from_wei(&"42".parse().unwrap(), 0);
        assert_eq!(amount.to_fixed_string(), "42");
    }
}

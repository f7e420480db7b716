use std::fmt;
use std::str::FromStr;

use ethers::types::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::errors::CustomError;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const WEI_DECIMALS: u32 = 18;

/// A strictly positive amount in a chain's major unit (SOL or ETH).
///
/// Held as a `Decimal` so the conversion to lamports or wei never goes
/// through a floating-point approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, CustomError> {
        if value.is_zero() || value.is_sign_negative() {
            return Err(CustomError::InvalidAmountError(format!(
                "{} must be greater than zero",
                value
            )));
        }
        Ok(Self(value.normalize()))
    }

    /// Reads the `amount` field of a request body. JSON numbers and numeric
    /// strings are accepted, everything else is rejected.
    pub fn from_json(value: Option<&Value>) -> Result<Self, CustomError> {
        match value {
            None | Some(Value::Null) => Err(CustomError::InvalidAmountError(
                "amount is required".to_string(),
            )),
            Some(Value::Number(n)) => Self::from_str(&n.to_string()),
            Some(Value::String(s)) => Self::from_str(s),
            Some(other) => Err(CustomError::InvalidAmountError(format!(
                "expected a number, got {}",
                other
            ))),
        }
    }

    /// round(amount * 10^9), midpoints away from zero.
    pub fn to_lamports(&self) -> Result<u64, CustomError> {
        let lamports = self
            .0
            .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
            .ok_or_else(|| CustomError::InvalidAmountError(format!("{} SOL is too large", self)))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .ok_or_else(|| CustomError::InvalidAmountError(format!("{} SOL is too large", self)))?;

        if lamports == 0 {
            return Err(CustomError::InvalidAmountError(format!(
                "{} SOL is less than one lamport",
                self
            )));
        }
        Ok(lamports)
    }

    /// amount * 10^18 as an exact integer. Amounts finer than one wei are
    /// rejected instead of rounded.
    pub fn to_wei(&self) -> Result<U256, CustomError> {
        let scale = self.0.scale();
        if scale > WEI_DECIMALS {
            return Err(CustomError::InvalidAmountError(format!(
                "{} ETH has more than {} decimal places",
                self, WEI_DECIMALS
            )));
        }

        let mantissa = self.0.mantissa().unsigned_abs();
        Ok(U256::from(mantissa) * U256::exp10((WEI_DECIMALS - scale) as usize))
    }
}

impl FromStr for Amount {
    type Err = CustomError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let value = Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map_err(|_| CustomError::InvalidAmountError(format!("'{}' is not a number", raw)))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn amount(raw: &str) -> Amount {
        raw.parse().unwrap()
    }

    #[test]
    fn converts_sol_to_lamports() {
        assert_eq!(amount("0.5").to_lamports().unwrap(), 500_000_000);
        assert_eq!(amount("1").to_lamports().unwrap(), LAMPORTS_PER_SOL);
        assert_eq!(amount("0.1").to_lamports().unwrap(), 100_000_000);
        assert_eq!(amount("0.000000001").to_lamports().unwrap(), 1);
    }

    #[test]
    fn rounds_sub_lamport_fractions_half_away_from_zero() {
        assert_eq!(amount("1.0000000005").to_lamports().unwrap(), 1_000_000_001);
        assert_eq!(amount("1.0000000004").to_lamports().unwrap(), 1_000_000_000);
    }

    #[test]
    fn rejects_amount_below_one_lamport() {
        let err = amount("0.0000000004").to_lamports().unwrap_err();
        assert!(matches!(err, CustomError::InvalidAmountError(_)));
    }

    #[test]
    fn converts_eth_to_wei_exactly() {
        assert_eq!(amount("1").to_wei().unwrap(), U256::exp10(18));
        assert_eq!(amount("1.0").to_wei().unwrap(), U256::exp10(18));
        assert_eq!(amount("0.000000000000000001").to_wei().unwrap(), U256::one());
        assert_eq!(
            amount("1.234567890123456789").to_wei().unwrap(),
            U256::from_dec_str("1234567890123456789").unwrap()
        );
        assert_eq!(
            amount("12345678.9").to_wei().unwrap(),
            U256::from_dec_str("12345678900000000000000000").unwrap()
        );
    }

    #[test]
    fn rejects_sub_wei_precision() {
        let err = amount("0.0000000000000000001").to_wei().unwrap_err();
        assert!(matches!(err, CustomError::InvalidAmountError(_)));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!("0".parse::<Amount>().is_err());
        assert!("0.0".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
    }

    #[test]
    fn parses_json_numbers_and_numeric_strings() {
        assert_eq!(Amount::from_json(Some(&json!(0.5))).unwrap(), amount("0.5"));
        assert_eq!(Amount::from_json(Some(&json!("0.25"))).unwrap(), amount("0.25"));
        assert_eq!(Amount::from_json(Some(&json!(3))).unwrap(), amount("3"));
        assert_eq!(Amount::from_json(Some(&json!(1e-7))).unwrap(), amount("0.0000001"));
    }

    #[test]
    fn rejects_missing_or_non_numeric_json() {
        let values = [
            None,
            Some(json!(null)),
            Some(json!("abc")),
            Some(json!(true)),
            Some(json!([1])),
        ];
        for value in values {
            let err = Amount::from_json(value.as_ref()).unwrap_err();
            assert!(matches!(err, CustomError::InvalidAmountError(_)), "{:?}", value);
        }
    }
}

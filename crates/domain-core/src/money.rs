//! 货币值对象

use bookmart_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 货币代码
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Self {
        Self(code.to_uppercase())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 金额值对象
///
/// 以最小单位（分）存储。跨币种运算是调用方错误，返回校验失败。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn usd(amount: i64) -> Self {
        Self::new(amount, Currency::usd())
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    pub fn add(&self, other: &Money) -> AppResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency.clone()))
    }

    pub fn sub(&self, other: &Money) -> AppResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency.clone()))
    }

    pub fn times(&self, factor: i64) -> Money {
        Money::new(self.amount * factor, self.currency.clone())
    }

    fn ensure_same_currency(&self, other: &Money) -> AppResult<()> {
        if self.currency != other.currency {
            return Err(AppError::validation(format!(
                "Currency mismatch: {} vs {}",
                self.currency.as_str(),
                other.currency.as_str()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.amount / 100,
            (self.amount % 100).abs(),
            self.currency.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_same_currency() {
        let total = Money::usd(1050).add(&Money::usd(250)).unwrap();
        assert_eq!(total, Money::usd(1300));
    }

    #[test]
    fn test_currency_mismatch_rejected() {
        let result = Money::usd(100).add(&Money::new(100, Currency::eur()));
        assert!(result.is_err());
    }

    #[test]
    fn test_times() {
        assert_eq!(Money::usd(250).times(3), Money::usd(750));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::usd(1999).to_string(), "19.99 USD");
    }
}

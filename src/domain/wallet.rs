use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};

use crate::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Purchase,
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Purchase => "purchase",
            TransactionKind::Refund => "refund",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "purchase" => Ok(TransactionKind::Purchase),
            "refund" => Ok(TransactionKind::Refund),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the balance after a signed adjustment. The only place the
/// non-negative balance invariant is decided.
pub fn apply(previous: &BigDecimal, amount: &BigDecimal) -> Result<BigDecimal, AppError> {
    let new_balance = previous + amount;
    if new_balance < BigDecimal::zero() {
        return Err(AppError::InsufficientBalance);
    }
    Ok(new_balance)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn credit_increases_balance() {
        assert_eq!(apply(&dec("50"), &dec("200")).unwrap(), dec("250"));
    }

    #[test]
    fn debit_decreases_balance() {
        assert_eq!(apply(&dec("250"), &dec("-100.50")).unwrap(), dec("149.50"));
    }

    #[test]
    fn debit_to_exactly_zero_is_allowed() {
        assert_eq!(apply(&dec("99.99"), &dec("-99.99")).unwrap(), dec("0.00"));
    }

    #[test]
    fn overdraft_is_rejected() {
        assert!(matches!(
            apply(&dec("10"), &dec("-10.01")),
            Err(AppError::InsufficientBalance)
        ));
    }

    #[test]
    fn adjustment_round_trip_restores_balance_exactly() {
        let original = dec("123.45");
        let credited = apply(&original, &dec("100")).unwrap();
        let restored = apply(&credited, &dec("-100")).unwrap();
        assert_eq!(restored, original);
    }
}

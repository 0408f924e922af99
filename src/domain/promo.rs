use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::rounding::RoundingMode;
use chrono::{DateTime, Utc};

use crate::app_error::AppError;
use crate::models::PromoCodeEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            other => Err(format!("unknown discount type: {other}")),
        }
    }
}

/// Checks whether a promo code may be applied to an order of `subtotal`.
/// Checkout calls this on a row locked with `FOR UPDATE`, so the usage-limit
/// check and the `times_used` increment cannot race.
pub fn check_eligibility(
    promo: &PromoCodeEntity,
    subtotal: &BigDecimal,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if !promo.is_active {
        return Err(AppError::Validation("promo code is inactive".into()));
    }
    if promo.expires_at.is_some_and(|expires_at| expires_at < now) {
        return Err(AppError::Validation("promo code has expired".into()));
    }
    if *subtotal < promo.min_order_amount {
        return Err(AppError::Validation(format!(
            "order total is below the promo code minimum of {}",
            promo.min_order_amount
        )));
    }
    if promo
        .usage_limit
        .is_some_and(|limit| promo.times_used >= limit)
    {
        return Err(AppError::Conflict(
            "promo code usage limit reached".into(),
        ));
    }
    Ok(())
}

/// Discount owed for `subtotal`, rounded to cents. A fixed discount never
/// exceeds the subtotal, so order totals stay non-negative.
pub fn discount_amount(
    promo: &PromoCodeEntity,
    subtotal: &BigDecimal,
) -> Result<BigDecimal, AppError> {
    let discount_type: DiscountType = promo
        .discount_type
        .parse()
        .map_err(|err: String| AppError::Other(anyhow::anyhow!(err)))?;

    let discount = match discount_type {
        DiscountType::Percentage => (subtotal * &promo.discount_value / BigDecimal::from(100))
            .with_scale_round(2, RoundingMode::HalfUp),
        DiscountType::Fixed => {
            if promo.discount_value > *subtotal {
                subtotal.clone()
            } else {
                promo.discount_value.clone()
            }
        }
    };
    Ok(discount)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use chrono::Duration;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn promo(discount_type: DiscountType, value: &str) -> PromoCodeEntity {
        PromoCodeEntity {
            id: 1,
            code: "SUMMER10".into(),
            discount_type: discount_type.as_str().into(),
            discount_value: dec(value),
            min_order_amount: dec("0"),
            usage_limit: None,
            times_used: 0,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_discount_rounds_to_cents() {
        let promo = promo(DiscountType::Percentage, "10");
        assert_eq!(discount_amount(&promo, &dec("149.99")).unwrap(), dec("15.00"));
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() {
        let promo = promo(DiscountType::Fixed, "50");
        assert_eq!(discount_amount(&promo, &dec("30")).unwrap(), dec("30"));
        assert_eq!(discount_amount(&promo, &dec("80")).unwrap(), dec("50"));
    }

    #[test]
    fn inactive_code_is_rejected() {
        let mut promo = promo(DiscountType::Fixed, "5");
        promo.is_active = false;
        assert!(matches!(
            check_eligibility(&promo, &dec("100"), Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn expired_code_is_rejected() {
        let mut promo = promo(DiscountType::Fixed, "5");
        promo.expires_at = Some(Utc::now() - Duration::days(1));
        assert!(matches!(
            check_eligibility(&promo, &dec("100"), Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn minimum_order_amount_is_enforced() {
        let mut promo = promo(DiscountType::Percentage, "10");
        promo.min_order_amount = dec("100");
        assert!(matches!(
            check_eligibility(&promo, &dec("99.99"), Utc::now()),
            Err(AppError::Validation(_))
        ));
        assert!(check_eligibility(&promo, &dec("100"), Utc::now()).is_ok());
    }

    #[test]
    fn exhausted_code_is_a_conflict() {
        let mut promo = promo(DiscountType::Percentage, "10");
        promo.usage_limit = Some(3);
        promo.times_used = 3;
        assert!(matches!(
            check_eligibility(&promo, &dec("100"), Utc::now()),
            Err(AppError::Conflict(_))
        ));
    }
}

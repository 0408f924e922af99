use std::fmt;
use std::str::FromStr;

use crate::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    AwaitingVerification,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::AwaitingVerification => "awaiting_verification",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "awaiting_verification" => Ok(PaymentStatus::AwaitingVerification),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    BankTransfer,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "wallet" => Ok(PaymentMethod::Wallet),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// What a fulfillment transition does to `stock_quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryEffect {
    /// No stock movement.
    None,
    /// Deduct each line item's quantity; fails the whole transition if any
    /// variant would go negative.
    Deduct,
    /// Return each line item's quantity to stock, best-effort.
    Restore,
}

/// The fulfillment transition table. Inventory is deducted lazily at the
/// shipped transition so unpaid orders never lock stock; re-setting the
/// current status is an explicit no-op.
pub fn plan_transition(
    from: OrderStatus,
    to: OrderStatus,
) -> Result<InventoryEffect, AppError> {
    use OrderStatus::*;

    if from == to {
        return Ok(InventoryEffect::None);
    }
    match (from, to) {
        (Pending, Shipped) => Ok(InventoryEffect::Deduct),
        (Shipped, Cancelled) => Ok(InventoryEffect::Restore),
        (Pending, Cancelled) => Ok(InventoryEffect::None),
        (Shipped, Delivered) => Ok(InventoryEffect::None),
        (from, to) => Err(AppError::Conflict(format!(
            "cannot transition order from {from} to {to}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn shipping_deducts_stock() {
        assert_eq!(plan_transition(Pending, Shipped).unwrap(), InventoryEffect::Deduct);
    }

    #[test]
    fn cancelling_a_shipped_order_restores_stock() {
        assert_eq!(
            plan_transition(Shipped, Cancelled).unwrap(),
            InventoryEffect::Restore
        );
    }

    #[test]
    fn cancelling_before_shipment_touches_nothing() {
        assert_eq!(
            plan_transition(Pending, Cancelled).unwrap(),
            InventoryEffect::None
        );
    }

    #[test]
    fn delivery_touches_nothing() {
        assert_eq!(
            plan_transition(Shipped, Delivered).unwrap(),
            InventoryEffect::None
        );
    }

    #[test]
    fn resetting_current_status_is_a_noop_for_every_state() {
        for status in [Pending, Shipped, Delivered, Cancelled] {
            assert_eq!(
                plan_transition(status, status).unwrap(),
                InventoryEffect::None
            );
        }
    }

    #[test]
    fn illegal_jumps_are_conflicts() {
        for (from, to) in [
            (Delivered, Shipped),
            (Delivered, Pending),
            (Delivered, Cancelled),
            (Cancelled, Shipped),
            (Cancelled, Pending),
            (Cancelled, Delivered),
            (Shipped, Pending),
            (Pending, Delivered),
        ] {
            assert!(matches!(
                plan_transition(from, to),
                Err(AppError::Conflict(_))
            ));
        }
    }

    #[test]
    fn statuses_round_trip_through_storage_strings() {
        for status in [Pending, Shipped, Delivered, Cancelled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        for status in [
            PaymentStatus::Unpaid,
            PaymentStatus::AwaitingVerification,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
    }
}

use serde::Deserialize;
use utoipa::ToSchema;

use crate::app_error::AppError;
use crate::domain::order::PaymentStatus;
use crate::domain::wallet::TransactionStatus;

/// The one-shot admin decision shared by payment verification and top-up
/// review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

/// A rejection is the only user-facing explanation for a failed top-up, so it
/// must carry an auditable note.
pub fn validate_topup_review(
    action: ReviewAction,
    admin_note: Option<&str>,
) -> Result<(), AppError> {
    if action == ReviewAction::Reject
        && admin_note.map(str::trim).unwrap_or_default().is_empty()
    {
        return Err(AppError::Validation(
            "a rejection requires a non-empty admin note".into(),
        ));
    }
    Ok(())
}

pub fn resolved_transaction_status(action: ReviewAction) -> TransactionStatus {
    match action {
        ReviewAction::Approve => TransactionStatus::Confirmed,
        ReviewAction::Reject => TransactionStatus::Rejected,
    }
}

pub fn resolved_payment_status(action: ReviewAction) -> PaymentStatus {
    match action {
        ReviewAction::Approve => PaymentStatus::Paid,
        ReviewAction::Reject => PaymentStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_without_note_fails_validation() {
        assert!(matches!(
            validate_topup_review(ReviewAction::Reject, None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_topup_review(ReviewAction::Reject, Some("   ")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejection_with_note_passes() {
        assert!(validate_topup_review(ReviewAction::Reject, Some("proof unreadable")).is_ok());
    }

    #[test]
    fn approval_needs_no_note() {
        assert!(validate_topup_review(ReviewAction::Approve, None).is_ok());
    }

    #[test]
    fn actions_resolve_to_terminal_statuses() {
        assert_eq!(
            resolved_transaction_status(ReviewAction::Approve),
            TransactionStatus::Confirmed
        );
        assert_eq!(
            resolved_transaction_status(ReviewAction::Reject),
            TransactionStatus::Rejected
        );
        assert_eq!(
            resolved_payment_status(ReviewAction::Approve),
            PaymentStatus::Paid
        );
        assert_eq!(
            resolved_payment_status(ReviewAction::Reject),
            PaymentStatus::Failed
        );
    }
}

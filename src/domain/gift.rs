use crate::app_error::AppError;

/// Whether the caller may redeem a code. An unset recipient lock means
/// anyone may redeem; a set lock matches the email case-insensitively.
pub fn check_recipient(
    recipient_email: Option<&str>,
    caller_email: &str,
) -> Result<(), AppError> {
    if let Some(recipient) = recipient_email
        && !recipient.eq_ignore_ascii_case(caller_email)
    {
        return Err(AppError::Forbidden(
            "gift code is addressed to another recipient".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_code_may_be_redeemed_by_anyone() {
        assert!(check_recipient(None, "anyone@example.com").is_ok());
    }

    #[test]
    fn recipient_lock_matches_case_insensitively() {
        assert!(check_recipient(Some("Nose@Example.com"), "nose@example.com").is_ok());
    }

    #[test]
    fn mismatched_recipient_is_forbidden() {
        assert!(matches!(
            check_recipient(Some("nose@example.com"), "other@example.com"),
            Err(AppError::Forbidden(_))
        ));
    }
}

use bigdecimal::BigDecimal;
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_error::AppError;
use crate::domain::wallet::{self, TransactionKind, TransactionStatus};
use crate::models::{CreateTransactionEntity, TransactionEntity};
use crate::schema::{profiles, transactions};

#[derive(Serialize, Debug, ToSchema)]
pub struct WalletAdjustment {
    #[schema(value_type = String)]
    pub previous_balance: BigDecimal,
    #[schema(value_type = String)]
    pub new_balance: BigDecimal,
}

/// Locks the profile row, applies the signed amount, and writes the new
/// balance. Callers must already be inside a database transaction so the
/// balance write commits or aborts together with their other rows.
async fn apply_balance_change(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    amount: &BigDecimal,
) -> Result<WalletAdjustment, AppError> {
    let previous_balance: BigDecimal = profiles::table
        .find(user_id)
        .select(profiles::wallet_balance)
        .for_update()
        .get_result(conn)
        .await?;

    let new_balance = wallet::apply(&previous_balance, amount)?;

    diesel::update(profiles::table.find(user_id))
        .set((
            profiles::wallet_balance.eq(&new_balance),
            profiles::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;

    Ok(WalletAdjustment {
        previous_balance,
        new_balance,
    })
}

/// The only sanctioned way to change `wallet_balance`: mutates the balance
/// and appends the confirmed audit row in the caller's transaction.
pub async fn adjust_wallet(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    amount: &BigDecimal,
    kind: TransactionKind,
    description: String,
) -> Result<WalletAdjustment, AppError> {
    let adjustment = apply_balance_change(conn, user_id, amount).await?;

    diesel::insert_into(transactions::table)
        .values(CreateTransactionEntity {
            user_id,
            kind: kind.as_str().into(),
            amount: amount.clone(),
            description,
            status: TransactionStatus::Confirmed.as_str().into(),
            proof_url: None,
        })
        .execute(conn)
        .await?;

    Ok(adjustment)
}

/// Credits an approved deposit. The deposit row itself is the audit record,
/// so no second transaction row is appended.
pub async fn settle_deposit(
    conn: &mut AsyncPgConnection,
    deposit: &TransactionEntity,
) -> Result<WalletAdjustment, AppError> {
    apply_balance_change(conn, deposit.user_id, &deposit.amount).await
}

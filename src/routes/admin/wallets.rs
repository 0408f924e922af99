use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use bigdecimal::{BigDecimal, Zero};
use diesel::{ExpressionMethods, QueryDsl};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    domain::wallet::TransactionKind,
    ledger::{self, WalletAdjustment},
    models::{ProfileEntity, TransactionEntity},
    schema::{profiles, transactions},
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/wallets",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_wallet))
            .routes(utoipa_axum::routes!(adjust_wallet))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                auth::admin_authorization,
            )),
    )
}

#[derive(Serialize, ToSchema)]
struct GetWalletRes {
    profile: ProfileEntity,
    transactions: Vec<TransactionEntity>,
}

/// A user's balance and full ledger history.
#[utoipa::path(
    get,
    path = "/{user_id}",
    tags = ["Admin / Wallets"],
    security(("bearerAuth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "Profile ID to inspect")
    ),
    responses(
        (status = 200, description = "Get wallet successfully", body = StdResponse<GetWalletRes, String>)
    )
)]
async fn get_wallet(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let profile: ProfileEntity = profiles::table.find(user_id).get_result(conn).await?;
    let history: Vec<TransactionEntity> = transactions::table
        .filter(transactions::user_id.eq(user_id))
        .order_by(transactions::created_at.desc())
        .get_results(conn)
        .await?;

    Ok(StdResponse {
        data: Some(GetWalletRes {
            profile,
            transactions: history,
        }),
        message: Some("Get wallet successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct AdjustWalletReq {
    /// Signed amount; positive credits, negative debits.
    #[schema(value_type = String)]
    amount: BigDecimal,
    /// Free-text reason recorded on the audit row.
    reason: String,
}

/// Manual goodwill credit or debit. Balance write and audit row commit in one
/// transaction; a debit below zero fails with `InsufficientBalance`.
#[utoipa::path(
    post,
    path = "/{user_id}/adjust",
    tags = ["Admin / Wallets"],
    security(("bearerAuth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "Profile ID to adjust")
    ),
    request_body = AdjustWalletReq,
    responses(
        (status = 200, description = "Wallet adjusted", body = StdResponse<WalletAdjustment, String>),
        (status = 409, description = "Adjustment would overdraw the wallet")
    )
)]
async fn adjust_wallet(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<AdjustWalletReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.amount.is_zero() {
        return Err(AppError::Validation("amount must be non-zero".into()));
    }
    if body.reason.trim().is_empty() {
        return Err(AppError::Validation("a reason is required".into()));
    }

    let conn = &mut state.conn().await?;

    let admin_id = caller.user_id;
    let adjustment = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let kind = if body.amount > BigDecimal::zero() {
                    TransactionKind::Refund
                } else {
                    TransactionKind::Purchase
                };
                ledger::adjust_wallet(
                    conn,
                    user_id,
                    &body.amount,
                    kind,
                    format!("Admin adjustment by {}: {}", admin_id, body.reason.trim()),
                )
                .await
            })
        })
        .await?;

    tracing::info!(
        admin = %admin_id,
        user = %user_id,
        "wallet adjusted manually"
    );

    Ok(StdResponse {
        data: Some(adjustment),
        message: Some("Wallet adjusted successfully"),
    })
}

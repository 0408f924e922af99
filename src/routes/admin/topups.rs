use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    domain::{
        review::{ReviewAction, resolved_transaction_status, validate_topup_review},
        wallet::{TransactionKind, TransactionStatus},
    },
    ledger,
    models::TransactionEntity,
    schema::transactions,
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/topups",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_pending_topups))
            .routes(utoipa_axum::routes!(process_topup))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                auth::admin_authorization,
            )),
    )
}

/// Deposit requests awaiting proof review, oldest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin / Top-ups"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List pending top-up requests", body = StdResponse<Vec<TransactionEntity>, String>)
    )
)]
async fn get_pending_topups(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let pending: Vec<TransactionEntity> = transactions::table
        .filter(transactions::kind.eq(TransactionKind::Deposit.as_str()))
        .filter(transactions::status.eq(TransactionStatus::Pending.as_str()))
        .order_by(transactions::created_at.asc())
        .get_results(conn)
        .await?;

    Ok(StdResponse {
        data: Some(pending),
        message: Some("Get pending top-ups successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct ProcessTopUpReq {
    action: ReviewAction,
    /// Required when rejecting; shown to the user as the reason.
    admin_note: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct ProcessTopUpRes {
    status: String,
    /// Present when an approved deposit credited the wallet.
    #[schema(value_type = Option<String>)]
    new_balance: Option<bigdecimal::BigDecimal>,
}

/// Resolve a pending top-up request. The status flip is a conditioned update
/// on `status = 'pending'`, so of two concurrent approvals exactly one wins
/// and credits the wallet once; the other sees `AlreadyProcessed`. Approval
/// and wallet credit commit in one transaction.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Admin / Top-ups"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Transaction ID to resolve")
    ),
    request_body = ProcessTopUpReq,
    responses(
        (status = 200, description = "Top-up request resolved", body = StdResponse<ProcessTopUpRes, String>),
        (status = 409, description = "Transaction already resolved"),
        (status = 422, description = "Rejection without an admin note")
    )
)]
async fn process_topup(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<ProcessTopUpReq>,
) -> Result<impl IntoResponse, AppError> {
    validate_topup_review(body.action, body.admin_note.as_deref())?;

    let conn = &mut state.conn().await?;

    let (transaction, adjustment) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let resolved = resolved_transaction_status(body.action);

                let updated: Option<TransactionEntity> = diesel::update(
                    transactions::table
                        .find(id)
                        .filter(transactions::status.eq(TransactionStatus::Pending.as_str())),
                )
                .set((
                    transactions::status.eq(resolved.as_str()),
                    transactions::admin_note.eq(body.admin_note),
                    transactions::updated_at.eq(diesel::dsl::now),
                ))
                .returning(TransactionEntity::as_returning())
                .get_result(conn)
                .await
                .optional()?;

                let Some(transaction) = updated else {
                    let exists: Option<Uuid> = transactions::table
                        .find(id)
                        .select(transactions::id)
                        .get_result(conn)
                        .await
                        .optional()?;
                    return Err(match exists {
                        Some(_) => AppError::AlreadyProcessed,
                        None => AppError::NotFound,
                    });
                };

                // Only a deposit moves money; a failed credit rolls the
                // status flip back so success is never partially reported.
                let adjustment = if body.action == ReviewAction::Approve
                    && transaction.kind == TransactionKind::Deposit.as_str()
                {
                    Some(ledger::settle_deposit(conn, &transaction).await?)
                } else {
                    None
                };

                Ok::<_, AppError>((transaction, adjustment))
            })
        })
        .await?;

    tracing::info!(
        admin = %caller.user_id,
        transaction_id = %transaction.id,
        status = %transaction.status,
        "top-up request resolved"
    );

    Ok(StdResponse {
        data: Some(ProcessTopUpRes {
            status: transaction.status,
            new_balance: adjustment.map(|a| a.new_balance),
        }),
        message: Some("Top-up request resolved successfully"),
    })
}

use axum::{Extension, Json, extract::State, response::IntoResponse};
use bigdecimal::{BigDecimal, Zero};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    domain::wallet::{TransactionKind, TransactionStatus},
    models::{CreateTransactionEntity, TransactionEntity},
    schema::{profiles, transactions},
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/storefront/wallet",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_my_wallet))
            .routes(utoipa_axum::routes!(request_topup))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                auth::customer_authorization,
            )),
    )
}

#[derive(Serialize, ToSchema)]
struct GetMyWalletRes {
    #[schema(value_type = String)]
    balance: BigDecimal,
    transactions: Vec<TransactionEntity>,
}

/// The caller's balance and ledger history.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Storefront / Wallet"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get wallet successfully", body = StdResponse<GetMyWalletRes, String>)
    )
)]
async fn get_my_wallet(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let balance: BigDecimal = profiles::table
        .find(caller.user_id)
        .select(profiles::wallet_balance)
        .get_result(conn)
        .await?;
    let history: Vec<TransactionEntity> = transactions::table
        .filter(transactions::user_id.eq(caller.user_id))
        .order_by(transactions::created_at.desc())
        .get_results(conn)
        .await?;

    Ok(StdResponse {
        data: Some(GetMyWalletRes {
            balance,
            transactions: history,
        }),
        message: Some("Get wallet successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct RequestTopUpReq {
    #[schema(value_type = String)]
    amount: BigDecimal,
    /// Object-storage URL of the transfer receipt, if already uploaded.
    proof_url: Option<String>,
}

/// File a top-up request. The deposit stays `pending` — and the balance
/// untouched — until an admin reviews the proof.
#[utoipa::path(
    post,
    path = "/topups",
    tags = ["Storefront / Wallet"],
    security(("bearerAuth" = [])),
    request_body = RequestTopUpReq,
    responses(
        (status = 200, description = "Top-up request filed", body = StdResponse<TransactionEntity, String>)
    )
)]
async fn request_topup(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<RequestTopUpReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.amount <= BigDecimal::zero() {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let conn = &mut state.conn().await?;

    let profile: Option<Uuid> = profiles::table
        .find(caller.user_id)
        .select(profiles::id)
        .get_result(conn)
        .await
        .optional()?;
    if profile.is_none() {
        return Err(AppError::NotFound);
    }

    let topup: TransactionEntity = diesel::insert_into(transactions::table)
        .values(CreateTransactionEntity {
            user_id: caller.user_id,
            kind: TransactionKind::Deposit.as_str().into(),
            amount: body.amount,
            description: "Wallet top-up request".into(),
            status: TransactionStatus::Pending.as_str().into(),
            proof_url: body.proof_url,
        })
        .returning(TransactionEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(topup),
        message: Some("Top-up request filed successfully"),
    })
}

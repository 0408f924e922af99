use axum::{Extension, Json, extract::State, response::IntoResponse};
use bigdecimal::{BigDecimal, Zero};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    domain::{gift, wallet::TransactionKind},
    ledger::{self, WalletAdjustment},
    models::{CreateGiftCodeEntity, GiftCodeEntity},
    routes::admin::gifts::generate_gift_code,
    schema::gift_codes,
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/storefront/gifts",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(purchase_gift))
            .routes(utoipa_axum::routes!(redeem_gift))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                auth::customer_authorization,
            )),
    )
}

#[derive(Deserialize, ToSchema)]
struct PurchaseGiftReq {
    #[schema(value_type = String)]
    amount: BigDecimal,
    /// Locks redemption to this email; unset means anyone may redeem.
    recipient_email: Option<String>,
}

/// Buy a gift code with wallet balance. Unlike admin-sent gifts, this debits
/// the buyer; debit and issuance commit in one transaction.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Storefront / Gifts"],
    security(("bearerAuth" = [])),
    request_body = PurchaseGiftReq,
    responses(
        (status = 200, description = "Gift code purchased", body = StdResponse<GiftCodeEntity, String>),
        (status = 409, description = "Insufficient wallet balance")
    )
)]
async fn purchase_gift(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<PurchaseGiftReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.amount <= BigDecimal::zero() {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let conn = &mut state.conn().await?;

    let buyer = caller.user_id;
    let gift = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let code = generate_gift_code();
                let debit = -&body.amount;
                ledger::adjust_wallet(
                    conn,
                    buyer,
                    &debit,
                    TransactionKind::Purchase,
                    format!("Purchase of gift code {code}"),
                )
                .await?;

                let gift: GiftCodeEntity = diesel::insert_into(gift_codes::table)
                    .values(CreateGiftCodeEntity {
                        code,
                        amount: body.amount,
                        recipient_email: body.recipient_email,
                        created_by: Some(buyer),
                    })
                    .returning(GiftCodeEntity::as_returning())
                    .get_result(conn)
                    .await?;

                Ok::<GiftCodeEntity, AppError>(gift)
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(gift),
        message: Some("Gift code purchased successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct RedeemGiftReq {
    code: String,
}

/// Redeem a gift code into the caller's wallet. Redemption flips `is_active`
/// with a conditioned update while the row is locked, so a code credits
/// exactly once; a second attempt fails with `AlreadyProcessed`.
#[utoipa::path(
    post,
    path = "/redeem",
    tags = ["Storefront / Gifts"],
    security(("bearerAuth" = [])),
    request_body = RedeemGiftReq,
    responses(
        (status = 200, description = "Gift code redeemed", body = StdResponse<WalletAdjustment, String>),
        (status = 403, description = "Code is addressed to another recipient"),
        (status = 409, description = "Code already redeemed")
    )
)]
async fn redeem_gift(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<RedeemGiftReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let adjustment = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let gift: Option<GiftCodeEntity> = gift_codes::table
                    .filter(gift_codes::code.eq(body.code.trim()))
                    .for_update()
                    .get_result(conn)
                    .await
                    .optional()?;
                let gift = gift.ok_or(AppError::NotFound)?;

                gift::check_recipient(gift.recipient_email.as_deref(), &caller.email)?;

                let affected = diesel::update(
                    gift_codes::table
                        .find(gift.id)
                        .filter(gift_codes::is_active.eq(true)),
                )
                .set((
                    gift_codes::is_active.eq(false),
                    gift_codes::redeemed_by.eq(caller.user_id),
                    gift_codes::redeemed_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
                if affected == 0 {
                    return Err(AppError::AlreadyProcessed);
                }

                ledger::adjust_wallet(
                    conn,
                    caller.user_id,
                    &gift.amount,
                    TransactionKind::Deposit,
                    format!("Redeemed gift code {}", gift.code),
                )
                .await
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(adjustment),
        message: Some("Gift code redeemed successfully"),
    })
}

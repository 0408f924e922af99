use axum::{Extension, Json, extract::State, response::IntoResponse};
use bigdecimal::{BigDecimal, Zero};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    models::{CreateGiftCodeEntity, GiftCodeEntity},
    schema::gift_codes,
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/gifts",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_gift_codes, send_gift))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                auth::admin_authorization,
            )),
    )
}

pub(crate) fn generate_gift_code() -> String {
    format!("GIFT-{}", Uuid::new_v4().simple())
}

/// List all issued gift codes, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin / Gifts"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List gift codes", body = StdResponse<Vec<GiftCodeEntity>, String>)
    )
)]
async fn get_gift_codes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let codes: Vec<GiftCodeEntity> = gift_codes::table
        .order_by(gift_codes::created_at.desc())
        .get_results(conn)
        .await?;

    Ok(StdResponse {
        data: Some(codes),
        message: Some("Get gift codes successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct SendGiftReq {
    #[schema(value_type = String)]
    amount: BigDecimal,
    /// Locks redemption to this email; unset means anyone may redeem.
    recipient_email: Option<String>,
}

/// Issue a gift code as free credit. Deliberately NOT balance-backed: no
/// wallet is debited when an admin sends a gift.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin / Gifts"],
    security(("bearerAuth" = [])),
    request_body = SendGiftReq,
    responses(
        (status = 200, description = "Gift code issued", body = StdResponse<GiftCodeEntity, String>)
    )
)]
async fn send_gift(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<SendGiftReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.amount <= BigDecimal::zero() {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let conn = &mut state.conn().await?;

    let gift: GiftCodeEntity = diesel::insert_into(gift_codes::table)
        .values(CreateGiftCodeEntity {
            code: generate_gift_code(),
            amount: body.amount,
            recipient_email: body.recipient_email,
            created_by: Some(caller.user_id),
        })
        .returning(GiftCodeEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(admin = %caller.user_id, code = %gift.code, "gift code issued");

    Ok(StdResponse {
        data: Some(gift),
        message: Some("Gift code issued successfully"),
    })
}

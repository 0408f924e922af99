use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    domain::promo::DiscountType,
    models::{CreatePromoCodeEntity, PromoCodeEntity},
    schema::promo_codes,
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/promos",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_promos, create_promo))
            .routes(utoipa_axum::routes!(toggle_promo, delete_promo))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                auth::admin_authorization,
            )),
    )
}

/// List all promo codes, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin / Promos"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List promo codes", body = StdResponse<Vec<PromoCodeEntity>, String>)
    )
)]
async fn get_promos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let promos: Vec<PromoCodeEntity> = promo_codes::table
        .order_by(promo_codes::created_at.desc())
        .get_results(conn)
        .await?;

    Ok(StdResponse {
        data: Some(promos),
        message: Some("Get promo codes successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct CreatePromoReq {
    code: String,
    /// `percentage` or `fixed`.
    discount_type: String,
    #[schema(value_type = String)]
    discount_value: BigDecimal,
    #[schema(value_type = Option<String>)]
    min_order_amount: Option<BigDecimal>,
    /// Unset means unlimited uses.
    usage_limit: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
}

/// Create a promo code. Codes are unique; a duplicate fails with `Conflict`.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin / Promos"],
    security(("bearerAuth" = [])),
    request_body = CreatePromoReq,
    responses(
        (status = 200, description = "Promo code created", body = StdResponse<PromoCodeEntity, String>),
        (status = 409, description = "Code already exists")
    )
)]
async fn create_promo(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<CreatePromoReq>,
) -> Result<impl IntoResponse, AppError> {
    let code = body.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::Validation("code must not be empty".into()));
    }

    let discount_type: DiscountType =
        body.discount_type.parse().map_err(AppError::Validation)?;
    if body.discount_value <= BigDecimal::zero() {
        return Err(AppError::Validation(
            "discount value must be positive".into(),
        ));
    }
    if discount_type == DiscountType::Percentage && body.discount_value > BigDecimal::from(100) {
        return Err(AppError::Validation(
            "percentage discount cannot exceed 100".into(),
        ));
    }

    let min_order_amount = body.min_order_amount.unwrap_or_else(BigDecimal::zero);
    if min_order_amount < BigDecimal::zero() {
        return Err(AppError::Validation(
            "minimum order amount cannot be negative".into(),
        ));
    }
    if body.usage_limit.is_some_and(|limit| limit <= 0) {
        return Err(AppError::Validation(
            "usage limit must be positive when set".into(),
        ));
    }

    let conn = &mut state.conn().await?;

    let promo: PromoCodeEntity = diesel::insert_into(promo_codes::table)
        .values(CreatePromoCodeEntity {
            code,
            discount_type: discount_type.as_str().into(),
            discount_value: body.discount_value,
            min_order_amount,
            usage_limit: body.usage_limit,
            expires_at: body.expires_at,
        })
        .returning(PromoCodeEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(admin = %caller.user_id, code = %promo.code, "promo code created");

    Ok(StdResponse {
        data: Some(promo),
        message: Some("Promo code created successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct TogglePromoReq {
    is_active: bool,
}

/// Activate or deactivate a promo code.
#[utoipa::path(
    patch,
    path = "/{id}",
    tags = ["Admin / Promos"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Promo code ID to toggle")
    ),
    request_body = TogglePromoReq,
    responses(
        (status = 200, description = "Promo code toggled", body = StdResponse<PromoCodeEntity, String>)
    )
)]
async fn toggle_promo(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Json(body): Json<TogglePromoReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let promo: PromoCodeEntity = diesel::update(promo_codes::table.find(id))
        .set(promo_codes::is_active.eq(body.is_active))
        .returning(PromoCodeEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(promo),
        message: Some("Promo code toggled successfully"),
    })
}

/// Delete a promo code.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin / Promos"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Promo code ID to delete")
    ),
    responses(
        (status = 200, description = "Promo code deleted")
    )
)]
async fn delete_promo(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let affected = diesel::delete(promo_codes::table.find(id))
        .execute(conn)
        .await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse::<(), _> {
        data: None,
        message: Some("Promo code deleted successfully"),
    })
}

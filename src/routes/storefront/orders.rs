use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    domain::{
        order::{OrderStatus, PaymentMethod, PaymentStatus},
        promo,
        wallet::TransactionKind,
    },
    ledger,
    models::{
        CreateOrderEntity, CreateOrderItemEntity, OrderEntity, OrderItemEntity,
        ProductVariantEntity, PromoCodeEntity,
    },
    routes::admin::orders::group_items_by_order,
    schema::{order_items, orders, product_variants, promo_codes},
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    // Checkout stays open so guests can order; the caller-scoped views
    // require a valid session.
    let open = OpenApiRouter::new().routes(utoipa_axum::routes!(create_order));
    let authed = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_my_orders))
        .routes(utoipa_axum::routes!(get_my_order))
        .routes(utoipa_axum::routes!(submit_payment_proof))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth::customer_authorization,
        ));

    utoipa_axum::router::OpenApiRouter::new().nest("/storefront/orders", open.merge(authed))
}

#[derive(Deserialize, Serialize, ToSchema)]
struct ShippingInfo {
    full_name: String,
    phone: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    postal_code: String,
    country: String,
}

#[derive(Deserialize, ToSchema)]
struct CheckoutItemReq {
    variant_id: i32,
    quantity: i32,
}

#[derive(Deserialize, ToSchema)]
struct CheckoutReq {
    items: Vec<CheckoutItemReq>,
    shipping_info: ShippingInfo,
    /// `bank_transfer` or `wallet`.
    payment_method: String,
    promo_code: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct CheckoutRes {
    order: OrderEntity,
    order_items: Vec<OrderItemEntity>,
    #[schema(value_type = String)]
    discount: BigDecimal,
}

/// Checkout. Prices are snapshotted into the line items so later catalog
/// edits never change what was owed. Stock is not reserved here; it is
/// deducted when the order ships. Wallet payment debits the caller through
/// the ledger in the same transaction that creates the order.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Storefront / Orders"],
    request_body = CheckoutReq,
    responses(
        (status = 200, description = "Order created", body = StdResponse<CheckoutRes, String>),
        (status = 409, description = "Insufficient wallet balance or exhausted promo code")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutReq>,
) -> Result<impl IntoResponse, AppError> {
    let caller = auth::optional_caller(&headers, &state.settings.auth.jwt_secret)?;

    if body.items.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one item".into(),
        ));
    }
    if body.items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::Validation(
            "item quantities must be positive".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    if body.items.iter().any(|item| !seen.insert(item.variant_id)) {
        return Err(AppError::Validation(
            "duplicate variants in order; merge quantities into one line".into(),
        ));
    }

    let payment_method: PaymentMethod =
        body.payment_method.parse().map_err(AppError::Validation)?;
    if payment_method == PaymentMethod::Wallet && caller.is_none() {
        return Err(AppError::Unauthorized);
    }

    let shipping_info =
        serde_json::to_value(&body.shipping_info).context("Failed to serialize shipping info")?;
    let user_id = caller.as_ref().map(|caller| caller.user_id);

    let conn = &mut state.conn().await?;

    let (order, items, discount) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let variant_ids: Vec<i32> =
                    body.items.iter().map(|item| item.variant_id).collect();
                let variants: Vec<ProductVariantEntity> = product_variants::table
                    .filter(product_variants::id.eq_any(&variant_ids))
                    .get_results(conn)
                    .await?;
                let prices: HashMap<i32, BigDecimal> = variants
                    .into_iter()
                    .map(|variant| (variant.id, variant.price))
                    .collect();

                let mut subtotal = BigDecimal::zero();
                for item in &body.items {
                    let price = prices.get(&item.variant_id).ok_or_else(|| {
                        AppError::Validation(format!("unknown variant {}", item.variant_id))
                    })?;
                    subtotal += price * BigDecimal::from(item.quantity);
                }

                // Promo row is locked for the duration of the transaction, so
                // eligibility check and usage increment cannot race.
                let mut discount = BigDecimal::zero();
                if let Some(code) = &body.promo_code {
                    let promo_row: Option<PromoCodeEntity> = promo_codes::table
                        .filter(promo_codes::code.eq(code.trim().to_uppercase()))
                        .for_update()
                        .get_result(conn)
                        .await
                        .optional()?;
                    let promo_row = promo_row
                        .ok_or_else(|| AppError::Validation("unknown promo code".into()))?;

                    promo::check_eligibility(&promo_row, &subtotal, Utc::now())?;
                    discount = promo::discount_amount(&promo_row, &subtotal)?;

                    diesel::update(promo_codes::table.find(promo_row.id))
                        .set(promo_codes::times_used.eq(promo_codes::times_used + 1))
                        .execute(conn)
                        .await?;
                }

                let total_amount = &subtotal - &discount;

                let order: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        user_id,
                        status: OrderStatus::Pending.as_str().into(),
                        payment_status: PaymentStatus::Unpaid.as_str().into(),
                        payment_method: payment_method.as_str().into(),
                        total_amount: total_amount.clone(),
                        shipping_info,
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let new_items: Vec<CreateOrderItemEntity> = body
                    .items
                    .iter()
                    .map(|item| CreateOrderItemEntity {
                        order_id: order.id,
                        variant_id: item.variant_id,
                        quantity: item.quantity,
                        unit_price: prices[&item.variant_id].clone(),
                    })
                    .collect();
                let items: Vec<OrderItemEntity> = diesel::insert_into(order_items::table)
                    .values(&new_items)
                    .returning(OrderItemEntity::as_returning())
                    .get_results(conn)
                    .await?;

                let order = if payment_method == PaymentMethod::Wallet {
                    let user_id = user_id.ok_or(AppError::Unauthorized)?;
                    let debit = -&total_amount;
                    ledger::adjust_wallet(
                        conn,
                        user_id,
                        &debit,
                        TransactionKind::Purchase,
                        format!("Payment for order #{}", order.id),
                    )
                    .await?;

                    diesel::update(orders::table.find(order.id))
                        .set(orders::payment_status.eq(PaymentStatus::Paid.as_str()))
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await?
                } else {
                    order
                };

                Ok::<_, AppError>((order, items, discount))
            })
        })
        .await?;

    tracing::info!(order_id = order.id, "order created");

    Ok(StdResponse {
        data: Some(CheckoutRes {
            order,
            order_items: items,
            discount,
        }),
        message: Some("Order created successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct GetOrderRes {
    order: OrderEntity,
    order_items: Vec<OrderItemEntity>,
}

/// All orders belonging to the authenticated caller, newest first.
#[utoipa::path(
    get,
    path = "/mine",
    tags = ["Storefront / Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<GetOrderRes>, String>)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let my_orders: Vec<OrderEntity> = orders::table
        .filter(orders::user_id.eq(caller.user_id))
        .order_by(orders::created_at.desc())
        .get_results(conn)
        .await?;

    let order_ids: Vec<i32> = my_orders.iter().map(|order| order.id).collect();
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .get_results(conn)
        .await?;

    let mut grouped = group_items_by_order(items);
    let orders_with_items: Vec<GetOrderRes> = my_orders
        .into_iter()
        .map(|order| GetOrderRes {
            order_items: grouped.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect();

    Ok(StdResponse {
        data: Some(orders_with_items),
        message: Some("Get my orders successfully"),
    })
}

/// A specific order belonging to the authenticated caller.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Storefront / Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>)
    )
)]
async fn get_my_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let order: OrderEntity = orders::table
        .find(id)
        .filter(orders::user_id.eq(caller.user_id))
        .get_result(conn)
        .await?;
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .get_results(conn)
        .await?;

    Ok(StdResponse {
        data: Some(GetOrderRes {
            order,
            order_items: items,
        }),
        message: Some("Get order successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct SubmitPaymentProofReq {
    /// Object-storage URL of the uploaded transfer receipt.
    proof_url: String,
}

/// Attach a payment proof to an unpaid bank-transfer order, queueing it for
/// admin verification.
#[utoipa::path(
    patch,
    path = "/{id}/payment-proof",
    tags = ["Storefront / Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to attach the proof to")
    ),
    request_body = SubmitPaymentProofReq,
    responses(
        (status = 200, description = "Proof submitted", body = StdResponse<OrderEntity, String>),
        (status = 409, description = "Order is not awaiting payment")
    )
)]
async fn submit_payment_proof(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<SubmitPaymentProofReq>,
) -> Result<impl IntoResponse, AppError> {
    if body.proof_url.trim().is_empty() {
        return Err(AppError::Validation("proof_url must not be empty".into()));
    }

    let conn = &mut state.conn().await?;

    let updated: Option<OrderEntity> = diesel::update(
        orders::table
            .find(id)
            .filter(orders::user_id.eq(caller.user_id))
            .filter(orders::payment_status.eq(PaymentStatus::Unpaid.as_str())),
    )
    .set((
        orders::payment_status.eq(PaymentStatus::AwaitingVerification.as_str()),
        orders::payment_proof_url.eq(body.proof_url),
        orders::updated_at.eq(diesel::dsl::now),
    ))
    .returning(OrderEntity::as_returning())
    .get_result(conn)
    .await
    .optional()?;

    let Some(order) = updated else {
        let exists: Option<i32> = orders::table
            .find(id)
            .filter(orders::user_id.eq(caller.user_id))
            .select(orders::id)
            .get_result(conn)
            .await
            .optional()?;
        return Err(match exists {
            Some(_) => AppError::Conflict("order is not awaiting payment".into()),
            None => AppError::NotFound,
        });
    };

    Ok(StdResponse {
        data: Some(order),
        message: Some("Payment proof submitted successfully"),
    })
}

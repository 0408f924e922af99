use std::collections::HashMap;

use anyhow::anyhow;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth::{self, Caller},
    domain::{
        order::{InventoryEffect, OrderStatus, PaymentStatus, plan_transition},
        review::{ReviewAction, resolved_payment_status},
    },
    models::{OrderEntity, OrderItemEntity},
    schema::{order_items, orders, product_variants},
};

pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/admin/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(get_payment_queue))
            .routes(utoipa_axum::routes!(get_order))
            .routes(utoipa_axum::routes!(update_order_status))
            .routes(utoipa_axum::routes!(verify_order_payment))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                auth::admin_authorization,
            )),
    )
}

#[derive(Deserialize, IntoParams)]
struct OrderFilter {
    /// Restrict to a fulfillment status.
    status: Option<String>,
    /// Restrict to a payment status.
    payment_status: Option<String>,
}

/// List orders, newest first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin / Orders"],
    security(("bearerAuth" = [])),
    params(OrderFilter),
    responses(
        (status = 200, description = "List orders", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn get_orders(
    Query(filter): Query<OrderFilter>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(raw) = &filter.status {
        raw.parse::<OrderStatus>().map_err(AppError::Validation)?;
    }
    if let Some(raw) = &filter.payment_status {
        raw.parse::<PaymentStatus>().map_err(AppError::Validation)?;
    }

    let conn = &mut state.conn().await?;

    let mut query = orders::table
        .order_by(orders::created_at.desc())
        .into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status));
    }
    if let Some(payment_status) = filter.payment_status {
        query = query.filter(orders::payment_status.eq(payment_status));
    }

    let orders: Vec<OrderEntity> = query.get_results(conn).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get orders successfully"),
    })
}

/// Orders whose payment proof awaits manual verification, oldest first.
#[utoipa::path(
    get,
    path = "/payment-queue",
    tags = ["Admin / Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List orders awaiting payment verification", body = StdResponse<Vec<OrderEntity>, String>)
    )
)]
async fn get_payment_queue(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let queue: Vec<OrderEntity> = orders::table
        .filter(orders::payment_status.eq(PaymentStatus::AwaitingVerification.as_str()))
        .order_by(orders::created_at.asc())
        .get_results(conn)
        .await?;

    Ok(StdResponse {
        data: Some(queue),
        message: Some("Get payment queue successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct GetOrderRes {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemEntity>,
}

/// Fetch a specific order with its line items.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin / Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>)
    )
)]
async fn get_order(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state.conn().await?;

    let order: OrderEntity = orders::table.find(id).get_result(conn).await?;
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
struct UpdateOrderStatusReq {
    /// Target fulfillment status.
    status: String,
    /// Stored when the order moves to `shipped`.
    tracking_number: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct UpdateOrderStatusRes {
    previous_status: String,
    new_status: String,
}

/// Move an order through the fulfillment state machine. Shipping deducts
/// stock for every line item in the same database transaction as the status
/// write; cancelling a shipped order returns stock best-effort.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Admin / Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to update")
    ),
    request_body = UpdateOrderStatusReq,
    responses(
        (status = 200, description = "Order status updated", body = StdResponse<UpdateOrderStatusRes, String>),
        (status = 409, description = "Illegal transition, concurrent change, or insufficient stock")
    )
)]
async fn update_order_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<UpdateOrderStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let to: OrderStatus = body.status.parse().map_err(AppError::Validation)?;
    let tracking_number = body.tracking_number;

    let conn = &mut state.conn().await?;

    let (previous, current) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order: OrderEntity = orders::table.find(id).get_result(conn).await?;
                let from: OrderStatus = order
                    .status
                    .parse()
                    .map_err(|err: String| AppError::Other(anyhow!(err)))?;

                if from == to {
                    return Ok((from, to));
                }

                let effect = plan_transition(from, to)?;
                let items: Vec<OrderItemEntity> = order_items::table
                    .filter(order_items::order_id.eq(id))
                    .get_results(conn)
                    .await?;

                apply_inventory_effect(conn, id, &items, effect).await?;

                // Compare-and-swap on the status we planned from; a
                // concurrent transition rolls everything back.
                let scope = orders::table
                    .find(id)
                    .filter(orders::status.eq(from.as_str()));
                let affected = if to == OrderStatus::Shipped && tracking_number.is_some() {
                    diesel::update(scope)
                        .set((
                            orders::status.eq(to.as_str()),
                            orders::tracking_number.eq(tracking_number),
                            orders::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?
                } else {
                    diesel::update(scope)
                        .set((
                            orders::status.eq(to.as_str()),
                            orders::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?
                };

                if affected == 0 {
                    return Err(AppError::Conflict(
                        "order status changed concurrently".into(),
                    ));
                }

                Ok::<(OrderStatus, OrderStatus), AppError>((from, to))
            })
        })
        .await?;

    tracing::info!(
        admin = %caller.user_id,
        order_id = id,
        from = %previous,
        to = %current,
        "order status updated"
    );

    Ok(StdResponse {
        data: Some(UpdateOrderStatusRes {
            previous_status: previous.as_str().into(),
            new_status: current.as_str().into(),
        }),
        message: Some("Order status updated successfully"),
    })
}

/// Applies a transition's stock movement inside the caller's transaction.
/// Deduction is a conditioned decrement so stock never goes negative; restore
/// is best-effort.
async fn apply_inventory_effect(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    items: &[OrderItemEntity],
    effect: InventoryEffect,
) -> Result<(), AppError> {
    match effect {
        InventoryEffect::Deduct => {
            for item in items {
                let affected = diesel::update(
                    product_variants::table
                        .find(item.variant_id)
                        .filter(product_variants::stock_quantity.ge(item.quantity)),
                )
                .set((
                    product_variants::stock_quantity
                        .eq(product_variants::stock_quantity - item.quantity),
                    product_variants::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;

                if affected == 0 {
                    return Err(AppError::InsufficientStock(item.variant_id));
                }
            }
        }
        InventoryEffect::Restore => {
            // Best-effort: a vanished variant must not block a cancellation
            // the customer is owed.
            for item in items {
                let affected = diesel::update(product_variants::table.find(item.variant_id))
                    .set((
                        product_variants::stock_quantity
                            .eq(product_variants::stock_quantity + item.quantity),
                        product_variants::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;

                if affected == 0 {
                    tracing::warn!(
                        order_id,
                        variant_id = item.variant_id,
                        quantity = item.quantity,
                        "could not restore stock for cancelled order"
                    );
                }
            }
        }
        InventoryEffect::None => {}
    }
    Ok(())
}

/// Error for a payment review whose conditioned update matched no row:
/// the order is missing, was never queued for review, or is already resolved.
fn payment_review_miss(current_payment_status: Option<&str>) -> AppError {
    match current_payment_status {
        Some(s) if s == PaymentStatus::Unpaid.as_str() => {
            AppError::Conflict("order is not awaiting payment".into())
        }
        Some(_) => AppError::AlreadyProcessed,
        None => AppError::NotFound,
    }
}

#[derive(Deserialize, ToSchema)]
struct VerifyOrderPaymentReq {
    action: ReviewAction,
}

#[derive(Serialize, ToSchema)]
struct VerifyOrderPaymentRes {
    payment_status: String,
    order: OrderEntity,
}

/// One-shot manual payment decision for an order awaiting verification.
/// Touches no inventory; only the shipped transition does.
#[utoipa::path(
    patch,
    path = "/{id}/payment",
    tags = ["Admin / Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to verify payment for")
    ),
    request_body = VerifyOrderPaymentReq,
    responses(
        (status = 200, description = "Payment decision recorded", body = StdResponse<VerifyOrderPaymentRes, String>),
        (status = 409, description = "Payment already resolved")
    )
)]
async fn verify_order_payment(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<VerifyOrderPaymentReq>,
) -> Result<impl IntoResponse, AppError> {
    let status_after_approval = state.settings.orders.status_after_payment_approval;
    let conn = &mut state.conn().await?;

    let order = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let new_status = resolved_payment_status(body.action);

                let updated: Option<OrderEntity> = diesel::update(
                    orders::table.find(id).filter(
                        orders::payment_status
                            .eq(PaymentStatus::AwaitingVerification.as_str()),
                    ),
                )
                .set((
                    orders::payment_status.eq(new_status.as_str()),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await
                .optional()?;

                let Some(mut order) = updated else {
                    let current: Option<String> = orders::table
                        .find(id)
                        .select(orders::payment_status)
                        .get_result(conn)
                        .await
                        .optional()?;
                    return Err(payment_review_miss(current.as_deref()));
                };

                // Configurable policy: approval may also advance a
                // still-pending order, with the transition's usual stock
                // movement.
                if body.action == ReviewAction::Approve
                    && let Some(next) = status_after_approval
                    && order.status == OrderStatus::Pending.as_str()
                    && next != OrderStatus::Pending
                {
                    let effect = plan_transition(OrderStatus::Pending, next)?;
                    let items: Vec<OrderItemEntity> = order_items::table
                        .filter(order_items::order_id.eq(id))
                        .get_results(conn)
                        .await?;
                    apply_inventory_effect(conn, id, &items, effect).await?;

                    order = diesel::update(
                        orders::table
                            .find(id)
                            .filter(orders::status.eq(OrderStatus::Pending.as_str())),
                    )
                    .set((
                        orders::status.eq(next.as_str()),
                        orders::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| {
                        AppError::Conflict("order status changed concurrently".into())
                    })?;
                }

                Ok::<OrderEntity, AppError>(order)
            })
        })
        .await?;

    tracing::info!(
        admin = %caller.user_id,
        order_id = id,
        payment_status = %order.payment_status,
        "order payment reviewed"
    );

    Ok(StdResponse {
        data: Some(VerifyOrderPaymentRes {
            payment_status: order.payment_status.clone(),
            order,
        }),
        message: Some("Payment decision recorded successfully"),
    })
}

// Grouping helper shared with the storefront order views.
pub(crate) fn group_items_by_order(
    items: Vec<OrderItemEntity>,
) -> HashMap<i32, Vec<OrderItemEntity>> {
    let mut group: HashMap<i32, Vec<OrderItemEntity>> = HashMap::new();
    for item in items {
        group.entry(item.order_id).or_default().push(item);
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviewing_an_order_without_submitted_proof_is_a_conflict() {
        let err = payment_review_miss(Some(PaymentStatus::Unpaid.as_str()));
        assert!(matches!(err, AppError::Conflict(msg) if msg == "order is not awaiting payment"));
    }

    #[test]
    fn reviewing_a_resolved_payment_is_already_processed() {
        for resolved in [PaymentStatus::Paid, PaymentStatus::Failed] {
            assert!(matches!(
                payment_review_miss(Some(resolved.as_str())),
                AppError::AlreadyProcessed
            ));
        }
    }

    #[test]
    fn reviewing_a_missing_order_is_not_found() {
        assert!(matches!(payment_review_miss(None), AppError::NotFound));
    }
}

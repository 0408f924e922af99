use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

// Profiles

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    #[schema(value_type = String)]
    pub wallet_balance: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    #[schema(value_type = String)]
    pub total_amount: BigDecimal,
    pub shipping_info: Value,
    pub tracking_number: Option<String>,
    pub payment_proof_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub user_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub total_amount: BigDecimal,
    pub shipping_info: Value,
}

#[derive(Queryable, Selectable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub order_id: i32,
    pub variant_id: i32,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub variant_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

// Product variants (stock is the shared resource; catalog CRUD lives elsewhere)

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::product_variants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductVariantEntity {
    pub id: i32,
    pub product_id: i32,
    pub size_label: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Transactions (append-only wallet ledger)

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub description: String,
    pub status: String,
    pub proof_url: Option<String>,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::transactions)]
pub struct CreateTransactionEntity {
    pub user_id: Uuid,
    pub kind: String,
    pub amount: BigDecimal,
    pub description: String,
    pub status: String,
    pub proof_url: Option<String>,
}

// Gift codes

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::gift_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GiftCodeEntity {
    pub id: i32,
    pub code: String,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub recipient_email: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub redeemed_by: Option<Uuid>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::gift_codes)]
pub struct CreateGiftCodeEntity {
    pub code: String,
    pub amount: BigDecimal,
    pub recipient_email: Option<String>,
    pub created_by: Option<Uuid>,
}

// Promo codes

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(table_name = crate::schema::promo_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PromoCodeEntity {
    pub id: i32,
    pub code: String,
    pub discount_type: String,
    #[schema(value_type = String)]
    pub discount_value: BigDecimal,
    #[schema(value_type = String)]
    pub min_order_amount: BigDecimal,
    pub usage_limit: Option<i32>,
    pub times_used: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::promo_codes)]
pub struct CreatePromoCodeEntity {
    pub code: String,
    pub discount_type: String,
    pub discount_value: BigDecimal,
    pub min_order_amount: BigDecimal,
    pub usage_limit: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

use anyhow::{Context, Result};

use crate::domain::order::{OrderStatus, plan_transition};

#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub orders: OrderPolicyConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone, Debug)]
pub struct OrderPolicyConfig {
    /// When set, approving a payment also moves a still-`pending` order to
    /// this status. Unset means approval changes `payment_status` only.
    pub status_after_payment_approval: Option<OrderStatus>,
}

pub fn load() -> Result<Config> {
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    let listen_addr =
        std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let status_after_payment_approval = match std::env::var("STATUS_AFTER_PAYMENT_APPROVAL") {
        Ok(raw) => {
            let status: OrderStatus = raw
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid STATUS_AFTER_PAYMENT_APPROVAL: {raw}"))?;
            // Must be reachable from pending, since approval only advances
            // still-pending orders.
            if plan_transition(OrderStatus::Pending, status).is_err() {
                anyhow::bail!("STATUS_AFTER_PAYMENT_APPROVAL: pending orders cannot move to {raw}");
            }
            Some(status)
        }
        Err(_) => None,
    };

    Ok(Config {
        database: DatabaseConfig { url: database_url },
        server: ServerConfig { listen_addr },
        auth: AuthConfig { jwt_secret },
        orders: OrderPolicyConfig {
            status_after_payment_approval,
        },
    })
}

use std::str::FromStr;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{app_error::AppError, app_state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Claims minted by the external identity provider; this service only
/// verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

/// Request-scoped caller identity, injected as an `Extension` by the
/// authorization middleware. Never read from ambient/global state.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Decodes the bearer token into a [`Caller`]. Missing, malformed, expired,
/// or unknown-role tokens are all `Unauthorized`.
pub fn caller_from_headers(headers: &HeaderMap, jwt_secret: &str) -> Result<Caller, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let role = token_data
        .claims
        .role
        .parse()
        .map_err(|_| AppError::Unauthorized)?;

    Ok(Caller {
        user_id: token_data.claims.sub,
        email: token_data.claims.email,
        role,
    })
}

/// Guest-tolerant variant used by checkout: no Authorization header means a
/// guest caller, but a present-and-invalid token is still rejected.
pub fn optional_caller(
    headers: &HeaderMap,
    jwt_secret: &str,
) -> Result<Option<Caller>, AppError> {
    if bearer_token(headers).is_none() {
        return Ok(None);
    }
    caller_from_headers(headers, jwt_secret).map(Some)
}

/// Route layer for admin-only operations. Aborts before any store access.
pub async fn admin_authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = caller_from_headers(req.headers(), &state.settings.auth.jwt_secret)?;
    if caller.role != Role::Admin {
        return Err(AppError::Forbidden(
            "this operation requires the admin role".into(),
        ));
    }
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

/// Route layer for operations open to any authenticated caller.
pub async fn customer_authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = caller_from_headers(req.headers(), &state.settings.auth.jwt_secret)?;
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    const SECRET: &str = "test-secret";

    fn headers_with_token(claims: &Claims) -> HeaderMap {
        let token = encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn claims(role: &str, exp_offset_secs: i64) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "nose@example.com".into(),
            role: role.into(),
            exp: (chrono::Utc::now().timestamp() + exp_offset_secs) as usize,
        }
    }

    #[test]
    fn valid_admin_token_decodes() {
        let claims = claims("admin", 3600);
        let caller = caller_from_headers(&headers_with_token(&claims), SECRET).unwrap();
        assert_eq!(caller.role, Role::Admin);
        assert_eq!(caller.user_id, claims.sub);
        assert_eq!(caller.email, "nose@example.com");
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let claims = claims("customer", -3600);
        let result = caller_from_headers(&headers_with_token(&claims), SECRET);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn unknown_role_is_unauthorized() {
        let claims = claims("superuser", 3600);
        let result = caller_from_headers(&headers_with_token(&claims), SECRET);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn missing_header_is_guest_for_optional_caller() {
        let headers = HeaderMap::new();
        assert!(optional_caller(&headers, SECRET).unwrap().is_none());
    }

    #[test]
    fn garbage_token_is_rejected_even_when_optional() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer not-a-jwt"),
        );
        assert!(matches!(
            optional_caller(&headers, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let claims = claims("admin", 3600);
        let result = caller_from_headers(&headers_with_token(&claims), "other-secret");
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}

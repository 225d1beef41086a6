//! Bearer-token requester extraction.
//!
//! Tokens are HS256 JWTs carrying the requester id, role, and department.
//! Session issuance lives with the identity provider; this extractor only
//! verifies and maps claims onto a `Requester` for the access gate.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use digisewa_core::models::{Requester, Role};
use digisewa_core::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Requester id
    pub sub: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
    pub exp: usize,
}

/// Authenticated requester, extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct RequesterContext {
    pub requester: Requester,
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header must be a bearer token".to_string()))
}

impl FromRequestParts<Arc<AppState>> for RequesterContext {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        let role: Role = data
            .claims
            .role
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("Unknown role: {}", data.claims.role)))?;

        Ok(RequesterContext {
            requester: Requester {
                id: data.claims.sub,
                role,
                department: data.claims.department,
            },
        })
    }
}

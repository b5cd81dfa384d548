//! Authentication
//!
//! Bearer JWTs (HS256) carry the caller in `sub` and the tenant in
//! `tenant_id`. The [`Caller`] extractor turns them into a
//! [`CallerContext`] for the core services.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ipam_core::{CallerContext, CallerId, TenantId};

use crate::{config::ApiConfig, error::ApiError, ApiState};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: Uuid,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Issue a token for `caller` in `tenant`
pub fn create_token(
    config: &ApiConfig,
    caller: &str,
    tenant: TenantId,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: caller.to_string(),
        tenant_id: *tenant.as_uuid(),
        exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
        iss: config.jwt_issuer.clone(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Verify signature, expiry and issuer
pub fn verify_token(token: &str, config: &ApiConfig) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = &config.jwt_issuer {
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
    }

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    ) {
        Ok(data) if !data.claims.sub.trim().is_empty() => Some(data.claims),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Rejected token: {}", e);
            None
        }
    }
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Caller(pub CallerContext);

#[axum::async_trait]
impl FromRequestParts<Arc<ApiState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(ApiError::Unauthorized("missing bearer token"))?;
        let claims = verify_token(token, &state.config)
            .ok_or(ApiError::Unauthorized("invalid or expired token"))?;

        Ok(Caller(CallerContext::new(
            CallerId::new(claims.sub),
            TenantId::from_uuid(claims.tenant_id),
        )))
    }
}

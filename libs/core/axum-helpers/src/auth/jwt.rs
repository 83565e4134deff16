use super::config::JwtConfig;
use crate::errors::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    pub sub: String,        // User ID
    pub email: String,
    pub name: String,
    pub roles: Vec<String>, // Role names as stored on the user
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// HS256 token issuer and verifier. Cheap to clone.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl_secs: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(ttl_secs = config.ttl_secs, "JWT auth initialized");
        Self {
            encoding: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            ttl_secs: config.ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue_token(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        roles: &[String],
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            roles: roles.to_vec(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        decode::<JwtClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT verification failed: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(ttl: i64) -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("0123456789abcdef0123456789abcdef", ttl).unwrap())
    }

    #[test]
    fn test_issued_token_verifies() {
        let auth = auth(60);
        let id = Uuid::now_v7();
        let token = auth
            .issue_token(id, "seller@shop.test", "Sam Seller", &["SELLER".to_string()])
            .unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.roles, vec!["SELLER".to_string()]);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Beyond the default 60s leeway.
        let auth = auth(-120);
        let token = auth
            .issue_token(Uuid::now_v7(), "a@b.c", "A", &[])
            .unwrap();
        assert!(matches!(auth.verify_token(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = JwtAuth::new(&JwtConfig::new("ffffffffffffffffffffffffffffffff", 60).unwrap());
        let token = other.issue_token(Uuid::now_v7(), "a@b.c", "A", &[]).unwrap();
        assert!(auth(60).verify_token(&token).is_err());
    }
}

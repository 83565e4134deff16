use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Authenticated caller, built from the verified claims a JWT middleware left
/// on the request.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

impl TryFrom<&JwtClaims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: &JwtClaims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;
        Ok(Self {
            id,
            email: claims.email.clone(),
            roles: claims.roles.clone(),
        })
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        CurrentUser::try_from(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> JwtClaims {
        JwtClaims {
            sub: sub.to_string(),
            email: "admin@shop.test".to_string(),
            name: "Ada".to_string(),
            roles: vec!["BUYER".to_string(), "APP_ADMIN".to_string()],
            exp: 0,
            iat: 0,
            jti: "j".to_string(),
        }
    }

    #[test]
    fn test_has_role_is_case_insensitive() {
        let user = CurrentUser::try_from(&claims(&Uuid::now_v7().to_string())).unwrap();
        assert!(user.has_role("app_admin"));
        assert!(!user.has_role("SELLER"));
    }

    #[test]
    fn test_malformed_subject_is_unauthorized() {
        assert!(matches!(
            CurrentUser::try_from(&claims("42")),
            Err(AppError::Unauthorized(_))
        ));
    }
}

//! Bearer-token gate for protected routes.
//!
//! Verifies the Authorization header and attaches the authenticated
//! identity to the request extensions. No database lookup happens here:
//! the signed claim is trusted as-is, so a deleted or disabled account
//! keeps working tokens until they expire.

use crate::auth::{jwt::JwtHandler, models::AuthUser};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use std::sync::Arc;
use uuid::Uuid;

/// Middleware applied to every protected route.
pub async fn require_auth(
    State(jwt): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());
    let user = authenticate(&jwt, header)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// The actual gate: a pure function of (header, secret, clock).
///
/// Safe to run concurrently for unrelated requests; there is no shared
/// mutable state.
pub fn authenticate(jwt: &JwtHandler, header: Option<&str>) -> Result<AuthUser, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidScheme)?;

    let claims = jwt.validate_token(token).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::InvalidToken,
    })?;

    let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
    Ok(AuthUser { id })
}

/// Gate failures. All surface as 401; the variants stay distinct so tests
/// can tell a malformed token apart from a valid-but-expired one.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingHeader,
    InvalidScheme,
    InvalidToken,
    Expired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingHeader => "Missing authorization token",
            AuthError::InvalidScheme => "Invalid authorization format. Use: Bearer {token}",
            AuthError::InvalidToken => "Invalid token",
            AuthError::Expired => "Invalid or expired token",
        };
        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Claims;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn handler() -> JwtHandler {
        JwtHandler::new("test-secret-key-12345".to_string())
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            authenticate(&handler(), None).unwrap_err(),
            AuthError::MissingHeader
        );
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(
            authenticate(&handler(), Some("Token abc")).unwrap_err(),
            AuthError::InvalidScheme
        );
    }

    #[test]
    fn test_garbage_token() {
        assert_eq!(
            authenticate(&handler(), Some("Bearer not.a.jwt")).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtHandler::new("another-secret".to_string());
        let token = other.generate_token(&Uuid::new_v4()).unwrap();
        let header = format!("Bearer {token}");
        assert_eq!(
            authenticate(&handler(), Some(&header)).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_expired_token_distinct_from_malformed() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-12345"),
        )
        .unwrap();
        let header = format!("Bearer {token}");
        assert_eq!(
            authenticate(&handler(), Some(&header)).unwrap_err(),
            AuthError::Expired
        );
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let jwt = handler();
        let user_id = Uuid::new_v4();
        let token = jwt.generate_token(&user_id).unwrap();
        let header = format!("Bearer {token}");

        let user = authenticate(&jwt, Some(&header)).unwrap();
        assert_eq!(user.id, user_id);
    }

    #[test]
    fn test_all_variants_answer_401() {
        for err in [
            AuthError::MissingHeader,
            AuthError::InvalidScheme,
            AuthError::InvalidToken,
            AuthError::Expired,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }
}

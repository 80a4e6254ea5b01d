//! Login endpoint.

use crate::{
    api::AppState,
    auth::models::{LoginRequest, LoginResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

/// `POST /login`.
///
/// Unknown usernames and wrong passwords both answer 401 so callers cannot
/// probe which accounts exist. Storage, hashing, and signing failures are
/// 500: "credentials wrong" and "system broke" stay distinguishable.
/// No rate limiting or lockout is applied.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, LoginError> {
    let user = state
        .store
        .get_user_by_username(&payload.user_name)
        .map_err(|e| {
            error!("Login lookup failed: {e:#}");
            LoginError::Internal
        })?
        .ok_or(LoginError::InvalidCredentials)?;

    let valid = bcrypt::verify(&payload.password, &user.password_hash).map_err(|e| {
        error!("Password verification failed: {e:#}");
        LoginError::Internal
    })?;

    if !valid {
        warn!("Failed login attempt: {}", payload.user_name);
        return Err(LoginError::InvalidCredentials);
    }

    let token = state.jwt.generate_token(&user.id).map_err(|e| {
        error!("Token signing failed: {e:#}");
        LoginError::Internal
    })?;

    Ok(Json(LoginResponse { token }))
}

/// Login failures.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginError {
    InvalidCredentials,
    Internal,
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            LoginError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            LoginError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_responses() {
        let invalid = LoginError::InvalidCredentials.into_response();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);

        let internal = LoginError::Internal.into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

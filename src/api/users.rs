//! User endpoints: signup, the aggregated listing, profile updates, and
//! account deletion.

use crate::{
    api::{ApiError, AppState},
    auth::AuthUser,
    models::{FoundObject, User, UserWithStats},
    policy::{self, Actor, Decision, ProtectedAction},
    store::users::{NewUser, ProfileUpdate},
};
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bcrypt::DEFAULT_COST;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default and hard cap for `pageSize`.
const MAX_PAGE_SIZE: i64 = 10;

/// Pagination query for `GET /users`.
///
/// Kept as raw strings: non-numeric values clamp to the defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    page: Option<String>,
    page_size: Option<String>,
}

impl PageQuery {
    /// Clamp to page >= 1 and 0 <= pageSize <= 10.
    fn clamp(&self) -> (i64, i64) {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1);

        let page_size = self
            .page_size
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|&s| (0..=MAX_PAGE_SIZE).contains(&s))
            .unwrap_or(MAX_PAGE_SIZE);

        (page, page_size)
    }
}

/// `GET /users`: every user with their `objectsPosted` count, newest first.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<UserWithStats>>, ApiError> {
    let (page, page_size) = query.clamp();
    let users = state
        .store
        .list_users_with_counts(page_size, (page - 1) * page_size)?;
    Ok(Json(users))
}

/// `GET /users/:id`.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    state
        .store
        .get_user(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound("User"))
}

#[derive(Debug, Serialize)]
pub struct UserObjectsResponse {
    pub objects: Vec<FoundObject>,
    pub user: User,
}

/// `GET /users/:id/objects`: the user together with everything they posted.
pub async fn get_user_objects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserObjectsResponse>, ApiError> {
    let user = state.store.get_user(&id)?.ok_or(ApiError::NotFound("User"))?;
    let objects = state.store.list_objects_by_owner(&id)?;
    Ok(Json(UserObjectsResponse { objects, user }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub admin: bool,
}

/// `POST /users`: open signup.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    for (field, value) in [
        ("firstName", &payload.first_name),
        ("lastName", &payload.last_name),
        ("userName", &payload.user_name),
    ] {
        if !(3..=20).contains(&value.chars().count()) {
            return Err(ApiError::Validation(format!(
                "You must provide a {field} between 3 and 20 characters!"
            )));
        }
    }
    if payload.password.chars().count() < 3 {
        return Err(ApiError::Validation(
            "You must provide a password!".to_string(),
        ));
    }
    if payload.email.is_empty() {
        return Err(ApiError::Validation(
            "You must provide an email".to_string(),
        ));
    }

    let password_hash =
        bcrypt::hash(&payload.password, DEFAULT_COST).context("Failed to hash password")?;

    let user = state.store.create_user(NewUser {
        first_name: payload.first_name,
        last_name: payload.last_name,
        user_name: payload.user_name,
        email: payload.email,
        password_hash,
        admin: payload.admin,
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub admin: Option<bool>,
}

/// `PUT /users/:id`.
///
/// Self-service updates touch the profile fields only; an admin updating
/// somebody else may change nothing but the admin flag.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let actor = resolve_actor(&state, auth)?;

    match policy::authorize(actor, ProtectedAction::UserUpdate { target: id }) {
        Decision::Allow => {
            let updated = state.store.update_profile(
                &id,
                &ProfileUpdate {
                    first_name: payload.first_name,
                    last_name: payload.last_name,
                    user_name: payload.user_name,
                    email: payload.email,
                },
            )?;
            updated.map(Json).ok_or(ApiError::NotFound("User"))
        }
        Decision::AllowAdminFlagOnly => {
            let updated = match payload.admin {
                Some(admin) => state.store.set_admin(&id, admin)?,
                // Nothing an admin is allowed to change was provided.
                None => state.store.get_user(&id)?,
            };
            updated.map(Json).ok_or(ApiError::NotFound("User"))
        }
        Decision::Deny => Err(ApiError::Forbidden),
    }
}

/// `DELETE /users/:id`: self only, echoes the removed account.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let actor = resolve_actor(&state, auth)?;

    match policy::authorize(actor, ProtectedAction::UserDelete { target: id }) {
        Decision::Allow => state
            .store
            .delete_user(&id)?
            .map(Json)
            .ok_or(ApiError::NotFound("User")),
        _ => Err(ApiError::Forbidden),
    }
}

/// Resolve the acting user's admin flag from storage.
///
/// The gate trusts the signed claim without a lookup, so a principal whose
/// account has since been deleted resolves to a plain non-admin actor.
pub(crate) fn resolve_actor(state: &AppState, auth: AuthUser) -> Result<Actor, ApiError> {
    let admin = state
        .store
        .get_user(&auth.id)?
        .map(|u| u.admin)
        .unwrap_or(false);
    Ok(Actor { id: auth.id, admin })
}

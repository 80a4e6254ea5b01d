//! Found-object endpoints.
//!
//! Creation is the one write with a side channel: once the row is
//! persisted and the 201 is on its way, a detached task resolves the
//! finder and place and broadcasts the news to every connected client.

use crate::{
    api::{users::resolve_actor, ApiError, AppState},
    auth::AuthUser,
    models::FoundObject,
    notify,
    policy::{self, Decision, ProtectedAction},
    store::objects::{NewObject, ObjectUpdate},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

/// `GET /objects`.
pub async fn list_objects(
    State(state): State<AppState>,
) -> Result<Json<Vec<FoundObject>>, ApiError> {
    Ok(Json(state.store.list_objects()?))
}

/// `GET /objects/:id`.
pub async fn get_object(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoundObject>, ApiError> {
    state
        .store
        .get_object(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Object"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateObjectRequest {
    pub name: String,
    pub picture: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub place_id: Uuid,
}

/// `POST /objects`.
///
/// The broadcast runs in its own task: the response below is complete
/// whether or not the fan-out ever finishes.
pub async fn create_object(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
    Json(payload): Json<CreateObjectRequest>,
) -> Result<(StatusCode, Json<FoundObject>), ApiError> {
    if !(3..=30).contains(&payload.name.chars().count()) {
        return Err(ApiError::Validation(
            "You must provide a name!".to_string(),
        ));
    }
    if payload.picture.is_empty() {
        return Err(ApiError::Validation(
            "You must provide a picture!".to_string(),
        ));
    }

    let object = state.store.create_object(NewObject {
        name: payload.name,
        picture: payload.picture,
        description: payload.description,
        owner_id: payload.owner_id,
        place_id: payload.place_id,
    })?;

    tokio::spawn(notify::announce_found_object(
        state.store.clone(),
        state.notices.clone(),
        object.clone(),
    ));

    Ok((StatusCode::CREATED, Json(object)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateObjectRequest {
    pub name: Option<String>,
    pub picture: Option<String>,
    pub description: Option<String>,
}

/// `PUT /objects/:id`: owner or admin.
pub async fn update_object(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateObjectRequest>,
) -> Result<Json<FoundObject>, ApiError> {
    let object = state
        .store
        .get_object(&id)?
        .ok_or(ApiError::NotFound("Object"))?;
    let actor = resolve_actor(&state, auth)?;

    match policy::authorize(
        actor,
        ProtectedAction::ObjectMutate {
            owner: object.owner_id,
        },
    ) {
        Decision::Allow => state
            .store
            .update_object(
                &id,
                &ObjectUpdate {
                    name: payload.name,
                    picture: payload.picture,
                    description: payload.description,
                },
            )?
            .map(Json)
            .ok_or(ApiError::NotFound("Object")),
        _ => Err(ApiError::Forbidden),
    }
}

/// `DELETE /objects/:id`: owner or admin.
pub async fn delete_object(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<&'static str, ApiError> {
    let object = state
        .store
        .get_object(&id)?
        .ok_or(ApiError::NotFound("Object"))?;
    let actor = resolve_actor(&state, auth)?;

    match policy::authorize(
        actor,
        ProtectedAction::ObjectMutate {
            owner: object.owner_id,
        },
    ) {
        Decision::Allow => {
            state.store.delete_object(&id)?;
            Ok("Deleted successfully!")
        }
        _ => Err(ApiError::Forbidden),
    }
}

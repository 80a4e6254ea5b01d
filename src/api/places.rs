//! Place endpoints.
//!
//! Mutations require authentication but no ownership: any logged-in user
//! may alter any place. That looseness is a real behavior of the system,
//! kept on purpose and kept visible in the policy table.

use crate::{
    api::{ApiError, AppState},
    auth::AuthUser,
    models::{is_valid_geolocation, Floor, Place},
    policy::{self, Actor, Decision, ProtectedAction},
    store::places::{NewPlace, PlaceUpdate},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

const MAX_DESCRIPTION_LEN: usize = 250;

#[derive(Debug, Default, Deserialize)]
pub struct ListPlacesQuery {
    pub floor: Option<Floor>,
}

/// `GET /places`: newest first, optionally filtered by floor.
pub async fn list_places(
    State(state): State<AppState>,
    Query(query): Query<ListPlacesQuery>,
) -> Result<Json<Vec<Place>>, ApiError> {
    Ok(Json(state.store.list_places(query.floor)?))
}

/// `GET /places/:id`.
pub async fn get_place(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Place>, ApiError> {
    state
        .store
        .get_place(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Place"))
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaceRequest {
    pub geolocation: Vec<f64>,
    pub floor: Floor,
    pub description: String,
}

/// `POST /places`.
pub async fn create_place(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreatePlaceRequest>,
) -> Result<(StatusCode, Json<Place>), ApiError> {
    check_place_policy(auth)?;
    validate_geolocation(&payload.geolocation)?;
    validate_description(&payload.description)?;

    let place = state.store.create_place(NewPlace {
        geolocation: payload.geolocation,
        floor: payload.floor,
        description: payload.description,
    })?;

    Ok((StatusCode::CREATED, Json(place)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaceRequest {
    pub geolocation: Option<Vec<f64>>,
    pub floor: Option<Floor>,
    pub description: Option<String>,
}

/// `PUT /places/:id`.
pub async fn update_place(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlaceRequest>,
) -> Result<Json<Place>, ApiError> {
    check_place_policy(auth)?;
    if let Some(geolocation) = &payload.geolocation {
        validate_geolocation(geolocation)?;
    }
    if let Some(description) = &payload.description {
        validate_description(description)?;
    }

    state
        .store
        .update_place(
            &id,
            &PlaceUpdate {
                geolocation: payload.geolocation,
                floor: payload.floor,
                description: payload.description,
            },
        )?
        .map(Json)
        .ok_or(ApiError::NotFound("Place"))
}

/// `DELETE /places/:id`.
pub async fn delete_place(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<&'static str, ApiError> {
    check_place_policy(auth)?;

    if !state.store.delete_place(&id)? {
        return Err(ApiError::NotFound("Place"));
    }
    Ok("Deleted successfully!")
}

/// Always allows; consulted anyway so the per-resource asymmetry lives in
/// the policy table rather than being implied by an absent check.
fn check_place_policy(auth: AuthUser) -> Result<(), ApiError> {
    let actor = Actor {
        id: auth.id,
        admin: false,
    };
    match policy::authorize(actor, ProtectedAction::PlaceMutate) {
        Decision::Allow => Ok(()),
        _ => Err(ApiError::Forbidden),
    }
}

fn validate_geolocation(coords: &[f64]) -> Result<(), ApiError> {
    if !is_valid_geolocation(coords) {
        return Err(ApiError::Validation(
            "Not a valid longitude/latitude(/altitude) coordinates array".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::Validation(
            "You must enter a description".to_string(),
        ));
    }
    Ok(())
}

//! Domain models shared by the API, storage, and notification layers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub admin: bool,
    pub disabled: bool,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    // bcrypt hash - never serialize
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: String,
}

/// A user's public row plus the number of objects they have posted,
/// as returned by `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithStats {
    #[serde(flatten)]
    pub user: User,
    pub objects_posted: i64,
}

/// Building level labels used by places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Floor {
    #[serde(rename = "ss")]
    Basement,
    #[serde(rename = "rdc")]
    GroundFloor,
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
}

impl Floor {
    pub fn as_str(&self) -> &str {
        match self {
            Floor::Basement => "ss",
            Floor::GroundFloor => "rdc",
            Floor::First => "1",
            Floor::Second => "2",
            Floor::Third => "3",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ss" => Some(Floor::Basement),
            "rdc" => Some(Floor::GroundFloor),
            "1" => Some(Floor::First),
            "2" => Some(Floor::Second),
            "3" => Some(Floor::Third),
            _ => None,
        }
    }
}

/// A physical location where objects get found.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: Uuid,
    /// Longitude, latitude and an optional altitude.
    pub geolocation: Vec<f64>,
    pub floor: Floor,
    pub description: String,
    pub created_at: String,
}

/// A found item, linked to the user who found it and the place it was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundObject {
    pub id: Uuid,
    pub name: String,
    pub picture: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub place_id: Uuid,
    pub created_at: String,
}

/// Validate a coordinates array: longitude, latitude and optional altitude.
pub fn is_valid_geolocation(coords: &[f64]) -> bool {
    (2..=3).contains(&coords.len())
        && (-180.0..=180.0).contains(&coords[0])
        && (-90.0..=90.0).contains(&coords[1])
}

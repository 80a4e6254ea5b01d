//! Place rows.

use super::{parse_uuid, Store};
use crate::models::{Floor, Place};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

#[derive(Debug)]
pub struct NewPlace {
    pub geolocation: Vec<f64>,
    pub floor: Floor,
    pub description: String,
}

/// Partial update; `None` leaves the current value in place.
#[derive(Debug, Default)]
pub struct PlaceUpdate {
    pub geolocation: Option<Vec<f64>>,
    pub floor: Option<Floor>,
    pub description: Option<String>,
}

fn place_from_row(row: &Row<'_>) -> rusqlite::Result<Place> {
    let geolocation: String = row.get(1)?;
    let geolocation = serde_json::from_str(&geolocation).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let floor: String = row.get(2)?;
    let floor = Floor::from_str(&floor).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown floor label: {floor}").into(),
        )
    })?;

    Ok(Place {
        id: parse_uuid(0, row.get::<_, String>(0)?)?,
        geolocation,
        floor,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const PLACE_COLUMNS: &str = "id, geolocation, floor, description, created_at";

impl Store {
    pub fn create_place(&self, new: NewPlace) -> Result<Place> {
        let place = Place {
            id: Uuid::new_v4(),
            geolocation: new.geolocation,
            floor: new.floor,
            description: new.description,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO places (id, geolocation, floor, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                place.id.to_string(),
                serde_json::to_string(&place.geolocation)?,
                place.floor.as_str(),
                place.description,
                place.created_at,
            ],
        )
        .context("Failed to insert place")?;

        Ok(place)
    }

    pub fn get_place(&self, id: &Uuid) -> Result<Option<Place>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {PLACE_COLUMNS} FROM places WHERE id = ?1"))?;

        match stmt.query_row(params![id.to_string()], place_from_row) {
            Ok(place) => Ok(Some(place)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List places newest first, optionally filtered by floor.
    pub fn list_places(&self, floor: Option<Floor>) -> Result<Vec<Place>> {
        let conn = self.open()?;

        let places = match floor {
            Some(floor) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PLACE_COLUMNS} FROM places WHERE floor = ?1 ORDER BY created_at DESC"
                ))?;
                let places = stmt
                    .query_map(params![floor.as_str()], place_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                places
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PLACE_COLUMNS} FROM places ORDER BY created_at DESC"
                ))?;
                let places = stmt
                    .query_map([], place_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                places
            }
        };

        Ok(places)
    }

    pub fn update_place(&self, id: &Uuid, update: &PlaceUpdate) -> Result<Option<Place>> {
        let geolocation = update
            .geolocation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE places SET
                geolocation = COALESCE(?2, geolocation),
                floor       = COALESCE(?3, floor),
                description = COALESCE(?4, description)
             WHERE id = ?1",
            params![
                id.to_string(),
                geolocation,
                update.floor.map(|f| f.as_str().to_string()),
                update.description,
            ],
        )
        .context("Failed to update place")?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_place(id)
    }

    pub fn delete_place(&self, id: &Uuid) -> Result<bool> {
        let conn = self.open()?;
        let removed = conn
            .execute("DELETE FROM places WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete place")?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};
    use tempfile::NamedTempFile;

    fn create_test_store() -> (Store, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Store::new(temp_file.path().to_str().unwrap()).unwrap();
        (store, temp_file)
    }

    fn new_place(description: &str, floor: Floor) -> NewPlace {
        NewPlace {
            geolocation: vec![6.64, 46.78],
            floor,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_create_and_retrieve_place() {
        let (store, _temp) = create_test_store();

        let created = store
            .create_place(new_place("Cafeteria", Floor::GroundFloor))
            .unwrap();
        let fetched = store.get_place(&created.id).unwrap().unwrap();

        assert_eq!(fetched.description, "Cafeteria");
        assert_eq!(fetched.floor, Floor::GroundFloor);
        assert_eq!(fetched.geolocation, vec![6.64, 46.78]);
    }

    #[test]
    fn test_list_sorted_and_filtered_by_floor() {
        let (store, _temp) = create_test_store();

        let cafeteria = store
            .create_place(new_place("Cafeteria", Floor::GroundFloor))
            .unwrap();
        thread::sleep(Duration::from_millis(5));
        let library = store
            .create_place(new_place("Library", Floor::Second))
            .unwrap();

        let all = store.list_places(None).unwrap();
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].id, library.id);
        assert_eq!(all[1].id, cafeteria.id);

        let second_floor = store.list_places(Some(Floor::Second)).unwrap();
        assert_eq!(second_floor.len(), 1);
        assert_eq!(second_floor[0].id, library.id);

        assert!(store.list_places(Some(Floor::Basement)).unwrap().is_empty());
    }

    #[test]
    fn test_partial_update() {
        let (store, _temp) = create_test_store();
        let place = store
            .create_place(new_place("Cafeteria", Floor::GroundFloor))
            .unwrap();

        let updated = store
            .update_place(
                &place.id,
                &PlaceUpdate {
                    description: Some("Main cafeteria".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.description, "Main cafeteria");
        assert_eq!(updated.floor, Floor::GroundFloor);

        assert!(store
            .update_place(&Uuid::new_v4(), &PlaceUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_place() {
        let (store, _temp) = create_test_store();
        let place = store
            .create_place(new_place("Cafeteria", Floor::GroundFloor))
            .unwrap();

        assert!(store.delete_place(&place.id).unwrap());
        assert!(store.get_place(&place.id).unwrap().is_none());
        assert!(!store.delete_place(&place.id).unwrap());
    }
}

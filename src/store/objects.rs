//! Found-object rows.

use super::{parse_uuid, Store};
use crate::models::FoundObject;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

#[derive(Debug)]
pub struct NewObject {
    pub name: String,
    pub picture: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub place_id: Uuid,
}

/// Partial update; the owner and place links are immutable.
#[derive(Debug, Default)]
pub struct ObjectUpdate {
    pub name: Option<String>,
    pub picture: Option<String>,
    pub description: Option<String>,
}

fn object_from_row(row: &Row<'_>) -> rusqlite::Result<FoundObject> {
    Ok(FoundObject {
        id: parse_uuid(0, row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        picture: row.get(2)?,
        description: row.get(3)?,
        owner_id: parse_uuid(4, row.get::<_, String>(4)?)?,
        place_id: parse_uuid(5, row.get::<_, String>(5)?)?,
        created_at: row.get(6)?,
    })
}

const OBJECT_COLUMNS: &str = "id, name, picture, description, owner_id, place_id, created_at";

impl Store {
    pub fn create_object(&self, new: NewObject) -> Result<FoundObject> {
        let object = FoundObject {
            id: Uuid::new_v4(),
            name: new.name,
            picture: new.picture,
            description: new.description,
            owner_id: new.owner_id,
            place_id: new.place_id,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO objects (id, name, picture, description, owner_id, place_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                object.id.to_string(),
                object.name,
                object.picture,
                object.description,
                object.owner_id.to_string(),
                object.place_id.to_string(),
                object.created_at,
            ],
        )
        .context("Failed to insert object")?;

        Ok(object)
    }

    pub fn get_object(&self, id: &Uuid) -> Result<Option<FoundObject>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {OBJECT_COLUMNS} FROM objects WHERE id = ?1"))?;

        match stmt.query_row(params![id.to_string()], object_from_row) {
            Ok(object) => Ok(Some(object)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_objects(&self) -> Result<Vec<FoundObject>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!("SELECT {OBJECT_COLUMNS} FROM objects"))?;

        let objects = stmt
            .query_map([], object_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(objects)
    }

    pub fn list_objects_by_owner(&self, owner_id: &Uuid) -> Result<Vec<FoundObject>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {OBJECT_COLUMNS} FROM objects WHERE owner_id = ?1"
        ))?;

        let objects = stmt
            .query_map(params![owner_id.to_string()], object_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(objects)
    }

    pub fn update_object(&self, id: &Uuid, update: &ObjectUpdate) -> Result<Option<FoundObject>> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE objects SET
                name        = COALESCE(?2, name),
                picture     = COALESCE(?3, picture),
                description = COALESCE(?4, description)
             WHERE id = ?1",
            params![
                id.to_string(),
                update.name,
                update.picture,
                update.description,
            ],
        )
        .context("Failed to update object")?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_object(id)
    }

    pub fn delete_object(&self, id: &Uuid) -> Result<bool> {
        let conn = self.open()?;
        let removed = conn
            .execute("DELETE FROM objects WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete object")?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (Store, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Store::new(temp_file.path().to_str().unwrap()).unwrap();
        (store, temp_file)
    }

    fn new_object(name: &str, owner_id: Uuid) -> NewObject {
        NewObject {
            name: name.to_string(),
            picture: "picture.png".to_string(),
            description: Some("Found near the entrance".to_string()),
            owner_id,
            place_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_create_and_retrieve_object() {
        let (store, _temp) = create_test_store();
        let owner = Uuid::new_v4();

        let created = store.create_object(new_object("Keys", owner)).unwrap();
        let fetched = store.get_object(&created.id).unwrap().unwrap();

        assert_eq!(fetched.name, "Keys");
        assert_eq!(fetched.owner_id, owner);
        assert!(store.get_object(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_by_owner() {
        let (store, _temp) = create_test_store();
        let sami = Uuid::new_v4();
        let thomas = Uuid::new_v4();

        store.create_object(new_object("Keys", sami)).unwrap();
        store.create_object(new_object("Umbrella", sami)).unwrap();
        store.create_object(new_object("Wallet", thomas)).unwrap();

        assert_eq!(store.list_objects().unwrap().len(), 3);
        assert_eq!(store.list_objects_by_owner(&sami).unwrap().len(), 2);
        assert_eq!(store.list_objects_by_owner(&thomas).unwrap().len(), 1);
        assert!(store
            .list_objects_by_owner(&Uuid::new_v4())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_partial_update_keeps_links() {
        let (store, _temp) = create_test_store();
        let owner = Uuid::new_v4();
        let object = store.create_object(new_object("Keys", owner)).unwrap();

        let updated = store
            .update_object(
                &object.id,
                &ObjectUpdate {
                    name: Some("Key ring".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Key ring");
        assert_eq!(updated.picture, "picture.png");
        assert_eq!(updated.owner_id, owner);

        assert!(store
            .update_object(&Uuid::new_v4(), &ObjectUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_object() {
        let (store, _temp) = create_test_store();
        let object = store
            .create_object(new_object("Keys", Uuid::new_v4()))
            .unwrap();

        assert!(store.delete_object(&object.id).unwrap());
        assert!(!store.delete_object(&object.id).unwrap());
    }
}

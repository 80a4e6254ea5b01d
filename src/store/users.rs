//! User rows and the grouped `objectsPosted` aggregation.

use super::{parse_uuid, Store};
use crate::models::{User, UserWithStats};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};
use uuid::Uuid;

/// Fields required to insert a user. The password is already hashed by the
/// time it reaches the store.
#[derive(Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub admin: bool,
}

/// Profile fields a user may change on their own account. `None` leaves the
/// current value in place.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(0, row.get::<_, String>(0)?)?,
        admin: row.get(1)?,
        disabled: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        user_name: row.get(5)?,
        email: row.get(6)?,
        password_hash: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const USER_COLUMNS: &str =
    "id, admin, disabled, first_name, last_name, user_name, email, password_hash, created_at";

impl Store {
    pub fn create_user(&self, new: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            admin: new.admin,
            disabled: false,
            first_name: new.first_name,
            last_name: new.last_name,
            user_name: new.user_name,
            email: new.email,
            password_hash: new.password_hash,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO users (id, admin, disabled, first_name, last_name, user_name, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.id.to_string(),
                user.admin,
                user.disabled,
                user.first_name,
                user.last_name,
                user.user_name,
                user.email,
                user.password_hash,
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        Ok(user)
    }

    pub fn get_user(&self, id: &Uuid) -> Result<Option<User>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;

        match stmt.query_row(params![id.to_string()], user_from_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user_by_username(&self, user_name: &str) -> Result<Option<User>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_name = ?1"))?;

        match stmt.query_row(params![user_name], user_from_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a partial profile update; returns the fresh row, or `None` if
    /// the user does not exist.
    pub fn update_profile(&self, id: &Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE users SET
                first_name = COALESCE(?2, first_name),
                last_name  = COALESCE(?3, last_name),
                user_name  = COALESCE(?4, user_name),
                email      = COALESCE(?5, email)
             WHERE id = ?1",
            params![
                id.to_string(),
                update.first_name,
                update.last_name,
                update.user_name,
                update.email,
            ],
        )
        .context("Failed to update user profile")?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_user(id)
    }

    /// Flip the admin flag; the only field an admin may touch on somebody
    /// else's account.
    pub fn set_admin(&self, id: &Uuid, admin: bool) -> Result<Option<User>> {
        let conn = self.open()?;
        let changed = conn
            .execute(
                "UPDATE users SET admin = ?2 WHERE id = ?1",
                params![id.to_string(), admin],
            )
            .context("Failed to update admin flag")?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_user(id)
    }

    /// Hard delete; returns the removed row so the handler can echo it back.
    pub fn delete_user(&self, id: &Uuid) -> Result<Option<User>> {
        let Some(user) = self.get_user(id)? else {
            return Ok(None);
        };

        let conn = self.open()?;
        conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete user")?;

        Ok(Some(user))
    }

    /// The aggregation behind `GET /users`: every user with the count of
    /// objects they posted, newest account first, one SQL pass.
    pub fn list_users_with_counts(&self, limit: i64, offset: i64) -> Result<Vec<UserWithStats>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.admin, u.disabled, u.first_name, u.last_name, u.user_name,
                    u.email, u.password_hash, u.created_at,
                    COUNT(o.id) AS objects_posted
             FROM users u
             LEFT JOIN objects o ON o.owner_id = u.id
             GROUP BY u.id
             ORDER BY u.created_at DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt
            .query_map(params![limit, offset], |row| {
                Ok(UserWithStats {
                    user: user_from_row(row)?,
                    objects_posted: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Floor;
    use crate::store::objects::NewObject;
    use crate::store::places::NewPlace;
    use std::{thread, time::Duration};
    use tempfile::NamedTempFile;

    fn create_test_store() -> (Store, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = Store::new(db_path).unwrap();
        (store, temp_file)
    }

    fn new_user(user_name: &str, admin: bool) -> NewUser {
        NewUser {
            first_name: "Sami".to_string(),
            last_name: "Musta".to_string(),
            user_name: user_name.to_string(),
            email: format!("{user_name}@gmail.com"),
            password_hash: "hash".to_string(),
            admin,
        }
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let created = store.create_user(new_user("samimusta", false)).unwrap();
        assert!(!created.admin);
        assert!(!created.disabled);

        let by_id = store.get_user(&created.id).unwrap().unwrap();
        assert_eq!(by_id.user_name, "samimusta");

        let by_name = store.get_user_by_username("samimusta").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        assert!(store.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (store, _temp) = create_test_store();

        store.create_user(new_user("samimusta", false)).unwrap();
        assert!(store.create_user(new_user("samimusta", false)).is_err());
    }

    #[test]
    fn test_partial_profile_update() {
        let (store, _temp) = create_test_store();
        let user = store.create_user(new_user("samimusta", false)).unwrap();

        let updated = store
            .update_profile(
                &user.id,
                &ProfileUpdate {
                    first_name: Some("Samuel".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.first_name, "Samuel");
        // Untouched fields keep their values.
        assert_eq!(updated.last_name, "Musta");
        assert_eq!(updated.user_name, "samimusta");

        let missing = store
            .update_profile(&Uuid::new_v4(), &ProfileUpdate::default())
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_set_admin_touches_only_the_flag() {
        let (store, _temp) = create_test_store();
        let user = store.create_user(new_user("samimusta", false)).unwrap();

        let updated = store.set_admin(&user.id, true).unwrap().unwrap();
        assert!(updated.admin);
        assert_eq!(updated.first_name, "Sami");
    }

    #[test]
    fn test_delete_user_returns_removed_row() {
        let (store, _temp) = create_test_store();
        let user = store.create_user(new_user("samimusta", false)).unwrap();

        let removed = store.delete_user(&user.id).unwrap().unwrap();
        assert_eq!(removed.id, user.id);

        assert!(store.get_user(&user.id).unwrap().is_none());
        assert!(store.delete_user(&user.id).unwrap().is_none());
    }

    #[test]
    fn test_aggregation_counts_sorts_and_paginates() {
        let (store, _temp) = create_test_store();

        let sami = store.create_user(new_user("samimusta", true)).unwrap();
        thread::sleep(Duration::from_millis(5));
        let thomas = store.create_user(new_user("thomasbercht", false)).unwrap();
        thread::sleep(Duration::from_millis(5));
        let dzeneta = store.create_user(new_user("dzenetahamza", false)).unwrap();

        let place = store
            .create_place(NewPlace {
                geolocation: vec![6.64, 46.78],
                floor: Floor::GroundFloor,
                description: "Cafeteria".to_string(),
            })
            .unwrap();

        for name in ["Keys", "Umbrella"] {
            store
                .create_object(NewObject {
                    name: name.to_string(),
                    picture: "keys.png".to_string(),
                    description: None,
                    owner_id: sami.id,
                    place_id: place.id,
                })
                .unwrap();
        }

        let listed = store.list_users_with_counts(10, 0).unwrap();
        assert_eq!(listed.len(), 3);

        // Newest account first.
        assert_eq!(listed[0].user.id, dzeneta.id);
        assert_eq!(listed[1].user.id, thomas.id);
        assert_eq!(listed[2].user.id, sami.id);

        assert_eq!(listed[0].objects_posted, 0);
        assert_eq!(listed[2].objects_posted, 2);

        // Second page of size one is the middle account.
        let page = store.list_users_with_counts(1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].user.id, thomas.id);
    }
}

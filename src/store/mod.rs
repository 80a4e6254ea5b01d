//! SQLite persistence.
//!
//! One store handle holding the database path, one connection per call.

pub mod objects;
pub mod places;
pub mod users;

use anyhow::Result;
use rusqlite::Connection;
use uuid::Uuid;

/// Storage handle shared across handlers.
pub struct Store {
    db_path: String,
}

impl Store {
    /// Open the store and create the schema if needed.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    pub(crate) fn open(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                admin INTEGER NOT NULL DEFAULT 0,
                disabled INTEGER NOT NULL DEFAULT 0,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                user_name TEXT UNIQUE NOT NULL,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS places (
                id TEXT PRIMARY KEY,
                geolocation TEXT NOT NULL,
                floor TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS objects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                picture TEXT NOT NULL,
                description TEXT,
                owner_id TEXT NOT NULL,
                place_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id),
                FOREIGN KEY (place_id) REFERENCES places(id)
            )",
            [],
        )?;

        Ok(())
    }
}

/// Map a TEXT column back to a Uuid, keeping the rusqlite error channel.
pub(crate) fn parse_uuid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

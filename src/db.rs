//! Database module for the giveaway bot
//!
//! Provides persistence for events and their registrants.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Event not found: {0}")]
    EventNotFound(EventId),
    #[error("Registrant not found: {0}")]
    RegistrantNotFound(i64),
    #[error("Account {account_id} is already registered for event {event_id}")]
    AlreadyRegistered { account_id: i64, event_id: EventId },
}

pub type DbResult<T> = Result<T, DbError>;

const EVENT_COLUMNS: &str = "id, name, description, date, created_at";
const REGISTRANT_COLUMNS: &str = "id, account_id, name, handle, event_id, n, created_at";

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.lock().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves the connection usable
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // ==================== Event Operations ====================

    /// Create a new event
    pub fn create_event(
        &self,
        name: &str,
        description: Option<&str>,
        date: DateTime<Utc>,
    ) -> DbResult<Event> {
        let conn = self.lock();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO events (name, description, date, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, description, date.to_rfc3339(), now.to_rfc3339()],
        )?;

        Ok(Event {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(String::from),
            date,
            created_at: now,
        })
    }

    /// Get event by ID
    pub fn get_event(&self, id: EventId) -> DbResult<Event> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
            params![id],
            parse_event_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::EventNotFound(id),
            other => DbError::Sqlite(other),
        })
    }

    /// Most recently created event, if any
    pub fn get_last_event(&self) -> DbResult<Option<Event>> {
        let conn = self.lock();
        let event = conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id DESC LIMIT 1"),
                [],
                parse_event_row,
            )
            .optional()?;
        Ok(event)
    }

    /// List all events, newest date first
    pub fn list_events(&self) -> DbResult<Vec<Event>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], parse_event_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Update an event's details
    pub fn update_event(
        &self,
        id: EventId,
        name: &str,
        description: Option<&str>,
        date: DateTime<Utc>,
    ) -> DbResult<Event> {
        {
            let conn = self.lock();
            let updated = conn.execute(
                "UPDATE events SET name = ?1, description = ?2, date = ?3 WHERE id = ?4",
                params![name, description, date.to_rfc3339(), id],
            )?;
            if updated == 0 {
                return Err(DbError::EventNotFound(id));
            }
        }
        self.get_event(id)
    }

    /// Delete an event together with its registrants
    pub fn delete_event(&self, id: EventId) -> DbResult<()> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DbError::EventNotFound(id));
        }
        Ok(())
    }

    // ==================== Registrant Operations ====================

    /// Register an account for an event.
    ///
    /// Returns `DbError::AlreadyRegistered` when the account already has a
    /// registrant row for this event.
    pub fn create_registrant(&self, new: &NewRegistrant) -> DbResult<Registrant> {
        let conn = self.lock();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO registrants (account_id, name, handle, event_id, n, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                new.account_id,
                new.name,
                new.handle,
                new.event_id,
                now.to_rfc3339()
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::AlreadyRegistered {
                    account_id: new.account_id,
                    event_id: new.event_id,
                }
            } else {
                DbError::Sqlite(e)
            }
        })?;

        Ok(Registrant {
            id: conn.last_insert_rowid(),
            account_id: new.account_id,
            name: new.name.clone(),
            handle: new.handle.clone(),
            event_id: new.event_id,
            n: 1,
            created_at: now,
        })
    }

    /// Registrants of an event in registration order
    pub fn list_registrants(&self, event_id: EventId) -> DbResult<Vec<Registrant>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REGISTRANT_COLUMNS} FROM registrants WHERE event_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![event_id], parse_registrant_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Set the draw weight of a registrant
    pub fn update_registrant_weight(
        &self,
        event_id: EventId,
        registrant_id: i64,
        n: i64,
    ) -> DbResult<()> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE registrants SET n = ?1 WHERE id = ?2 AND event_id = ?3",
            params![n, registrant_id, event_id],
        )?;
        if updated == 0 {
            return Err(DbError::RegistrantNotFound(registrant_id));
        }
        Ok(())
    }

    /// Remove a registrant from an event
    pub fn delete_registrant(&self, event_id: EventId, registrant_id: i64) -> DbResult<()> {
        let conn = self.lock();
        let deleted = conn.execute(
            "DELETE FROM registrants WHERE id = ?1 AND event_id = ?2",
            params![registrant_id, event_id],
        )?;
        if deleted == 0 {
            return Err(DbError::RegistrantNotFound(registrant_id));
        }
        Ok(())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        date: parse_datetime(&row.get::<_, String>(3)?),
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn parse_registrant_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Registrant> {
    Ok(Registrant {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        handle: row.get(3)?,
        event_id: row.get(4)?,
        n: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 17, 18, 0, 0).unwrap()
    }

    fn new_registrant(account_id: i64, event_id: EventId) -> NewRegistrant {
        NewRegistrant {
            account_id,
            name: format!("Participant {account_id}"),
            handle: Some(format!("user{account_id}")),
            event_id,
        }
    }

    #[test]
    fn test_create_and_get_event() {
        let db = Database::open_in_memory().unwrap();

        let event = db
            .create_event("Spring Meetup", Some("Talks and pizza"), event_date())
            .unwrap();
        assert_eq!(event.name, "Spring Meetup");

        let fetched = db.get_event(event.id).unwrap();
        assert_eq!(fetched.name, "Spring Meetup");
        assert_eq!(fetched.description.as_deref(), Some("Talks and pizza"));
        assert_eq!(fetched.date, event_date());
    }

    #[test]
    fn test_missing_event() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_event(42), Err(DbError::EventNotFound(42))));
        assert!(db.get_last_event().unwrap().is_none());
    }

    #[test]
    fn test_last_event_is_most_recently_created() {
        let db = Database::open_in_memory().unwrap();
        db.create_event("First", None, event_date()).unwrap();
        let second = db.create_event("Second", None, event_date()).unwrap();

        let last = db.get_last_event().unwrap().unwrap();
        assert_eq!(last.id, second.id);
    }

    #[test]
    fn test_duplicate_registration_is_typed() {
        let db = Database::open_in_memory().unwrap();
        let event = db.create_event("Meetup", None, event_date()).unwrap();

        db.create_registrant(&new_registrant(7, event.id)).unwrap();
        let err = db.create_registrant(&new_registrant(7, event.id)).unwrap_err();

        assert!(matches!(
            err,
            DbError::AlreadyRegistered { account_id: 7, .. }
        ));
        assert_eq!(db.list_registrants(event.id).unwrap().len(), 1);
    }

    #[test]
    fn test_same_account_may_register_for_different_events() {
        let db = Database::open_in_memory().unwrap();
        let first = db.create_event("First", None, event_date()).unwrap();
        let second = db.create_event("Second", None, event_date()).unwrap();

        db.create_registrant(&new_registrant(7, first.id)).unwrap();
        db.create_registrant(&new_registrant(7, second.id)).unwrap();
    }

    #[test]
    fn test_registration_for_unknown_event_is_not_a_duplicate() {
        let db = Database::open_in_memory().unwrap();
        let err = db.create_registrant(&new_registrant(7, 999)).unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    }

    #[test]
    fn test_registrants_in_registration_order() {
        let db = Database::open_in_memory().unwrap();
        let event = db.create_event("Meetup", None, event_date()).unwrap();
        for account in [30, 10, 20] {
            db.create_registrant(&new_registrant(account, event.id))
                .unwrap();
        }

        let accounts: Vec<i64> = db
            .list_registrants(event.id)
            .unwrap()
            .iter()
            .map(|r| r.account_id)
            .collect();
        assert_eq!(accounts, vec![30, 10, 20]);
    }

    #[test]
    fn test_update_weight_and_delete_registrant() {
        let db = Database::open_in_memory().unwrap();
        let event = db.create_event("Meetup", None, event_date()).unwrap();
        let registrant = db.create_registrant(&new_registrant(1, event.id)).unwrap();

        db.update_registrant_weight(event.id, registrant.id, 3)
            .unwrap();
        assert_eq!(db.list_registrants(event.id).unwrap()[0].n, 3);

        // Wrong event does not match
        assert!(matches!(
            db.update_registrant_weight(event.id + 1, registrant.id, 5),
            Err(DbError::RegistrantNotFound(_))
        ));

        db.delete_registrant(event.id, registrant.id).unwrap();
        assert!(db.list_registrants(event.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_event_cascades_registrants() {
        let db = Database::open_in_memory().unwrap();
        let event = db.create_event("Meetup", None, event_date()).unwrap();
        db.create_registrant(&new_registrant(1, event.id)).unwrap();
        db.create_registrant(&new_registrant(2, event.id)).unwrap();

        db.delete_event(event.id).unwrap();

        assert!(db.list_registrants(event.id).unwrap().is_empty());
        assert!(matches!(
            db.delete_event(event.id),
            Err(DbError::EventNotFound(_))
        ));
    }

    #[test]
    fn test_update_event() {
        let db = Database::open_in_memory().unwrap();
        let event = db.create_event("Draft", None, event_date()).unwrap();

        let updated = db
            .update_event(event.id, "Final", Some("Now with prizes"), event_date())
            .unwrap();
        assert_eq!(updated.name, "Final");
        assert_eq!(updated.description.as_deref(), Some("Now with prizes"));
    }
}

//! Mock store for tracker tests

use super::{RegistrantStore, WriteError};
use crate::db::{Event, EventId, NewRegistrant, Registrant};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory store enforcing one registrant per (account, event)
#[derive(Default)]
pub struct MockStore {
    events: Mutex<HashMap<EventId, Event>>,
    registrants: Mutex<Vec<Registrant>>,
    failures: Mutex<VecDeque<String>>,
    lookup_failures: Mutex<VecDeque<String>>,
    write_attempts: Mutex<usize>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(id: EventId, name: &str) -> Self {
        let store = Self::new();
        store.add_event(id, name);
        store
    }

    pub fn add_event(&self, id: EventId, name: &str) {
        let now = Utc::now();
        self.events.lock().unwrap().insert(
            id,
            Event {
                id,
                name: name.to_string(),
                description: None,
                date: now,
                created_at: now,
            },
        );
    }

    /// Insert a registrant directly, bypassing write accounting
    pub fn preregister(&self, account_id: i64, event_id: EventId) {
        let mut registrants = self.registrants.lock().unwrap();
        let id = i64::try_from(registrants.len()).unwrap() + 1;
        registrants.push(Registrant {
            id,
            account_id,
            name: format!("Account {account_id}"),
            handle: None,
            event_id,
            n: 1,
            created_at: Utc::now(),
        });
    }

    /// Make the next write fail with a non-duplicate error
    pub fn fail_next_write(&self, message: &str) {
        self.failures.lock().unwrap().push_back(message.to_string());
    }

    /// Make the next event lookup fail
    pub fn fail_next_get_event(&self, message: &str) {
        self.lookup_failures
            .lock()
            .unwrap()
            .push_back(message.to_string());
    }

    pub fn registrants(&self) -> Vec<Registrant> {
        self.registrants.lock().unwrap().clone()
    }

    pub fn write_attempts(&self) -> usize {
        *self.write_attempts.lock().unwrap()
    }
}

#[async_trait]
impl RegistrantStore for MockStore {
    async fn create_registrant(&self, new: &NewRegistrant) -> Result<Registrant, WriteError> {
        *self.write_attempts.lock().unwrap() += 1;

        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(WriteError::Other(message));
        }

        let mut registrants = self.registrants.lock().unwrap();
        if registrants
            .iter()
            .any(|r| r.account_id == new.account_id && r.event_id == new.event_id)
        {
            return Err(WriteError::AlreadyRegistered);
        }

        let registrant = Registrant {
            id: i64::try_from(registrants.len()).unwrap() + 1,
            account_id: new.account_id,
            name: new.name.clone(),
            handle: new.handle.clone(),
            event_id: new.event_id,
            n: 1,
            created_at: Utc::now(),
        };
        registrants.push(registrant.clone());
        Ok(registrant)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, String> {
        if let Some(message) = self.lookup_failures.lock().unwrap().pop_front() {
            return Err(message);
        }
        Ok(self.events.lock().unwrap().get(&id).cloned())
    }
}

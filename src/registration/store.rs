//! Store abstraction used by the tracker
//!
//! Lets the tracker be exercised against an in-memory mock.

use crate::db::{Database, DbError, Event, EventId, NewRegistrant, Registrant};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Why a registrant write did not happen
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WriteError {
    #[error("already registered")]
    AlreadyRegistered,
    #[error("{0}")]
    Other(String),
}

/// Storage consulted by the registration flow
#[async_trait]
pub trait RegistrantStore: Send + Sync {
    /// Insert a registrant; a unique-key conflict is `WriteError::AlreadyRegistered`
    async fn create_registrant(&self, new: &NewRegistrant) -> Result<Registrant, WriteError>;

    /// Look up an event; `Ok(None)` when it does not exist
    async fn get_event(&self, id: EventId) -> Result<Option<Event>, String>;
}

#[async_trait]
impl<T: RegistrantStore + ?Sized> RegistrantStore for Arc<T> {
    async fn create_registrant(&self, new: &NewRegistrant) -> Result<Registrant, WriteError> {
        (**self).create_registrant(new).await
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, String> {
        (**self).get_event(id).await
    }
}

#[async_trait]
impl RegistrantStore for Database {
    async fn create_registrant(&self, new: &NewRegistrant) -> Result<Registrant, WriteError> {
        Database::create_registrant(self, new).map_err(|e| match e {
            DbError::AlreadyRegistered { .. } => WriteError::AlreadyRegistered,
            other => WriteError::Other(other.to_string()),
        })
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, String> {
        match Database::get_event(self, id) {
            Ok(event) => Ok(Some(event)),
            Err(DbError::EventNotFound(_)) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }
}

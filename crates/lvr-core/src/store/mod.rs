//! Persistence for projection records, analytics events and projection runs.
//!
//! The submodules hold free functions over a borrowed [`Connection`], in the
//! same shape as the rest of the `db` helpers. [`Store`] wraps one connection
//! behind a mutex so async callers can share it and run each operation on a
//! blocking thread.

pub mod events;
pub mod projections;
pub mod runs;

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::db;
use crate::error::ErrorCode;
use crate::model::activity::{AnalyticsEvent, NewEvent, NewRun, ProjectionRun};
use crate::model::record::ProjectionRecord;
use crate::normalize::ValidationErrors;

pub use projections::{PutOutcome, StoredProjection};

/// Failures surfaced by store operations.
///
/// "Not found" is not an error: lookups return `Option`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored {what} could not be decoded: {reason}")]
    Corrupt { what: String, reason: String },

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

impl StoreError {
    pub(crate) fn corrupt(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::StorageUnavailable,
            Self::Corrupt { .. } => ErrorCode::CorruptRecord,
            Self::Invalid(_) => ErrorCode::ValidationFailed,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Unavailable(error.to_string())
    }
}

/// Shared handle to the service database.
#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating and migrating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    /// Fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database handle poisoned".to_string()))?;
        f(&conn)
    }

    /// Insert or replace the record stored under its `meta.slug`.
    ///
    /// # Errors
    ///
    /// See [`projections::put`].
    pub fn put_projection(
        &self,
        owner_slug: &str,
        record: &ProjectionRecord,
    ) -> Result<(StoredProjection, PutOutcome), StoreError> {
        self.with_conn(|conn| projections::put(conn, owner_slug, record, Utc::now()))
    }

    /// # Errors
    ///
    /// See [`projections::get_by_slug`].
    pub fn get_projection(&self, slug: &str) -> Result<Option<StoredProjection>, StoreError> {
        self.with_conn(|conn| projections::get_by_slug(conn, slug))
    }

    /// # Errors
    ///
    /// See [`projections::get_by_owner_and_slug`].
    pub fn get_owned_projection(
        &self,
        owner_slug: &str,
        slug: &str,
    ) -> Result<Option<StoredProjection>, StoreError> {
        self.with_conn(|conn| projections::get_by_owner_and_slug(conn, owner_slug, slug))
    }

    /// # Errors
    ///
    /// See [`events::append`].
    pub fn append_event(&self, event: &NewEvent) -> Result<i64, StoreError> {
        self.with_conn(|conn| events::append(conn, event, Utc::now()))
    }

    /// # Errors
    ///
    /// See [`events::query_by_slug`].
    pub fn events_for_slug(&self, slug: &str) -> Result<Vec<AnalyticsEvent>, StoreError> {
        self.with_conn(|conn| events::query_by_slug(conn, slug))
    }

    /// # Errors
    ///
    /// See [`runs::append`].
    pub fn append_run(&self, run: &NewRun) -> Result<i64, StoreError> {
        self.with_conn(|conn| runs::append(conn, run, Utc::now()))
    }

    /// # Errors
    ///
    /// See [`runs::list`].
    pub fn list_runs(&self, limit: Option<i64>) -> Result<Vec<ProjectionRun>, StoreError> {
        self.with_conn(|conn| runs::list(conn, limit))
    }
}

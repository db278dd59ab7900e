//! Slug-keyed projection records.
//!
//! One row per slug. A write for an existing slug replaces the payload and
//! owner, bumps `updated_at` and keeps `created_at`. There is no merge and no
//! version check: the last writer wins.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use super::StoreError;
use crate::db::{from_micros, to_micros};
use crate::model::activity::RunAction;
use crate::model::record::ProjectionRecord;
use crate::normalize::ValidationErrors;

/// A projection record with its storage envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProjection {
    pub slug: String,
    pub owner_slug: String,
    pub data: ProjectionRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a [`put`] inserted a new slug or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Updated,
}

impl PutOutcome {
    #[must_use]
    pub const fn run_action(self) -> RunAction {
        match self {
            Self::Created => RunAction::Create,
            Self::Updated => RunAction::Update,
        }
    }
}

/// Insert or replace the record stored under `record.meta.slug`.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for a blank slug or owner, and
/// [`StoreError::Unavailable`] if the write fails.
pub fn put(
    conn: &Connection,
    owner_slug: &str,
    record: &ProjectionRecord,
    now: DateTime<Utc>,
) -> Result<(StoredProjection, PutOutcome), StoreError> {
    let slug = record.meta.slug.as_str();
    if slug.trim().is_empty() {
        return Err(ValidationErrors::single("meta.slug", "must not be empty").into());
    }
    if owner_slug.trim().is_empty() {
        return Err(ValidationErrors::single("ownerSlug", "must not be empty").into());
    }

    let data_json = serde_json::to_string(record)
        .map_err(|e| StoreError::Unavailable(format!("encode projection '{slug}': {e}")))?;
    let now_us = to_micros(now);

    let tx = conn.unchecked_transaction()?;
    let existed: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM projections WHERE slug = ?1)",
        params![slug],
        |row| row.get(0),
    )?;
    let created_at_us: i64 = tx.query_row(
        "INSERT INTO projections (slug, owner_slug, data_json, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(slug) DO UPDATE SET
             owner_slug = excluded.owner_slug,
             data_json = excluded.data_json,
             updated_at_us = excluded.updated_at_us
         RETURNING created_at_us",
        params![slug, owner_slug, data_json, now_us],
        |row| row.get(0),
    )?;
    tx.commit()?;

    let outcome = if existed {
        PutOutcome::Updated
    } else {
        PutOutcome::Created
    };
    tracing::debug!(slug, owner_slug, ?outcome, "stored projection");

    Ok((
        StoredProjection {
            slug: slug.to_string(),
            owner_slug: owner_slug.to_string(),
            data: record.clone(),
            created_at: from_micros(created_at_us),
            updated_at: from_micros(now_us),
        },
        outcome,
    ))
}

/// Look up a projection by slug.
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if the stored payload no longer decodes,
/// [`StoreError::Unavailable`] if the query fails.
pub fn get_by_slug(conn: &Connection, slug: &str) -> Result<Option<StoredProjection>, StoreError> {
    let row = conn
        .query_row(
            "SELECT slug, owner_slug, data_json, created_at_us, updated_at_us
             FROM projections WHERE slug = ?1",
            params![slug],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((slug, owner_slug, data_json, created_at_us, updated_at_us)) = row else {
        return Ok(None);
    };

    let data: ProjectionRecord = serde_json::from_str(&data_json)
        .map_err(|e| StoreError::corrupt(format!("projection '{slug}'"), e))?;

    Ok(Some(StoredProjection {
        slug,
        owner_slug,
        data,
        created_at: from_micros(created_at_us),
        updated_at: from_micros(updated_at_us),
    }))
}

/// Look up a projection by slug, returning it only if `owner_slug` owns it.
///
/// # Errors
///
/// Same as [`get_by_slug`].
pub fn get_by_owner_and_slug(
    conn: &Connection,
    owner_slug: &str,
    slug: &str,
) -> Result<Option<StoredProjection>, StoreError> {
    Ok(get_by_slug(conn, slug)?.filter(|stored| stored.owner_slug == owner_slug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::testing::sample_record;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn first_put_creates_then_updates() {
        let conn = open_in_memory().expect("db");
        let record = sample_record("456 Beachside Dr");

        let (stored, outcome) = put(&conn, "kaci-wolkers", &record, t0()).expect("put");
        assert_eq!(outcome, PutOutcome::Created);
        assert_eq!(stored.created_at, stored.updated_at);

        let later = t0() + Duration::minutes(5);
        let (stored, outcome) = put(&conn, "kaci-wolkers", &record, later).expect("put again");
        assert_eq!(outcome, PutOutcome::Updated);
        assert_eq!(stored.created_at, t0());
        assert_eq!(stored.updated_at, later);
    }

    #[test]
    fn get_returns_what_was_put() {
        let conn = open_in_memory().expect("db");
        let record = sample_record("456 Beachside Dr");
        put(&conn, "kaci-wolkers", &record, t0()).expect("put");

        let stored = get_by_slug(&conn, &record.meta.slug)
            .expect("get")
            .expect("present");
        assert_eq!(stored.data, record);
        assert_eq!(stored.owner_slug, "kaci-wolkers");
        assert_eq!(stored.created_at, t0());
    }

    #[test]
    fn second_put_replaces_data_and_owner() {
        let conn = open_in_memory().expect("db");
        let mut record = sample_record("456 Beachside Dr");
        put(&conn, "kaci-wolkers", &record, t0()).expect("put");

        record.projections.expected_revenue = 1.0;
        put(&conn, "team-30a", &record, t0() + Duration::seconds(1)).expect("put again");

        let stored = get_by_slug(&conn, &record.meta.slug)
            .expect("get")
            .expect("present");
        assert!((stored.data.projections.expected_revenue - 1.0).abs() < f64::EPSILON);
        assert_eq!(stored.owner_slug, "team-30a");
        assert!(get_by_owner_and_slug(&conn, "kaci-wolkers", &record.meta.slug)
            .expect("get")
            .is_none());
    }

    #[test]
    fn owner_scoped_lookup_requires_matching_owner() {
        let conn = open_in_memory().expect("db");
        let record = sample_record("456 Beachside Dr");
        put(&conn, "kaci-wolkers", &record, t0()).expect("put");

        assert!(get_by_owner_and_slug(&conn, "kaci-wolkers", &record.meta.slug)
            .expect("get")
            .is_some());
        assert!(get_by_owner_and_slug(&conn, "someone-else", &record.meta.slug)
            .expect("get")
            .is_none());
    }

    #[test]
    fn unknown_slug_is_none() {
        let conn = open_in_memory().expect("db");
        assert!(get_by_slug(&conn, "nope").expect("get").is_none());
    }

    #[test]
    fn blank_owner_is_rejected_without_writing() {
        let conn = open_in_memory().expect("db");
        let record = sample_record("456 Beachside Dr");
        let err = put(&conn, "  ", &record, t0()).expect_err("blank owner");
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(get_by_slug(&conn, &record.meta.slug).expect("get").is_none());
    }

    #[test]
    fn undecodable_row_is_corrupt() {
        let conn = open_in_memory().expect("db");
        conn.execute(
            "INSERT INTO projections (slug, owner_slug, data_json, created_at_us, updated_at_us)
             VALUES ('broken', 'kaci', '{\"meta\":1}', 1, 1)",
            [],
        )
        .expect("insert raw row");
        let err = get_by_slug(&conn, "broken").expect_err("corrupt row");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}

//! Append-only analytics event log.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use super::StoreError;
use crate::db::{from_micros, to_micros};
use crate::model::activity::{AnalyticsEvent, NewEvent};
use crate::normalize::ValidationErrors;

/// Record an event and return its id. Duplicates are stored as-is.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for a blank event name and
/// [`StoreError::Unavailable`] if the insert fails.
pub fn append(conn: &Connection, event: &NewEvent, now: DateTime<Utc>) -> Result<i64, StoreError> {
    let name = event.event.trim();
    if name.is_empty() {
        return Err(ValidationErrors::single("event", "must not be empty").into());
    }

    let meta_json = event
        .meta
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Unavailable(format!("encode event meta: {e}")))?;

    conn.execute(
        "INSERT INTO analytics_events
             (event, slug, owner_slug, lead_id, campaign, source, meta_json, created_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            name,
            event.slug,
            event.owner_slug,
            event.lead_id,
            event.campaign,
            event.source,
            meta_json,
            to_micros(now),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, event = name, slug = event.slug.as_deref(), "recorded event");
    Ok(id)
}

/// All events recorded for `slug`, oldest first.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the query fails and
/// [`StoreError::Corrupt`] if a stored `meta` payload no longer decodes.
pub fn query_by_slug(conn: &Connection, slug: &str) -> Result<Vec<AnalyticsEvent>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, event, slug, owner_slug, lead_id, campaign, source, meta_json, created_at_us
         FROM analytics_events
         WHERE slug = ?1
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![slug], |row| {
        Ok((
            AnalyticsEvent {
                id: row.get(0)?,
                event: row.get(1)?,
                slug: row.get(2)?,
                owner_slug: row.get(3)?,
                lead_id: row.get(4)?,
                campaign: row.get(5)?,
                source: row.get(6)?,
                meta: None,
                created_at: from_micros(row.get(8)?),
            },
            row.get::<_, Option<String>>(7)?,
        ))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (mut event, meta_json) = row?;
        if let Some(raw) = meta_json {
            event.meta = Some(
                serde_json::from_str(&raw)
                    .map_err(|e| StoreError::corrupt(format!("event {}", event.id), e))?,
            );
        }
        events.push(event);
    }
    Ok(events)
}

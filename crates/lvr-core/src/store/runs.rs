//! Append-only projection run (audit) log.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use super::StoreError;
use crate::db::{from_micros, to_micros};
use crate::model::activity::{NewRun, ProjectionRun, RunAction};

/// Rows returned by [`list`] when no limit is given.
pub const DEFAULT_RUN_LIMIT: u32 = 100;
/// Upper bound on rows returned by [`list`].
pub const MAX_RUN_LIMIT: u32 = 1000;

/// Clamp a requested limit to `1..=MAX_RUN_LIMIT`.
#[must_use]
pub fn clamp_limit(requested: Option<i64>) -> u32 {
    requested.map_or(DEFAULT_RUN_LIMIT, |n| {
        u32::try_from(n.clamp(1, i64::from(MAX_RUN_LIMIT))).unwrap_or(DEFAULT_RUN_LIMIT)
    })
}

/// Record a run and return its id.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the insert fails.
pub fn append(conn: &Connection, run: &NewRun, now: DateTime<Utc>) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO projection_runs (
            slug, owner_slug, actor_name, actor_email, lead_id, internal_id,
            owner_name, address, city, state, market, public_url, preview_url,
            sheet_url, action, created_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            run.slug,
            run.owner_slug,
            run.actor_name,
            run.actor_email,
            run.lead_id,
            run.internal_id,
            run.owner_name,
            run.address,
            run.city,
            run.state,
            run.market,
            run.public_url,
            run.preview_url,
            run.sheet_url,
            run.action.as_str(),
            to_micros(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent runs first, at most `clamp_limit(limit)` rows.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the query fails and
/// [`StoreError::Corrupt`] if a row carries an unknown action.
pub fn list(conn: &Connection, limit: Option<i64>) -> Result<Vec<ProjectionRun>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, slug, owner_slug, actor_name, actor_email, lead_id, internal_id,
                owner_name, address, city, state, market, public_url, preview_url,
                sheet_url, action, created_at_us
         FROM projection_runs
         ORDER BY created_at_us DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![clamp_limit(limit)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            NewRun {
                slug: row.get(1)?,
                owner_slug: row.get(2)?,
                actor_name: row.get(3)?,
                actor_email: row.get(4)?,
                lead_id: row.get(5)?,
                internal_id: row.get(6)?,
                owner_name: row.get(7)?,
                address: row.get(8)?,
                city: row.get(9)?,
                state: row.get(10)?,
                market: row.get(11)?,
                public_url: row.get(12)?,
                preview_url: row.get(13)?,
                sheet_url: row.get(14)?,
                action: RunAction::Create,
            },
            row.get::<_, String>(15)?,
            row.get::<_, i64>(16)?,
        ))
    })?;

    let mut runs = Vec::new();
    for row in rows {
        let (id, mut run, action, created_at_us) = row?;
        run.action = action
            .parse()
            .map_err(|e| StoreError::corrupt(format!("run {id}"), e))?;
        runs.push(ProjectionRun {
            id,
            run,
            created_at: from_micros(created_at_us),
        });
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::Duration;

    fn run(slug: &str, action: RunAction) -> NewRun {
        NewRun {
            slug: slug.to_string(),
            owner_slug: "kaci-wolkers".to_string(),
            actor_name: Some("Kaci Wolkers".to_string()),
            actor_email: None,
            lead_id: Some("00Q1".to_string()),
            internal_id: None,
            owner_name: None,
            address: None,
            city: None,
            state: None,
            market: None,
            public_url: Some(format!("https://projections.example.com/kaci-wolkers/{slug}")),
            preview_url: None,
            sheet_url: None,
            action,
        }
    }

    #[test]
    fn list_is_newest_first() {
        let conn = open_in_memory().expect("db");
        let t0 = Utc::now();
        append(&conn, &run("a", RunAction::Create), t0).expect("append");
        append(&conn, &run("b", RunAction::Create), t0 + Duration::seconds(1)).expect("append");
        append(&conn, &run("a", RunAction::Update), t0 + Duration::seconds(1)).expect("append");

        let runs = list(&conn, None).expect("list");
        let order: Vec<_> = runs.iter().map(|r| (r.run.slug.as_str(), r.run.action)).collect();
        assert_eq!(
            order,
            vec![
                ("a", RunAction::Update),
                ("b", RunAction::Create),
                ("a", RunAction::Create)
            ]
        );
        assert_eq!(runs[0].run.public_url, run("a", RunAction::Update).public_url);
    }

    #[test]
    fn list_honours_limit() {
        let conn = open_in_memory().expect("db");
        let now = Utc::now();
        for slug in ["a", "b", "c"] {
            append(&conn, &run(slug, RunAction::Create), now).expect("append");
        }
        assert_eq!(list(&conn, Some(2)).expect("list").len(), 2);
        assert_eq!(list(&conn, Some(0)).expect("list").len(), 1);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None), DEFAULT_RUN_LIMIT);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(1_000_000)), MAX_RUN_LIMIT);
    }
}

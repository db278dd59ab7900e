//! SQLite schema.
//!
//! - `projections` holds the latest canonical record per slug as JSON plus
//!   the owner slug used for scoped lookups
//! - `analytics_events` is an append-only event log
//! - `projection_runs` is an append-only audit log of projection writes

/// Migration v1: projection store, event log and run log.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projections (
    slug TEXT PRIMARY KEY CHECK (length(trim(slug)) > 0),
    owner_slug TEXT NOT NULL CHECK (length(trim(owner_slug)) > 0),
    data_json TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS analytics_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event TEXT NOT NULL CHECK (length(trim(event)) > 0),
    slug TEXT,
    owner_slug TEXT,
    lead_id TEXT,
    campaign TEXT,
    source TEXT,
    meta_json TEXT,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS projection_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL,
    owner_slug TEXT NOT NULL,
    actor_name TEXT,
    actor_email TEXT,
    lead_id TEXT,
    internal_id TEXT,
    owner_name TEXT,
    address TEXT,
    city TEXT,
    state TEXT,
    market TEXT,
    public_url TEXT,
    preview_url TEXT,
    action TEXT NOT NULL CHECK (action IN ('create', 'update')),
    created_at_us INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projections_owner_slug
    ON projections(owner_slug, slug);

CREATE INDEX IF NOT EXISTS idx_analytics_events_slug
    ON analytics_events(slug, id);

CREATE INDEX IF NOT EXISTS idx_projection_runs_created
    ON projection_runs(created_at_us DESC, id DESC);
";

/// Migration v2: spreadsheet link on runs, event-name index for reporting.
pub const MIGRATION_V2_SQL: &str = r"
ALTER TABLE projection_runs ADD COLUMN sheet_url TEXT;

CREATE INDEX IF NOT EXISTS idx_analytics_events_event_created
    ON analytics_events(event, created_at_us);
";

/// Indexes that must exist after migrating to the latest version.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_projections_owner_slug",
    "idx_analytics_events_slug",
    "idx_projection_runs_created",
    "idx_analytics_events_event_created",
];

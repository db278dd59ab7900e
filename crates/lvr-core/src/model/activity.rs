//! Append-only activity rows: analytics events and projection runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// Event name recorded when the homeowner submits the contact form.
pub const EVENT_FORM_SUBMIT: &str = "projection_form_submit";
/// Event name recorded by the tracking redirect.
pub const EVENT_LINK_CLICK: &str = "projection_link_click";
/// Event name recorded when a page failed to load its projection.
pub const EVENT_LOAD_ERROR: &str = "projection_load_error";

/// An analytics event as submitted, before it is assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub event: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "aeSlug")]
    pub owner_slug: Option<String>,
    #[serde(default, alias = "lid")]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default, alias = "src")]
    pub source: Option<String>,
    #[serde(default)]
    pub meta: Option<Value>,
}

impl NewEvent {
    #[must_use]
    pub fn named(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Self::default()
        }
    }
}

/// A stored analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: i64,
    pub event: String,
    pub slug: Option<String>,
    pub owner_slug: Option<String>,
    pub lead_id: Option<String>,
    pub campaign: Option<String>,
    pub source: Option<String>,
    pub meta: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// What a projection POST did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunAction {
    Create,
    Update,
}

impl RunAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for RunAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown run action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown run action '{0}': expected create or update")]
pub struct UnknownRunAction(pub String);

impl FromStr for RunAction {
    type Err = UnknownRunAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            other => Err(UnknownRunAction(other.to_string())),
        }
    }
}

/// A projection run audit row as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRun {
    pub slug: String,
    pub owner_slug: String,
    pub actor_name: Option<String>,
    pub actor_email: Option<String>,
    pub lead_id: Option<String>,
    pub internal_id: Option<String>,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub public_url: Option<String>,
    pub preview_url: Option<String>,
    pub sheet_url: Option<String>,
    pub action: RunAction,
}

/// A stored projection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRun {
    pub id: i64,
    #[serde(flatten)]
    pub run: NewRun,
    pub created_at: DateTime<Utc>,
}

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use lvr_core::model::activity::{AnalyticsEvent, EVENT_LOAD_ERROR, NewEvent};
use lvr_core::normalize::ValidationErrors;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::AppState;
use super::error::{ApiError, blocking};

const INVALID_EVENT: &str = "Invalid event data";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    ok: bool,
    event_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    ok: bool,
    count: usize,
    events: Vec<AnalyticsEvent>,
}

/// Browser report of a projection page that failed to load.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadErrorReport {
    slug: Option<String>,
    #[serde(alias = "aeSlug")]
    owner_slug: Option<String>,
    url: Option<String>,
    user_agent: Option<String>,
    referrer: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    ok: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Blank optional tags are stored as absent.
pub fn tidy(event: NewEvent) -> NewEvent {
    NewEvent {
        event: event.event.trim().to_string(),
        slug: non_blank(event.slug),
        owner_slug: non_blank(event.owner_slug),
        lead_id: non_blank(event.lead_id),
        campaign: non_blank(event.campaign),
        source: non_blank(event.source),
        meta: event.meta.filter(|m| !m.is_null()),
    }
}

#[tracing::instrument(skip(state, payload))]
pub async fn append(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Json<AppendResponse>, ApiError> {
    let Json(event) =
        payload.map_err(|rejection| ApiError::from_rejection(INVALID_EVENT, &rejection))?;
    let event = tidy(event);

    let name = event.event.clone();
    let slug = event.slug.clone();
    let event_id = blocking(&state.store, move |store| store.append_event(&event))
        .await
        .map_err(|error| match error {
            ApiError::Validation { errors, .. } => ApiError::invalid(INVALID_EVENT, errors),
            other => other,
        })?;

    tracing::info!(event_id, event = %name, slug = slug.as_deref(), "recorded analytics event");
    Ok(Json(AppendResponse { ok: true, event_id }))
}

#[tracing::instrument(skip(state))]
pub async fn list_for_slug(
    State(state): State<AppState>,
    Query(query): Query<SlugQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let Some(slug) = non_blank(query.slug) else {
        return Err(ApiError::invalid(
            INVALID_EVENT,
            ValidationErrors::single("slug", "is required"),
        ));
    };
    let events = blocking(&state.store, move |store| store.events_for_slug(&slug)).await?;
    Ok(Json(EventsResponse {
        ok: true,
        count: events.len(),
        events,
    }))
}

/// Record a page load failure for operator follow-up. Always answers 200.
#[tracing::instrument(skip(state, payload))]
pub async fn report_error(
    State(state): State<AppState>,
    payload: Result<Json<LoadErrorReport>, JsonRejection>,
) -> Json<OkResponse> {
    let report = payload.map(|Json(report)| report).unwrap_or_default();

    let mut meta = Map::new();
    for (key, value) in [
        ("url", &report.url),
        ("userAgent", &report.user_agent),
        ("referrer", &report.referrer),
        ("message", &report.message),
    ] {
        if let Some(value) = value {
            meta.insert(key.to_string(), json!(value));
        }
    }

    tracing::warn!(
        slug = report.slug.as_deref(),
        url = report.url.as_deref(),
        message = report.message.as_deref(),
        "projection page failed to load"
    );

    let event = tidy(NewEvent {
        slug: report.slug,
        owner_slug: report.owner_slug,
        meta: Some(Value::Object(meta)),
        ..NewEvent::named(EVENT_LOAD_ERROR)
    });
    if let Err(error) = blocking(&state.store, move |store| store.append_event(&event)).await {
        tracing::error!(%error, "failed to record load error event");
    }

    Json(OkResponse { ok: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidy_drops_blank_tags() {
        let event = tidy(NewEvent {
            slug: Some("  ".to_string()),
            campaign: Some("spring".to_string()),
            meta: Some(Value::Null),
            ..NewEvent::named(" projection_page_view ")
        });
        assert_eq!(event.event, "projection_page_view");
        assert!(event.slug.is_none());
        assert_eq!(event.campaign.as_deref(), Some("spring"));
        assert!(event.meta.is_none());
    }
}

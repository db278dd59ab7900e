use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use lvr_core::model::activity::{EVENT_LINK_CLICK, NewEvent};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use super::error::blocking;
use super::events::tidy;

/// Query string of a tracked email link.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClickQuery {
    lid: Option<String>,
    slug: Option<String>,
    ae: Option<String>,
    campaign: Option<String>,
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Record the click and redirect to the projection page.
///
/// Never fails: an unknown or missing slug lands on the site root, and a
/// failed event write only gets logged.
#[tracing::instrument(skip(state))]
pub async fn click(State(state): State<AppState>, Query(query): Query<ClickQuery>) -> Response {
    let blank = |v: Option<String>| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let lead_id = blank(query.lid);
    let campaign = blank(query.campaign);
    let Some(slug) = blank(query.slug) else {
        return found(state.urls.home());
    };

    let lookup = slug.clone();
    let stored = blocking(&state.store, move |store| store.get_projection(&lookup))
        .await
        .unwrap_or_else(|error| {
            tracing::warn!(%error, slug = %slug, "projection lookup failed for tracked click");
            None
        });

    let owner_slug = blank(query.ae).or_else(|| stored.as_ref().map(|s| s.owner_slug.clone()));
    let event = tidy(NewEvent {
        slug: Some(slug.clone()),
        owner_slug,
        lead_id: lead_id.clone(),
        campaign: campaign.clone(),
        source: Some("email".to_string()),
        ..NewEvent::named(EVENT_LINK_CLICK)
    });
    match blocking(&state.store, move |store| store.append_event(&event)).await {
        Ok(event_id) => tracing::info!(event_id, slug = %slug, "tracked link click"),
        Err(error) => tracing::error!(%error, slug = %slug, "failed to record link click"),
    }

    if let Some(lead_id) = lead_id.clone() {
        let crm = Arc::clone(&state.crm);
        let slug = slug.clone();
        state.tasks.spawn("crm.click_task", async move {
            crm.create_click_task(&lead_id, &slug).await
        });
    }

    let Some(stored) = stored else {
        tracing::warn!(slug = %slug, "tracked link for unknown projection");
        return found(state.urls.home());
    };
    found(state.urls.click_through_url(
        &stored.owner_slug,
        &stored.slug,
        lead_id.as_deref(),
        campaign.as_deref(),
    ))
}

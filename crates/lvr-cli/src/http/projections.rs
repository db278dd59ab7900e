use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use lvr_core::model::activity::{NewRun, RunAction};
use lvr_core::model::record::ProjectionRecord;
use lvr_core::normalize::normalize_value;
use lvr_core::ErrorCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::AppState;
use super::error::{ApiError, blocking};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    ok: bool,
    slug: String,
    owner_slug: String,
    action: RunAction,
    public_url: String,
    preview_url: String,
    tracking_url: String,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    ok: bool,
    data: ProjectionRecord,
}

/// Normalize, store, audit, then queue the CRM lead update.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreateResponse>, ApiError> {
    let message = ErrorCode::ValidationFailed.message();
    let Json(payload) = payload.map_err(|rejection| ApiError::from_rejection(message, &rejection))?;

    let submission = normalize_value(payload, &state.markets).map_err(|errors| {
        tracing::warn!(%errors, "rejected projection payload");
        ApiError::invalid(message, errors)
    })?;

    let record = submission.record;
    let slug = record.meta.slug.clone();
    let owner_slug = submission.owner_slug;

    let estimates = &record.projections;
    if !estimates.is_ordered() {
        tracing::warn!(
            slug = %slug,
            low = estimates.low_revenue,
            expected = estimates.expected_revenue,
            high = estimates.high_revenue,
            "revenue estimates are not in low <= expected <= high order"
        );
    }

    let public_url = state.urls.public_url(&owner_slug, &slug);
    let preview_url = state.urls.preview_url(&owner_slug, &slug);
    let tracking_url = state
        .urls
        .tracking_url(&record.meta.lead_id, &slug, &owner_slug);

    let mut run = NewRun {
        slug: slug.clone(),
        owner_slug: owner_slug.clone(),
        actor_name: submission.run.actor_name,
        actor_email: submission.run.actor_email,
        lead_id: Some(record.meta.lead_id.clone()),
        internal_id: Some(record.property.internal_id.clone()).filter(|id| !id.is_empty()),
        owner_name: Some(record.meta.homeowner_full_name.clone()),
        address: Some(record.property.address.clone()),
        city: Some(record.property.city.clone()).filter(|c| !c.is_empty()),
        state: Some(record.property.state.clone()).filter(|s| !s.is_empty()),
        market: Some(record.property.market.clone()),
        public_url: Some(public_url.clone()),
        preview_url: Some(preview_url.clone()),
        sheet_url: submission.run.sheet_url,
        action: RunAction::Create,
    };
    let lead_id = record.meta.lead_id.clone();

    let owner = owner_slug.clone();
    let (_, outcome) =
        blocking(&state.store, move |store| store.put_projection(&owner, &record)).await?;
    let action = outcome.run_action();
    run.action = action;

    // The projection is already stored; a missing audit row must not fail the request.
    if let Err(error) = blocking(&state.store, move |store| store.append_run(&run)).await {
        tracing::warn!(slug = %slug, %error, "failed to record projection run");
    }

    let crm = Arc::clone(&state.crm);
    let crm_tracking_url = tracking_url.clone();
    state.tasks.spawn("crm.update_lead", async move {
        crm.update_lead_projection_url(&lead_id, &crm_tracking_url)
            .await
    });

    tracing::info!(slug = %slug, owner_slug = %owner_slug, %action, "stored projection");

    Ok(Json(CreateResponse {
        ok: true,
        slug,
        owner_slug,
        action,
        public_url,
        preview_url,
        tracking_url,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RecordResponse>, ApiError> {
    let stored = blocking(&state.store, move |store| store.get_projection(&slug))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(RecordResponse {
        ok: true,
        data: stored.data,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn get_by_owner_and_slug(
    State(state): State<AppState>,
    Path((owner_slug, slug)): Path<(String, String)>,
) -> Result<Json<RecordResponse>, ApiError> {
    let stored = blocking(&state.store, move |store| {
        store.get_owned_projection(&owner_slug, &slug)
    })
    .await?
    .ok_or(ApiError::NotFound)?;
    Ok(Json(RecordResponse {
        ok: true,
        data: stored.data,
    }))
}

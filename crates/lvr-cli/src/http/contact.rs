use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use lvr_core::StoredProjection;
use lvr_core::model::activity::{EVENT_FORM_SUBMIT, NewEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::AppState;
use super::error::{ApiError, blocking};
use super::events::tidy;
use crate::notify::mail::{ContactNotice, contact_email};
use crate::validate;

const INVALID_FORM: &str = "Invalid form data";

/// Homeowner contact form posted from a projection page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default, alias = "aeId", alias = "aeSlug")]
    owner_slug: Option<String>,
    #[serde(default, alias = "lid")]
    lead_id: Option<String>,
    #[serde(default)]
    campaign: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    ok: bool,
    message: &'static str,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Log the submission, then notify the agent and the CRM in the background.
///
/// The response only depends on the event being recorded.
#[tracing::instrument(skip(state, payload))]
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
    let Json(form) =
        payload.map_err(|rejection| ApiError::from_rejection(INVALID_FORM, &rejection))?;

    validate::collect([
        validate::validate_name(&form.name),
        validate::validate_email(&form.email),
        validate::validate_message(form.message.as_deref().unwrap_or_default()),
    ])
    .map_err(|errors| ApiError::invalid(INVALID_FORM, errors))?;

    let name = form.name.trim().to_string();
    let email = form.email.trim().to_string();
    let phone = non_blank(form.phone.as_ref());
    let message = non_blank(form.message.as_ref());
    let slug = non_blank(form.slug.as_ref());

    let event = tidy(NewEvent {
        slug: slug.clone(),
        owner_slug: form.owner_slug.clone(),
        lead_id: form.lead_id.clone(),
        campaign: form.campaign.clone(),
        meta: Some(json!({ "name": name, "email": email, "phone": phone })),
        ..NewEvent::named(EVENT_FORM_SUBMIT)
    });
    let event_id = blocking(&state.store, move |store| store.append_event(&event)).await?;
    tracing::info!(event_id, slug = slug.as_deref(), "contact form submitted");

    let stored = match slug.clone() {
        Some(slug) => blocking(&state.store, move |store| store.get_projection(&slug))
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "could not load projection for contact notification");
                None
            }),
        None => None,
    };

    let lead_id = non_blank(form.lead_id.as_ref())
        .or_else(|| stored.as_ref().and_then(|s| non_blank(Some(&s.data.meta.lead_id))));
    // Mail only ever goes to the agent on the stored record.
    let agent_email = stored
        .as_ref()
        .and_then(|s| non_blank(Some(&s.data.cta.ae_email)));

    match (&agent_email, &stored) {
        (Some(to), Some(stored)) => {
            let notice = ContactNotice {
                homeowner_name: name,
                homeowner_email: email,
                homeowner_phone: phone,
                message: message.clone(),
                lead_id: lead_id.clone(),
                ..notice_for(&state, stored)
            };
            let email = contact_email(&state.mail_from, to, &notice);
            let mailer = Arc::clone(&state.mailer);
            state
                .tasks
                .spawn("mail.contact", async move { mailer.send(&email).await });
        }
        _ => tracing::warn!(
            slug = slug.as_deref(),
            has_agent_email = agent_email.is_some(),
            "no projection or agent email for contact form, skipping agent email"
        ),
    }

    if let (Some(lead_id), Some(slug)) = (lead_id, slug) {
        let crm = Arc::clone(&state.crm);
        state.tasks.spawn("crm.form_task", async move {
            crm.create_form_task(&lead_id, &slug, message.as_deref()).await
        });
    }

    Ok(Json(ContactResponse {
        ok: true,
        message: "Form submitted successfully. The account executive will be notified.",
    }))
}

/// Property and revenue half of the notice; homeowner fields left blank.
fn notice_for(state: &AppState, stored: &StoredProjection) -> ContactNotice {
    let record = &stored.data;
    ContactNotice {
        homeowner_name: String::new(),
        homeowner_email: String::new(),
        homeowner_phone: None,
        message: None,
        lead_id: None,
        property_address: record.property.address.clone(),
        property_city: record.property.city.clone(),
        property_market: Some(record.property.market.clone()).filter(|m| !m.is_empty()),
        low_revenue: record.projections.low_revenue,
        expected_revenue: record.projections.expected_revenue,
        high_revenue: record.projections.high_revenue,
        page_url: state.urls.public_url(&stored.owner_slug, &stored.slug),
    }
}

//! CRM lead updates and follow-up tasks.
//!
//! [`SalesforceClient`] owns its OAuth token. The token is fetched with the
//! client-credentials grant on first use, cached for a fixed window and
//! refreshed lazily once that window has passed.

use async_trait::async_trait;
use chrono::Utc;
use lvr_core::config::SalesforceConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// How long a fetched access token is reused before a refresh.
pub const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("CRM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CRM returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("lead {0} not found in CRM")]
    LeadNotFound(String),
}

/// Lead fields needed to assign follow-up tasks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeadInfo {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "OwnerId")]
    pub owner_id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
}

/// A follow-up task assigned to the lead owner, due today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FollowUpTask {
    pub who_id: String,
    pub subject: String,
    pub description: String,
    pub activity_date: String,
    pub status: String,
    pub owner_id: String,
}

impl FollowUpTask {
    #[must_use]
    pub fn for_lead(lead: &LeadInfo, subject: &str, description: String) -> Self {
        Self {
            who_id: lead.id.clone(),
            subject: subject.to_string(),
            description,
            activity_date: Utc::now().format("%Y-%m-%d").to_string(),
            status: "Not Started".to_string(),
            owner_id: lead.owner_id.clone(),
        }
    }
}

#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Write the projection tracking URL onto the lead.
    async fn update_lead_projection_url(
        &self,
        lead_id: &str,
        tracking_url: &str,
    ) -> Result<(), CrmError>;

    /// Fetch the lead, or `None` if the CRM does not know it.
    async fn lead_owner(&self, lead_id: &str) -> Result<Option<LeadInfo>, CrmError>;

    /// Create a task and return its id.
    async fn create_task(&self, task: &FollowUpTask) -> Result<String, CrmError>;

    /// Follow-up for a tracked projection link click.
    async fn create_click_task(&self, lead_id: &str, slug: &str) -> Result<(), CrmError> {
        let lead = self
            .lead_owner(lead_id)
            .await?
            .ok_or_else(|| CrmError::LeadNotFound(lead_id.to_string()))?;
        let task = FollowUpTask::for_lead(
            &lead,
            "Projection link clicked - follow up",
            format!("Lead clicked projection link for slug {slug}."),
        );
        self.create_task(&task).await.map(|_| ())
    }

    /// Follow-up for a contact-form submission.
    async fn create_form_task(
        &self,
        lead_id: &str,
        slug: &str,
        message: Option<&str>,
    ) -> Result<(), CrmError> {
        let lead = self
            .lead_owner(lead_id)
            .await?
            .ok_or_else(|| CrmError::LeadNotFound(lead_id.to_string()))?;
        let description = message.map_or_else(
            || format!("Homeowner submitted the projection page form for slug {slug}."),
            |message| {
                format!(
                    "Homeowner submitted the projection page form for slug {slug}. Message: {message}"
                )
            },
        );
        let task = FollowUpTask::for_lead(&lead, "Projection landing page form submitted", description);
        self.create_task(&task).await.map(|_| ())
    }
}

/// Used when CRM credentials are not configured. Every call succeeds and
/// does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCrm;

#[async_trait]
impl CrmClient for DisabledCrm {
    async fn update_lead_projection_url(&self, lead_id: &str, _: &str) -> Result<(), CrmError> {
        tracing::debug!(lead_id, "CRM not configured, skipping lead update");
        Ok(())
    }

    async fn lead_owner(&self, _: &str) -> Result<Option<LeadInfo>, CrmError> {
        Ok(None)
    }

    async fn create_task(&self, task: &FollowUpTask) -> Result<String, CrmError> {
        tracing::debug!(subject = %task.subject, "CRM not configured, skipping task");
        Ok(String::new())
    }

    async fn create_click_task(&self, lead_id: &str, _: &str) -> Result<(), CrmError> {
        tracing::debug!(lead_id, "CRM not configured, skipping click task");
        Ok(())
    }

    async fn create_form_task(&self, lead_id: &str, _: &str, _: Option<&str>) -> Result<(), CrmError> {
        tracing::debug!(lead_id, "CRM not configured, skipping form task");
        Ok(())
    }
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

/// Salesforce REST client.
#[derive(Debug)]
pub struct SalesforceClient {
    http: reqwest::Client,
    instance_url: Url,
    token_url: String,
    client_id: String,
    client_secret: String,
    api_version: String,
    lead_url_field: String,
    token_ttl: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl SalesforceClient {
    /// Build a client from config, or `None` when credentials are missing or
    /// the instance URL is unusable.
    #[must_use]
    pub fn from_config(config: &SalesforceConfig, http: reqwest::Client) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let raw = config.instance_url.as_deref()?.trim_end_matches('/');
        let instance_url = match Url::parse(raw) {
            Ok(url) if !url.cannot_be_a_base() => url,
            Ok(_) => {
                tracing::warn!(instance_url = raw, "Salesforce instance URL cannot carry a path");
                return None;
            }
            Err(error) => {
                tracing::warn!(instance_url = raw, %error, "invalid Salesforce instance URL");
                return None;
            }
        };
        let token_url = config
            .token_url
            .clone()
            .unwrap_or_else(|| format!("{raw}/services/oauth2/token"));
        Some(Self {
            http,
            token_url,
            client_id: config.client_id.clone()?,
            client_secret: config.client_secret.clone()?,
            api_version: config.api_version.clone(),
            lead_url_field: config.lead_url_field.clone(),
            token_ttl: TOKEN_TTL,
            token: Mutex::new(None),
            instance_url,
        })
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// `{instance}/services/data/{version}/sobjects/{segments...}`.
    ///
    /// Each segment is percent-encoded as one path segment, so a record id
    /// can never address a different sobject.
    fn sobject_url(&self, segments: &[&str]) -> Url {
        let mut url = self.instance_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["services", "data", self.api_version.as_str(), "sobjects"])
                .extend(segments);
        }
        url
    }

    /// Cached access token, fetching a new one if the cache is empty or
    /// expired. The lock is held across the fetch so concurrent callers share
    /// one refresh.
    async fn access_token(&self) -> Result<String, CrmError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.access_token.clone());
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        let response = check(response).await?;
        let token: TokenResponse = response.json().await?;
        tracing::debug!("refreshed CRM access token");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + self.token_ttl,
        });
        Ok(token.access_token)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, CrmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CrmError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CrmClient for SalesforceClient {
    #[tracing::instrument(skip(self, tracking_url))]
    async fn update_lead_projection_url(
        &self,
        lead_id: &str,
        tracking_url: &str,
    ) -> Result<(), CrmError> {
        let token = self.access_token().await?;
        let mut body = serde_json::Map::new();
        body.insert(self.lead_url_field.clone(), tracking_url.into());

        let response = self
            .http
            .patch(self.sobject_url(&["Lead", lead_id]))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        tracing::info!(lead_id, field = %self.lead_url_field, "updated lead projection URL");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn lead_owner(&self, lead_id: &str) -> Result<Option<LeadInfo>, CrmError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(self.sobject_url(&["Lead", lead_id]))
            .query(&[("fields", "Id,OwnerId,Name,Email")])
            .bearer_auth(token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let lead = check(response).await?.json::<LeadInfo>().await?;
        Ok(Some(lead))
    }

    #[tracing::instrument(skip(self, task), fields(who_id = %task.who_id))]
    async fn create_task(&self, task: &FollowUpTask) -> Result<String, CrmError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.sobject_url(&["Task"]))
            .bearer_auth(token)
            .json(task)
            .send()
            .await?;
        let created: CreatedResponse = check(response).await?.json().await?;
        tracing::info!(task_id = %created.id, subject = %task.subject, "created CRM task");
        Ok(created.id)
    }
}

//! Agent email for contact-form submissions.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Write as _;

/// One outbound email, in the JSON shape the mail relay accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Mailer used when no relay is configured: logs what would have been sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let preview: String = message.text.chars().take(200).collect();
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            preview = %preview,
            "mail relay not configured, logging email instead"
        );
        Ok(())
    }
}

/// Posts messages as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct RelayMailer {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl RelayMailer {
    #[must_use]
    pub const fn new(http: reqwest::Client, url: String, token: Option<String>) -> Self {
        Self { http, url, token }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    #[tracing::instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut request = self.http.post(&self.url).json(message);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(subject = %message.subject, "sent email");
        Ok(())
    }
}

/// Everything the agent needs to follow up on a contact-form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactNotice {
    pub homeowner_name: String,
    pub homeowner_email: String,
    pub homeowner_phone: Option<String>,
    pub message: Option<String>,
    pub lead_id: Option<String>,
    pub property_address: String,
    pub property_city: String,
    pub property_market: Option<String>,
    pub low_revenue: f64,
    pub expected_revenue: f64,
    pub high_revenue: f64,
    pub page_url: String,
}

/// Build the agent notification for a contact-form submission.
///
/// Replies go to the homeowner.
#[must_use]
pub fn contact_email(from: &str, to: &str, notice: &ContactNotice) -> EmailMessage {
    let location = notice.property_market.as_deref().map_or_else(
        || notice.property_city.clone(),
        |market| format!("{}, {market}", notice.property_city),
    );
    let low = format_usd(notice.low_revenue);
    let expected = format_usd(notice.expected_revenue);
    let high = format_usd(notice.high_revenue);

    let mut text = String::new();
    let _ = writeln!(text, "New Form Submission from Projection Page\n");
    let _ = writeln!(text, "Contact Information:");
    let _ = writeln!(text, "- Name: {}", notice.homeowner_name);
    let _ = writeln!(text, "- Email: {}", notice.homeowner_email);
    if let Some(phone) = &notice.homeowner_phone {
        let _ = writeln!(text, "- Phone: {phone}");
    }
    if let Some(lead_id) = &notice.lead_id {
        let _ = writeln!(text, "- Salesforce Lead ID: {lead_id}");
    }
    let _ = writeln!(text, "\nProperty Details:");
    let _ = writeln!(text, "- Address: {}", notice.property_address);
    let _ = writeln!(text, "- Market: {location}");
    let _ = writeln!(text, "\nRevenue Projection:");
    let _ = writeln!(text, "- Conservative: {low}");
    let _ = writeln!(text, "- Expected: {expected}");
    let _ = writeln!(text, "- Optimistic: {high}");
    if let Some(message) = &notice.message {
        let _ = writeln!(text, "\nMessage from Homeowner:\n{message}");
    }
    let _ = write!(text, "\nView Projection Page: {}", notice.page_url);

    let mut html = String::from(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\n\
         <h2>New Form Submission from Projection Page</h2>\n",
    );
    let _ = writeln!(html, "<h3>Contact Information</h3>");
    let _ = writeln!(html, "<p><strong>Name:</strong> {}</p>", escape_html(&notice.homeowner_name));
    let email = escape_html(&notice.homeowner_email);
    let _ = writeln!(
        html,
        "<p><strong>Email:</strong> <a href=\"mailto:{email}\">{email}</a></p>"
    );
    if let Some(phone) = &notice.homeowner_phone {
        let phone = escape_html(phone);
        let _ = writeln!(
            html,
            "<p><strong>Phone:</strong> <a href=\"tel:{phone}\">{phone}</a></p>"
        );
    }
    if let Some(lead_id) = &notice.lead_id {
        let _ = writeln!(
            html,
            "<p><strong>Salesforce Lead ID:</strong> {}</p>",
            escape_html(lead_id)
        );
    }
    let _ = writeln!(html, "<h3>Property Details</h3>");
    let _ = writeln!(
        html,
        "<p><strong>Address:</strong> {}</p>",
        escape_html(&notice.property_address)
    );
    let _ = writeln!(html, "<p><strong>Market:</strong> {}</p>", escape_html(&location));
    let _ = writeln!(html, "<h3>Revenue Projection</h3>\n<table style=\"width: 100%;\">");
    for (label, amount) in [("Conservative", &low), ("Expected", &expected), ("Optimistic", &high)] {
        let _ = writeln!(
            html,
            "<tr><td><strong>{label}:</strong></td><td style=\"text-align: right;\">{amount}</td></tr>"
        );
    }
    let _ = writeln!(html, "</table>");
    if let Some(message) = &notice.message {
        let _ = writeln!(
            html,
            "<h3>Message from Homeowner</h3>\n<p style=\"white-space: pre-wrap;\">{}</p>",
            escape_html(message)
        );
    }
    let _ = writeln!(
        html,
        "<p><a href=\"{}\">View Projection Page</a></p>\n</div>",
        escape_html(&notice.page_url)
    );

    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        reply_to: Some(notice.homeowner_email.clone()),
        subject: format!(
            "New Projection Page Form Submission - {}",
            notice.property_address
        ),
        html,
        text,
    }
}

/// Whole US dollars with thousands separators: `1234567.6` → `$1,234,568`.
#[must_use]
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0".to_string();
    }
    let rounded = amount.abs().round();
    let digits = format!("{rounded:.0}");

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0.0 && rounded > 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

//! Field checks for browser-submitted forms.

use lvr_core::normalize::{FieldError, ValidationErrors};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_MESSAGE_LEN: usize = 5000;

pub fn validate_name(s: &str) -> Result<(), FieldError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new("name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(FieldError::new(
            "name",
            format!("must be <= {MAX_NAME_LEN} characters"),
        ));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(FieldError::new("name", "must not contain control characters"));
    }
    Ok(())
}

/// Shape check only: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(s: &str) -> Result<(), FieldError> {
    let invalid = || FieldError::new("email", "must be a valid email address");
    let s = s.trim();
    if s.is_empty() || s.len() > MAX_EMAIL_LEN || s.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = s.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_message(s: &str) -> Result<(), FieldError> {
    if s.chars().count() > MAX_MESSAGE_LEN {
        return Err(FieldError::new(
            "message",
            format!("must be <= {MAX_MESSAGE_LEN} characters"),
        ));
    }
    Ok(())
}

/// Run every check and collect the failures.
pub fn collect(checks: impl IntoIterator<Item = Result<(), FieldError>>) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = checks.into_iter().filter_map(Result::err).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

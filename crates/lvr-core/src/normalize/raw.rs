//! Raw inbound payload and the field-precedence table.
//!
//! Producers (spreadsheet macros, scripts, people) send projection payloads
//! in several historical shapes. Rather than a struct per shape, the raw input
//! is kept as a JSON object and every canonical field names the ordered list
//! of input paths it may be read from. The first path holding a present value
//! wins. `null` and blank strings count as absent.

use serde_json::{Map, Value};

use super::error::ValidationErrors;

/// Ordered input paths for one canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Canonical field path, used in error messages when nothing was supplied.
    pub field: &'static str,
    /// Dotted input paths, highest precedence first.
    pub sources: &'static [&'static str],
}

macro_rules! rule {
    ($name:ident, $field:literal, [$($src:literal),+ $(,)?]) => {
        pub const $name: FieldRule = FieldRule {
            field: $field,
            sources: &[$($src),+],
        };
    };
}

rule!(SLUG, "meta.slug", ["meta.slug", "slug"]);
rule!(LEAD_ID, "meta.leadId", ["meta.leadId", "leadId", "lid"]);
rule!(FIRST_NAME, "meta.homeownerFirstName", ["meta.homeownerFirstName", "homeownerFirstName"]);
rule!(FULL_NAME, "meta.homeownerFullName", ["meta.homeownerFullName", "homeownerFullName"]);

rule!(INTERNAL_ID, "property.internalId", ["property.internalId", "internalId"]);
rule!(ADDRESS, "property.address", ["property.address", "address"]);
rule!(BEDROOMS, "property.bedrooms", ["property.bedrooms", "bedrooms"]);
rule!(BATHROOMS, "property.bathrooms", ["property.bathrooms", "bathrooms"]);
rule!(SQUARE_FEET, "property.squareFeet", ["property.squareFeet", "squareFeet"]);
rule!(CITY, "property.city", ["property.city", "city"]);
rule!(STATE, "property.state", ["property.state", "state"]);
rule!(MARKET, "property.market", ["property.market", "market"]);
rule!(IS_LUXE, "property.isLuxe", ["property.isLuxe", "isLuxe"]);

rule!(LOW_REVENUE, "projections.lowRevenue", [
    "projections.lowRevenue",
    "lowRevenue",
    "projections.lowAnnualRevenue",
    "lowAnnualRevenue",
]);
rule!(EXPECTED_REVENUE, "projections.expectedRevenue", [
    "projections.expectedRevenue",
    "expectedRevenue",
    "projections.expectedAnnualRevenue",
    "expectedAnnualRevenue",
]);
rule!(HIGH_REVENUE, "projections.highRevenue", [
    "projections.highRevenue",
    "highRevenue",
    "projections.highAnnualRevenue",
    "highAnnualRevenue",
]);
rule!(DISCLAIMER, "projections.disclaimer", ["projections.disclaimer"]);

rule!(MONTHLY_REVENUE, "monthlyRevenue", ["monthlyRevenue"]);
rule!(SEASONAL_BREAKDOWN, "seasonalBreakdown", ["seasonalBreakdown", "seasonality.seasons"]);

rule!(SCHEDULE_CALL_URL, "cta.scheduleCallUrl", ["cta.scheduleCallUrl", "cta.calendlyUrl"]);
rule!(AE_NAME, "cta.aeName", ["cta.aeName"]);
rule!(AE_TITLE, "cta.aeTitle", ["cta.aeTitle"]);
rule!(AE_PHONE, "cta.aePhone", ["cta.aePhone"]);
rule!(AE_EMAIL, "cta.aeEmail", ["cta.aeEmail"]);
rule!(AE_HEADSHOT_URL, "cta.aeHeadshotUrl", ["cta.aeHeadshotUrl"]);

rule!(TRUST, "trust", ["trust"]);
rule!(TESTIMONIALS, "testimonials", ["testimonials"]);
rule!(BENEFITS, "benefits", ["benefits"]);
rule!(COMPARABLE_PROPERTIES, "comparableProperties", ["comparableProperties"]);
rule!(AI_NARRATIVE, "aiNarrativePlaceholders", ["aiNarrativePlaceholders"]);

rule!(OWNER_SLUG, "ownerSlug", ["ownerSlug", "aeSlug", "cta.aeSlug"]);
rule!(ACTOR_NAME, "run.actorName", ["run.actorName"]);
rule!(ACTOR_EMAIL, "run.actorEmail", ["run.actorEmail"]);
rule!(SHEET_URL, "run.sheetUrl", ["run.sheetUrl", "run.gsheetUrl", "sheetUrl", "gsheetUrl"]);

/// A projection payload as received, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProjectionInput {
    root: Map<String, Value>,
}

impl RawProjectionInput {
    /// Wrap a JSON value. Only objects are accepted.
    ///
    /// # Errors
    ///
    /// Returns a single `$` field error when `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ValidationErrors> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(ValidationErrors::single(
                "$",
                format!("payload must be a JSON object, got {}", json_kind(&other)),
            )),
        }
    }

    /// First present value for `rule`, with the input path it came from.
    #[must_use]
    pub fn resolve(&self, rule: &FieldRule) -> Option<(&'static str, &Value)> {
        rule.sources
            .iter()
            .find_map(|path| self.get_path(path).map(|value| (*path, value)))
    }

    fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        is_present(current).then_some(current)
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

pub(super) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

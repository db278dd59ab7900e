//! Raw payload → canonical [`ProjectionRecord`].
//!
//! [`normalize`] is pure: it reads the payload and the market catalog and
//! returns either a complete record or every validation failure it found.
//! It never returns a partially-filled record.
//!
//! Supplementary bundles (`trust`, `testimonials`, `benefits`,
//! `comparableProperties`, `aiNarrativePlaceholders`) are all-or-nothing: a
//! supplied bundle is used as-is, a missing one is replaced by the market
//! bundle. `cta` is the exception and merges field by field over the market
//! CTA.

pub mod error;
pub mod raw;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::market::MarketCatalog;
use crate::model::record::{
    CtaInfo, MONTHS_PER_YEAR, MonthlyRevenue, ProjectionEstimates, ProjectionMeta,
    ProjectionRecord, PropertyInfo, SeasonalBreakdownItem, market_code_from_internal_id,
};
use crate::slug::slugify;

pub use error::{FieldError, ValidationErrors};
pub use raw::{FieldRule, RawProjectionInput};

use raw::json_kind;

/// Audit context carried next to the record; never stored in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    pub actor_name: Option<String>,
    pub actor_email: Option<String>,
    pub sheet_url: Option<String>,
}

/// Output of a successful normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSubmission {
    pub record: ProjectionRecord,
    pub owner_slug: String,
    pub run: RunContext,
}

impl NormalizedSubmission {
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.record.meta.slug
    }
}

/// Normalize a JSON payload.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing every failed field when the payload
/// is not an object or misses/mistypes required data.
pub fn normalize_value(
    payload: Value,
    markets: &MarketCatalog,
) -> Result<NormalizedSubmission, ValidationErrors> {
    let raw = RawProjectionInput::from_value(payload)?;
    normalize(&raw, markets)
}

/// Normalize a raw payload into a canonical record plus owner slug.
///
/// # Errors
///
/// Returns [`ValidationErrors`] listing every failed field.
pub fn normalize(
    raw: &RawProjectionInput,
    markets: &MarketCatalog,
) -> Result<NormalizedSubmission, ValidationErrors> {
    let mut cx = Collector::new(raw);

    // property first: the slug and the market bundle both depend on it
    let internal_id = cx.string(&raw::INTERNAL_ID).unwrap_or_default();
    let address = cx.required_string(&raw::ADDRESS);
    let bedrooms = cx.required_number(&raw::BEDROOMS);
    let bathrooms = cx.required_number(&raw::BATHROOMS);
    let square_feet = cx.number(&raw::SQUARE_FEET);
    let city = cx.string(&raw::CITY).unwrap_or_default();
    let state = cx.string(&raw::STATE).unwrap_or_default();
    let market_name = cx.string(&raw::MARKET);
    let is_luxe = cx.boolean(&raw::IS_LUXE).unwrap_or(false);

    let bundle = markets.bundle(market_code_from_internal_id(&internal_id));

    let slug = match cx.string(&raw::SLUG) {
        Some(supplied) => {
            let slug = slugify(&supplied);
            if slug.is_empty() {
                cx.fail(raw::SLUG.field, "must contain at least one letter or digit");
            }
            Some(slug)
        }
        None => match &address {
            Some(address) => {
                let slug = slugify(address);
                if slug.is_empty() {
                    cx.fail(
                        raw::SLUG.field,
                        "could not be derived from property.address",
                    );
                }
                Some(slug)
            }
            None => {
                cx.fail(raw::SLUG.field, "is required when property.address is absent");
                None
            }
        },
    };

    let lead_id = cx.required_string(&raw::LEAD_ID);
    let first_name = cx.required_string(&raw::FIRST_NAME);
    let full_name = cx.required_string(&raw::FULL_NAME);

    let projections = ProjectionEstimates {
        expected_revenue: cx.number(&raw::EXPECTED_REVENUE).unwrap_or(0.0),
        high_revenue: cx.number(&raw::HIGH_REVENUE).unwrap_or(0.0),
        low_revenue: cx.number(&raw::LOW_REVENUE).unwrap_or(0.0),
        disclaimer: cx
            .string(&raw::DISCLAIMER)
            .unwrap_or_else(|| bundle.projection_disclaimer.clone()),
    };

    let monthly_revenue = cx.monthly_revenue();
    let seasonal_breakdown = cx.seasonal_breakdown();

    let ae_name = cx.required_string(&raw::AE_NAME);
    let ae_title = cx.required_string(&raw::AE_TITLE);
    let ae_phone = cx.required_string(&raw::AE_PHONE);
    let ae_email = cx.required_string(&raw::AE_EMAIL);
    let schedule_call_url = cx
        .string(&raw::SCHEDULE_CALL_URL)
        .unwrap_or_else(|| bundle.cta.schedule_call_url.clone());
    let ae_headshot_url = cx
        .string(&raw::AE_HEADSHOT_URL)
        .or_else(|| bundle.cta.ae_headshot_url.clone());

    let trust = cx.bundle(&raw::TRUST).unwrap_or_else(|| bundle.trust.clone());
    let testimonials = cx
        .bundle(&raw::TESTIMONIALS)
        .unwrap_or_else(|| bundle.testimonials.clone());
    let benefits = cx
        .bundle(&raw::BENEFITS)
        .unwrap_or_else(|| bundle.benefits.clone());
    let comparable_properties = cx
        .bundle(&raw::COMPARABLE_PROPERTIES)
        .unwrap_or_else(|| bundle.comparable_properties.clone());
    let ai_narrative_placeholders = cx
        .bundle(&raw::AI_NARRATIVE)
        .unwrap_or_else(|| bundle.ai_narrative_placeholders.clone());

    let owner_slug = match cx.string(&raw::OWNER_SLUG) {
        Some(supplied) => {
            let owner = slugify(&supplied);
            if owner.is_empty() {
                cx.fail(raw::OWNER_SLUG.field, "must contain at least one letter or digit");
            }
            Some(owner)
        }
        None => ae_name.as_deref().map(slugify).inspect(|owner| {
            if owner.is_empty() {
                cx.fail(raw::OWNER_SLUG.field, "could not be derived from cta.aeName");
            }
        }),
    };

    let run = RunContext {
        actor_name: cx.string(&raw::ACTOR_NAME).or_else(|| ae_name.clone()),
        actor_email: cx.string(&raw::ACTOR_EMAIL).or_else(|| ae_email.clone()),
        sheet_url: cx.string(&raw::SHEET_URL),
    };

    let errors = cx.finish();
    if !errors.is_empty() {
        return Err(ValidationErrors { errors });
    }

    // every `None` below pushed an error above, so reaching here means all set
    let (
        Some(slug),
        Some(lead_id),
        Some(homeowner_first_name),
        Some(homeowner_full_name),
        Some(address),
        Some(bedrooms),
        Some(bathrooms),
        Some(monthly_revenue),
        Some(ae_name),
        Some(ae_title),
        Some(ae_phone),
        Some(ae_email),
        Some(owner_slug),
    ) = (
        slug,
        lead_id,
        first_name,
        full_name,
        address,
        bedrooms,
        bathrooms,
        monthly_revenue,
        ae_name,
        ae_title,
        ae_phone,
        ae_email,
        owner_slug,
    )
    else {
        return Err(ValidationErrors::single("$", "incomplete payload"));
    };

    let record = ProjectionRecord {
        meta: ProjectionMeta {
            slug,
            lead_id,
            homeowner_first_name,
            homeowner_full_name,
        },
        property: PropertyInfo {
            internal_id,
            address,
            bedrooms,
            bathrooms,
            square_feet,
            city,
            state,
            market: market_name.unwrap_or_else(|| bundle.display_name.clone()),
            is_luxe,
        },
        projections,
        monthly_revenue,
        seasonal_breakdown,
        ai_narrative_placeholders,
        trust,
        cta: CtaInfo {
            schedule_call_url,
            ae_name,
            ae_title,
            ae_phone,
            ae_email,
            ae_headshot_url,
        },
        testimonials,
        benefits,
        comparable_properties,
    };

    Ok(NormalizedSubmission {
        record,
        owner_slug,
        run,
    })
}

/// Typed field extraction that records failures instead of stopping.
struct Collector<'a> {
    raw: &'a RawProjectionInput,
    errors: Vec<FieldError>,
}

impl<'a> Collector<'a> {
    const fn new(raw: &'a RawProjectionInput) -> Self {
        Self {
            raw,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(FieldError::new(field, reason));
    }

    fn finish(self) -> Vec<FieldError> {
        self.errors
    }

    fn string(&mut self, rule: &FieldRule) -> Option<String> {
        let (path, value) = self.raw.resolve(rule)?;
        if let Value::String(s) = value {
            Some(s.clone())
        } else {
            self.fail(path, format!("expected a string, got {}", json_kind(value)));
            None
        }
    }

    fn required_string(&mut self, rule: &FieldRule) -> Option<String> {
        if self.raw.resolve(rule).is_none() {
            self.fail(rule.field, "is required");
            return None;
        }
        self.string(rule)
    }

    fn number(&mut self, rule: &FieldRule) -> Option<f64> {
        let (path, value) = self.raw.resolve(rule)?;
        self.non_negative(path, value)
    }

    fn required_number(&mut self, rule: &FieldRule) -> Option<f64> {
        if self.raw.resolve(rule).is_none() {
            self.fail(rule.field, "is required");
            return None;
        }
        self.number(rule)
    }

    fn non_negative(&mut self, path: &str, value: &Value) -> Option<f64> {
        match value.as_f64() {
            Some(n) if n.is_finite() && n >= 0.0 => Some(n),
            Some(_) => {
                self.fail(path, "must be a non-negative number");
                None
            }
            None => {
                self.fail(path, format!("expected a number, got {}", json_kind(value)));
                None
            }
        }
    }

    fn boolean(&mut self, rule: &FieldRule) -> Option<bool> {
        let (path, value) = self.raw.resolve(rule)?;
        if let Value::Bool(b) = value {
            Some(*b)
        } else {
            self.fail(path, format!("expected a boolean, got {}", json_kind(value)));
            None
        }
    }

    fn bundle<T: DeserializeOwned>(&mut self, rule: &FieldRule) -> Option<T> {
        let (path, value) = self.raw.resolve(rule)?;
        self.parse(path, value)
    }

    fn parse<T: DeserializeOwned>(&mut self, path: &str, value: &Value) -> Option<T> {
        match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                self.fail(path, error.to_string());
                None
            }
        }
    }

    fn array(&mut self, rule: &FieldRule) -> Option<(&'static str, &'a Vec<Value>)> {
        let (path, value) = self.raw.resolve(rule)?;
        if let Value::Array(items) = value {
            Some((path, items))
        } else {
            self.fail(path, format!("expected an array, got {}", json_kind(value)));
            None
        }
    }

    fn monthly_revenue(&mut self) -> Option<Vec<MonthlyRevenue>> {
        if self.raw.resolve(&raw::MONTHLY_REVENUE).is_none() {
            self.fail(raw::MONTHLY_REVENUE.field, "is required");
            return None;
        }
        let (path, items) = self.array(&raw::MONTHLY_REVENUE)?;
        let before = self.errors.len();

        if items.len() != MONTHS_PER_YEAR {
            self.fail(
                path,
                format!("expected {MONTHS_PER_YEAR} entries, got {}", items.len()),
            );
        }

        let mut months = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{idx}]");
            let Some(month) = self.parse::<MonthlyRevenue>(&item_path, item) else {
                continue;
            };
            if month.month.trim().is_empty() {
                self.fail(format!("{item_path}.month"), "must not be empty");
            }
            for (name, amount) in [("low", month.low), ("high", month.high)] {
                if !amount.is_finite() || amount < 0.0 {
                    self.fail(format!("{item_path}.{name}"), "must be a non-negative number");
                }
            }
            months.push(month);
        }

        (self.errors.len() == before).then_some(months)
    }

    fn seasonal_breakdown(&mut self) -> Vec<SeasonalBreakdownItem> {
        let Some((path, items)) = self.array(&raw::SEASONAL_BREAKDOWN) else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| self.parse(&format!("{path}[{idx}]"), item))
            .collect()
    }
}

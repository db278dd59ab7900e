//! Canonical projection record.
//!
//! This is the only shape that is stored and served. Every field is
//! required here; optionality and legacy field names live in
//! [`crate::normalize::raw`].

use serde::{Deserialize, Serialize};

/// Number of entries a canonical `monthlyRevenue` sequence must contain.
pub const MONTHS_PER_YEAR: usize = 12;

/// Market code used when a property's internal identifier carries none.
pub const DEFAULT_MARKET_CODE: &str = "30A";

/// A fully normalized projection page record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRecord {
    pub meta: ProjectionMeta,
    pub property: PropertyInfo,
    pub projections: ProjectionEstimates,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub seasonal_breakdown: Vec<SeasonalBreakdownItem>,
    pub ai_narrative_placeholders: AiNarrativePlaceholders,
    pub trust: TrustSection,
    pub cta: CtaInfo,
    pub testimonials: Vec<Testimonial>,
    pub benefits: Vec<Benefit>,
    pub comparable_properties: Vec<ComparableProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionMeta {
    pub slug: String,
    pub lead_id: String,
    pub homeowner_first_name: String,
    pub homeowner_full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    pub internal_id: String,
    pub address: String,
    pub bedrooms: f64,
    pub bathrooms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<f64>,
    pub city: String,
    pub state: String,
    pub market: String,
    pub is_luxe: bool,
}

impl PropertyInfo {
    /// Market code embedded in [`Self::internal_id`].
    #[must_use]
    pub fn market_code(&self) -> &str {
        market_code_from_internal_id(&self.internal_id)
    }
}

/// Extract the market code from an internal identifier of the form
/// `LVR-<MARKET>-<digits>`.
///
/// The code is the second hyphen-delimited segment. An identifier with fewer
/// than two segments, or whose second segment is empty or not alphanumeric,
/// resolves to [`DEFAULT_MARKET_CODE`].
#[must_use]
pub fn market_code_from_internal_id(internal_id: &str) -> &str {
    let mut segments = internal_id.trim().split('-');
    let _prefix = segments.next();
    match segments.next() {
        Some(code) if !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric()) => code,
        _ => DEFAULT_MARKET_CODE,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionEstimates {
    pub expected_revenue: f64,
    pub high_revenue: f64,
    pub low_revenue: f64,
    pub disclaimer: String,
}

impl ProjectionEstimates {
    /// Returns true when `low <= expected <= high`.
    ///
    /// Ordering is not a validation rule; callers use this to flag suspicious
    /// submissions.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.low_revenue <= self.expected_revenue && self.expected_revenue <= self.high_revenue
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalBreakdownItem {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub subtitle: String,
    pub days_booked_min: f64,
    pub days_booked_max: f64,
    pub days_available: f64,
    pub occupancy_min_pct: f64,
    pub occupancy_max_pct: f64,
    pub adr_min: f64,
    pub adr_max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiNarrativePlaceholders {
    pub summary: String,
    pub insights: String,
    pub optimization_tips: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustStats {
    pub homeowner_satisfaction: String,
    pub guest_reviews: String,
    pub higher_revenue: String,
    pub local_team: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSection {
    pub stats: TrustStats,
    pub pillars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaInfo {
    pub schedule_call_url: String,
    pub ae_name: String,
    pub ae_title: String,
    pub ae_phone: String,
    pub ae_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ae_headshot_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub quote: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    pub title: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableProperty {
    pub image: String,
    pub title: String,
    pub location: String,
    pub bedrooms: f64,
    pub bathrooms: String,
    pub property_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_code_is_second_segment() {
        assert_eq!(market_code_from_internal_id("LVR-BC-10293"), "BC");
        assert_eq!(market_code_from_internal_id("LVR-30A-RE1281"), "30A");
        assert_eq!(market_code_from_internal_id(" LVR-SMK-1 "), "SMK");
    }

    #[test]
    fn malformed_internal_id_falls_back_to_default_market() {
        for id in ["", "LVR", "LVR--10293", "LVR-B C-1", "-", "   "] {
            assert_eq!(
                market_code_from_internal_id(id),
                DEFAULT_MARKET_CODE,
                "internal id {id:?}"
            );
        }
    }

    #[test]
    fn estimates_order_check() {
        let mut estimates = ProjectionEstimates {
            expected_revenue: 100.0,
            high_revenue: 120.0,
            low_revenue: 80.0,
            disclaimer: String::new(),
        };
        assert!(estimates.is_ordered());
        estimates.low_revenue = 130.0;
        assert!(!estimates.is_ordered());
    }

    #[test]
    fn record_fields_serialize_as_camel_case() {
        let meta = ProjectionMeta {
            slug: "1-main-st".into(),
            lead_id: "00Q1".into(),
            homeowner_first_name: "Ana".into(),
            homeowner_full_name: "Ana Ruiz".into(),
        };
        let json = serde_json::to_value(&meta).expect("serialize meta");
        assert_eq!(json["leadId"], "00Q1");
        assert_eq!(json["homeownerFirstName"], "Ana");
    }
}

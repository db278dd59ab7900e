//! Market-level default content.
//!
//! A projection payload may omit any of the supplementary display bundles
//! (trust section, testimonials, benefits, comparable properties, narrative
//! placeholders); the normalizer then substitutes the whole bundle from the
//! property's market. Markets are keyed by the code embedded in the
//! property's internal identifier (see
//! [`crate::model::record::market_code_from_internal_id`]).
//!
//! The `30A` bundle is compiled in. Further markets can be supplied as a JSON
//! object keyed by market code and merged over the built-in set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::record::{
    AiNarrativePlaceholders, Benefit, ComparableProperty, CtaInfo, DEFAULT_MARKET_CODE,
    Testimonial, TrustSection, TrustStats,
};

/// Default content for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDefaults {
    /// Display name written to `property.market` when the payload has none.
    pub display_name: String,
    pub cta: CtaInfo,
    pub trust: TrustSection,
    pub testimonials: Vec<Testimonial>,
    pub benefits: Vec<Benefit>,
    pub comparable_properties: Vec<ComparableProperty>,
    pub ai_narrative_placeholders: AiNarrativePlaceholders,
    pub projection_disclaimer: String,
}

/// Lookup table of market bundles with a guaranteed default entry.
#[derive(Debug, Clone)]
pub struct MarketCatalog {
    fallback: MarketDefaults,
    markets: BTreeMap<String, MarketDefaults>,
}

impl Default for MarketCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MarketCatalog {
    /// Catalog containing only the compiled-in markets.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            fallback: thirty_a(),
            markets: BTreeMap::new(),
        }
    }

    /// Built-in markets overlaid with the bundles in a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object of
    /// market code to [`MarketDefaults`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let extra: BTreeMap<String, MarketDefaults> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let mut catalog = Self::builtin();
        for (code, defaults) in extra {
            catalog.insert(code, defaults);
        }
        Ok(catalog)
    }

    /// Insert or replace a market bundle. Inserting under the default code
    /// replaces the fallback bundle.
    pub fn insert(&mut self, code: impl Into<String>, defaults: MarketDefaults) {
        let code = code.into();
        if code == DEFAULT_MARKET_CODE {
            self.fallback = defaults;
        } else {
            self.markets.insert(code, defaults);
        }
    }

    /// Bundle for `code`, or the default market's bundle when `code` is unknown.
    #[must_use]
    pub fn bundle(&self, code: &str) -> &MarketDefaults {
        self.markets.get(code).unwrap_or(&self.fallback)
    }

    /// Known market codes, default first, then sorted.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(DEFAULT_MARKET_CODE).chain(self.markets.keys().map(String::as_str))
    }
}

fn thirty_a() -> MarketDefaults {
    MarketDefaults {
        display_name: "30A - Florida".to_string(),
        cta: CtaInfo {
            schedule_call_url: "https://calendly.com/kaci-wolkers".to_string(),
            ae_name: "Kaci Wolkers".to_string(),
            ae_title: "Account Executive, LocalVR 30A".to_string(),
            ae_phone: "(850) 641-1001".to_string(),
            ae_email: "kaci.wolkers@golocalvr.com".to_string(),
            ae_headshot_url: None,
        },
        trust: TrustSection {
            stats: TrustStats {
                homeowner_satisfaction: "98%".to_string(),
                guest_reviews: "10,000+".to_string(),
                higher_revenue: "25%".to_string(),
                local_team: true,
            },
            pillars: [
                "Local Pricing™ dynamic algorithm",
                "Local operations team in every market",
                "24/7 guest support",
                "Hotel-grade housekeeping",
                "Three-tier inspection",
                "Three-level guest vetting",
                "Owner performance portal with real-time insights",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        },
        // No vetted testimonials, benefits or comparables exist for 30A yet;
        // payloads that want them must supply their own.
        testimonials: Vec::new(),
        benefits: Vec::new(),
        comparable_properties: Vec::new(),
        ai_narrative_placeholders: AiNarrativePlaceholders {
            summary: "Based on our market analysis and proprietary Local Pricing™ algorithm, your property is positioned in one of the most desirable vacation rental markets in the Southeast, with particular strength during the peak summer months.".to_string(),
            insights: "The 30A market sees exceptional demand in June and July, when occupancy consistently reaches near-full capacity. Winter brings steady shoulder demand that gives year-round income stability many coastal markets lack.".to_string(),
            optimization_tips: "Keep presentation standards high to support peak-season rates, use dynamic pricing through the shoulder seasons, and lean on consistent housekeeping and inspections to protect guest ratings.".to_string(),
        },
        projection_disclaimer: "These projections are based on historical performance of comparable properties, market seasonality trends, and LocalVR's pricing algorithm. Actual results may vary.".to_string(),
    }
}

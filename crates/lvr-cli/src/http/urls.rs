//! Public URLs handed to producers, agents and homeowners.

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("invalid public base URL '{0}': {1}")]
    Parse(String, url::ParseError),
    #[error("public base URL '{0}' cannot carry a path")]
    NotABase(String),
}

/// URL builder rooted at the configured public origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrls {
    base: Url,
}

impl PublicUrls {
    /// # Errors
    ///
    /// Returns an error if `base` is not an absolute http(s)-style URL.
    pub fn new(base: &str) -> Result<Self, UrlError> {
        let base = Url::parse(base.trim()).map_err(|e| UrlError::Parse(base.to_string(), e))?;
        if base.cannot_be_a_base() {
            return Err(UrlError::NotABase(base.to_string()));
        }
        Ok(Self { base })
    }

    fn with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `{base}/`
    #[must_use]
    pub fn home(&self) -> String {
        let mut url = self.with_segments(&[]);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.into()
    }

    /// `{base}/{owner}/{slug}`
    #[must_use]
    pub fn public_url(&self, owner_slug: &str, slug: &str) -> String {
        self.with_segments(&[owner_slug, slug]).into()
    }

    /// `{public}?src=preview`
    #[must_use]
    pub fn preview_url(&self, owner_slug: &str, slug: &str) -> String {
        let mut url = self.with_segments(&[owner_slug, slug]);
        url.query_pairs_mut().append_pair("src", "preview");
        url.into()
    }

    /// `{base}/t?lid={lead}&slug={slug}&ae={owner}`
    #[must_use]
    pub fn tracking_url(&self, lead_id: &str, slug: &str, owner_slug: &str) -> String {
        let mut url = self.with_segments(&["t"]);
        url.query_pairs_mut()
            .append_pair("lid", lead_id)
            .append_pair("slug", slug)
            .append_pair("ae", owner_slug);
        url.into()
    }

    /// Landing URL for a tracked click: the public page tagged with the lead,
    /// `src=email` and the campaign when known.
    #[must_use]
    pub fn click_through_url(
        &self,
        owner_slug: &str,
        slug: &str,
        lead_id: Option<&str>,
        campaign: Option<&str>,
    ) -> String {
        let mut url = self.with_segments(&[owner_slug, slug]);
        {
            let mut query = url.query_pairs_mut();
            if let Some(lead_id) = lead_id {
                query.append_pair("lid", lead_id);
            }
            query.append_pair("src", "email");
            if let Some(campaign) = campaign {
                query.append_pair("campaign", campaign);
            }
        }
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> PublicUrls {
        PublicUrls::new("https://projections.example.com/").expect("valid base")
    }

    #[test]
    fn page_urls() {
        let urls = urls();
        assert_eq!(urls.home(), "https://projections.example.com/");
        assert_eq!(
            urls.public_url("kaci-wolkers", "456-beachside-dr"),
            "https://projections.example.com/kaci-wolkers/456-beachside-dr"
        );
        assert_eq!(
            urls.preview_url("kaci-wolkers", "456-beachside-dr"),
            "https://projections.example.com/kaci-wolkers/456-beachside-dr?src=preview"
        );
    }

    #[test]
    fn tracking_url_encodes_query() {
        assert_eq!(
            urls().tracking_url("00Q 1&2", "456-beachside-dr", "kaci-wolkers"),
            "https://projections.example.com/t?lid=00Q+1%262&slug=456-beachside-dr&ae=kaci-wolkers"
        );
    }

    #[test]
    fn click_through_carries_lead_source_and_campaign() {
        let urls = urls();
        assert_eq!(
            urls.click_through_url("kaci", "abc", Some("00Q1"), Some("spring")),
            "https://projections.example.com/kaci/abc?lid=00Q1&src=email&campaign=spring"
        );
        assert_eq!(
            urls.click_through_url("kaci", "abc", None, None),
            "https://projections.example.com/kaci/abc?src=email"
        );
    }

    #[test]
    fn base_with_path_is_kept() {
        let urls = PublicUrls::new("https://example.com/landing").expect("valid base");
        assert_eq!(urls.public_url("a", "b"), "https://example.com/landing/a/b");
        assert_eq!(urls.home(), "https://example.com/landing/");
    }

    #[test]
    fn rejects_relative_and_opaque_bases() {
        assert!(PublicUrls::new("projections.example.com").is_err());
        assert!(PublicUrls::new("mailto:ops@example.com").is_err());
    }
}

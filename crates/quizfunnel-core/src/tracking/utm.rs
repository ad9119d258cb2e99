use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameters carried over from the landing URL into every event.
pub const CAPTURED_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "fbclid",
    "gclid",
];

/// Attribution parameters captured on landing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtmParams(BTreeMap<String, String>);

impl UtmParams {
    /// Extract the captured parameters from a landing URL.
    ///
    /// Unparseable URLs and empty values yield nothing.
    pub fn from_url(landing_url: &str) -> Self {
        let url = match Url::parse(landing_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("ignoring unparseable landing url {landing_url:?}: {e}");
                return Self::default();
            }
        };
        let params = url
            .query_pairs()
            .filter(|(k, v)| !v.is_empty() && CAPTURED_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self(params)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

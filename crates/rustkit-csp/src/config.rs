//! Policy configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::CspError;

/// Per-document settings that shape how a policy is parsed and enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyConfig {
    /// Enables the CSP 1.1 directives (`base-uri`, `child-src`,
    /// `form-action`, `plugin-types`, `reflected-xss`, `referrer`) and the
    /// `frame-src` → `child-src` → `default-src` fallback chain.
    pub experimental_features: bool,
    /// URL of the protected document. `'self'` matches its origin.
    pub self_url: Option<Url>,
}

impl PolicyConfig {
    /// Create a configuration with experimental features off and no
    /// document URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON, e.g.
    /// `{"experimental-features": true, "self-url": "https://example.com/"}`.
    pub fn from_json(json: &str) -> Result<Self, CspError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Configuration for the document at `document_url`.
    pub fn for_document(document_url: &str) -> Result<Self, CspError> {
        Ok(Self::new().with_self_url(Url::parse(document_url)?))
    }

    /// Toggle the CSP 1.1 directive set.
    pub fn with_experimental_features(mut self, enabled: bool) -> Self {
        self.experimental_features = enabled;
        self
    }

    /// Set the protected document's URL.
    pub fn with_self_url(mut self, url: Url) -> Self {
        self.self_url = Some(url);
        self
    }
}

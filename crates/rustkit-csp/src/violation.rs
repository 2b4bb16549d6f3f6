//! Violations and the JSON report body sent to `report-uri` endpoints.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::origin::Origin;
use crate::CspError;

/// Everything a host needs to surface one failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Text of the directive that failed, e.g. `img-src https://example.com`.
    pub directive_text: String,
    /// Name of the directive the check was for, even when `default-src`
    /// made the decision.
    pub effective_directive: String,
    /// Console message, prefixed with `[Report Only] ` for report-only
    /// policies.
    pub console_message: String,
    pub blocked_url: Option<Url>,
    /// Location of inline content, when the check was for inline content.
    pub context_url: Option<Url>,
    pub context_line: Option<u32>,
    /// `report-uri` endpoints of the policy that was violated.
    pub report_uris: Vec<Url>,
    /// The whole policy header.
    pub header: String,
    pub report_only: bool,
}

impl Violation {
    /// Build the body posted to the policy's report URIs.
    pub fn to_report(&self, document_url: &Url, referrer: Option<&Url>, status_code: u16) -> ViolationReport {
        ViolationReport {
            document_uri: strip_url_for_report(document_url, document_url),
            referrer: referrer.map(|r| strip_url_for_report(r, r)).unwrap_or_default(),
            violated_directive: self.directive_text.clone(),
            effective_directive: self.effective_directive.clone(),
            original_policy: self.header.clone(),
            blocked_uri: self
                .blocked_url
                .as_ref()
                .map(|blocked| strip_url_for_report(blocked, document_url))
                .unwrap_or_default(),
            status_code,
            source_file: self
                .context_url
                .as_ref()
                .map(|source| strip_url_for_report(source, document_url)),
            line_number: self.context_line,
        }
    }
}

/// The `csp-report` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ViolationReport {
    pub document_uri: String,
    pub referrer: String,
    pub violated_directive: String,
    pub effective_directive: String,
    pub original_policy: String,
    pub blocked_uri: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct ReportEnvelope {
    #[serde(rename = "csp-report")]
    csp_report: ViolationReport,
}

impl ViolationReport {
    /// Serialize as `{"csp-report": {...}}`.
    pub fn to_json(&self) -> Result<String, CspError> {
        let envelope = ReportEnvelope {
            csp_report: self.clone(),
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Parse a `{"csp-report": {...}}` body.
    pub fn from_json(json: &str) -> Result<Self, CspError> {
        let envelope: ReportEnvelope = serde_json::from_str(json)?;
        Ok(envelope.csp_report)
    }
}

/// Reduce a URL to what a report may reveal to `document_url`'s origin.
///
/// Same-origin URLs lose their fragment, cross-origin URLs are cut down to
/// their origin, and non-hierarchical or `file:` URLs to their scheme.
pub fn strip_url_for_report(url: &Url, document_url: &Url) -> String {
    if url.cannot_be_a_base() || url.scheme() == "file" {
        return url.scheme().to_string();
    }
    let origin = Origin::from_url(url);
    if origin.same_origin(&Origin::from_url(document_url)) {
        let mut stripped = url.clone();
        stripped.set_fragment(None);
        stripped.to_string()
    } else {
        origin.serialize()
    }
}

//! A document's full set of policies.
//!
//! A document may receive several policy headers, and one header value may
//! hold several comma-separated policies. [`ContentSecurityPolicy`] keeps
//! one [`DirectiveList`] per policy and allows an action only when every
//! list allows it.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::directive_list::{AncestorFrame, DirectiveList, ReferrerPolicy, ReflectedXssDisposition};
use crate::hash::{HashAlgorithms, HashValue};
use crate::{HeaderSource, HeaderType, PolicyConfig, PolicyHost, ReportingStatus};

/// Every policy delivered to one document.
pub struct ContentSecurityPolicy {
    host: Arc<dyn PolicyHost>,
    config: PolicyConfig,
    policies: Vec<DirectiveList>,
}

impl ContentSecurityPolicy {
    pub fn new(config: PolicyConfig, host: Arc<dyn PolicyHost>) -> Self {
        Self {
            host,
            config,
            policies: Vec::new(),
        }
    }

    /// Add the policies in one header value.
    pub fn did_receive_header(&mut self, header: &str, header_type: HeaderType, header_source: HeaderSource) {
        if header_source == HeaderSource::Meta && header_type == HeaderType::Report {
            self.host.report_report_only_in_meta(header);
            return;
        }

        // RFC 7230 folds repeated headers with ','.
        for part in header.split(',') {
            let list = DirectiveList::parse(
                part,
                header_type,
                header_source,
                &self.config,
                Arc::clone(&self.host),
            );

            if !list.is_report_only() && !list.allow_eval(ReportingStatus::SuppressReport) {
                if let Some(message) = list.eval_disabled_error_message() {
                    self.host.disable_eval(message);
                }
            }
            self.policies.push(list);
        }

        info!(
            policies = self.policies.len(),
            ?header_type,
            ?header_source,
            "content security policy received"
        );
    }

    pub fn policies(&self) -> &[DirectiveList] {
        &self.policies
    }

    pub fn is_active(&self) -> bool {
        !self.policies.is_empty()
    }

    /// Ask every list so each one reports, then combine.
    fn is_allowed_by_all(&self, check: impl Fn(&DirectiveList) -> bool) -> bool {
        self.policies
            .iter()
            .fold(true, |allowed, policy| check(policy) && allowed)
    }

    pub fn allow_javascript_urls(&self, context_url: Option<&Url>, context_line: u32, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_javascript_urls(context_url, context_line, reporting))
    }

    pub fn allow_inline_event_handlers(
        &self,
        context_url: Option<&Url>,
        context_line: u32,
        reporting: ReportingStatus,
    ) -> bool {
        self.is_allowed_by_all(|p| p.allow_inline_event_handlers(context_url, context_line, reporting))
    }

    pub fn allow_inline_script(&self, context_url: Option<&Url>, context_line: u32, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_inline_script(context_url, context_line, reporting))
    }

    pub fn allow_inline_style(&self, context_url: Option<&Url>, context_line: u32, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_inline_style(context_url, context_line, reporting))
    }

    pub fn allow_eval(&self, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_eval(reporting))
    }

    pub fn allow_plugin_type(
        &self,
        mime_type: &str,
        type_attribute: &str,
        url: &Url,
        reporting: ReportingStatus,
    ) -> bool {
        self.is_allowed_by_all(|p| p.allow_plugin_type(mime_type, type_attribute, url, reporting))
    }

    pub fn allow_script_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_script_from_source(url, reporting))
    }

    pub fn allow_object_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_object_from_source(url, reporting))
    }

    pub fn allow_child_frame_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_child_frame_from_source(url, reporting))
    }

    pub fn allow_child_context_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_child_context_from_source(url, reporting))
    }

    pub fn allow_image_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_image_from_source(url, reporting))
    }

    pub fn allow_style_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_style_from_source(url, reporting))
    }

    pub fn allow_font_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_font_from_source(url, reporting))
    }

    pub fn allow_media_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_media_from_source(url, reporting))
    }

    pub fn allow_connect_to_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_connect_to_source(url, reporting))
    }

    pub fn allow_form_action(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_form_action(url, reporting))
    }

    pub fn allow_base_uri(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_base_uri(url, reporting))
    }

    pub fn allow_ancestors(&self, ancestors: &[AncestorFrame], url: &Url, reporting: ReportingStatus) -> bool {
        self.is_allowed_by_all(|p| p.allow_ancestors(ancestors, url, reporting))
    }

    pub fn allow_script_nonce(&self, nonce: &str) -> bool {
        self.policies.iter().all(|p| p.allow_script_nonce(nonce))
    }

    pub fn allow_style_nonce(&self, nonce: &str) -> bool {
        self.policies.iter().all(|p| p.allow_style_nonce(nonce))
    }

    /// Whether the text of an inline script matches a hash source in every
    /// policy. False when no policy uses hash sources.
    pub fn allow_script_with_hash(&self, content: &str) -> bool {
        self.allow_with_hash(content, DirectiveList::script_hash_algorithms, DirectiveList::allow_script_hash)
    }

    /// Whether the text of an inline style matches a hash source in every
    /// policy.
    pub fn allow_style_with_hash(&self, content: &str) -> bool {
        self.allow_with_hash(content, DirectiveList::style_hash_algorithms, DirectiveList::allow_style_hash)
    }

    fn allow_with_hash(
        &self,
        content: &str,
        algorithms_used: fn(&DirectiveList) -> HashAlgorithms,
        allow_hash: fn(&DirectiveList, &HashValue) -> bool,
    ) -> bool {
        let used = self
            .policies
            .iter()
            .fold(HashAlgorithms::empty(), |acc, policy| acc | algorithms_used(policy));

        used.algorithms().any(|algorithm| {
            let hash = HashValue::compute(algorithm, content);
            let allowed = self.policies.iter().all(|policy| allow_hash(policy, &hash));
            debug!(?algorithm, allowed, "checked inline content digest");
            allowed
        })
    }

    /// The strongest `reflected-xss` disposition across all policies.
    pub fn reflected_xss_disposition(&self) -> ReflectedXssDisposition {
        self.policies
            .iter()
            .map(DirectiveList::reflected_xss_disposition)
            .max()
            .unwrap_or_default()
    }

    /// Merged `referrer` policy. Policies that disagree yield `Never`.
    pub fn referrer_policy(&self) -> ReferrerPolicy {
        self.policies
            .iter()
            .filter(|p| p.did_set_referrer_policy())
            .map(DirectiveList::referrer_policy)
            .reduce(|merged, next| if merged == next { merged } else { ReferrerPolicy::Never })
            .unwrap_or_default()
    }

    pub fn did_set_referrer_policy(&self) -> bool {
        self.policies.iter().any(DirectiveList::did_set_referrer_policy)
    }

    /// Every `report-uri` endpoint, without duplicates, in header order.
    pub fn report_uris(&self) -> Vec<Url> {
        let mut uris: Vec<Url> = Vec::new();
        for uri in self.policies.iter().flat_map(|p| p.report_uris()) {
            if !uris.contains(uri) {
                uris.push(uri.clone());
            }
        }
        uris
    }
}

impl std::fmt::Debug for ContentSecurityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSecurityPolicy")
            .field("config", &self.config)
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LoggingHost;

    fn policy(headers: &[(&str, HeaderType)]) -> ContentSecurityPolicy {
        let base = Url::parse("https://example.com/").unwrap();
        let mut csp = ContentSecurityPolicy::new(
            PolicyConfig::new()
                .with_experimental_features(true)
                .with_self_url(base.clone()),
            Arc::new(LoggingHost::new(base)),
        );
        for &(header, header_type) in headers {
            csp.did_receive_header(header, header_type, HeaderSource::Http);
        }
        csp
    }

    #[test]
    fn test_comma_splits_policies() {
        let csp = policy(&[("img-src 'self', script-src 'none'", HeaderType::Enforce)]);
        assert_eq!(csp.policies().len(), 2);
        assert_eq!(csp.policies()[0].header(), "img-src 'self'");
        assert_eq!(csp.policies()[1].header(), "script-src 'none'");
    }

    #[test]
    fn test_every_policy_must_allow() {
        let csp = policy(&[
            ("img-src https://a.test https://b.test", HeaderType::Enforce),
            ("img-src https://b.test", HeaderType::Enforce),
        ]);
        let a = Url::parse("https://a.test/x.png").unwrap();
        let b = Url::parse("https://b.test/x.png").unwrap();
        assert!(!csp.allow_image_from_source(&a, ReportingStatus::SuppressReport));
        assert!(csp.allow_image_from_source(&b, ReportingStatus::SuppressReport));
    }

    #[test]
    fn test_no_policy_is_permissive() {
        let csp = policy(&[]);
        assert!(!csp.is_active());
        assert!(csp.allow_eval(ReportingStatus::SendReport));
        assert!(!csp.allow_script_with_hash("alert(1)"));
    }

    #[test]
    fn test_report_only_meta_is_ignored() {
        let mut csp = policy(&[]);
        csp.did_receive_header("script-src 'none'", HeaderType::Report, HeaderSource::Meta);
        assert!(!csp.is_active());
        csp.did_receive_header("script-src 'none'", HeaderType::Enforce, HeaderSource::Meta);
        assert!(csp.is_active());
    }

    #[test]
    fn test_reflected_xss_takes_strongest() {
        let csp = policy(&[
            ("reflected-xss allow", HeaderType::Enforce),
            ("reflected-xss block", HeaderType::Enforce),
            ("reflected-xss filter", HeaderType::Enforce),
        ]);
        assert_eq!(csp.reflected_xss_disposition(), ReflectedXssDisposition::Block);
        assert_eq!(policy(&[]).reflected_xss_disposition(), ReflectedXssDisposition::Unset);
    }

    #[test]
    fn test_referrer_merge() {
        let same = policy(&[
            ("referrer origin", HeaderType::Enforce),
            ("img-src *", HeaderType::Enforce),
            ("referrer origin", HeaderType::Enforce),
        ]);
        assert_eq!(same.referrer_policy(), ReferrerPolicy::Origin);

        let conflicting = policy(&[
            ("referrer origin", HeaderType::Enforce),
            ("referrer always", HeaderType::Enforce),
        ]);
        assert_eq!(conflicting.referrer_policy(), ReferrerPolicy::Never);
        assert!(!policy(&[]).did_set_referrer_policy());
    }

    #[test]
    fn test_report_uris_union() {
        let csp = policy(&[
            ("img-src 'none'; report-uri /a /b", HeaderType::Enforce),
            ("script-src 'none'; report-uri /b https://r.test/c", HeaderType::Report),
        ]);
        let all = csp.report_uris();
        let uris: Vec<&str> = all.iter().map(Url::as_str).collect();
        assert_eq!(
            uris,
            vec!["https://example.com/a", "https://example.com/b", "https://r.test/c"]
        );
    }

    #[test]
    fn test_inline_script_hash() {
        let csp = policy(&[(
            "script-src 'sha256-bhHHL3z2vDgxUt0W3dWQOrprscmda2Y5pLsLg4GF+pI='",
            HeaderType::Enforce,
        )]);
        assert!(csp.allow_script_with_hash("alert(1)"));
        assert!(!csp.allow_script_with_hash("alert(2)"));
        assert!(!csp.allow_style_with_hash("alert(1)"));
    }
}

//! The host a directive list reports to.
//!
//! A directive list never decides how a problem is surfaced. Parse errors,
//! violations and side effects (sandboxing, inspector notifications) are
//! handed to a [`PolicyHost`], normally the document that owns the policy.

use tracing::{debug, warn};
use url::Url;

use crate::hash::HashAlgorithms;
use crate::sandbox::SandboxFlags;
use crate::violation::Violation;

/// Callbacks from a directive list into its owning document.
///
/// Every method has a default that logs through `tracing`, so a host only
/// overrides what it acts on.
pub trait PolicyHost: Send + Sync {
    /// A check failed. Called in both enforcing and report-only mode.
    fn report_violation(&self, violation: &Violation) {
        warn!(
            directive = %violation.directive_text,
            effective_directive = %violation.effective_directive,
            blocked_url = ?violation.blocked_url.as_ref().map(Url::as_str),
            "{}",
            violation.console_message
        );
    }

    fn report_duplicate_directive(&self, name: &str) {
        warn!("Ignoring duplicate Content-Security-Policy directive '{}'.", name);
    }

    fn report_unsupported_directive(&self, name: &str) {
        warn!("Unrecognized Content-Security-Policy directive '{}'.", name);
    }

    fn report_invalid_directive_value_character(&self, name: &str, value: &str) {
        warn!(
            "The value for Content Security Policy directive '{}' contains an invalid character: '{}'.",
            name, value
        );
    }

    fn report_invalid_source_expression(&self, directive: &str, source: &str) {
        warn!(
            "The source list for Content Security Policy directive '{}' contains an invalid source: '{}'. It will be ignored.",
            directive, source
        );
    }

    fn report_directive_as_source_expression(&self, directive: &str, source: &str) {
        warn!(
            "The Content Security Policy directive '{}' contains '{}' as a source expression. Did you mean '{} ...; {} ...' (note the semicolon)?",
            directive, source, directive, source
        );
    }

    fn report_invalid_path_character(&self, directive: &str, value: &str, invalid: char) {
        warn!(
            "The source list for Content Security Policy directive '{}' contains a source with an invalid path: '{}'. The '{}' character is ignored.",
            directive, value, invalid
        );
    }

    fn report_invalid_plugin_types(&self, plugin_type: &str) {
        if plugin_type.is_empty() {
            warn!("'plugin-types' Content Security Policy directive is empty; all plugins will be blocked.");
        } else {
            warn!("Invalid plugin type in 'plugin-types' Content Security Policy directive: '{}'.", plugin_type);
        }
    }

    fn report_invalid_sandbox_flags(&self, message: &str) {
        warn!("Error while parsing the 'sandbox' Content Security Policy directive: {}", message);
    }

    fn report_invalid_reflected_xss(&self, value: &str) {
        warn!(
            "The 'reflected-xss' Content Security Policy directive has the invalid value \"{}\". Valid values are \"allow\", \"filter\", and \"block\".",
            value
        );
    }

    fn report_invalid_referrer(&self, value: &str) {
        warn!(
            "The 'referrer' Content Security Policy directive has the invalid value \"{}\". Valid values are \"always\", \"default\", \"never\", and \"origin\".",
            value
        );
    }

    fn report_invalid_in_report_only(&self, name: &str) {
        warn!(
            "The Content Security Policy directive '{}' is ignored when delivered in a report-only policy.",
            name
        );
    }

    fn report_missing_report_uri(&self, header: &str) {
        warn!(
            "The Content Security Policy '{}' was delivered in report-only mode, but does not specify a 'report-uri'; the policy will have no effect.",
            header
        );
    }

    fn report_report_only_in_meta(&self, header: &str) {
        warn!(
            "The report-only Content Security Policy '{}' was delivered via a <meta> element, which is disallowed. The policy has been ignored.",
            header
        );
    }

    /// Resolve a `report-uri` token. Relative tokens need a base URL, so
    /// the default only accepts absolute URLs.
    fn complete_url(&self, url: &str) -> Option<Url> {
        Url::parse(url).ok()
    }

    fn enforce_sandbox_flags(&self, flags: SandboxFlags) {
        debug!(?flags, "sandbox flags requested by policy");
    }

    fn uses_script_hash_algorithms(&self, algorithms: HashAlgorithms) {
        debug!(?algorithms, "script-src uses hash sources");
    }

    fn uses_style_hash_algorithms(&self, algorithms: HashAlgorithms) {
        debug!(?algorithms, "style-src uses hash sources");
    }

    fn report_blocked_script_execution_to_inspector(&self, directive_text: &str) {
        debug!(directive = directive_text, "script execution blocked");
    }

    /// The policy forbids `eval()`; `message` is the error to raise.
    fn disable_eval(&self, message: &str) {
        debug!("eval disabled: {}", message);
    }
}

/// A host that only logs, resolving `report-uri` tokens against the
/// document URL when one is known.
#[derive(Debug, Clone, Default)]
pub struct LoggingHost {
    base_url: Option<Url>,
}

impl LoggingHost {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
        }
    }
}

impl PolicyHost for LoggingHost {
    fn complete_url(&self, url: &str) -> Option<Url> {
        match self.base_url {
            Some(ref base) => base.join(url).ok(),
            None => Url::parse(url).ok(),
        }
    }
}

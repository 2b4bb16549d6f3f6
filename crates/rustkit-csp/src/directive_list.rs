//! One parsed policy header and the checks that consult it.
//!
//! A [`DirectiveList`] is built once from a header and is read-only
//! afterwards. Every `allow_*` query resolves its operative directive
//! (the directive itself, or `default-src` when it is absent), runs a
//! check, and on failure reports a [`Violation`] to the host. Report-only
//! lists report but never block.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use url::Url;

use crate::directive::{Directive, DirectiveKind, MediaListDirective, SourceListDirective};
use crate::hash::{HashAlgorithms, HashValue};
use crate::sandbox::parse_sandbox_policy;
use crate::tokenizer::{is_ascii_space, skip_while, DirectiveToken, DirectiveTokenizer};
use crate::violation::Violation;
use crate::{HeaderSource, HeaderType, PolicyConfig, PolicyHost, ReportingStatus};

const EVAL_MESSAGE: &str = "Refused to evaluate a string as JavaScript because 'unsafe-eval' is not an allowed source of script in the following Content Security Policy directive: ";
const JAVASCRIPT_URL_MESSAGE: &str = "Refused to execute JavaScript URL because it violates the following Content Security Policy directive: ";
const EVENT_HANDLER_MESSAGE: &str = "Refused to execute inline event handler because it violates the following Content Security Policy directive: ";
const INLINE_SCRIPT_MESSAGE: &str = "Refused to execute inline script because it violates the following Content Security Policy directive: ";
const INLINE_STYLE_MESSAGE: &str = "Refused to apply inline style because it violates the following Content Security Policy directive: ";

/// Value of the `reflected-xss` directive.
///
/// Ordered by strength, so merging several policies keeps the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReflectedXssDisposition {
    #[default]
    Unset,
    Allow,
    Invalid,
    Filter,
    Block,
}

/// Value of the `referrer` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferrerPolicy {
    #[default]
    Default,
    Always,
    Never,
    Origin,
}

/// A frame above the protected document, for `frame-ancestors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorFrame {
    /// An ancestor in this process whose document URL is known.
    Local(Url),
    /// An ancestor whose document cannot be inspected. Always fails.
    Remote,
}

/// The parsed form of one policy header.
pub struct DirectiveList {
    host: Arc<dyn PolicyHost>,
    config: PolicyConfig,

    header: String,
    header_type: HeaderType,
    header_source: HeaderSource,
    report_only: bool,

    has_sandbox_policy: bool,
    reflected_xss_disposition: ReflectedXssDisposition,
    did_set_referrer_policy: bool,
    referrer_policy: ReferrerPolicy,
    eval_disabled_error_message: Option<String>,
    report_uris: Vec<Url>,

    default_src: Option<SourceListDirective>,
    script_src: Option<SourceListDirective>,
    object_src: Option<SourceListDirective>,
    frame_ancestors: Option<SourceListDirective>,
    frame_src: Option<SourceListDirective>,
    img_src: Option<SourceListDirective>,
    style_src: Option<SourceListDirective>,
    font_src: Option<SourceListDirective>,
    media_src: Option<SourceListDirective>,
    connect_src: Option<SourceListDirective>,
    base_uri: Option<SourceListDirective>,
    child_src: Option<SourceListDirective>,
    form_action: Option<SourceListDirective>,
    plugin_types: Option<MediaListDirective>,
}

impl DirectiveList {
    /// Parse a policy header. Never fails: malformed parts are reported to
    /// `host` and dropped.
    pub fn parse(
        header: &str,
        header_type: HeaderType,
        header_source: HeaderSource,
        config: &PolicyConfig,
        host: Arc<dyn PolicyHost>,
    ) -> Self {
        let mut list = DirectiveList {
            host,
            config: config.clone(),
            header: header.trim_matches(is_ascii_space).to_string(),
            header_type,
            header_source,
            report_only: header_type == HeaderType::Report,
            has_sandbox_policy: false,
            reflected_xss_disposition: ReflectedXssDisposition::Unset,
            did_set_referrer_policy: false,
            referrer_policy: ReferrerPolicy::Default,
            eval_disabled_error_message: None,
            report_uris: Vec::new(),
            default_src: None,
            script_src: None,
            object_src: None,
            frame_ancestors: None,
            frame_src: None,
            img_src: None,
            style_src: None,
            font_src: None,
            media_src: None,
            connect_src: None,
            base_uri: None,
            child_src: None,
            form_action: None,
            plugin_types: None,
        };

        for token in DirectiveTokenizer::new(header) {
            match token {
                DirectiveToken::Empty => {}
                DirectiveToken::Directive { name, value } => list.add_directive(name, value),
                DirectiveToken::Unsupported(text) => list.host.report_unsupported_directive(text),
                DirectiveToken::InvalidValue { name, value } => {
                    list.host.report_invalid_directive_value_character(name, value)
                }
            }
        }

        list.eval_disabled_error_message = list
            .operative(list.script_src.as_ref())
            .filter(|d| !d.allow_eval())
            .map(|d| format!("{}\"{}\".", EVAL_MESSAGE, d.text()));

        if list.report_only && list.report_uris.is_empty() {
            list.host.report_missing_report_uri(header);
        }

        debug!(
            header = %list.header,
            report_only = list.report_only,
            report_uris = list.report_uris.len(),
            "parsed content security policy"
        );
        list
    }

    fn add_directive(&mut self, name: &str, value: &str) {
        let kind = match DirectiveKind::from_name(name) {
            Some(kind) if !kind.is_experimental() || self.config.experimental_features => kind,
            _ => {
                self.host.report_unsupported_directive(name);
                return;
            }
        };
        trace!(%kind, value, "adding directive");

        let host = self.host.as_ref();
        let self_url = self.config.self_url.as_ref();
        match kind {
            DirectiveKind::DefaultSrc => set_directive(&mut self.default_src, name, value, self_url, host),
            DirectiveKind::ScriptSrc => {
                set_directive(&mut self.script_src, name, value, self_url, host);
                if let Some(ref directive) = self.script_src {
                    host.uses_script_hash_algorithms(directive.hash_algorithms_used());
                }
            }
            DirectiveKind::ObjectSrc => set_directive(&mut self.object_src, name, value, self_url, host),
            DirectiveKind::FrameAncestors => {
                set_directive(&mut self.frame_ancestors, name, value, self_url, host)
            }
            DirectiveKind::FrameSrc => set_directive(&mut self.frame_src, name, value, self_url, host),
            DirectiveKind::ImgSrc => set_directive(&mut self.img_src, name, value, self_url, host),
            DirectiveKind::StyleSrc => {
                set_directive(&mut self.style_src, name, value, self_url, host);
                if let Some(ref directive) = self.style_src {
                    host.uses_style_hash_algorithms(directive.hash_algorithms_used());
                }
            }
            DirectiveKind::FontSrc => set_directive(&mut self.font_src, name, value, self_url, host),
            DirectiveKind::MediaSrc => set_directive(&mut self.media_src, name, value, self_url, host),
            DirectiveKind::ConnectSrc => set_directive(&mut self.connect_src, name, value, self_url, host),
            DirectiveKind::BaseUri => set_directive(&mut self.base_uri, name, value, self_url, host),
            DirectiveKind::ChildSrc => set_directive(&mut self.child_src, name, value, self_url, host),
            DirectiveKind::FormAction => set_directive(&mut self.form_action, name, value, self_url, host),
            DirectiveKind::PluginTypes => set_directive(&mut self.plugin_types, name, value, self_url, host),
            DirectiveKind::Sandbox => self.apply_sandbox_policy(name, value),
            DirectiveKind::ReportUri => self.parse_report_uri(name, value),
            DirectiveKind::ReflectedXss => self.parse_reflected_xss(name, value),
            DirectiveKind::Referrer => self.parse_referrer(name, value),
        }
    }

    fn apply_sandbox_policy(&mut self, name: &str, value: &str) {
        if self.report_only {
            self.host.report_invalid_in_report_only(name);
            return;
        }
        if self.has_sandbox_policy {
            self.host.report_duplicate_directive(name);
            return;
        }
        self.has_sandbox_policy = true;

        let (flags, invalid_tokens) = parse_sandbox_policy(value);
        self.host.enforce_sandbox_flags(flags);
        if let Some(message) = invalid_tokens {
            self.host.report_invalid_sandbox_flags(&message);
        }
    }

    fn parse_report_uri(&mut self, name: &str, value: &str) {
        if !self.report_uris.is_empty() {
            self.host.report_duplicate_directive(name);
            return;
        }

        for token in value.split(is_ascii_space).filter(|t| !t.is_empty()) {
            match self.host.complete_url(token) {
                Some(url) => self.report_uris.push(url),
                None => warn!(token, "dropping report-uri that cannot be resolved"),
            }
        }
    }

    fn parse_reflected_xss(&mut self, name: &str, value: &str) {
        if self.reflected_xss_disposition != ReflectedXssDisposition::Unset {
            self.host.report_duplicate_directive(name);
            self.reflected_xss_disposition = ReflectedXssDisposition::Invalid;
            return;
        }
        if value.is_empty() {
            self.reflected_xss_disposition = ReflectedXssDisposition::Invalid;
            self.host.report_invalid_reflected_xss(value);
            return;
        }

        let (token, rest) = first_token(value);
        self.reflected_xss_disposition = match token.to_ascii_lowercase().as_str() {
            "allow" => ReflectedXssDisposition::Allow,
            "filter" => ReflectedXssDisposition::Filter,
            "block" => ReflectedXssDisposition::Block,
            _ => {
                self.reflected_xss_disposition = ReflectedXssDisposition::Invalid;
                self.host.report_invalid_reflected_xss(value);
                return;
            }
        };

        // value1 value2
        //        ^
        if !rest.is_empty() {
            self.reflected_xss_disposition = ReflectedXssDisposition::Invalid;
            self.host.report_invalid_reflected_xss(value);
        }
    }

    fn parse_referrer(&mut self, name: &str, value: &str) {
        if self.did_set_referrer_policy {
            self.host.report_duplicate_directive(name);
            self.referrer_policy = ReferrerPolicy::Never;
            return;
        }
        self.did_set_referrer_policy = true;

        if value.is_empty() {
            self.host.report_invalid_referrer(value);
            self.referrer_policy = ReferrerPolicy::Never;
            return;
        }

        let (token, rest) = first_token(value);
        self.referrer_policy = match token.to_ascii_lowercase().as_str() {
            "always" => ReferrerPolicy::Always,
            "default" => ReferrerPolicy::Default,
            "never" => ReferrerPolicy::Never,
            "origin" => ReferrerPolicy::Origin,
            _ => {
                self.referrer_policy = ReferrerPolicy::Never;
                self.host.report_invalid_referrer(value);
                return;
            }
        };

        if !rest.is_empty() {
            self.referrer_policy = ReferrerPolicy::Never;
            self.host.report_invalid_referrer(value);
        }
    }

    // ==================== Operative directives ====================

    fn operative<'a>(&'a self, directive: Option<&'a SourceListDirective>) -> Option<&'a SourceListDirective> {
        directive.or(self.default_src.as_ref())
    }

    fn is_default_src(&self, directive: &SourceListDirective) -> bool {
        self.default_src
            .as_ref()
            .is_some_and(|default| std::ptr::eq(default, directive))
    }

    /// The source-list directive stored for `kind`, without fallback.
    pub fn directive(&self, kind: DirectiveKind) -> Option<&SourceListDirective> {
        match kind {
            DirectiveKind::DefaultSrc => self.default_src.as_ref(),
            DirectiveKind::ScriptSrc => self.script_src.as_ref(),
            DirectiveKind::ObjectSrc => self.object_src.as_ref(),
            DirectiveKind::FrameAncestors => self.frame_ancestors.as_ref(),
            DirectiveKind::FrameSrc => self.frame_src.as_ref(),
            DirectiveKind::ImgSrc => self.img_src.as_ref(),
            DirectiveKind::StyleSrc => self.style_src.as_ref(),
            DirectiveKind::FontSrc => self.font_src.as_ref(),
            DirectiveKind::MediaSrc => self.media_src.as_ref(),
            DirectiveKind::ConnectSrc => self.connect_src.as_ref(),
            DirectiveKind::BaseUri => self.base_uri.as_ref(),
            DirectiveKind::ChildSrc => self.child_src.as_ref(),
            DirectiveKind::FormAction => self.form_action.as_ref(),
            DirectiveKind::PluginTypes
            | DirectiveKind::Sandbox
            | DirectiveKind::ReportUri
            | DirectiveKind::ReflectedXss
            | DirectiveKind::Referrer => None,
        }
    }

    /// The directive stored for `kind`, falling back to `default-src`.
    pub fn operative_directive(&self, kind: DirectiveKind) -> Option<&SourceListDirective> {
        self.operative(self.directive(kind))
    }

    pub fn plugin_types(&self) -> Option<&MediaListDirective> {
        self.plugin_types.as_ref()
    }

    // ==================== Reporting ====================

    fn report_violation(
        &self,
        directive_text: &str,
        effective_directive: &str,
        console_message: String,
        blocked_url: Option<&Url>,
        context: Option<(Option<&Url>, u32)>,
    ) {
        let console_message = if self.report_only {
            format!("[Report Only] {}", console_message)
        } else {
            console_message
        };

        self.host.report_violation(&Violation {
            directive_text: directive_text.to_string(),
            effective_directive: effective_directive.to_string(),
            console_message,
            blocked_url: blocked_url.cloned(),
            context_url: context.and_then(|(url, _)| url.cloned()),
            context_line: context.map(|(_, line)| line),
            report_uris: self.report_uris.clone(),
            header: self.header.clone(),
            report_only: self.report_only,
        });
    }

    fn deny_if_enforcing_policy(&self) -> bool {
        self.report_only
    }

    fn check_eval_and_report_violation(
        &self,
        directive: Option<&SourceListDirective>,
        console_message: &str,
    ) -> bool {
        let Some(directive) = directive.filter(|d| !check_eval(Some(*d))) else {
            return true;
        };

        let suffix = if self.is_default_src(directive) {
            " Note that 'script-src' was not explicitly set, so 'default-src' is used as a fallback."
        } else {
            ""
        };
        self.report_violation(
            directive.text(),
            DirectiveKind::ScriptSrc.name(),
            format!("{}\"{}\".{}", console_message, directive.text(), suffix),
            None,
            None,
        );

        if !self.report_only {
            self.host.report_blocked_script_execution_to_inspector(directive.text());
            return false;
        }
        true
    }

    fn check_inline_and_report_violation(
        &self,
        directive: Option<&SourceListDirective>,
        console_message: &str,
        context_url: Option<&Url>,
        context_line: u32,
        is_script: bool,
    ) -> bool {
        let Some(directive) = directive.filter(|d| !check_inline(Some(*d))) else {
            return true;
        };

        let effective = if is_script {
            DirectiveKind::ScriptSrc
        } else {
            DirectiveKind::StyleSrc
        };
        let suffix = if directive.allow_inline() && directive.is_hash_or_nonce_present() {
            " Note that 'unsafe-inline' is ignored if either a hash or nonce value is present in the source list.".to_string()
        } else {
            let mut suffix = " Either the 'unsafe-inline' keyword, a hash ('sha256-...'), or a nonce ('nonce-...') is required to enable inline execution.".to_string();
            if self.is_default_src(directive) {
                suffix.push_str(&format!(
                    " Note also that '{}' was not explicitly set, so 'default-src' is used as a fallback.",
                    effective
                ));
            }
            suffix
        };
        self.report_violation(
            directive.text(),
            effective.name(),
            format!("{}\"{}\".{}", console_message, directive.text(), suffix),
            None,
            Some((context_url, context_line)),
        );

        if !self.report_only {
            if is_script {
                self.host.report_blocked_script_execution_to_inspector(directive.text());
            }
            return false;
        }
        true
    }

    fn check_source_and_report_violation(
        &self,
        directive: Option<&SourceListDirective>,
        url: &Url,
        effective: DirectiveKind,
    ) -> bool {
        let Some(directive) = directive.filter(|d| !check_source(Some(*d), url)) else {
            return true;
        };

        let suffix = if self.is_default_src(directive) {
            format!(
                " Note that '{}' was not explicitly set, so 'default-src' is used as a fallback.",
                effective
            )
        } else {
            String::new()
        };
        self.report_violation(
            directive.text(),
            effective.name(),
            format!(
                "{}{}' because it violates the following Content Security Policy directive: \"{}\".{}",
                refusal_prefix(effective),
                elided(url),
                directive.text(),
                suffix
            ),
            Some(url),
            None,
        );
        self.deny_if_enforcing_policy()
    }

    fn check_media_type_and_report_violation(
        &self,
        directive: Option<&MediaListDirective>,
        mime_type: &str,
        type_attribute: &str,
        url: &Url,
        console_message: &str,
    ) -> bool {
        let Some(directive) =
            directive.filter(|d| !check_media_type(Some(*d), mime_type, type_attribute))
        else {
            return true;
        };

        let mut message = format!("{}'{}'.", console_message, directive.text());
        if type_attribute.is_empty() {
            message.push_str(" When enforcing the 'plugin-types' directive, the plugin's media type must be explicitly declared with a 'type' attribute on the containing element (e.g. '<object type=\"[TYPE GOES HERE]\" ...>').");
        }
        self.report_violation(
            directive.text(),
            DirectiveKind::PluginTypes.name(),
            message,
            Some(url),
            None,
        );
        self.deny_if_enforcing_policy()
    }

    fn check_ancestors_and_report_violation(
        &self,
        directive: Option<&SourceListDirective>,
        ancestors: &[AncestorFrame],
        url: &Url,
    ) -> bool {
        let Some(directive) = directive.filter(|d| !check_ancestors(Some(*d), ancestors)) else {
            return true;
        };

        self.report_violation(
            directive.text(),
            DirectiveKind::FrameAncestors.name(),
            format!(
                "Refused to display '{}' in a frame because an ancestor violates the following Content Security Policy directive: \"{}\".",
                elided(url),
                directive.text()
            ),
            Some(url),
            None,
        );
        self.deny_if_enforcing_policy()
    }

    // ==================== Queries ====================

    pub fn allow_javascript_urls(
        &self,
        context_url: Option<&Url>,
        context_line: u32,
        reporting: ReportingStatus,
    ) -> bool {
        let directive = self.operative(self.script_src.as_ref());
        match reporting {
            ReportingStatus::SendReport => self.check_inline_and_report_violation(
                directive,
                JAVASCRIPT_URL_MESSAGE,
                context_url,
                context_line,
                true,
            ),
            ReportingStatus::SuppressReport => check_inline(directive),
        }
    }

    pub fn allow_inline_event_handlers(
        &self,
        context_url: Option<&Url>,
        context_line: u32,
        reporting: ReportingStatus,
    ) -> bool {
        let directive = self.operative(self.script_src.as_ref());
        match reporting {
            ReportingStatus::SendReport => self.check_inline_and_report_violation(
                directive,
                EVENT_HANDLER_MESSAGE,
                context_url,
                context_line,
                true,
            ),
            ReportingStatus::SuppressReport => check_inline(directive),
        }
    }

    pub fn allow_inline_script(
        &self,
        context_url: Option<&Url>,
        context_line: u32,
        reporting: ReportingStatus,
    ) -> bool {
        let directive = self.operative(self.script_src.as_ref());
        match reporting {
            ReportingStatus::SendReport => self.check_inline_and_report_violation(
                directive,
                INLINE_SCRIPT_MESSAGE,
                context_url,
                context_line,
                true,
            ),
            ReportingStatus::SuppressReport => check_inline(directive),
        }
    }

    pub fn allow_inline_style(
        &self,
        context_url: Option<&Url>,
        context_line: u32,
        reporting: ReportingStatus,
    ) -> bool {
        let directive = self.operative(self.style_src.as_ref());
        match reporting {
            ReportingStatus::SendReport => self.check_inline_and_report_violation(
                directive,
                INLINE_STYLE_MESSAGE,
                context_url,
                context_line,
                false,
            ),
            ReportingStatus::SuppressReport => check_inline(directive),
        }
    }

    pub fn allow_eval(&self, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.script_src.as_ref());
        match reporting {
            ReportingStatus::SendReport => self.check_eval_and_report_violation(directive, EVAL_MESSAGE),
            ReportingStatus::SuppressReport => check_eval(directive),
        }
    }

    /// `mime_type` is the type being loaded, `type_attribute` the `type`
    /// attribute of the embedding element.
    pub fn allow_plugin_type(
        &self,
        mime_type: &str,
        type_attribute: &str,
        url: &Url,
        reporting: ReportingStatus,
    ) -> bool {
        let directive = self.plugin_types.as_ref();
        match reporting {
            ReportingStatus::SendReport => self.check_media_type_and_report_violation(
                directive,
                mime_type,
                type_attribute,
                url,
                &format!(
                    "Refused to load '{}' (MIME type '{}') because it violates the following Content Security Policy Directive: ",
                    elided(url),
                    type_attribute
                ),
            ),
            ReportingStatus::SuppressReport => check_media_type(directive, mime_type, type_attribute),
        }
    }

    fn allow_from_source(
        &self,
        directive: Option<&SourceListDirective>,
        url: &Url,
        effective: DirectiveKind,
        reporting: ReportingStatus,
    ) -> bool {
        match reporting {
            ReportingStatus::SendReport => self.check_source_and_report_violation(directive, url, effective),
            ReportingStatus::SuppressReport => check_source(directive, url),
        }
    }

    pub fn allow_script_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.script_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::ScriptSrc, reporting)
    }

    pub fn allow_object_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        if url.scheme() == "about" {
            return true;
        }
        let directive = self.operative(self.object_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::ObjectSrc, reporting)
    }

    /// `frame-src` decides; with experimental features the chain is
    /// `frame-src` → `child-src` → `default-src`.
    pub fn allow_child_frame_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        if url.scheme() == "about" {
            return true;
        }
        let directive = if self.config.experimental_features {
            self.frame_src
                .as_ref()
                .or_else(|| self.operative(self.child_src.as_ref()))
        } else {
            self.operative(self.frame_src.as_ref())
        };
        self.allow_from_source(directive, url, DirectiveKind::FrameSrc, reporting)
    }

    /// Workers and other nested browsing contexts.
    pub fn allow_child_context_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.child_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::ChildSrc, reporting)
    }

    pub fn allow_image_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.img_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::ImgSrc, reporting)
    }

    pub fn allow_style_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.style_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::StyleSrc, reporting)
    }

    pub fn allow_font_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.font_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::FontSrc, reporting)
    }

    pub fn allow_media_from_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.media_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::MediaSrc, reporting)
    }

    pub fn allow_connect_to_source(&self, url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.operative(self.connect_src.as_ref());
        self.allow_from_source(directive, url, DirectiveKind::ConnectSrc, reporting)
    }

    /// No `default-src` fallback.
    pub fn allow_form_action(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.allow_from_source(self.form_action.as_ref(), url, DirectiveKind::FormAction, reporting)
    }

    /// No `default-src` fallback.
    pub fn allow_base_uri(&self, url: &Url, reporting: ReportingStatus) -> bool {
        self.allow_from_source(self.base_uri.as_ref(), url, DirectiveKind::BaseUri, reporting)
    }

    /// `ancestors` runs from the parent frame up to the top. No
    /// `default-src` fallback.
    pub fn allow_ancestors(&self, ancestors: &[AncestorFrame], url: &Url, reporting: ReportingStatus) -> bool {
        let directive = self.frame_ancestors.as_ref();
        match reporting {
            ReportingStatus::SendReport => {
                self.check_ancestors_and_report_violation(directive, ancestors, url)
            }
            ReportingStatus::SuppressReport => check_ancestors(directive, ancestors),
        }
    }

    pub fn allow_script_nonce(&self, nonce: &str) -> bool {
        check_nonce(self.operative(self.script_src.as_ref()), nonce)
    }

    pub fn allow_style_nonce(&self, nonce: &str) -> bool {
        check_nonce(self.operative(self.style_src.as_ref()), nonce)
    }

    pub fn allow_script_hash(&self, hash: &HashValue) -> bool {
        check_hash(self.operative(self.script_src.as_ref()), hash)
    }

    pub fn allow_style_hash(&self, hash: &HashValue) -> bool {
        check_hash(self.operative(self.style_src.as_ref()), hash)
    }

    // ==================== Accessors ====================

    /// The header text, trimmed.
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn header_type(&self) -> HeaderType {
        self.header_type
    }

    pub fn header_source(&self) -> HeaderSource {
        self.header_source
    }

    pub fn is_report_only(&self) -> bool {
        self.report_only
    }

    pub fn report_uris(&self) -> &[Url] {
        &self.report_uris
    }

    /// Set when the operative script directive forbids `eval()`.
    pub fn eval_disabled_error_message(&self) -> Option<&str> {
        self.eval_disabled_error_message.as_deref()
    }

    pub fn reflected_xss_disposition(&self) -> ReflectedXssDisposition {
        self.reflected_xss_disposition
    }

    pub fn did_set_referrer_policy(&self) -> bool {
        self.did_set_referrer_policy
    }

    pub fn referrer_policy(&self) -> ReferrerPolicy {
        self.referrer_policy
    }

    pub fn has_sandbox_policy(&self) -> bool {
        self.has_sandbox_policy
    }

    /// Hash algorithms used by the operative script directive.
    pub fn script_hash_algorithms(&self) -> HashAlgorithms {
        self.operative(self.script_src.as_ref())
            .map_or(HashAlgorithms::empty(), SourceListDirective::hash_algorithms_used)
    }

    /// Hash algorithms used by the operative style directive.
    pub fn style_hash_algorithms(&self) -> HashAlgorithms {
        self.operative(self.style_src.as_ref())
            .map_or(HashAlgorithms::empty(), SourceListDirective::hash_algorithms_used)
    }
}

impl fmt::Debug for DirectiveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveList")
            .field("header", &self.header)
            .field("header_type", &self.header_type)
            .field("header_source", &self.header_source)
            .field("report_uris", &self.report_uris)
            .field("has_sandbox_policy", &self.has_sandbox_policy)
            .field("reflected_xss_disposition", &self.reflected_xss_disposition)
            .field("referrer_policy", &self.referrer_policy)
            .finish_non_exhaustive()
    }
}

/// Store `directive` in `slot` unless the slot is taken.
fn set_directive<D: Directive>(
    slot: &mut Option<D>,
    name: &str,
    value: &str,
    self_url: Option<&Url>,
    host: &dyn PolicyHost,
) {
    if slot.is_some() {
        host.report_duplicate_directive(name);
        return;
    }
    *slot = Some(D::parse(name, value, self_url, host));
}

/// Split off the first whitespace-delimited token; the remainder has its
/// leading whitespace removed.
fn first_token(value: &str) -> (&str, &str) {
    let value = value.trim_start_matches(is_ascii_space);
    let end = skip_while(value, 0, |c| !is_ascii_space(c));
    (&value[..end], value[end..].trim_start_matches(is_ascii_space))
}

fn refusal_prefix(effective: DirectiveKind) -> &'static str {
    match effective {
        DirectiveKind::BaseUri => "Refused to set the document's base URI to '",
        DirectiveKind::ChildSrc => "Refused to create a child context containing '",
        DirectiveKind::ConnectSrc => "Refused to connect to '",
        DirectiveKind::FontSrc => "Refused to load the font '",
        DirectiveKind::FormAction => "Refused to send form data to '",
        DirectiveKind::FrameSrc => "Refused to frame '",
        DirectiveKind::ImgSrc => "Refused to load the image '",
        DirectiveKind::MediaSrc => "Refused to load media from '",
        DirectiveKind::ObjectSrc => "Refused to load plugin data from '",
        DirectiveKind::ScriptSrc => "Refused to load the script '",
        DirectiveKind::StyleSrc => "Refused to load the stylesheet '",
        _ => "Refused to load '",
    }
}

/// Shorten very long URLs for the console.
fn elided(url: &Url) -> String {
    let s = url.as_str();
    if s.len() <= 1024 {
        return s.to_string();
    }
    format!("{}...{}", &s[..511], &s[s.len() - 510..])
}

// Check primitives: a missing directive never restricts.

fn check_eval(directive: Option<&SourceListDirective>) -> bool {
    directive.map_or(true, SourceListDirective::allow_eval)
}

/// A nonce or hash in the list disables `'unsafe-inline'`.
fn check_inline(directive: Option<&SourceListDirective>) -> bool {
    directive.map_or(true, |d| d.allow_inline() && !d.is_hash_or_nonce_present())
}

fn check_nonce(directive: Option<&SourceListDirective>, nonce: &str) -> bool {
    directive.map_or(true, |d| d.allow_nonce(nonce))
}

fn check_hash(directive: Option<&SourceListDirective>, hash: &HashValue) -> bool {
    directive.map_or(true, |d| d.allow_hash(hash))
}

fn check_source(directive: Option<&SourceListDirective>, url: &Url) -> bool {
    directive.map_or(true, |d| d.allows(url))
}

fn check_ancestors(directive: Option<&SourceListDirective>, ancestors: &[AncestorFrame]) -> bool {
    directive.map_or(true, |d| {
        ancestors.iter().all(|ancestor| match ancestor {
            AncestorFrame::Local(url) => d.allows(url),
            AncestorFrame::Remote => false,
        })
    })
}

fn check_media_type(directive: Option<&MediaListDirective>, mime_type: &str, type_attribute: &str) -> bool {
    directive.map_or(true, |d| {
        let declared = type_attribute.trim_matches(is_ascii_space);
        !declared.is_empty() && declared == mime_type && d.allows(mime_type)
    })
}

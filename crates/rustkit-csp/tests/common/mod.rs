//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rustkit_csp::{
    DirectiveList, HashAlgorithms, HeaderSource, HeaderType, PolicyConfig, PolicyHost, SandboxFlags, Violation,
};
use url::Url;

pub const DOCUMENT: &str = "https://example.com/index.html";

/// Everything a directive list told its host, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Violation(Violation),
    DuplicateDirective(String),
    UnsupportedDirective(String),
    InvalidValueCharacter(String, String),
    InvalidSource(String, String),
    DirectiveAsSource(String, String),
    InvalidPathCharacter(String, String, char),
    InvalidPluginTypes(String),
    InvalidSandboxFlags(String),
    InvalidReflectedXss(String),
    InvalidReferrer(String),
    InvalidInReportOnly(String),
    MissingReportUri(String),
    ReportOnlyInMeta(String),
    SandboxFlags(SandboxFlags),
    ScriptHashAlgorithms(HashAlgorithms),
    StyleHashAlgorithms(HashAlgorithms),
    BlockedScriptToInspector(String),
    DisableEval(String),
}

pub struct RecordingHost {
    base_url: Url,
    events: Mutex<Vec<Event>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base_url: url(DOCUMENT),
            events: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Violation(violation) => Some(violation),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl PolicyHost for RecordingHost {
    fn report_violation(&self, violation: &Violation) {
        self.record(Event::Violation(violation.clone()));
    }

    fn report_duplicate_directive(&self, name: &str) {
        self.record(Event::DuplicateDirective(name.to_string()));
    }

    fn report_unsupported_directive(&self, name: &str) {
        self.record(Event::UnsupportedDirective(name.to_string()));
    }

    fn report_invalid_directive_value_character(&self, name: &str, value: &str) {
        self.record(Event::InvalidValueCharacter(name.to_string(), value.to_string()));
    }

    fn report_invalid_source_expression(&self, directive: &str, source: &str) {
        self.record(Event::InvalidSource(directive.to_string(), source.to_string()));
    }

    fn report_directive_as_source_expression(&self, directive: &str, source: &str) {
        self.record(Event::DirectiveAsSource(directive.to_string(), source.to_string()));
    }

    fn report_invalid_path_character(&self, directive: &str, value: &str, invalid: char) {
        self.record(Event::InvalidPathCharacter(directive.to_string(), value.to_string(), invalid));
    }

    fn report_invalid_plugin_types(&self, plugin_type: &str) {
        self.record(Event::InvalidPluginTypes(plugin_type.to_string()));
    }

    fn report_invalid_sandbox_flags(&self, message: &str) {
        self.record(Event::InvalidSandboxFlags(message.to_string()));
    }

    fn report_invalid_reflected_xss(&self, value: &str) {
        self.record(Event::InvalidReflectedXss(value.to_string()));
    }

    fn report_invalid_referrer(&self, value: &str) {
        self.record(Event::InvalidReferrer(value.to_string()));
    }

    fn report_invalid_in_report_only(&self, name: &str) {
        self.record(Event::InvalidInReportOnly(name.to_string()));
    }

    fn report_missing_report_uri(&self, header: &str) {
        self.record(Event::MissingReportUri(header.to_string()));
    }

    fn report_report_only_in_meta(&self, header: &str) {
        self.record(Event::ReportOnlyInMeta(header.to_string()));
    }

    fn complete_url(&self, url: &str) -> Option<Url> {
        self.base_url.join(url).ok()
    }

    fn enforce_sandbox_flags(&self, flags: SandboxFlags) {
        self.record(Event::SandboxFlags(flags));
    }

    fn uses_script_hash_algorithms(&self, algorithms: HashAlgorithms) {
        self.record(Event::ScriptHashAlgorithms(algorithms));
    }

    fn uses_style_hash_algorithms(&self, algorithms: HashAlgorithms) {
        self.record(Event::StyleHashAlgorithms(algorithms));
    }

    fn report_blocked_script_execution_to_inspector(&self, directive_text: &str) {
        self.record(Event::BlockedScriptToInspector(directive_text.to_string()));
    }

    fn disable_eval(&self, message: &str) {
        self.record(Event::DisableEval(message.to_string()));
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub fn config(experimental: bool) -> PolicyConfig {
    PolicyConfig::for_document(DOCUMENT)
        .unwrap()
        .with_experimental_features(experimental)
}

/// Parse `header` for a document at [`DOCUMENT`] with experimental
/// directives enabled.
pub fn parse(header: &str, header_type: HeaderType) -> (DirectiveList, Arc<RecordingHost>) {
    parse_with(header, header_type, &config(true))
}

pub fn parse_with(header: &str, header_type: HeaderType, config: &PolicyConfig) -> (DirectiveList, Arc<RecordingHost>) {
    init_tracing();
    let host = RecordingHost::new();
    let list = DirectiveList::parse(header, header_type, HeaderSource::Http, config, host.clone());
    (list, host)
}

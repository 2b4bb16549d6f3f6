//! Directive names and the typed directive values held by a directive list.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::hash::{HashAlgorithms, HashValue};
use crate::source_list::SourceList;
use crate::tokenizer::{is_ascii_space, skip_while};
use crate::PolicyHost;

/// Every directive name the parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    DefaultSrc,
    ScriptSrc,
    ObjectSrc,
    FrameAncestors,
    FrameSrc,
    ImgSrc,
    StyleSrc,
    FontSrc,
    MediaSrc,
    ConnectSrc,
    Sandbox,
    ReportUri,
    // CSP 1.1, behind `PolicyConfig::experimental_features`
    BaseUri,
    ChildSrc,
    FormAction,
    PluginTypes,
    ReflectedXss,
    Referrer,
}

const DIRECTIVES: &[(&str, DirectiveKind)] = &[
    ("default-src", DirectiveKind::DefaultSrc),
    ("script-src", DirectiveKind::ScriptSrc),
    ("object-src", DirectiveKind::ObjectSrc),
    ("frame-ancestors", DirectiveKind::FrameAncestors),
    ("frame-src", DirectiveKind::FrameSrc),
    ("img-src", DirectiveKind::ImgSrc),
    ("style-src", DirectiveKind::StyleSrc),
    ("font-src", DirectiveKind::FontSrc),
    ("media-src", DirectiveKind::MediaSrc),
    ("connect-src", DirectiveKind::ConnectSrc),
    ("sandbox", DirectiveKind::Sandbox),
    ("report-uri", DirectiveKind::ReportUri),
    ("base-uri", DirectiveKind::BaseUri),
    ("child-src", DirectiveKind::ChildSrc),
    ("form-action", DirectiveKind::FormAction),
    ("plugin-types", DirectiveKind::PluginTypes),
    ("reflected-xss", DirectiveKind::ReflectedXss),
    ("referrer", DirectiveKind::Referrer),
];

impl DirectiveKind {
    /// Look up a directive name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        DIRECTIVES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        DIRECTIVES
            .iter()
            .find(|&&(_, kind)| kind == *self)
            .map_or("", |&(name, _)| name)
    }

    /// Only recognised when experimental features are enabled.
    pub fn is_experimental(&self) -> bool {
        matches!(
            self,
            DirectiveKind::BaseUri
                | DirectiveKind::ChildSrc
                | DirectiveKind::FormAction
                | DirectiveKind::PluginTypes
                | DirectiveKind::ReflectedXss
                | DirectiveKind::Referrer
        )
    }
}

impl FromStr for DirectiveKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DirectiveKind::from_name(s).ok_or(())
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A directive value type that can occupy a slot in the directive list.
pub trait Directive: Sized {
    fn parse(name: &str, value: &str, self_url: Option<&Url>, host: &dyn PolicyHost) -> Self;

    /// Name and value as written in the header, used in console messages.
    fn text(&self) -> &str;
}

fn directive_text(name: &str, value: &str) -> String {
    format!("{} {}", name, value).trim_end().to_string()
}

/// A directive whose value is a source list (`script-src`, `img-src`, ...).
#[derive(Debug, Clone)]
pub struct SourceListDirective {
    name: String,
    text: String,
    list: SourceList,
}

impl Directive for SourceListDirective {
    fn parse(name: &str, value: &str, self_url: Option<&Url>, host: &dyn PolicyHost) -> Self {
        Self {
            name: name.to_string(),
            text: directive_text(name, value),
            list: SourceList::parse(name, value, self_url, host),
        }
    }

    fn text(&self) -> &str {
        &self.text
    }
}

impl SourceListDirective {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allows(&self, url: &Url) -> bool {
        self.list.matches(url)
    }

    pub fn allow_inline(&self) -> bool {
        self.list.allow_inline()
    }

    pub fn allow_eval(&self) -> bool {
        self.list.allow_eval()
    }

    pub fn allow_nonce(&self, nonce: &str) -> bool {
        self.list.allow_nonce(nonce)
    }

    pub fn allow_hash(&self, hash: &HashValue) -> bool {
        self.list.allow_hash(hash)
    }

    pub fn is_hash_or_nonce_present(&self) -> bool {
        self.list.is_hash_or_nonce_present()
    }

    pub fn hash_algorithms_used(&self) -> HashAlgorithms {
        self.list.hash_algorithms_used()
    }
}

/// The `plugin-types` directive: a set of `type/subtype` tokens.
#[derive(Debug, Clone)]
pub struct MediaListDirective {
    name: String,
    text: String,
    plugin_types: HashSet<String>,
}

impl Directive for MediaListDirective {
    fn parse(name: &str, value: &str, _self_url: Option<&Url>, host: &dyn PolicyHost) -> Self {
        Self {
            name: name.to_string(),
            text: directive_text(name, value),
            plugin_types: parse_media_list(value, host),
        }
    }

    fn text(&self) -> &str {
        &self.text
    }
}

impl MediaListDirective {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allows(&self, mime_type: &str) -> bool {
        self.plugin_types.contains(mime_type)
    }
}

fn parse_media_list(value: &str, host: &dyn PolicyHost) -> HashSet<String> {
    let mut types = HashSet::new();

    // 'plugin-types ____;' OR 'plugin-types;'
    if value.is_empty() {
        host.report_invalid_plugin_types("");
        return types;
    }

    for token in value.split(is_ascii_space).filter(|t| !t.is_empty()) {
        if is_media_type(token) {
            types.insert(token.to_string());
        } else {
            host.report_invalid_plugin_types(token);
        }
    }

    types
}

/// `type/subtype`, each side non-empty and free of further slashes.
fn is_media_type(token: &str) -> bool {
    let is_media_type_character = |c: char| !is_ascii_space(c) && c != '/';
    let slash = skip_while(token, 0, is_media_type_character);
    if slash == 0 || !token[slash..].starts_with('/') {
        return false;
    }
    let subtype_begin = slash + 1;
    let end = skip_while(token, subtype_begin, is_media_type_character);
    end > subtype_begin && end == token.len()
}

//! Source lists: the value grammar shared by every `*-src` directive.
//!
//! ```text
//! source-list       = *WSP [ source-expression *( 1*WSP source-expression ) *WSP ]
//!                   / *WSP "'none'" *WSP
//! source-expression = scheme-source / host-source / keyword-source
//!                   / nonce-source / hash-source
//! ```

use std::collections::HashSet;

use tracing::{debug, trace};
use url::Url;

use crate::directive::DirectiveKind;
use crate::hash::{HashAlgorithm, HashAlgorithms, HashValue};
use crate::origin::{default_port, inner_url};
use crate::tokenizer::{is_ascii_space, skip_while};
use crate::{PolicyHost, SourceError};

/// One parsed source expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CspSource {
    /// `*` - any URL with a network scheme
    Star,
    /// `'self'` - the protected document's origin
    Self_,
    /// `'unsafe-inline'` - inline scripts/styles allowed
    UnsafeInline,
    /// `'unsafe-eval'` - eval() allowed
    UnsafeEval,
    /// `'nonce-xxx'` - specific nonce value
    Nonce(String),
    /// `'sha256-xxx'` or similar hash
    Hash(HashValue),
    /// Scheme source (e.g. `https:`), stored without the colon
    Scheme(String),
    /// Host source (e.g. `https://*.example.com:443/static/`)
    Host(HostSource),
}

impl CspSource {
    /// Parse a single source expression.
    pub fn parse(expression: &str) -> Result<Self, SourceError> {
        parse_source(expression, &mut |_| {})
    }
}

/// A host source, optionally with scheme, port and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSource {
    pub scheme: Option<String>,
    /// Host without the `*.` prefix. Empty for a bare `*` host.
    pub host: String,
    pub host_wildcard: bool,
    pub port: Option<u16>,
    pub port_wildcard: bool,
    /// Percent-decoded path.
    pub path: Option<String>,
}

impl HostSource {
    /// Check a URL against this source. `self_scheme` is the scheme of the
    /// protected document, used when the source has none.
    pub fn matches(&self, url: &Url, self_scheme: Option<&str>) -> bool {
        self.scheme_matches(url, self_scheme)
            && self.host_matches(url)
            && self.port_matches(url)
            && self.path_matches(url)
    }

    fn scheme_matches(&self, url: &Url, self_scheme: Option<&str>) -> bool {
        match (&self.scheme, self_scheme) {
            (Some(scheme), _) => url.scheme().eq_ignore_ascii_case(scheme),
            // An http: document also accepts https: for scheme-less sources
            (None, None) | (None, Some("http")) => matches!(url.scheme(), "http" | "https"),
            (None, Some(self_scheme)) => url.scheme().eq_ignore_ascii_case(self_scheme),
        }
    }

    fn host_matches(&self, url: &Url) -> bool {
        if self.host.is_empty() {
            return self.host_wildcard;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.host_wildcard {
            let suffix = format!(".{}", self.host.to_ascii_lowercase());
            host.to_ascii_lowercase().ends_with(&suffix)
        } else {
            host.eq_ignore_ascii_case(&self.host)
        }
    }

    fn port_matches(&self, url: &Url) -> bool {
        if self.port_wildcard {
            return true;
        }
        match (self.port, url.port()) {
            (expected, actual) if expected == actual => true,
            (Some(expected), None) => default_port(url.scheme()) == Some(expected),
            _ => false,
        }
    }

    fn path_matches(&self, url: &Url) -> bool {
        let Some(ref expected) = self.path else {
            return true;
        };
        let path = urlencoding::decode(url.path())
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| url.path().to_string());
        if expected.ends_with('/') {
            path.starts_with(expected.as_str())
        } else {
            path == *expected
        }
    }
}

/// A parsed source list.
#[derive(Debug, Clone, Default)]
pub struct SourceList {
    allow_star: bool,
    allow_self: bool,
    allow_inline: bool,
    allow_eval: bool,
    nonces: HashSet<String>,
    hashes: HashSet<HashValue>,
    hash_algorithms_used: HashAlgorithms,
    sources: Vec<CspSource>,
    self_source: Option<HostSource>,
}

impl SourceList {
    /// Parse a directive value. Invalid expressions are dropped and
    /// reported to `host`.
    pub fn parse(
        directive_name: &str,
        value: &str,
        self_url: Option<&Url>,
        host: &dyn PolicyHost,
    ) -> Self {
        let mut list = SourceList {
            self_source: self_url.map(self_source_for),
            ..Default::default()
        };

        // 'none' is represented as an empty list
        if is_source_list_none(value) {
            return list;
        }

        for expression in value.split(is_ascii_space).filter(|e| !e.is_empty()) {
            let mut on_path_char =
                |c: char| host.report_invalid_path_character(directive_name, expression, c);
            match parse_source(expression, &mut on_path_char) {
                Ok(source) => {
                    trace!(directive = directive_name, ?source, "parsed source expression");
                    list.add(directive_name, source, host);
                }
                Err(error) => {
                    debug!(directive = directive_name, expression, %error, "dropping source expression");
                    host.report_invalid_source_expression(directive_name, expression);
                }
            }
        }

        list
    }

    fn add(&mut self, directive_name: &str, source: CspSource, host: &dyn PolicyHost) {
        match source {
            CspSource::Star => self.allow_star = true,
            CspSource::Self_ => self.allow_self = true,
            CspSource::UnsafeInline => self.allow_inline = true,
            CspSource::UnsafeEval => self.allow_eval = true,
            CspSource::Nonce(nonce) => {
                self.nonces.insert(nonce);
            }
            CspSource::Hash(hash) => {
                self.hash_algorithms_used |= hash.algorithm.flag();
                self.hashes.insert(hash);
            }
            CspSource::Host(h) => {
                // Usually a missing ';' between two directives
                if h.scheme.is_none() && DirectiveKind::from_name(&h.host).is_some() {
                    host.report_directive_as_source_expression(directive_name, &h.host);
                }
                self.sources.push(CspSource::Host(h));
            }
            scheme @ CspSource::Scheme(_) => self.sources.push(scheme),
        }
    }

    /// Check whether a URL is allowed by this list.
    pub fn matches(&self, url: &Url) -> bool {
        if self.allow_star && !matches!(url.scheme(), "data" | "blob" | "filesystem") {
            return true;
        }

        let inner = inner_url(url);
        let effective = inner.as_ref().unwrap_or(url);
        let self_scheme = self.self_source.as_ref().and_then(|s| s.scheme.as_deref());

        if self.allow_self {
            if let Some(ref own) = self.self_source {
                if own.matches(effective, self_scheme) {
                    return true;
                }
            }
        }

        self.sources.iter().any(|source| match source {
            CspSource::Scheme(scheme) => url.scheme().eq_ignore_ascii_case(scheme),
            CspSource::Host(h) => h.matches(effective, self_scheme),
            _ => false,
        })
    }

    pub fn allow_inline(&self) -> bool {
        self.allow_inline
    }

    pub fn allow_eval(&self) -> bool {
        self.allow_eval
    }

    pub fn allow_nonce(&self, nonce: &str) -> bool {
        let nonce = nonce.trim_matches(is_ascii_space);
        !nonce.is_empty() && self.nonces.contains(nonce)
    }

    pub fn allow_hash(&self, hash: &HashValue) -> bool {
        self.hashes.contains(hash)
    }

    pub fn is_hash_or_nonce_present(&self) -> bool {
        !self.nonces.is_empty() || !self.hash_algorithms_used.is_empty()
    }

    pub fn hash_algorithms_used(&self) -> HashAlgorithms {
        self.hash_algorithms_used
    }
}

fn self_source_for(url: &Url) -> HostSource {
    HostSource {
        scheme: Some(url.scheme().to_string()),
        host: url.host_str().unwrap_or("").to_string(),
        host_wildcard: false,
        port: url.port(),
        port_wildcard: false,
        path: None,
    }
}

fn is_source_list_none(value: &str) -> bool {
    value
        .trim_matches(is_ascii_space)
        .eq_ignore_ascii_case("'none'")
}

fn parse_source(
    expression: &str,
    on_invalid_path_char: &mut dyn FnMut(char),
) -> Result<CspSource, SourceError> {
    if expression.eq_ignore_ascii_case("'none'") {
        return Err(SourceError::NoneNotAlone);
    }
    if expression == "*" {
        return Ok(CspSource::Star);
    }
    if expression.eq_ignore_ascii_case("'self'") {
        return Ok(CspSource::Self_);
    }
    if expression.eq_ignore_ascii_case("'unsafe-inline'") {
        return Ok(CspSource::UnsafeInline);
    }
    if expression.eq_ignore_ascii_case("'unsafe-eval'") {
        return Ok(CspSource::UnsafeEval);
    }
    if let Some(nonce) = parse_nonce(expression)? {
        return Ok(CspSource::Nonce(nonce));
    }
    if let Some(hash) = parse_hash(expression)? {
        return Ok(CspSource::Hash(hash));
    }

    let is_colon_or_slash = |c: char| c == ':' || c == '/';
    let end = expression.len();
    let mut position = skip_while(expression, 0, |c| !is_colon_or_slash(c));

    // host
    if position == end {
        let (host, host_wildcard) = parse_host(expression)?;
        return Ok(CspSource::Host(HostSource {
            scheme: None,
            host,
            host_wildcard,
            port: None,
            port_wildcard: false,
            path: None,
        }));
    }

    let mut scheme = None;
    let mut host_begin = 0;
    let mut port_begin = None;

    if expression[position..].starts_with(':') {
        // scheme:
        if position + 1 == end {
            return Ok(CspSource::Scheme(parse_scheme(&expression[..position])?));
        }
        // scheme://host
        if expression[position + 1..].starts_with('/') {
            scheme = Some(parse_scheme(&expression[..position])?);
            if !expression[position..].starts_with("://") {
                return Err(SourceError::MissingHost);
            }
            position += 3;
            if position == end {
                return Err(SourceError::MissingHost);
            }
            host_begin = position;
            position = skip_while(expression, position, |c| !is_colon_or_slash(c));
        }
        // host:port
        if expression[position..].starts_with(':') {
            port_begin = Some(position);
            position = skip_while(expression, position, |c| c != '/');
        }
    }

    let mut path_begin = None;
    if expression[position..].starts_with('/') {
        if position == host_begin {
            return Err(SourceError::MissingHost);
        }
        path_begin = Some(position);
    }

    let host_end = port_begin.or(path_begin).unwrap_or(end);
    let (host, host_wildcard) = parse_host(&expression[host_begin..host_end])?;

    let (port, port_wildcard) = match port_begin {
        Some(begin) => parse_port(&expression[begin + 1..path_begin.unwrap_or(end)])?,
        None => (None, false),
    };

    let path = path_begin.map(|begin| parse_path(&expression[begin..], on_invalid_path_char));

    Ok(CspSource::Host(HostSource {
        scheme,
        host,
        host_wildcard,
        port,
        port_wildcard,
        path,
    }))
}

/// `Ok(None)` when the expression is not a nonce source at all.
fn parse_nonce(expression: &str) -> Result<Option<String>, SourceError> {
    const PREFIX: &str = "'nonce-";
    let Some(rest) = strip_prefix_ignore_case(expression, PREFIX) else {
        return Ok(None);
    };
    let nonce = rest.strip_suffix('\'').ok_or(SourceError::InvalidNonce)?;
    if nonce.is_empty() || !nonce.chars().all(is_base64_character) {
        return Err(SourceError::InvalidNonce);
    }
    Ok(Some(nonce.to_string()))
}

/// `Ok(None)` when the expression is not a hash source at all.
fn parse_hash(expression: &str) -> Result<Option<HashValue>, SourceError> {
    for algorithm in HashAlgorithm::ALL {
        let Some(rest) = strip_prefix_ignore_case(expression, algorithm.source_prefix()) else {
            continue;
        };
        let encoded = rest.strip_suffix('\'').ok_or(SourceError::InvalidHash)?;
        let digits = encoded.trim_end_matches('=');
        if encoded.len() - digits.len() > 2 || !digits.chars().all(is_base64_character) {
            return Err(SourceError::InvalidHash);
        }
        return HashValue::from_base64(algorithm, encoded)
            .map(Some)
            .ok_or(SourceError::InvalidHash);
    }
    Ok(None)
}

fn parse_scheme(scheme: &str) -> Result<String, SourceError> {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return Err(SourceError::InvalidScheme),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return Err(SourceError::InvalidScheme);
    }
    Ok(scheme.to_string())
}

fn parse_host(host: &str) -> Result<(String, bool), SourceError> {
    if host == "*" {
        return Ok((String::new(), true));
    }
    let (labels, wildcard) = match host.strip_prefix("*.") {
        Some(rest) => (rest, true),
        None => (host, false),
    };
    if labels.is_empty() {
        return Err(SourceError::InvalidHost);
    }
    let trimmed = labels.strip_suffix('.').unwrap_or(labels);
    let valid = trimmed.split('.').all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !valid {
        return Err(SourceError::InvalidHost);
    }
    Ok((labels.to_string(), wildcard))
}

fn parse_port(port: &str) -> Result<(Option<u16>, bool), SourceError> {
    if port == "*" {
        return Ok((None, true));
    }
    if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
        return Err(SourceError::InvalidPort);
    }
    port.parse::<u16>()
        .map(|p| (Some(p), false))
        .map_err(|_| SourceError::InvalidPort)
}

fn parse_path(path: &str, on_invalid_path_char: &mut dyn FnMut(char)) -> String {
    let end = skip_while(path, 0, |c| c != '?' && c != '#');
    if let Some(c) = path[end..].chars().next() {
        on_invalid_path_char(c);
    }
    let raw = &path[..end];
    urlencoding::decode(raw)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn is_base64_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_' | '=')
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LoggingHost;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn list(value: &str) -> SourceList {
        let own = url("https://example.com/index.html");
        SourceList::parse("script-src", value, Some(&own), &LoggingHost::default())
    }

    #[test]
    fn test_csp_source_parse() {
        assert_eq!(CspSource::parse("'self'").unwrap(), CspSource::Self_);
        assert_eq!(CspSource::parse("'UNSAFE-INLINE'").unwrap(), CspSource::UnsafeInline);
        assert_eq!(CspSource::parse("'unsafe-eval'").unwrap(), CspSource::UnsafeEval);
        assert_eq!(CspSource::parse("https:").unwrap(), CspSource::Scheme("https".into()));
        assert_eq!(CspSource::parse("'nonce-abc123'").unwrap(), CspSource::Nonce("abc123".into()));
        assert_eq!(CspSource::parse("'none'"), Err(SourceError::NoneNotAlone));
    }

    #[test]
    fn test_host_source_parse() {
        let CspSource::Host(source) = CspSource::parse("https://*.example.com:8443/static/").unwrap() else {
            panic!("Expected host source");
        };
        assert_eq!(source.scheme.as_deref(), Some("https"));
        assert_eq!(source.host, "example.com");
        assert!(source.host_wildcard);
        assert_eq!(source.port, Some(8443));
        assert_eq!(source.path.as_deref(), Some("/static/"));
    }

    #[test]
    fn test_invalid_sources() {
        assert_eq!(CspSource::parse("'nonce-'"), Err(SourceError::InvalidNonce));
        assert_eq!(CspSource::parse("'nonce-a b'"), Err(SourceError::InvalidNonce));
        assert_eq!(CspSource::parse("'sha256-!!'"), Err(SourceError::InvalidHash));
        assert_eq!(CspSource::parse("1http://example.com"), Err(SourceError::InvalidScheme));
        assert_eq!(CspSource::parse("example..com"), Err(SourceError::InvalidHost));
        assert_eq!(CspSource::parse("example.com:99999"), Err(SourceError::InvalidPort));
        assert_eq!(CspSource::parse("https://"), Err(SourceError::MissingHost));
        assert_eq!(CspSource::parse("/path"), Err(SourceError::MissingHost));
    }

    #[test]
    fn test_none_is_empty() {
        let none = list(" 'none' ");
        assert!(!none.matches(&url("https://example.com/a.js")));
        assert!(!none.allow_inline());
    }

    #[test]
    fn test_self_matches_own_origin_only() {
        let self_only = list("'self'");
        assert!(self_only.matches(&url("https://example.com/app.js")));
        assert!(!self_only.matches(&url("http://example.com/app.js")));
        assert!(!self_only.matches(&url("https://cdn.example.com/app.js")));
    }

    #[test]
    fn test_star_excludes_local_schemes() {
        let star = list("*");
        assert!(star.matches(&url("https://anything.test/x")));
        assert!(!star.matches(&url("data:text/javascript,1")));
        assert!(list("* data:").matches(&url("data:text/javascript,1")));
    }

    #[test]
    fn test_wildcard_host() {
        let wildcard = list("*.example.com");
        assert!(wildcard.matches(&url("https://cdn.example.com/a.js")));
        assert!(!wildcard.matches(&url("https://example.com/a.js")));
        assert!(!wildcard.matches(&url("ftp://cdn.example.com/a.js")));
    }

    #[test]
    fn test_port_matching() {
        assert!(list("example.com:443").matches(&url("https://example.com/")));
        assert!(!list("example.com").matches(&url("https://example.com:8443/")));
        assert!(list("example.com:*").matches(&url("https://example.com:8443/")));
    }

    #[test]
    fn test_path_matching() {
        let dir = list("https://example.com/js/");
        assert!(dir.matches(&url("https://example.com/js/app.js")));
        assert!(!dir.matches(&url("https://example.com/css/app.css")));

        let file = list("https://example.com/js/app.js");
        assert!(file.matches(&url("https://example.com/js/app.js?v=2")));
        assert!(!file.matches(&url("https://example.com/js/app.js/extra")));
    }

    #[test]
    fn test_blob_matched_by_inner_origin() {
        let blob = url("blob:https://example.com/0b3b7d1e");
        assert!(list("'self'").matches(&blob));
        assert!(list("blob:").matches(&blob));
        assert!(!list("https://other.test").matches(&blob));
    }

    #[test]
    fn test_nonce_and_hash_bookkeeping() {
        let l = list("'nonce-abc' 'sha256-bhHHL3z2vDgxUt0W3dWQOrprscmda2Y5pLsLg4GF+pI='");
        assert!(l.allow_nonce("abc"));
        assert!(l.allow_nonce(" abc "));
        assert!(!l.allow_nonce("abd"));
        assert!(!l.allow_nonce(""));
        assert!(l.is_hash_or_nonce_present());
        assert_eq!(l.hash_algorithms_used(), HashAlgorithms::SHA256);
        assert!(l.allow_hash(&HashValue::compute(HashAlgorithm::Sha256, "alert(1)")));
    }
}

//! # RustKit CSP
//!
//! Content Security Policy parsing and enforcement for the RustKit browser engine.
//!
//! ## Design Goals
//!
//! 1. **Total parsing**: Malformed headers never fail; bad parts are reported and dropped
//! 2. **Host callbacks**: Violations and parse errors go to a [`PolicyHost`]
//! 3. **Report-only mode**: Policies that report without blocking
//! 4. **Multiple policies**: [`ContentSecurityPolicy`] combines every header a document receives
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rustkit_csp::{DirectiveList, HeaderSource, HeaderType, LoggingHost, PolicyConfig, ReportingStatus};
//! use url::Url;
//!
//! let list = DirectiveList::parse(
//!     "default-src 'none'; img-src https://example.com",
//!     HeaderType::Enforce,
//!     HeaderSource::Http,
//!     &PolicyConfig::new(),
//!     Arc::new(LoggingHost::default()),
//! );
//!
//! let image = Url::parse("https://example.com/a.png").unwrap();
//! assert!(list.allow_image_from_source(&image, ReportingStatus::SendReport));
//!
//! let script = Url::parse("https://example.com/a.js").unwrap();
//! assert!(!list.allow_script_from_source(&script, ReportingStatus::SuppressReport));
//! ```

pub mod config;
pub mod directive;
pub mod directive_list;
pub mod error;
pub mod hash;
pub mod host;
pub mod origin;
pub mod policy;
pub mod sandbox;
pub mod source_list;
pub mod tokenizer;
pub mod violation;

pub use config::PolicyConfig;
pub use directive::{Directive, DirectiveKind, MediaListDirective, SourceListDirective};
pub use directive_list::{AncestorFrame, DirectiveList, ReferrerPolicy, ReflectedXssDisposition};
pub use error::{CspError, SourceError};
pub use hash::{HashAlgorithm, HashAlgorithms, HashValue};
pub use host::{LoggingHost, PolicyHost};
pub use origin::Origin;
pub use policy::ContentSecurityPolicy;
pub use sandbox::{parse_sandbox_policy, SandboxFlags};
pub use source_list::{CspSource, HostSource, SourceList};
pub use violation::{strip_url_for_report, Violation, ViolationReport};

/// Which header delivered a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeaderType {
    /// `Content-Security-Policy`: violations are blocked and reported.
    #[default]
    Enforce,
    /// `Content-Security-Policy-Report-Only`: violations are only reported.
    Report,
}

/// Where a policy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeaderSource {
    #[default]
    Http,
    /// A `<meta http-equiv>` element.
    Meta,
}

/// Whether a failed check should be reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportingStatus {
    SendReport,
    SuppressReport,
}

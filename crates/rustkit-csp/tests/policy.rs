//! Several policies on one document, and the report body built from a
//! violation.

mod common;

use std::sync::Arc;

use common::{config, url, Event, RecordingHost, DOCUMENT};
use rustkit_csp::{ContentSecurityPolicy, HeaderSource, HeaderType, ReportingStatus, ViolationReport};

fn policy(headers: &[(&str, HeaderType, HeaderSource)]) -> (ContentSecurityPolicy, Arc<RecordingHost>) {
    common::init_tracing();
    let host = RecordingHost::new();
    let mut csp = ContentSecurityPolicy::new(config(true), host.clone());
    for &(header, header_type, source) in headers {
        csp.did_receive_header(header, header_type, source);
    }
    (csp, host)
}

#[test]
fn every_policy_reports() {
    let (csp, host) = policy(&[
        ("img-src 'none'", HeaderType::Enforce, HeaderSource::Http),
        ("img-src 'self', img-src https://cdn.test", HeaderType::Enforce, HeaderSource::Http),
    ]);
    assert_eq!(csp.policies().len(), 3);

    assert!(!csp.allow_image_from_source(&url("https://evil.test/x.png"), ReportingStatus::SendReport));
    assert_eq!(host.violations().len(), 3);
}

#[test]
fn report_only_policy_reports_without_blocking() {
    let (csp, host) = policy(&[
        ("img-src *", HeaderType::Enforce, HeaderSource::Http),
        ("img-src 'self'; report-uri /csp", HeaderType::Report, HeaderSource::Http),
    ]);

    assert!(csp.allow_image_from_source(&url("https://evil.test/x.png"), ReportingStatus::SendReport));
    let violations = host.violations();
    assert_eq!(violations.len(), 1);
    assert!(violations[0].report_only);
    assert!(violations[0].console_message.starts_with("[Report Only] "));
}

#[test]
fn enforced_eval_restriction_disables_eval() {
    let (_, host) = policy(&[("script-src 'self'", HeaderType::Enforce, HeaderSource::Http)]);
    assert_eq!(
        host.count(|e| matches!(e, Event::DisableEval(_))),
        1
    );
    assert!(host.events().contains(&Event::DisableEval(
        "Refused to evaluate a string as JavaScript because 'unsafe-eval' is not an allowed source of script in the following Content Security Policy directive: \"script-src 'self'\".".into()
    )));

    let (_, host) = policy(&[("script-src 'self'; report-uri /csp", HeaderType::Report, HeaderSource::Http)]);
    assert_eq!(host.count(|e| matches!(e, Event::DisableEval(_))), 0);

    let (_, host) = policy(&[("script-src 'unsafe-eval'", HeaderType::Enforce, HeaderSource::Http)]);
    assert_eq!(host.count(|e| matches!(e, Event::DisableEval(_))), 0);
}

#[test]
fn report_only_meta_policy_is_ignored() {
    let (csp, host) = policy(&[("script-src 'none'", HeaderType::Report, HeaderSource::Meta)]);
    assert!(!csp.is_active());
    assert_eq!(host.events(), vec![Event::ReportOnlyInMeta("script-src 'none'".into())]);

    let (csp, _) = policy(&[("script-src 'none'", HeaderType::Enforce, HeaderSource::Meta)]);
    assert!(csp.is_active());
    assert_eq!(csp.policies()[0].header_source(), HeaderSource::Meta);
}

#[test]
fn inline_hash_must_match_every_policy() {
    const ALERT: &str = "'sha256-bhHHL3z2vDgxUt0W3dWQOrprscmda2Y5pLsLg4GF+pI='";
    let both = format!("script-src {}", ALERT);

    let (csp, _) = policy(&[
        (both.as_str(), HeaderType::Enforce, HeaderSource::Http),
        (both.as_str(), HeaderType::Enforce, HeaderSource::Http),
    ]);
    assert!(csp.allow_script_with_hash("alert(1)"));

    let (csp, _) = policy(&[
        (both.as_str(), HeaderType::Enforce, HeaderSource::Http),
        ("script-src 'self'", HeaderType::Enforce, HeaderSource::Http),
    ]);
    assert!(!csp.allow_script_with_hash("alert(1)"));
}

#[test]
fn nonce_must_match_every_policy() {
    let (csp, _) = policy(&[
        ("script-src 'nonce-abc'", HeaderType::Enforce, HeaderSource::Http),
        ("script-src 'nonce-abc' 'nonce-def'", HeaderType::Enforce, HeaderSource::Http),
    ]);
    assert!(csp.allow_script_nonce("abc"));
    assert!(!csp.allow_script_nonce("def"));
}

#[test]
fn violation_becomes_report_body() {
    let (csp, host) = policy(&[(
        "default-src 'none'; img-src https://example.com; report-uri /csp",
        HeaderType::Enforce,
        HeaderSource::Http,
    )]);
    assert_eq!(csp.report_uris(), vec![url("https://example.com/csp")]);

    assert!(!csp.allow_image_from_source(
        &url("https://evil.test/tracker.png?id=42"),
        ReportingStatus::SendReport
    ));
    let violation = host.violations().remove(0);
    assert_eq!(violation.report_uris, vec![url("https://example.com/csp")]);

    let report = violation.to_report(&url(DOCUMENT), Some(&url("https://search.test/q#top")), 200);
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    let body = &json["csp-report"];

    assert_eq!(body["document-uri"], DOCUMENT);
    assert_eq!(body["referrer"], "https://search.test/q");
    assert_eq!(body["violated-directive"], "img-src https://example.com");
    assert_eq!(body["effective-directive"], "img-src");
    assert_eq!(
        body["original-policy"],
        "default-src 'none'; img-src https://example.com; report-uri /csp"
    );
    assert_eq!(body["blocked-uri"], "https://evil.test");
    assert_eq!(body["status-code"], 200);

    let parsed = ViolationReport::from_json(&report.to_json().unwrap()).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn inline_violation_report_carries_source_location() {
    let (csp, host) = policy(&[("script-src 'self'", HeaderType::Enforce, HeaderSource::Http)]);
    let document = url(DOCUMENT);
    assert!(!csp.allow_inline_script(Some(&document), 42, ReportingStatus::SendReport));

    let report = host.violations()[0].to_report(&document, None, 0);
    assert_eq!(report.source_file.as_deref(), Some(DOCUMENT));
    assert_eq!(report.line_number, Some(42));
    assert_eq!(report.blocked_uri, "");
}

//! The `sandbox` directive.

use bitflags::bitflags;

bitflags! {
    /// Restrictions applied to a sandboxed document. A set bit means the
    /// feature is blocked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SandboxFlags: u32 {
        const NAVIGATION = 1 << 0;
        const PLUGINS = 1 << 1;
        const ORIGIN = 1 << 2;
        const FORMS = 1 << 3;
        const SCRIPTS = 1 << 4;
        const TOP_NAVIGATION = 1 << 5;
        const POPUPS = 1 << 6;
        const AUTOMATIC_FEATURES = 1 << 7;
        const POINTER_LOCK = 1 << 8;
        const DOCUMENT_DOMAIN = 1 << 9;
    }
}

impl Default for SandboxFlags {
    /// A bare `sandbox` blocks everything.
    fn default() -> Self {
        SandboxFlags::all()
    }
}

/// Parse a sandbox token list.
///
/// Starts from [`SandboxFlags::all`] and lifts one restriction per
/// recognised `allow-*` keyword. Unknown tokens are kept aside and
/// returned as a console-ready message; the recognised ones still apply.
pub fn parse_sandbox_policy(policy: &str) -> (SandboxFlags, Option<String>) {
    let mut flags = SandboxFlags::all();
    let mut invalid: Vec<&str> = Vec::new();

    for token in policy.split_ascii_whitespace() {
        match token.to_ascii_lowercase().as_str() {
            "allow-same-origin" => flags.remove(SandboxFlags::ORIGIN),
            "allow-forms" => flags.remove(SandboxFlags::FORMS),
            "allow-scripts" => {
                flags.remove(SandboxFlags::SCRIPTS);
                flags.remove(SandboxFlags::AUTOMATIC_FEATURES);
            }
            "allow-top-navigation" => flags.remove(SandboxFlags::TOP_NAVIGATION),
            "allow-popups" => flags.remove(SandboxFlags::POPUPS),
            "allow-pointer-lock" => flags.remove(SandboxFlags::POINTER_LOCK),
            _ => invalid.push(token),
        }
    }

    if invalid.is_empty() {
        return (flags, None);
    }

    let quoted: Vec<String> = invalid.iter().map(|t| format!("'{}'", t)).collect();
    let message = if invalid.len() > 1 {
        format!("{} are invalid sandbox flags.", quoted.join(", "))
    } else {
        format!("{} is an invalid sandbox flag.", quoted[0])
    };
    (flags, Some(message))
}

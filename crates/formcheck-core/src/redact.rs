//! Redaction of credential-like material before text reaches a log.
//!
//! Provider error bodies and raw model payloads are logged for diagnosis.
//! They can echo API keys or bearer tokens back, so everything passes
//! through [`redact_secrets`] first.

use lazy_static::lazy_static;
use regex::Regex;

/// Replacement text for redacted spans.
pub const REDACTED: &str = "[REDACTED]";

/// Longest diagnostic snippet kept in a log line.
pub const MAX_SNIPPET_CHARS: usize = 512;

lazy_static! {
    /// OpenAI-style secret keys (sk-..., sk-proj-...)
    static ref SECRET_KEY_PATTERN: Regex = Regex::new(
        r"\bsk-[A-Za-z0-9_-]{8,}"
    ).unwrap();

    /// Bearer tokens in echoed headers
    static ref BEARER_PATTERN: Regex = Regex::new(
        r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]{8,}"
    ).unwrap();

    /// key=value / key: value pairs naming a credential
    static ref ASSIGNMENT_PATTERN: Regex = Regex::new(
        r#"(?i)\b(api[_-]?key|access[_-]?token|auth[_-]?token|secret|password)(["']?\s*[:=]\s*["']?)[A-Za-z0-9._-]{8,}"#
    ).unwrap();
}

/// Replace credential-like spans in `text` with [`REDACTED`].
pub fn redact_secrets(text: &str) -> String {
    let text = SECRET_KEY_PATTERN.replace_all(text, REDACTED);
    let text = BEARER_PATTERN.replace_all(&text, format!("Bearer {}", REDACTED).as_str());
    let text = ASSIGNMENT_PATTERN.replace_all(&text, format!("${{1}}${{2}}{}", REDACTED).as_str());
    text.into_owned()
}

/// Redact and truncate text for a log line.
pub fn log_snippet(text: &str) -> String {
    let redacted = redact_secrets(text);
    if redacted.chars().count() <= MAX_SNIPPET_CHARS {
        return redacted;
    }
    let mut snippet: String = redacted.chars().take(MAX_SNIPPET_CHARS).collect();
    snippet.push_str("...");
    snippet
}

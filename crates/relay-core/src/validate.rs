//! Inbound payload validation and sanitization.
//!
//! A defense-in-depth filter, not a full sanitizer: rejects structurally
//! dangerous content outright, then normalizes what remains. All functions
//! are pure and sanitization is a stable fixed point -- validating an
//! already-validated message returns it unchanged.

use relay_types::error::ValidationError;

/// Hard ceiling on message text length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Hard ceiling on tenant identifier length, in characters.
pub const MAX_TENANT_ID_CHARS: usize = 50;

/// Structural-injection markers rejected outright (matched case-insensitively).
const DENYLIST: &[&str] = &[
    "<script",
    "</script",
    "javascript:",
    "eval(",
    "document.",
    "window.",
    "onerror=",
    "onload=",
];

/// Parse and validate a raw inbound payload, returning the sanitized
/// message text.
///
/// The payload must be a JSON object with a string `text` field. A
/// `sessionId` field is accepted on the wire but deliberately ignored:
/// the server-side session lookup is authoritative (one active session
/// per connection is enforced at write time).
pub fn parse_message(raw: &str) -> Result<String, ValidationError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| ValidationError::NotAnObject)?;

    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
    let text = object
        .get("text")
        .and_then(serde_json::Value::as_str)
        .ok_or(ValidationError::MissingText)?;

    validate_text(text)
}

/// Validate and sanitize message text.
pub fn validate_text(text: &str) -> Result<String, ValidationError> {
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ValidationError::TooLong(MAX_MESSAGE_CHARS));
    }

    let lowered = text.to_lowercase();
    if DENYLIST.iter().any(|marker| lowered.contains(marker)) {
        return Err(ValidationError::DisallowedContent);
    }

    let sanitized: String = text
        .trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect();
    let sanitized = strip_script_protocol(&sanitized);
    let sanitized: String = sanitized.chars().take(MAX_MESSAGE_CHARS).collect();

    if sanitized.is_empty() {
        return Err(ValidationError::Empty);
    }

    Ok(sanitized)
}

/// Remove `javascript:`-style protocol prefixes wherever they appear.
fn strip_script_protocol(text: &str) -> String {
    let mut out = text.to_string();
    // The denylist already rejects the canonical spelling; this catches
    // mixed-case remnants after angle-bracket stripping.
    loop {
        let lowered = out.to_lowercase();
        let Some(pos) = lowered.find("javascript:") else {
            break;
        };
        out.replace_range(pos..pos + "javascript:".len(), "");
    }
    out.trim().to_string()
}

/// Coerce arbitrary input into a safe tenant identifier.
///
/// Keeps only alphanumerics and hyphens, lowercases, and truncates. An
/// empty or absent result falls back to the given default tenant rather
/// than failing.
pub fn sanitize_tenant_id(raw: Option<&str>, default_tenant: &str) -> String {
    let sanitized: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_TENANT_ID_CHARS)
        .collect();

    if sanitized.is_empty() {
        default_tenant.to_string()
    } else {
        sanitized
    }
}

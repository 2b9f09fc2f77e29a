//! Inbound text hygiene for the agent-facing surface.
//!
//! The agent platform interprets `{...}` as template syntax, so every text
//! value coming from its endpoints is scrubbed before it is stored or
//! encoded back out.

const QUOTE_CHARS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Strip control characters (C0/C1), remove curly braces, trim surrounding
/// quote characters and whitespace. Whitespace is trimmed on both sides of
/// the quote pass so `  "testo"  ` loses its quotes too.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String =
        raw.chars().filter(|c| !c.is_control() && *c != '{' && *c != '}').collect();
    cleaned.trim().trim_matches(QUOTE_CHARS).trim().to_string()
}

/// Partial-update policy for client upserts: an incoming value that is
/// absent, blank, or zero-equivalent leaves the stored field unchanged.
pub fn is_empty_or_zero(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(text) => {
            let trimmed = text.trim();
            trimmed.is_empty() || trimmed == "0"
        }
    }
}

//! Text normalization.
//!
//! Produces the canonical form all keyword and catalog matching runs on:
//! lower-case ASCII letters, digits, hyphens and single spaces.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes arbitrary text for matching.
///
/// Lower-cases, decomposes and drops diacritical marks, maps dash-like code
/// points to `-`, turns every other character outside `[a-z0-9-]` into a
/// separator, collapses separators and trims. Idempotent.
///
/// ```rust
/// use mostrador_nlp::normalize;
///
/// assert_eq!(normalize("  ¿Cuánto SALE el Sérum—Iuven?  "), "cuanto sale el serum-iuven");
/// assert_eq!(normalize("Café"), normalize("cafe"));
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for ch in lowered.nfd() {
        if is_combining_mark(ch) {
            continue;
        }

        let ch = if is_dash(ch) { '-' } else { ch };

        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            if pending_separator && !out.is_empty() {
                out.push(' ');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Same as [`normalize`], treating a missing value as empty text.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

fn is_dash(ch: char) -> bool {
    matches!(
        ch,
        '\u{2010}'..='\u{2015}'
            | '\u{2212}'
            | '\u{2E3A}'
            | '\u{2E3B}'
            | '\u{FE58}'
            | '\u{FE63}'
            | '\u{FF0D}'
    )
}

/// Whether `term` (already normalized) occurs in `text` (already normalized)
/// as a whole word or whole phrase. Anything but a letter or digit bounds a
/// word, so `fps` is found in `fps-50`.
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() || text.len() < term.len() {
        return false;
    }

    text.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before_ok = text[..start].chars().next_back().map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Whether any of `terms` occurs in `text` as a whole word or phrase.
pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(text, term))
}

//! Continuation shape for follow-up messages.

use crate::lexicon::{STOPWORDS, VARIANT_TERMS};
use crate::query::clean_query;

/// Conjunctions that open a follow-up ("y la corporal?").
const CONTINUATIONS: &[&str] = &["y", "e", "tambien"];

/// Whether normalized text reads as a continuation of the previous exchange.
///
/// True when it opens with a continuation conjunction, or when every word is a
/// variant-distinguishing term or filler and at least one is a variant term.
pub fn is_continuation(normalized: &str) -> bool {
    let Some(first) = normalized.split_whitespace().next() else {
        return false;
    };
    if CONTINUATIONS.contains(&first) {
        return true;
    }

    let mut saw_variant = false;
    for token in normalized.split_whitespace() {
        if VARIANT_TERMS.contains(&token) {
            saw_variant = true;
        } else if !STOPWORDS.contains(&token) {
            return false;
        }
    }
    saw_variant
}

/// Joins the stored query with the product words the follow-up adds,
/// skipping words the stored query already has.
pub fn compose_follow_up_query(previous: &str, follow_up: &str) -> String {
    let previous = previous.trim();
    let mut query = previous.to_string();
    for term in clean_query(follow_up).split_whitespace() {
        if previous.split_whitespace().any(|existing| existing == term) {
            continue;
        }
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(term);
    }
    query
}

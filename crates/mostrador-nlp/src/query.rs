//! Product query cleaning.

use crate::lexicon;
use crate::normalize::normalize;

/// Buckets whose vocabulary describes the question rather than the product.
const INTENT_BUCKETS: &[&[&str]] = &[
    lexicon::GREETINGS,
    lexicon::PLEASANTRIES,
    lexicon::PRICE,
    lexicon::PROMOS,
    lexicon::INSTALLMENTS,
    lexicon::PAYMENTS,
    lexicon::SHIPPING,
    lexicon::ORDER,
    lexicon::INFO,
];

/// Reduces a message to the words that name a product.
///
/// Strips intent vocabulary, filler words, bare units, bare numbers and
/// quantity tokens like `30ml`. Returns normalized text, possibly empty.
///
/// ```rust
/// use mostrador_nlp::clean_query;
///
/// assert_eq!(clean_query("¿Cuánto sale la Piel Iluminada de 195 ml?"), "piel iluminada");
/// ```
pub fn clean_query(text: &str) -> String {
    let mut padded = format!(" {} ", normalize(text));

    let mut phrases: Vec<&str> = INTENT_BUCKETS
        .iter()
        .flat_map(|bucket| bucket.iter().copied())
        .filter(|term| term.contains(' '))
        .collect();
    phrases.sort_by_key(|phrase| std::cmp::Reverse(phrase.len()));

    for phrase in phrases {
        let needle = format!(" {phrase} ");
        while padded.contains(&needle) {
            padded = padded.replace(&needle, " ");
        }
    }

    padded
        .split_whitespace()
        .filter(|token| !is_noise(token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_noise(token: &str) -> bool {
    token.chars().all(|c| c == '-')
        || is_quantity(token)
        || lexicon::STOPWORDS.contains(&token)
        || lexicon::UNITS.contains(&token)
        || INTENT_BUCKETS.iter().any(|bucket| bucket.contains(&token))
}

/// `195`, `30ml`, `1.5l` style tokens.
fn is_quantity(token: &str) -> bool {
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    if digits_end == 0 {
        return false;
    }
    let suffix = &token[digits_end..];
    suffix.is_empty() || lexicon::UNITS.contains(&suffix)
}

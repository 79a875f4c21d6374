//! Fuzzy scoring of catalog entries against a cleaned query.
//!
//! Each query token of three or more characters scores 2 when the entry name
//! contains it and 1 when the slug does. The whole query appearing inside the
//! name adds 2 more. The best score wins, ties going to the earlier entry, and
//! nothing below the acceptance threshold is ever returned.

use mostrador_core::{CatalogEntry, MatchingConfig};
use mostrador_nlp::normalize;
use tracing::debug;

const NAME_HIT: u32 = 2;
const SLUG_HIT: u32 = 1;
const PHRASE_BONUS: u32 = 2;
const MIN_TOKEN_LEN: usize = 3;

/// A scored candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub entry: &'a CatalogEntry,
    pub score: u32,
}

/// Tokens of a normalized query that take part in scoring.
pub fn query_tokens(query: &str) -> Vec<&str> {
    query
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .collect()
}

/// Scores one entry against an already normalized query.
pub fn score(entry: &CatalogEntry, query: &str) -> u32 {
    let name = normalize(&entry.name);
    let slug = normalize(&entry.slug).replace('-', " ");

    let token_score: u32 = query_tokens(query)
        .into_iter()
        .map(|token| {
            let mut hits = 0;
            if name.contains(token) {
                hits += NAME_HIT;
            }
            if slug.contains(token) {
                hits += SLUG_HIT;
            }
            hits
        })
        .sum();

    let phrase = if !query.is_empty() && name.contains(query) {
        PHRASE_BONUS
    } else {
        0
    };

    token_score + phrase
}

/// The highest-scoring entry, ties going to the earliest. `None` when nothing
/// scores above zero.
pub fn best_match<'a>(entries: &'a [CatalogEntry], query: &str) -> Option<Match<'a>> {
    let query = normalize(query);
    let mut best: Option<Match<'a>> = None;

    for entry in entries {
        let score = score(entry, &query);
        if score > 0 && best.map_or(true, |b| score > b.score) {
            best = Some(Match { entry, score });
        }
    }

    best
}

/// Applies the acceptance threshold on top of [`best_match`].
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    min_score: u32,
}

impl Matcher {
    pub fn new(min_score: u32) -> Self {
        Self { min_score }
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    pub fn find<'a>(&self, entries: &'a [CatalogEntry], query: &str) -> Option<&'a CatalogEntry> {
        let candidate = best_match(entries, query)?;
        if candidate.score < self.min_score {
            debug!(
                query,
                best = %candidate.entry.name,
                score = candidate.score,
                min_score = self.min_score,
                "Best candidate below acceptance threshold"
            );
            return None;
        }

        debug!(query, matched = %candidate.entry.name, score = candidate.score, "Catalog match");
        Some(candidate.entry)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::from(MatchingConfig::default())
    }
}

impl From<MatchingConfig> for Matcher {
    fn from(config: MatchingConfig) -> Self {
        Self::new(config.min_score)
    }
}

//! Product resolution.
//!
//! Turns free text into at most one catalog entry. A live lookup that returns
//! a named record is authoritative. Otherwise the cached catalog is scored,
//! refreshed once if it was stale and nothing matched, and any partial live
//! fields are laid over the cache hit.

use mostrador_adapters::{bounded, CatalogAdapter};
use mostrador_core::CatalogEntry;
use mostrador_nlp::clean_query;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::cache::CatalogCache;
use crate::ingest;
use crate::matching::Matcher;

const DEFAULT_LIVE_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ProductResolver {
    catalog: Arc<dyn CatalogAdapter>,
    cache: Arc<CatalogCache>,
    matcher: Matcher,
    live_timeout: Duration,
}

impl ProductResolver {
    pub fn new(catalog: Arc<dyn CatalogAdapter>, cache: Arc<CatalogCache>) -> Self {
        Self {
            catalog,
            cache,
            matcher: Matcher::default(),
            live_timeout: DEFAULT_LIVE_TIMEOUT,
        }
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_live_timeout(mut self, timeout: Duration) -> Self {
        self.live_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// Resolves free text to one catalog entry, or `None` when no candidate
    /// is convincing enough. Upstream failures only narrow the search.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> Option<CatalogEntry> {
        let cleaned = clean_query(query);
        if cleaned.is_empty() {
            debug!("Nothing left to search for after cleaning");
            return None;
        }

        let live = self.live_lookup(&cleaned).await;
        if let Some(entry) = live.as_ref().filter(|entry| entry.is_valid()) {
            debug!(product = %entry.name, "Resolved by live lookup");
            return live;
        }

        let view = self.cache.ensure_view().await;
        let mut hit = self.matcher.find(&view.entries, &cleaned).cloned();

        if hit.is_none() && view.is_stale() {
            info!(query = %cleaned, "No match in stale snapshot, forcing one refresh");
            let refreshed = self.cache.refresh().await;
            hit = self.matcher.find(&refreshed, &cleaned).cloned();
        }

        match (hit, live) {
            (Some(cached), Some(partial)) => Some(merge(cached, partial)),
            (hit, _) => hit,
        }
    }

    async fn live_lookup(&self, query: &str) -> Option<CatalogEntry> {
        let lookup = bounded(self.live_timeout, "get_product", self.catalog.get_product(query));
        match lookup.await {
            Ok(Some(record)) => Some(ingest::project(&record)),
            Ok(None) => None,
            Err(e) => {
                warn!(query, error = %e, "Live product lookup failed, using cache");
                None
            }
        }
    }
}

/// Lays live fields over a cached entry. Live name, price and URL win when
/// present; live variants win when there are any.
pub fn merge(cached: CatalogEntry, live: CatalogEntry) -> CatalogEntry {
    let live_named = live.is_valid();
    CatalogEntry {
        id: cached.id.or(live.id),
        name: if live_named { live.name } else { cached.name },
        slug: if cached.slug.is_empty() { live.slug } else { cached.slug },
        url: live.url.or(cached.url),
        price: live.price.or(cached.price),
        promotional_price: live.promotional_price.or(cached.promotional_price),
        description: if cached.description.is_empty() {
            live.description
        } else {
            cached.description
        },
        tags: if cached.tags.is_empty() { live.tags } else { cached.tags },
        variants: if live.variants.is_empty() {
            cached.variants
        } else {
            live.variants
        },
        spf: live.spf.or(cached.spf),
    }
}

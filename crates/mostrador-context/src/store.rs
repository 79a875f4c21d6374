//! Per-user context store

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use mostrador_core::{ContextConfig, IntentKind};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// What is remembered about one user's last exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationContext {
    pub user_id: String,
    pub last_product_query: Option<String>,
    pub last_intent: Option<IntentKind>,
    pub last_brand: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationContext {
    fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            last_product_query: None,
            last_intent: None,
            last_brand: None,
            timestamp: now,
        }
    }

    fn is_expired_at(&self, now: DateTime<Utc>, ttl: ChronoDuration) -> bool {
        now - self.timestamp > ttl
    }

    fn apply(&mut self, patch: ContextPatch, now: DateTime<Utc>) {
        if let Some(query) = patch.last_product_query {
            self.last_product_query = Some(query);
        }
        if let Some(intent) = patch.last_intent {
            self.last_intent = Some(intent);
        }
        if let Some(brand) = patch.last_brand {
            self.last_brand = Some(brand);
        }
        self.timestamp = now;
    }
}

/// Fields to merge into a context. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextPatch {
    pub last_product_query: Option<String>,
    pub last_intent: Option<IntentKind>,
    pub last_brand: Option<String>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product_query(mut self, query: impl Into<String>) -> Self {
        self.last_product_query = Some(query.into());
        self
    }

    pub fn with_intent(mut self, intent: IntentKind) -> Self {
        self.last_intent = Some(intent);
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.last_brand = Some(brand.into());
        self
    }
}

/// In-memory context store.
///
/// Concurrent writes for the same user are last-writer-wins.
#[derive(Debug)]
pub struct ContextStore {
    entries: DashMap<String, ConversationContext>,
    ttl: ChronoDuration,
    max_entries: usize,
}

impl ContextStore {
    pub fn new(config: &ContextConfig) -> Self {
        Self::with_ttl(config.ttl()).with_max_entries(config.max_entries)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::days(36_500)),
            max_entries: usize::MAX,
        }
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the live context for a user, evicting it if it has expired.
    pub fn get(&self, user_id: &str) -> Option<ConversationContext> {
        self.get_at(user_id, Utc::now())
    }

    pub fn get_at(&self, user_id: &str, now: DateTime<Utc>) -> Option<ConversationContext> {
        let context = self.entries.get(user_id).map(|entry| entry.clone())?;
        if context.is_expired_at(now, self.ttl) {
            // Only evict if nobody refreshed it in between.
            self.entries
                .remove_if(user_id, |_, stored| stored.is_expired_at(now, self.ttl));
            trace!(user_id, "Evicted expired context");
            return None;
        }
        Some(context)
    }

    /// Creates or merges a user's context and refreshes its timestamp.
    pub fn set(&self, user_id: &str, patch: ContextPatch) {
        self.set_at(user_id, patch, Utc::now());
    }

    pub fn set_at(&self, user_id: &str, patch: ContextPatch, now: DateTime<Utc>) {
        if !self.entries.contains_key(user_id) && self.entries.len() >= self.max_entries {
            self.make_room(now);
        }

        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| ConversationContext::new(user_id, now));

        // A context that expired but was never read starts over.
        if entry.is_expired_at(now, self.ttl) {
            *entry = ConversationContext::new(user_id, now);
        }
        entry.apply(patch, now);
    }

    /// Drops expired contexts, returning how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, context| !context.is_expired_at(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    /// Evicts expired entries and, if still full, the least recently updated.
    fn make_room(&self, now: DateTime<Utc>) {
        let removed = self.sweep_at(now);
        if removed > 0 || self.entries.len() < self.max_entries {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.timestamp)
            .map(|entry| entry.key().clone());
        if let Some(user_id) = oldest {
            self.entries.remove(&user_id);
            debug!(user_id = %user_id, "Context store full, evicted oldest entry");
        }
    }

    /// Spawns a periodic sweep that stops when `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Context sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = self.sweep();
                        if removed > 0 {
                            debug!(removed, "Context sweep removed expired entries");
                        }
                    }
                }
            }
        })
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

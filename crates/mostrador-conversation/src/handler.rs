//! Message handling pipeline.
//!
//! One inbound message is validated, classified, reinterpreted as a follow-up
//! when the stored context allows it, answered from the catalog or the order
//! collaborator, and finally folded back into the user's context.
//!
//! Sun-care questions, and any product question asked while the user is
//! talking about sun care, go to the sun-care store first when one is
//! configured. The main catalog answers whatever that store does not know.

use mostrador_adapters::{bounded, OrderAdapter};
use mostrador_catalog::ProductResolver;
use mostrador_context::{ContextPatch, ContextStore, ConversationContext};
use mostrador_core::{AppResult, BrandsConfig, CatalogEntry, Intent, IntentKind};
use mostrador_nlp::{clean_query, compose_follow_up_query, contains_any, lexicon, normalize, IntentClassifier};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::message::{HandledMessage, InboundMessage, OrderOutcome, Outcome, ProductOutcome};

const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(15);

pub const BRAND_OZONE: &str = "ozone";
pub const BRAND_MTB: &str = "mtb";

pub struct MessageHandler {
    classifier: IntentClassifier,
    contexts: Arc<ContextStore>,
    resolver: Arc<ProductResolver>,
    ozone: Option<Arc<ProductResolver>>,
    orders: Arc<dyn OrderAdapter>,
    brands: BrandsConfig,
    order_timeout: Duration,
}

impl MessageHandler {
    pub fn new(
        contexts: Arc<ContextStore>,
        resolver: Arc<ProductResolver>,
        orders: Arc<dyn OrderAdapter>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            contexts,
            resolver,
            ozone: None,
            orders,
            brands: BrandsConfig::default(),
            order_timeout: DEFAULT_ORDER_TIMEOUT,
        }
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_brands(mut self, brands: BrandsConfig) -> Self {
        self.brands = brands;
        self
    }

    /// Resolver backed by the sun-care brand's own store.
    pub fn with_ozone_resolver(mut self, resolver: Arc<ProductResolver>) -> Self {
        self.ozone = Some(resolver);
        self
    }

    pub fn with_order_timeout(mut self, timeout: Duration) -> Self {
        self.order_timeout = timeout;
        self
    }

    pub fn contexts(&self) -> &Arc<ContextStore> {
        &self.contexts
    }

    pub fn resolver(&self) -> &Arc<ProductResolver> {
        &self.resolver
    }

    /// Handles one message. Only a malformed message is an error; upstream
    /// trouble shows up as an outcome the composer can phrase.
    #[instrument(skip(self, message), fields(user_id = tracing::field::Empty, intent = tracing::field::Empty))]
    pub async fn handle(&self, message: InboundMessage) -> AppResult<HandledMessage> {
        let (user_id, text) = message.validate()?;
        tracing::Span::current().record("user_id", user_id);

        let classified = self.classifier.classify(text);
        let context = self.contexts.get(user_id);
        let (intent, follow_up_query) = resolve_follow_up(classified, context.as_ref(), text);
        let follow_up = follow_up_query.is_some();
        tracing::Span::current().record("intent", intent.intent.as_str());

        let mut brand = brand_for(intent.intent, text);
        let (outcome, product_query) = match intent.intent {
            IntentKind::Order => (Outcome::Order(self.order_outcome(&intent).await), None),
            kind if kind.is_product_bearing() => {
                let query = follow_up_query
                    .or_else(|| self.product_query(kind, text, context.as_ref()))
                    .unwrap_or_default();
                let route = route_brand(kind, text, context.as_ref());
                let (outcome, answered_by) = self.product_outcome(&query, route).await;
                brand = Some(answered_by);
                (Outcome::Product(outcome), Some(query).filter(|q| !q.is_empty()))
            }
            _ => (Outcome::Canned, None),
        };

        self.remember(user_id, &intent, brand, product_query);

        let handled = HandledMessage {
            user_id: user_id.to_string(),
            channel: message.channel.clone(),
            intent,
            follow_up,
            brand,
            outcome,
        };
        info!(status = handled.status(), follow_up, brand = brand.unwrap_or("none"), "Message handled");
        Ok(handled)
    }

    /// Query for a product-bearing intent: the cleaned text, then the brand
    /// query for the sun family, then the last product the user asked about.
    fn product_query(
        &self,
        kind: IntentKind,
        text: &str,
        context: Option<&ConversationContext>,
    ) -> Option<String> {
        let mut cleaned = clean_query(text);
        if kind.is_sun_family() {
            cleaned = without_generic_sun_terms(&cleaned);
            if cleaned.is_empty() && !self.brands.ozone_query.trim().is_empty() {
                return Some(self.brands.ozone_query.clone());
            }
        }
        if !cleaned.is_empty() {
            return Some(cleaned);
        }
        context.and_then(|ctx| ctx.last_product_query.clone())
    }

    /// Resolves `query` against the store for `route`, returning the outcome
    /// and the brand whose store answered.
    async fn product_outcome(&self, query: &str, route: &'static str) -> (ProductOutcome, &'static str) {
        if query.is_empty() {
            return (ProductOutcome::MissingQuery, route);
        }

        if route == BRAND_OZONE {
            if let Some(ozone) = &self.ozone {
                if let Some(product) = ozone.resolve(query).await {
                    return (found(query, product), BRAND_OZONE);
                }
                debug!(query, "Not in the sun-care store, trying the main catalog");
                return match self.resolver.resolve(query).await {
                    Some(product) => (found(query, product), BRAND_MTB),
                    None => (not_found(query), BRAND_OZONE),
                };
            }
        }

        match self.resolver.resolve(query).await {
            Some(product) => (found(query, product), route),
            None => (not_found(query), route),
        }
    }

    async fn order_outcome(&self, intent: &Intent) -> OrderOutcome {
        let Some(order_id) = intent.entities.order_id.clone() else {
            return OrderOutcome::NeedsOrderId;
        };

        let lookup = bounded(self.order_timeout, "get_order", self.orders.get_order(&order_id));
        match lookup.await {
            Ok(Some(order)) => OrderOutcome::Found { order },
            Ok(None) => OrderOutcome::NotFound { order_id },
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Order lookup failed");
                OrderOutcome::Unavailable { order_id }
            }
        }
    }

    fn remember(
        &self,
        user_id: &str,
        intent: &Intent,
        brand: Option<&'static str>,
        product_query: Option<String>,
    ) {
        let kind = intent.intent;
        let mut patch = ContextPatch::new();

        // Greetings and unknown messages keep the previous exchange alive for
        // a later follow-up.
        if !matches!(kind, IntentKind::Unknown | IntentKind::Greet) {
            patch = patch.with_intent(kind);
        }
        if let Some(query) = product_query {
            patch = patch.with_product_query(query);
        }
        if let Some(brand) = brand {
            patch = patch.with_brand(brand);
        }

        self.contexts.set(user_id, patch);
    }
}

fn found(query: &str, product: CatalogEntry) -> ProductOutcome {
    ProductOutcome::Found {
        query: query.to_string(),
        product,
    }
}

fn not_found(query: &str) -> ProductOutcome {
    debug!(query, "No confident product match");
    ProductOutcome::NotFound {
        query: query.to_string(),
    }
}

/// Applies the follow-up policy. Returns the effective intent and, when the
/// message continues a previous price question, the composite query.
pub fn resolve_follow_up(
    intent: Intent,
    context: Option<&ConversationContext>,
    text: &str,
) -> (Intent, Option<String>) {
    if !matches!(intent.intent, IntentKind::Unknown | IntentKind::Greet) || !intent.entities.follow_up {
        return (intent, None);
    }
    let Some(context) = context else {
        return (intent, None);
    };
    let Some(previous) = context.last_intent.filter(IntentKind::is_price_bearing) else {
        return (intent, None);
    };

    let query = compose_follow_up_query(context.last_product_query.as_deref().unwrap_or(""), text);
    debug!(previous = %previous, query = %query, "Treating message as a follow-up");

    let mut inherited = Intent::new(previous).with_rule("follow_up");
    inherited.entities = intent.entities;
    (inherited, Some(query))
}

/// Drops words that name the sun-protection category rather than a product.
fn without_generic_sun_terms(query: &str) -> String {
    query
        .split_whitespace()
        .filter(|token| !lexicon::SUN.contains(token) && !lexicon::FAQ.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Brand a message is about on its own, if any.
pub fn brand_for(kind: IntentKind, text: &str) -> Option<&'static str> {
    if kind.is_sun_family() || contains_any(&normalize(text), lexicon::OZONE) {
        Some(BRAND_OZONE)
    } else if kind.is_product_bearing() {
        Some(BRAND_MTB)
    } else {
        None
    }
}

/// Store a product question goes to first. A price question stays with the
/// sun-care store while the conversation is about it.
pub fn route_brand(kind: IntentKind, text: &str, context: Option<&ConversationContext>) -> &'static str {
    let own = brand_for(kind, text).unwrap_or(BRAND_MTB);
    let ongoing = context.and_then(|ctx| ctx.last_brand.as_deref()) == Some(BRAND_OZONE);
    if own == BRAND_OZONE || (kind.is_price_bearing() && ongoing) {
        BRAND_OZONE
    } else {
        BRAND_MTB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context(intent: IntentKind, query: &str) -> ConversationContext {
        let store = ContextStore::default();
        store.set("u1", ContextPatch::new().with_intent(intent).with_product_query(query));
        store.get("u1").unwrap()
    }

    fn classify(text: &str) -> Intent {
        mostrador_nlp::detect_intent(text)
    }

    #[test]
    fn test_follow_up_inherits_price_and_composes_query() {
        let ctx = context(IntentKind::Price, "piel iluminada");
        let (intent, query) = resolve_follow_up(classify("¿y la corporal?"), Some(&ctx), "¿y la corporal?");

        assert_eq!(intent.intent, IntentKind::Price);
        assert_eq!(intent.rule, Some("follow_up"));
        assert_eq!(query.as_deref(), Some("piel iluminada corporal"));
    }

    #[test]
    fn test_no_follow_up_without_price_bearing_context() {
        let ctx = context(IntentKind::Shipping, "piel iluminada");
        let (intent, query) = resolve_follow_up(classify("¿y la corporal?"), Some(&ctx), "¿y la corporal?");
        assert_eq!(intent.intent, IntentKind::Unknown);
        assert!(query.is_none());

        let (_, query) = resolve_follow_up(classify("¿y la corporal?"), None, "¿y la corporal?");
        assert!(query.is_none());
    }

    #[test]
    fn test_classified_intent_is_never_overridden() {
        let ctx = context(IntentKind::Price, "piel iluminada");
        let (intent, query) = resolve_follow_up(classify("y el envío?"), Some(&ctx), "y el envío?");
        assert_eq!(intent.intent, IntentKind::Shipping);
        assert!(query.is_none());
    }

    #[test]
    fn test_generic_sun_terms_are_dropped() {
        assert_eq!(without_generic_sun_terms("protector solar"), "");
        assert_eq!(without_generic_sun_terms("sunstick kids spf"), "sunstick kids");
    }

    #[test]
    fn test_routing_follows_the_ongoing_brand() {
        let store = ContextStore::default();
        store.set("u1", ContextPatch::new().with_intent(IntentKind::Price).with_brand(BRAND_OZONE));
        let ozone_ctx = store.get("u1");

        assert_eq!(route_brand(IntentKind::Price, "precio del azul", ozone_ctx.as_ref()), BRAND_OZONE);
        assert_eq!(route_brand(IntentKind::Info, "info del iuven", ozone_ctx.as_ref()), BRAND_MTB);
        assert_eq!(route_brand(IntentKind::Price, "precio iuven", None), BRAND_MTB);
        assert_eq!(route_brand(IntentKind::Price, "precio sunstick", None), BRAND_OZONE);
    }

    #[test]
    fn test_brand_tagging() {
        assert_eq!(brand_for(IntentKind::Sunstick, "sunstick"), Some(BRAND_OZONE));
        assert_eq!(brand_for(IntentKind::Price, "precio del protector solar"), Some(BRAND_OZONE));
        assert_eq!(brand_for(IntentKind::Price, "precio iuven"), Some(BRAND_MTB));
        assert_eq!(brand_for(IntentKind::Shipping, "envíos"), None);
    }
}

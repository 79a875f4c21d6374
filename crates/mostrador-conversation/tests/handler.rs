use async_trait::async_trait;
use mostrador_adapters::{AdapterError, AdapterResult, CatalogAdapter, OrderAdapter};
use mostrador_catalog::{CatalogCache, ProductResolver};
use mostrador_context::ContextStore;
use mostrador_conversation::{InboundMessage, MessageHandler, OrderOutcome, Outcome, ProductOutcome};
use mostrador_core::{CatalogEntry, IntentKind, Order, ProductRecord};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Catalog whose live endpoint never knows anything, so every answer comes
/// from the cached snapshot.
#[derive(Default)]
struct CacheOnlyCatalog {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl CatalogAdapter for CacheOnlyCatalog {
    async fn list_products(&self) -> AdapterResult<Vec<ProductRecord>> {
        Err(AdapterError::Connection("listing disabled".into()))
    }

    async fn get_product(&self, query: &str) -> AdapterResult<Option<ProductRecord>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "cache-only"
    }
}

enum OrderScript {
    Known,
    Failing,
    Slow,
}

struct ScriptedOrders(OrderScript);

#[async_trait]
impl OrderAdapter for ScriptedOrders {
    async fn get_order(&self, order_id: &str) -> AdapterResult<Option<Order>> {
        match self.0 {
            OrderScript::Known if order_id == "48213" => Ok(Some(Order {
                id: Some("48213".into()),
                status: Some("enviado".into()),
                ..Order::default()
            })),
            OrderScript::Known => Ok(None),
            OrderScript::Failing => Err(AdapterError::RequestFailed {
                status: 502,
                message: "bad gateway".into(),
            }),
            OrderScript::Slow => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(None)
            }
        }
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    catalog: Arc<CacheOnlyCatalog>,
    handler: MessageHandler,
}

async fn fixture(orders: OrderScript) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(CacheOnlyCatalog::default());
    let cache = Arc::new(CatalogCache::with_path(dir.path().join("products.json"), catalog.clone()));
    cache
        .write(&[
            CatalogEntry::new("Piel Iluminada Pocket").with_price(18_900.0),
            CatalogEntry::new("Piel Iluminada Corporal").with_price(35_595.0),
            CatalogEntry::new("Sérum Iuven 30ml"),
            CatalogEntry::new("Sunstick Kids Azul"),
        ])
        .await;

    let resolver = Arc::new(ProductResolver::new(catalog.clone(), cache));
    let handler = MessageHandler::new(
        Arc::new(ContextStore::default()),
        resolver,
        Arc::new(ScriptedOrders(orders)),
    )
    .with_order_timeout(Duration::from_millis(200));

    Fixture {
        _dir: dir,
        catalog,
        handler,
    }
}

struct OzoneFixture {
    _dir: tempfile::TempDir,
    sun_store: Arc<CacheOnlyCatalog>,
    handler: MessageHandler,
}

/// Main catalog plus a separate sun-care store with its own snapshot.
async fn ozone_fixture() -> OzoneFixture {
    let dir = tempfile::tempdir().unwrap();

    let main = Arc::new(CacheOnlyCatalog::default());
    let main_cache = Arc::new(CatalogCache::with_path(dir.path().join("products.json"), main.clone()));
    main_cache
        .write(&[
            CatalogEntry::new("Sérum Iuven 30ml").with_price(35_595.0),
            CatalogEntry::new("Piel Iluminada Pocket"),
        ])
        .await;

    let sun_store = Arc::new(CacheOnlyCatalog::default());
    let sun_cache = Arc::new(CatalogCache::with_path(dir.path().join("ozone.json"), sun_store.clone()));
    sun_cache
        .write(&[
            CatalogEntry::new("Sunstick Azul FPS 50"),
            CatalogEntry::new("Sunstick Verde FPS 50"),
        ])
        .await;

    let handler = MessageHandler::new(
        Arc::new(ContextStore::default()),
        Arc::new(ProductResolver::new(main, main_cache)),
        Arc::new(ScriptedOrders(OrderScript::Known)),
    )
    .with_ozone_resolver(Arc::new(ProductResolver::new(sun_store.clone(), sun_cache)));

    OzoneFixture {
        _dir: dir,
        sun_store,
        handler,
    }
}

fn found_name(outcome: &Outcome) -> Option<&str> {
    match outcome {
        Outcome::Product(ProductOutcome::Found { product, .. }) => Some(product.name.as_str()),
        _ => None,
    }
}

#[tokio::test]
async fn follow_up_extends_the_previous_price_question() {
    let f = fixture(OrderScript::Known).await;

    let first = f
        .handler
        .handle(InboundMessage::new("u1", "cuánto sale piel iluminada"))
        .await
        .unwrap();
    assert_eq!(first.intent.intent, IntentKind::Price);
    assert!(!first.follow_up);
    assert_eq!(found_name(&first.outcome), Some("Piel Iluminada Pocket"));

    let context = f.handler.contexts().get("u1").unwrap();
    assert_eq!(context.last_product_query.as_deref(), Some("piel iluminada"));
    assert_eq!(context.last_intent, Some(IntentKind::Price));

    let second = f
        .handler
        .handle(InboundMessage::new("u1", "¿y la corporal?"))
        .await
        .unwrap();
    assert_eq!(second.intent.intent, IntentKind::Price);
    assert!(second.follow_up);
    assert_eq!(found_name(&second.outcome), Some("Piel Iluminada Corporal"));
    match &second.outcome {
        Outcome::Product(ProductOutcome::Found { query, .. }) => {
            assert_eq!(query, "piel iluminada corporal")
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let queries = f.catalog.queries.lock().unwrap().clone();
    assert_eq!(queries.last().map(String::as_str), Some("piel iluminada corporal"));
}

#[tokio::test]
async fn follow_up_is_per_user() {
    let f = fixture(OrderScript::Known).await;
    f.handler
        .handle(InboundMessage::new("u1", "cuánto sale piel iluminada"))
        .await
        .unwrap();

    let other = f
        .handler
        .handle(InboundMessage::new("u2", "¿y la corporal?"))
        .await
        .unwrap();
    assert_eq!(other.intent.intent, IntentKind::Unknown);
    assert_eq!(other.outcome, Outcome::Canned);
}

#[tokio::test]
async fn greeting_keeps_the_previous_exchange_alive() {
    let f = fixture(OrderScript::Known).await;
    f.handler
        .handle(InboundMessage::new("u1", "precio iuven"))
        .await
        .unwrap();

    let greeting = f.handler.handle(InboundMessage::new("u1", "hola")).await.unwrap();
    assert_eq!(greeting.intent.intent, IntentKind::Greet);
    assert_eq!(greeting.status(), "canned");

    let context = f.handler.contexts().get("u1").unwrap();
    assert_eq!(context.last_intent, Some(IntentKind::Price));
    assert_eq!(context.last_product_query.as_deref(), Some("iuven"));
    assert_eq!(context.last_brand.as_deref(), Some("mtb"));
}

#[tokio::test]
async fn unmatched_product_asks_for_clarification() {
    let f = fixture(OrderScript::Known).await;

    let handled = f
        .handler
        .handle(InboundMessage::new("u1", "precio xyzxyz"))
        .await
        .unwrap();
    assert_eq!(
        handled.outcome,
        Outcome::Product(ProductOutcome::NotFound {
            query: "xyzxyz".into()
        })
    );

    let bare = f.handler.handle(InboundMessage::new("u2", "¿cuánto sale?")).await.unwrap();
    assert_eq!(bare.outcome, Outcome::Product(ProductOutcome::MissingQuery));
}

#[tokio::test]
async fn sun_family_without_product_uses_brand_query() {
    let f = fixture(OrderScript::Known).await;

    let handled = f
        .handler
        .handle(InboundMessage::new("u1", "tienen protector solar?"))
        .await
        .unwrap();
    assert_eq!(handled.intent.intent, IntentKind::Ozone);
    assert_eq!(found_name(&handled.outcome), Some("Sunstick Kids Azul"));

    let context = f.handler.contexts().get("u1").unwrap();
    assert_eq!(context.last_brand.as_deref(), Some("ozone"));
    assert_eq!(context.last_product_query.as_deref(), Some("sunstick"));
}

#[tokio::test]
async fn order_outcomes() {
    let f = fixture(OrderScript::Known).await;

    let found = f.handler.handle(InboundMessage::new("u1", "48213")).await.unwrap();
    assert_eq!(found.intent.entities.order_id.as_deref(), Some("48213"));
    assert!(matches!(found.outcome, Outcome::Order(OrderOutcome::Found { .. })));

    let missing = f
        .handler
        .handle(InboundMessage::new("u1", "mi pedido 99999"))
        .await
        .unwrap();
    assert_eq!(
        missing.outcome,
        Outcome::Order(OrderOutcome::NotFound {
            order_id: "99999".into()
        })
    );

    let no_id = f
        .handler
        .handle(InboundMessage::new("u1", "¿dónde está mi pedido?"))
        .await
        .unwrap();
    assert_eq!(no_id.outcome, Outcome::Order(OrderOutcome::NeedsOrderId));
}

#[tokio::test]
async fn order_upstream_trouble_is_recoverable() {
    for script in [OrderScript::Failing, OrderScript::Slow] {
        let f = fixture(script).await;
        let handled = f
            .handler
            .handle(InboundMessage::new("u1", "pedido 48213"))
            .await
            .unwrap();
        assert_eq!(
            handled.outcome,
            Outcome::Order(OrderOutcome::Unavailable {
                order_id: "48213".into()
            })
        );
    }
}

#[tokio::test]
async fn malformed_messages_are_validation_errors() {
    let f = fixture(OrderScript::Known).await;

    let err = f
        .handler
        .handle(InboundMessage {
            channel: Some("whatsapp".into()),
            user_id: None,
            text: Some("hola".into()),
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = f.handler.handle(InboundMessage::new("u1", "  ")).await.unwrap_err();
    assert!(err.is_validation());
    assert!(f.handler.contexts().is_empty());
}

#[tokio::test]
async fn sun_care_questions_go_to_the_sun_care_store() {
    let f = ozone_fixture().await;

    let stick = f
        .handler
        .handle(InboundMessage::new("u1", "precio del sunstick azul"))
        .await
        .unwrap();
    assert_eq!(found_name(&stick.outcome), Some("Sunstick Azul FPS 50"));
    assert_eq!(stick.brand, Some("ozone"));
    assert_eq!(f.handler.contexts().get("u1").unwrap().last_brand.as_deref(), Some("ozone"));

    // Still talking about sun care: a bare colour is looked up in the same store.
    let green = f
        .handler
        .handle(InboundMessage::new("u1", "cuánto sale el verde"))
        .await
        .unwrap();
    assert_eq!(green.intent.intent, IntentKind::Price);
    assert_eq!(found_name(&green.outcome), Some("Sunstick Verde FPS 50"));
    assert_eq!(green.brand, Some("ozone"));
}

#[tokio::test]
async fn sun_care_store_misses_fall_back_to_the_main_catalog() {
    let f = ozone_fixture().await;
    f.handler
        .handle(InboundMessage::new("u1", "precio del sunstick azul"))
        .await
        .unwrap();

    let serum = f
        .handler
        .handle(InboundMessage::new("u1", "precio iuven"))
        .await
        .unwrap();
    assert_eq!(found_name(&serum.outcome), Some("Sérum Iuven 30ml"));
    assert_eq!(serum.brand, Some("mtb"));
    assert!(f.sun_store.queries.lock().unwrap().iter().any(|q| q == "iuven"));

    // The conversation moved back to the house brand.
    let green = f
        .handler
        .handle(InboundMessage::new("u1", "cuánto sale el verde"))
        .await
        .unwrap();
    assert_eq!(green.outcome, Outcome::Product(ProductOutcome::NotFound { query: "verde".into() }));
    assert_eq!(green.brand, Some("mtb"));
}

#[tokio::test]
async fn house_brand_questions_skip_the_sun_care_store() {
    let f = ozone_fixture().await;

    let handled = f
        .handler
        .handle(InboundMessage::new("u2", "cuánto sale piel iluminada"))
        .await
        .unwrap();
    assert_eq!(found_name(&handled.outcome), Some("Piel Iluminada Pocket"));
    assert_eq!(handled.brand, Some("mtb"));
    assert!(f.sun_store.queries.lock().unwrap().is_empty());
}

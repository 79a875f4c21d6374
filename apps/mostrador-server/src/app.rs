//! Application state and initialization

use anyhow::{Context, Result};
use mostrador_adapters::{CatalogAdapter, FallbackCatalog, StoreApiClient, TiendanubeClient};
use mostrador_catalog::{CatalogCache, Matcher, ProductResolver};
use mostrador_context::ContextStore;
use mostrador_conversation::MessageHandler;
use mostrador_core::AppConfig;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::Args;
use crate::composer::ReplyComposer;
use crate::server::Server;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<MessageHandler>,
    pub cache: Arc<CatalogCache>,
    pub composer: Arc<ReplyComposer>,
}

impl AppState {
    pub fn new(handler: Arc<MessageHandler>, cache: Arc<CatalogCache>, composer: ReplyComposer) -> Self {
        Self {
            handler,
            cache,
            composer: Arc::new(composer),
        }
    }

    /// Wires collaborators, cache, resolver and context store from config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        info!("Initializing application components");

        let store_api =
            Arc::new(StoreApiClient::new(&config.catalog).context("Failed to create store API client")?);

        let mut catalog = FallbackCatalog::new(store_api.clone());
        if let Some(tiendanube) = &config.catalog.tiendanube {
            match TiendanubeClient::new(tiendanube, config.catalog.timeout()) {
                Ok(client) => {
                    info!(store_id = %tiendanube.store_id, "Tiendanube listing fallback enabled");
                    catalog = catalog.with_secondary(Arc::new(client));
                }
                Err(e) => warn!(error = %e, "Tiendanube fallback disabled"),
            }
        }
        let catalog: Arc<dyn CatalogAdapter> = Arc::new(catalog);

        let cache = Arc::new(CatalogCache::new(&config.cache, catalog.clone()));
        info!(path = %cache.path().display(), ttl_minutes = config.cache.ttl_minutes, "Catalog cache ready");

        let resolver = Arc::new(
            ProductResolver::new(catalog, cache.clone())
                .with_matcher(Matcher::from(config.matching))
                .with_live_timeout(config.catalog.timeout()),
        );

        let contexts = Arc::new(ContextStore::new(&config.context));
        let mut handler = MessageHandler::new(contexts, resolver, store_api)
            .with_brands(config.brands.clone())
            .with_order_timeout(config.catalog.timeout());
        if let Some(ozone) = Self::ozone_resolver(config) {
            handler = handler.with_ozone_resolver(ozone);
        }

        let composer = ReplyComposer::new(config.pricing).with_links(config.links.clone());
        Ok(Self::new(Arc::new(handler), cache, composer))
    }

    /// Resolver over the sun-care brand's own store, when one is configured.
    fn ozone_resolver(config: &AppConfig) -> Option<Arc<ProductResolver>> {
        let store = config.brands.ozone_store.as_ref()?;
        let client = match TiendanubeClient::new(store, config.catalog.timeout()) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!(error = %e, "Sun-care store disabled");
                return None;
            }
        };

        let cache = CatalogCache::with_path(&config.cache.ozone_path, client.clone())
            .with_ttl(config.cache.ttl())
            .with_fetch_timeout(config.cache.fetch_timeout());
        info!(store_id = %store.store_id, path = %cache.path().display(), "Sun-care store enabled");

        Some(Arc::new(
            ProductResolver::new(client, Arc::new(cache))
                .with_matcher(Matcher::from(config.matching))
                .with_live_timeout(config.catalog.timeout()),
        ))
    }
}

/// Main application
pub struct App {
    config: AppConfig,
    state: AppState,
    shutdown: CancellationToken,
    sweeper: JoinHandle<()>,
}

impl App {
    /// Loads configuration, applies CLI overrides and builds the state.
    pub async fn build(args: Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => AppConfig::load_from_file(path),
            None => AppConfig::load(),
        }
        .context("Failed to load configuration")?;

        if let Some(host) = args.host {
            config.server = config.server.with_host(host);
        }
        if let Some(port) = args.port {
            config.server = config.server.with_port(port);
        }

        let state = AppState::from_config(&config)?;

        let shutdown = CancellationToken::new();
        let sweeper = state
            .handler
            .contexts()
            .clone()
            .spawn_sweeper(config.context.sweep_interval(), shutdown.clone());

        Ok(Self {
            config,
            state,
            shutdown,
            sweeper,
        })
    }

    /// Serves until a shutdown signal arrives, then stops background work.
    pub async fn run(self) -> Result<()> {
        info!(address = %self.config.server.address(), "Starting server");

        let server = Server::new(self.config.server.clone(), self.state);
        let result = server.run(self.shutdown.clone()).await;

        self.shutdown.cancel();
        if let Err(e) = self.sweeper.await {
            warn!(error = %e, "Context sweeper ended abnormally");
        }
        result
    }
}

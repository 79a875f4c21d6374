use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppResult;
use crate::pricing::PriceNormalizer;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub context: ContextConfig,
    pub pricing: PriceNormalizer,
    pub matching: MatchingConfig,
    pub brands: BrandsConfig,
    #[serde(default)]
    pub links: LinksConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn load() -> AppResult<Self> {
        Self::load_from_env("MOSTRADOR")
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> AppResult<Self> {
        let builder = Self::with_defaults(Config::builder())?.add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load configuration from file with environment overrides.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("MOSTRADOR")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        builder
            .set_default("catalog.base_url", "http://127.0.0.1:3000")?
            .set_default("catalog.timeout_ms", 15_000)?
            .set_default("catalog.max_retries", 2)?
            .set_default("catalog.order_id_param", "order_id")?
            .set_default("cache.path", "/tmp/mostrador-products-cache.json")?
            .set_default("cache.ttl_minutes", 60)?
            .set_default("cache.fetch_timeout_secs", 60)?
            .set_default("cache.ozone_path", "/tmp/mostrador-ozone-cache.json")?
            .set_default("context.ttl_minutes", 10)?
            .set_default("context.max_entries", 10_000)?
            .set_default("context.sweep_interval_secs", 60)?
            .set_default("pricing.force_minor_units", false)?
            .set_default("pricing.minor_units_threshold", 500_000.0)?
            .set_default("matching.min_score", 3)?
            .set_default("brands.ozone_query", "sunstick")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)
    }
}

/// Catalog and order collaborator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_order_id_param")]
    pub order_id_param: String,
    #[serde(default)]
    pub tiendanube: Option<TiendanubeConfig>,
}

impl CatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            order_id_param: default_order_id_param(),
            tiendanube: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_tiendanube(mut self, tiendanube: TiendanubeConfig) -> Self {
        self.tiendanube = Some(tiendanube);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_max_retries() -> usize {
    2
}

fn default_order_id_param() -> String {
    "order_id".to_string()
}

/// Direct access to the Tiendanube platform, used as a secondary listing source
#[derive(Debug, Clone, Deserialize)]
pub struct TiendanubeConfig {
    pub store_id: String,
    pub access_token: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    #[serde(default = "default_tiendanube_base")]
    pub api_base: String,
}

impl TiendanubeConfig {
    pub fn new(store_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            access_token: access_token.into(),
            user_agent: default_user_agent(),
            per_page: default_per_page(),
            api_base: default_tiendanube_base(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }
}

fn default_user_agent() -> String {
    "mostrador-bot".to_string()
}

fn default_per_page() -> usize {
    200
}

fn default_tiendanube_base() -> String {
    "https://api.tiendanube.com/v1".to_string()
}

/// Persisted catalog snapshot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub path: PathBuf,
    #[serde(default = "default_cache_ttl_minutes")]
    pub ttl_minutes: u64,
    /// Deadline for one full listing fetch, all pages and retries included
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Snapshot of the sun-care store, when one is configured
    #[serde(default = "default_ozone_cache_path")]
    pub ozone_path: PathBuf,
}

impl CacheConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl_minutes: default_cache_ttl_minutes(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            ozone_path: default_ozone_cache_path(),
        }
    }

    pub fn with_ttl_minutes(mut self, minutes: u64) -> Self {
        self.ttl_minutes = minutes;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

fn default_cache_ttl_minutes() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

fn default_ozone_cache_path() -> PathBuf {
    PathBuf::from("/tmp/mostrador-ozone-cache.json")
}

/// Conversation context store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_context_ttl_minutes")]
    pub ttl_minutes: u64,
    #[serde(default = "default_context_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_context_ttl_minutes(),
            max_entries: default_context_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl ContextConfig {
    pub fn with_ttl_minutes(mut self, minutes: u64) -> Self {
        self.ttl_minutes = minutes;
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn default_context_ttl_minutes() -> u64 {
    10
}

fn default_context_max_entries() -> usize {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Fuzzy match acceptance
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_min_score")]
    pub min_score: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
        }
    }
}

fn default_min_score() -> u32 {
    3
}

/// Brand-level catalog queries
#[derive(Debug, Clone, Deserialize)]
pub struct BrandsConfig {
    /// Catalog query used for sun-protection intents without product text
    #[serde(default = "default_ozone_query")]
    pub ozone_query: String,
    /// The sun-care brand's own Tiendanube store. Sun-care price questions
    /// are answered from it first when set.
    #[serde(default)]
    pub ozone_store: Option<TiendanubeConfig>,
}

impl Default for BrandsConfig {
    fn default() -> Self {
        Self {
            ozone_query: default_ozone_query(),
            ozone_store: None,
        }
    }
}

impl BrandsConfig {
    pub fn with_ozone_query(mut self, query: impl Into<String>) -> Self {
        self.ozone_query = query.into();
        self
    }

    pub fn with_ozone_store(mut self, store: TiendanubeConfig) -> Self {
        self.ozone_store = Some(store);
        self
    }
}

fn default_ozone_query() -> String {
    "sunstick".to_string()
}

/// Store pages appended to promo, payment and shipping replies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinksConfig {
    #[serde(default)]
    pub promos_url: Option<String>,
    #[serde(default)]
    pub payments_url: Option<String>,
    #[serde(default)]
    pub shipping_url: Option<String>,
}

impl LinksConfig {
    pub fn with_promos_url(mut self, url: impl Into<String>) -> Self {
        self.promos_url = Some(url.into());
        self
    }

    pub fn with_payments_url(mut self, url: impl Into<String>) -> Self {
        self.payments_url = Some(url.into());
        self
    }

    pub fn with_shipping_url(mut self, url: impl Into<String>) -> Self {
        self.shipping_url = Some(url.into());
        self
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }

    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

//! Primary/secondary catalog composition.

use async_trait::async_trait;
use mostrador_core::ProductRecord;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::traits::CatalogAdapter;
use crate::AdapterResult;

/// Asks the primary source first and the secondary one when the primary
/// fails or comes back empty.
pub struct FallbackCatalog {
    primary: Arc<dyn CatalogAdapter>,
    secondary: Option<Arc<dyn CatalogAdapter>>,
}

impl FallbackCatalog {
    pub fn new(primary: Arc<dyn CatalogAdapter>) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn CatalogAdapter>) -> Self {
        self.secondary = Some(secondary);
        self
    }
}

#[async_trait]
impl CatalogAdapter for FallbackCatalog {
    async fn list_products(&self) -> AdapterResult<Vec<ProductRecord>> {
        let primary = self.primary.list_products().await;
        let Some(secondary) = &self.secondary else {
            return primary;
        };

        match primary {
            Ok(records) if !records.is_empty() => return Ok(records),
            Ok(_) => debug!(source = self.primary.name(), "Primary listing empty"),
            Err(e) => warn!(source = self.primary.name(), error = %e, "Primary listing failed"),
        }

        debug!(source = secondary.name(), "Listing from secondary catalog");
        secondary.list_products().await
    }

    async fn get_product(&self, query: &str) -> AdapterResult<Option<ProductRecord>> {
        let primary = self.primary.get_product(query).await;
        let Some(secondary) = &self.secondary else {
            return primary;
        };

        match primary {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => secondary.get_product(query).await,
            Err(e) => {
                warn!(source = self.primary.name(), error = %e, "Primary lookup failed");
                secondary.get_product(query).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

//! Tiendanube platform client.
//!
//! Used as the secondary catalog source. Listing pages through
//! `/{store_id}/products` until a short page comes back.

use async_trait::async_trait;
use mostrador_core::{ProductRecord, TiendanubeConfig};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::envelope;
use crate::traits::CatalogAdapter;
use crate::{AdapterError, AdapterResult};

/// Upper bound on pages fetched in one listing.
const MAX_PAGES: usize = 100;

pub struct TiendanubeClient {
    products_url: String,
    access_token: String,
    user_agent: String,
    per_page: usize,
    client: Client,
}

impl TiendanubeClient {
    pub fn new(config: &TiendanubeConfig, timeout: Duration) -> AdapterResult<Self> {
        if config.store_id.trim().is_empty() || config.access_token.trim().is_empty() {
            return Err(AdapterError::NotConfigured(
                "tiendanube store_id and access_token are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::NotConfigured(e.to_string()))?;

        Ok(Self {
            products_url: format!(
                "{}/{}/products",
                config.api_base.trim_end_matches('/'),
                config.store_id.trim()
            ),
            access_token: config.access_token.clone(),
            user_agent: config.user_agent.clone(),
            per_page: config.per_page.max(1),
            client,
        })
    }

    async fn get_page(&self, query: &[(&str, String)]) -> AdapterResult<Vec<Value>> {
        let response = self
            .client
            .get(&self.products_url)
            .query(query)
            .header("Authentication", format!("bearer {}", self.access_token))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        // An empty search answers 404 on this platform.
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::request_failed(status.as_u16(), body));
        }

        let body = response.json::<Value>().await?;
        envelope::list(body, "products")
            .ok_or_else(|| AdapterError::invalid_response("tiendanube page is not a list"))
    }
}

#[async_trait]
impl CatalogAdapter for TiendanubeClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> AdapterResult<Vec<ProductRecord>> {
        let mut records = Vec::new();

        for page in 1..=MAX_PAGES {
            let values = self
                .get_page(&[
                    ("page", page.to_string()),
                    ("per_page", self.per_page.to_string()),
                ])
                .await?;
            let fetched = values.len();
            records.extend(envelope::records::<ProductRecord>(values, self.name()));

            debug!(page, fetched, "Fetched tiendanube page");
            if fetched < self.per_page {
                break;
            }
        }

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, query: &str) -> AdapterResult<Option<ProductRecord>> {
        let values = self
            .get_page(&[("q", query.to_string()), ("per_page", "1".to_string())])
            .await?;
        Ok(envelope::records::<ProductRecord>(values, self.name())
            .into_iter()
            .next())
    }

    fn name(&self) -> &'static str {
        "tiendanube"
    }
}

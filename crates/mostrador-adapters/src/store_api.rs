//! Store API client.
//!
//! Thin HTTP client for the shop's own API: product search, full listing and
//! order status.

use async_trait::async_trait;
use mostrador_core::{CatalogConfig, Order, ProductRecord};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::envelope;
use crate::order::OrderRecord;
use crate::retry::RetryPolicy;
use crate::traits::{CatalogAdapter, OrderAdapter};
use crate::{AdapterError, AdapterResult};

/// HTTP client for the store API
#[derive(Debug, Clone)]
pub struct StoreApiClient {
    base_url: String,
    api_key: Option<String>,
    order_id_param: String,
    client: Client,
    retry: RetryPolicy,
}

impl StoreApiClient {
    pub fn new(config: &CatalogConfig) -> AdapterResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdapterError::NotConfigured(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            order_id_param: config.order_id_param.clone(),
            client,
            retry: RetryPolicy::new(config.max_retries + 1),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// GETs `path` and returns the JSON body, or `None` on 404.
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> AdapterResult<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Store API request");

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::request_failed(status.as_u16(), body));
        }

        Ok(Some(response.json::<Value>().await?))
    }
}

#[async_trait]
impl CatalogAdapter for StoreApiClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> AdapterResult<Vec<ProductRecord>> {
        let body = self
            .retry
            .execute(|| self.get_json("/products", &[]))
            .await?
            .ok_or_else(|| AdapterError::request_failed(404, "/products not found"))?;

        let values = envelope::list(body, "products")
            .ok_or_else(|| AdapterError::invalid_response("product listing is not a list"))?;
        let records = envelope::records(values, self.name());
        debug!(count = records.len(), "Listed products from store API");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, query: &str) -> AdapterResult<Option<ProductRecord>> {
        let Some(body) = self.get_json("/product", &[("q", query)]).await? else {
            return Ok(None);
        };

        match envelope::single(body, "product") {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| AdapterError::invalid_response(e.to_string())),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "store_api"
    }
}

#[async_trait]
impl OrderAdapter for StoreApiClient {
    #[instrument(skip(self))]
    async fn get_order(&self, order_id: &str) -> AdapterResult<Option<Order>> {
        let param = self.order_id_param.as_str();
        let Some(body) = self.get_json("/order", &[(param, order_id)]).await? else {
            return Ok(None);
        };

        match envelope::single(body, "order") {
            Some(value) => serde_json::from_value::<OrderRecord>(value)
                .map(|record| Some(record.into_order()))
                .map_err(|e| AdapterError::invalid_response(e.to_string())),
            None => Ok(None),
        }
    }
}

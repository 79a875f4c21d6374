use async_trait::async_trait;
use mostrador_core::{Order, ProductRecord};

use crate::AdapterResult;

/// Source of catalog data.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    /// Full catalog listing. An empty list is a valid answer; failures are errors.
    async fn list_products(&self) -> AdapterResult<Vec<ProductRecord>>;

    /// Point lookup by free text. `None` when the upstream has no match.
    async fn get_product(&self, query: &str) -> AdapterResult<Option<ProductRecord>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Source of order status.
#[async_trait]
pub trait OrderAdapter: Send + Sync {
    async fn get_order(&self, order_id: &str) -> AdapterResult<Option<Order>>;
}

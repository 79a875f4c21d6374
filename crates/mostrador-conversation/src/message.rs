use mostrador_core::{AppError, AppResult, CatalogEntry, Intent, Order};
use serde::{Deserialize, Serialize};

/// A chat message as received from a channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl InboundMessage {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: None,
            user_id: Some(user_id.into()),
            text: Some(text.into()),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Returns `(user_id, text)` when both are present and non-blank.
    pub fn validate(&self) -> AppResult<(&str, &str)> {
        let user_id = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::validation("user_id is required"))?;
        let text = self
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::validation("text is required"))?;
        Ok((user_id, text))
    }
}

/// Result of a product lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductOutcome {
    Found { query: String, product: CatalogEntry },
    /// No candidate was convincing; the reply should ask for clarification
    NotFound { query: String },
    /// The message named no product at all
    MissingQuery,
}

/// Result of an order status lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    Found { order: Order },
    NotFound { order_id: String },
    /// The order collaborator failed or timed out
    Unavailable { order_id: String },
    NeedsOrderId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Product(ProductOutcome),
    Order(OrderOutcome),
    /// Answered from fixed copy (greeting, shipping, payments and so on)
    Canned,
}

/// Everything a reply composer needs to answer one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandledMessage {
    pub user_id: String,
    pub channel: Option<String>,
    pub intent: Intent,
    /// The intent was inherited from the previous exchange
    pub follow_up: bool,
    /// Brand the exchange was about, for product questions the brand whose
    /// store answered
    pub brand: Option<&'static str>,
    pub outcome: Outcome,
}

impl HandledMessage {
    pub fn product(&self) -> Option<&CatalogEntry> {
        match &self.outcome {
            Outcome::Product(ProductOutcome::Found { product, .. }) => Some(product),
            _ => None,
        }
    }

    /// Short machine-readable status for logs and response metadata.
    pub fn status(&self) -> &'static str {
        match &self.outcome {
            Outcome::Product(ProductOutcome::Found { .. }) => "product_found",
            Outcome::Product(ProductOutcome::NotFound { .. }) => "product_not_found",
            Outcome::Product(ProductOutcome::MissingQuery) => "product_missing_query",
            Outcome::Order(OrderOutcome::Found { .. }) => "order_found",
            Outcome::Order(OrderOutcome::NotFound { .. }) => "order_not_found",
            Outcome::Order(OrderOutcome::Unavailable { .. }) => "order_unavailable",
            Outcome::Order(OrderOutcome::NeedsOrderId) => "order_needs_id",
            Outcome::Canned => "canned",
        }
    }
}
